use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyntenyError};

/// Category given to genes without a `Note=` attribute.
pub const FALLBACK_CATEGORY: &str = "hypothetical_protein";

const NOTE_KEY: &str = "Note=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Parse GFF column 6. Unstranded (`.`) and unknown (`?`) features are
    /// drawn like forward ones.
    fn parse(field: &str) -> Option<Strand> {
        match field {
            "+" | "." | "?" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }
}

/// One `gene` line of an annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    pub contig_id: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub category: String,
}

impl GeneRecord {
    pub fn is_annotated(&self) -> bool {
        self.category != FALLBACK_CATEGORY
    }
}

/// How the bounds of a contig are derived from its genes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BoundsPolicy {
    /// Start of the first gene and end of the last gene, in file order.
    #[default]
    FileOrder,
    /// Smallest start and largest end over all genes.
    Extent,
}

/// Genes of one annotation file together with the coordinate range they span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContigAnnotation {
    pub genes: Vec<GeneRecord>,
    pub min_coord: i64,
    pub max_coord: i64,
}

impl ContigAnnotation {
    pub fn span(&self) -> i64 {
        self.max_coord - self.min_coord
    }

    fn push(&mut self, gene: GeneRecord, policy: BoundsPolicy) {
        if self.genes.is_empty() {
            self.min_coord = gene.start;
            self.max_coord = gene.end;
        } else {
            match policy {
                BoundsPolicy::FileOrder => self.max_coord = gene.end,
                BoundsPolicy::Extent => {
                    self.min_coord = self.min_coord.min(gene.start);
                    self.max_coord = self.max_coord.max(gene.end);
                }
            }
        }
        self.genes.push(gene);
    }
}

/// Annotations keyed by track label. Insertion order is the drawing order,
/// top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    entries: Vec<(String, ContigAnnotation)>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        AnnotationSet::default()
    }

    /// Insert a track. A label that is already present keeps its position and
    /// gets the new annotation.
    pub fn insert(&mut self, label: String, annotation: ContigAnnotation) {
        if let Some(slot) = self.entries.iter_mut().find(|(l, _)| *l == label) {
            warn!("Track {:?} given more than once, keeping the last file", label);
            slot.1 = annotation;
        } else {
            self.entries.push((label, annotation));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContigAnnotation)> {
        self.entries.iter().map(|(l, a)| (l.as_str(), a))
    }

    pub fn longest_span(&self) -> i64 {
        self.entries.iter().map(|(_, a)| a.span()).max().unwrap_or(0)
    }
}

/// Track label for an annotation file: its file name without the extension.
pub fn track_label(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decode GFF3 `%XX` escapes. Invalid sequences are kept verbatim.
fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Category of a gene from its attribute column.
fn note_category(attributes: &str) -> String {
    attributes
        .split(';')
        .map(str::trim)
        .find_map(|attr| attr.strip_prefix(NOTE_KEY))
        .map(unescape)
        .filter(|note| !note.is_empty())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}

fn parse_gene_line(fields: &[&str], path: &Path, line_no: usize) -> Result<GeneRecord> {
    let malformed = |reason: String| SyntenyError::MalformedRecord {
        path: path.to_path_buf(),
        line: line_no,
        reason,
    };

    if fields.len() < 9 {
        return Err(malformed(format!(
            "expected 9 tab-separated fields, found {}",
            fields.len()
        )));
    }

    let coord = |idx: usize, name: &str| -> Result<i64> {
        fields[idx]
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(format!("{} {:?} is not an integer", name, fields[idx])))
    };
    let start = coord(3, "start")?;
    let end = coord(4, "end")?;
    if start < 1 {
        return Err(malformed(format!("start {} is below 1 (coordinates are 1-based)", start)));
    }
    if start > end {
        return Err(malformed(format!("start {} is after end {}", start, end)));
    }

    let strand = Strand::parse(fields[6].trim())
        .ok_or_else(|| malformed(format!("invalid strand {:?}", fields[6])))?;

    Ok(GeneRecord {
        contig_id: fields[0].to_string(),
        start,
        end,
        strand,
        category: note_category(fields[8]),
    })
}

/// Parse annotation lines from any reader. `path` is only used for error
/// messages.
pub fn parse_gff<R: BufRead>(reader: R, path: &Path, policy: BoundsPolicy) -> Result<ContigAnnotation> {
    let mut annotation = ContigAnnotation::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| SyntenyError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.starts_with("##FASTA") {
            break;
        }
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 || fields[2] != "gene" {
            continue;
        }

        let gene = parse_gene_line(&fields, path, idx + 1)?;
        annotation.push(gene, policy);
    }

    Ok(annotation)
}

/// Read one annotation file.
pub fn read_gff(path: &Path, policy: BoundsPolicy) -> Result<ContigAnnotation> {
    let file = File::open(path).map_err(|source| SyntenyError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let annotation = parse_gff(BufReader::new(file), path, policy)?;
    debug!(
        "{:?}: {} genes, range {}-{}",
        path,
        annotation.genes.len(),
        annotation.min_coord,
        annotation.max_coord
    );
    Ok(annotation)
}

/// Read all annotation files. Files are parsed in parallel but the set keeps
/// the order of `paths`, and the first failing path in that order is reported.
pub fn load_annotations(paths: &[PathBuf], policy: BoundsPolicy) -> Result<AnnotationSet> {
    info!("Loading {} annotation files...", paths.len());

    let parsed: Vec<Result<ContigAnnotation>> = paths
        .par_iter()
        .map(|path| read_gff(path, policy))
        .collect();

    let mut set = AnnotationSet::new();
    for (path, annotation) in paths.iter().zip(parsed) {
        set.insert(track_label(path), annotation?);
    }

    info!(
        "Loaded {} tracks, {} genes",
        set.len(),
        set.iter().map(|(_, a)| a.genes.len()).sum::<usize>()
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const SAMPLE: &str = "##gff-version 3\n\
        ctg1\tprokka\tgene\t100\t500\t.\t+\t.\tID=g1;Note=kinase\n\
        ctg1\tprokka\tCDS\t100\t500\t.\t+\t0\tID=c1\n\
        ctg1\tprokka\tgene\t900\t1200\t.\t-\t.\tID=g2\n\
        \n\
        ctg1\tprokka\tgene\t50\t80\t.\t+\t.\tID=g3;Note=transporter%2C ABC\n";

    fn track<'a>(set: &'a AnnotationSet, label: &str) -> Option<&'a ContigAnnotation> {
        set.iter().find(|(l, _)| *l == label).map(|(_, a)| a)
    }

    fn parse(text: &str, policy: BoundsPolicy) -> Result<ContigAnnotation> {
        parse_gff(Cursor::new(text), Path::new("sample.gff"), policy)
    }

    #[test]
    fn keeps_only_gene_lines() {
        let annotation = parse(SAMPLE, BoundsPolicy::FileOrder).unwrap();
        assert_eq!(annotation.genes.len(), 3);
        assert_eq!(annotation.genes[0].contig_id, "ctg1");
        assert_eq!(annotation.genes[0].category, "kinase");
        assert_eq!(annotation.genes[1].strand, Strand::Reverse);
        assert_eq!(annotation.genes[1].category, FALLBACK_CATEGORY);
        assert!(!annotation.genes[1].is_annotated());
        assert_eq!(annotation.genes[2].category, "transporter, ABC");
    }

    #[test]
    fn file_order_bounds_use_first_start_and_last_end() {
        let annotation = parse(SAMPLE, BoundsPolicy::FileOrder).unwrap();
        assert_eq!(annotation.min_coord, 100);
        assert_eq!(annotation.max_coord, 80);
        assert_eq!(annotation.span(), -20);
    }

    #[test]
    fn extent_bounds_scan_all_genes() {
        let annotation = parse(SAMPLE, BoundsPolicy::Extent).unwrap();
        assert_eq!(annotation.min_coord, 50);
        assert_eq!(annotation.max_coord, 1200);
        assert_eq!(annotation.span(), 1150);
    }

    #[test]
    fn empty_input_has_zero_span() {
        let annotation = parse("##gff-version 3\n", BoundsPolicy::FileOrder).unwrap();
        assert!(annotation.genes.is_empty());
        assert_eq!(annotation.span(), 0);
    }

    #[test]
    fn stops_at_fasta_section() {
        let text = "c\ts\tgene\t1\t10\t.\t+\t.\tNote=a\n##FASTA\n>c\nACGT\tx\tgene\n";
        let annotation = parse(text, BoundsPolicy::FileOrder).unwrap();
        assert_eq!(annotation.genes.len(), 1);
    }

    #[test]
    fn short_gene_line_is_malformed() {
        let err = parse("c\ts\tgene\t1\t10\t.\t+\n", BoundsPolicy::FileOrder).unwrap_err();
        match err {
            SyntenyError::MalformedRecord { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_integer_coordinate_is_malformed() {
        let text = "# header\nc\ts\tgene\t1\tten\t.\t+\t.\tNote=a\n";
        let err = parse(text, BoundsPolicy::FileOrder).unwrap_err();
        match err {
            SyntenyError::MalformedRecord { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("end"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reversed_coordinates_and_bad_strand_are_malformed() {
        let reversed = parse("c\ts\tgene\t10\t1\t.\t+\t.\t.\n", BoundsPolicy::FileOrder);
        assert!(matches!(reversed, Err(SyntenyError::MalformedRecord { .. })));
        let strand = parse("c\ts\tgene\t1\t10\t.\tx\t.\t.\n", BoundsPolicy::FileOrder);
        assert!(matches!(strand, Err(SyntenyError::MalformedRecord { .. })));
    }

    #[test]
    fn coordinates_below_one_are_malformed() {
        for text in [
            "c\ts\tgene\t0\t10\t.\t+\t.\tNote=a\n",
            "c\ts\tgene\t-5\t10\t.\t+\t.\tNote=a\n",
            "c\ts\tgene\t-9223372036854775808\t9223372036854775807\t.\t+\t.\t.\n",
        ] {
            match parse(text, BoundsPolicy::Extent) {
                Err(SyntenyError::MalformedRecord { reason, .. }) => assert!(reason.contains("below 1")),
                other => panic!("unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn widest_valid_range_has_no_overflow() {
        let text = "c\ts\tgene\t1\t9223372036854775807\t.\t+\t.\t.\n";
        let annotation = parse(text, BoundsPolicy::FileOrder).unwrap();
        assert_eq!(annotation.span(), i64::MAX - 1);
    }

    #[test]
    fn unstranded_and_unknown_strands_are_forward() {
        let text = "c\ts\tgene\t1\t10\t.\t.\t.\tNote=a\n\
                    c\ts\tgene\t20\t30\t.\t?\t.\tNote=b\n";
        let annotation = parse(text, BoundsPolicy::FileOrder).unwrap();
        assert_eq!(annotation.genes.len(), 2);
        assert!(annotation.genes.iter().all(|g| g.strand == Strand::Forward));
    }

    #[test]
    fn lines_with_few_columns_are_skipped() {
        let text = "garbage\nc\tgene\nc\ts\tgene\t5\t50\t.\t-\t.\tNote=a\n";
        let annotation = parse(text, BoundsPolicy::FileOrder).unwrap();
        assert_eq!(annotation.genes.len(), 1);
        assert_eq!((annotation.min_coord, annotation.max_coord), (5, 50));
    }

    #[test]
    fn note_prefix_is_removed_not_trimmed() {
        assert_eq!(note_category("ID=x;Note=toxin"), "toxin");
        assert_eq!(note_category("ID=x; Note=eNzyme"), "eNzyme");
        assert_eq!(note_category("ID=x;Note="), FALLBACK_CATEGORY);
        assert_eq!(note_category("."), FALLBACK_CATEGORY);
    }

    #[test]
    fn unescape_decodes_percent_sequences() {
        assert_eq!(unescape("a%3Bb%3Dc%26d"), "a;b=c&d");
        assert_eq!(unescape("50%"), "50%");
        assert_eq!(unescape("%zz"), "%zz");
    }

    #[test]
    fn track_label_strips_extension() {
        assert_eq!(track_label(Path::new("/data/strainA.gff")), "strainA");
        assert_eq!(track_label(Path::new("gff_sample.gff3")), "gff_sample");
        assert_eq!(track_label(Path::new("plain")), "plain");
    }

    #[test]
    fn insert_replaces_duplicate_label_in_place() {
        let mut set = AnnotationSet::new();
        set.insert("a".into(), ContigAnnotation::default());
        set.insert("b".into(), ContigAnnotation::default());
        let replacement = ContigAnnotation {
            genes: Vec::new(),
            min_coord: 1,
            max_coord: 5,
        };
        set.insert("a".into(), replacement.clone());
        let labels: Vec<&str> = set.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(track(&set, "a"), Some(&replacement));
        assert_eq!(set.longest_span(), 4);
    }

    #[test]
    fn load_annotations_keeps_argument_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (name, end) in [("zeta", 300), ("alpha", 900), ("mid", 600)] {
            let path = dir.path().join(format!("{name}.gff"));
            let mut file = File::create(&path).unwrap();
            writeln!(file, "c\ts\tgene\t100\t{end}\t.\t+\t.\tNote={name}").unwrap();
            paths.push(path);
        }

        let set = load_annotations(&paths, BoundsPolicy::FileOrder).unwrap();
        let labels: Vec<&str> = set.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["zeta", "alpha", "mid"]);
        assert_eq!(track(&set, "alpha").unwrap().span(), 800);
    }

    #[test]
    fn first_failing_path_in_argument_order_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.gff");
        std::fs::write(&good, "c\ts\tgene\t1\t100\t.\t+\t.\tNote=a\n").unwrap();
        let bad = dir.path().join("bad.gff");
        std::fs::write(&bad, "c\ts\tgene\t1\tten\t.\t+\t.\tNote=a\n").unwrap();
        let missing = dir.path().join("missing.gff");

        for _ in 0..5 {
            let paths = vec![good.clone(), bad.clone(), missing.clone()];
            match load_annotations(&paths, BoundsPolicy::FileOrder).unwrap_err() {
                SyntenyError::MalformedRecord { path, line, .. } => {
                    assert_eq!(path, bad);
                    assert_eq!(line, 1);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }

        let paths = vec![good.clone(), missing.clone(), bad.clone()];
        match load_annotations(&paths, BoundsPolicy::FileOrder).unwrap_err() {
            SyntenyError::FileNotFound { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.gff");
        let err = load_annotations(&[missing.clone()], BoundsPolicy::FileOrder).unwrap_err();
        match err {
            SyntenyError::FileNotFound { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
