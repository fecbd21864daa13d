use log::info;

use crate::error::{Result, SyntenyError};
use crate::gff::AnnotationSet;

/// Genomic-to-drawing multiplier shared by every track and the scale bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale(f64);

impl Scale {
    #[cfg(test)]
    pub fn from_factor(factor: f64) -> Self {
        Scale(factor)
    }

    pub fn factor(&self) -> f64 {
        self.0
    }

    /// Drawing length of a genomic distance.
    pub fn to_drawing(&self, distance: f64) -> f64 {
        distance * self.0
    }
}

/// Find a scale so that the longest contig spans exactly `drawing_width`.
pub fn find_scale(annotations: &AnnotationSet, drawing_width: f64) -> Result<Scale> {
    let longest = annotations.longest_span();
    if longest <= 0 {
        return Err(SyntenyError::DegenerateInput);
    }

    let scale = Scale(drawing_width / longest as f64);
    info!("Longest span {} bp, scale {:.6} units/bp", longest, scale.factor());
    Ok(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gff::ContigAnnotation;

    fn span_set(bounds: &[(i64, i64)]) -> AnnotationSet {
        let mut set = AnnotationSet::new();
        for (i, &(min_coord, max_coord)) in bounds.iter().enumerate() {
            set.insert(
                format!("t{i}"),
                ContigAnnotation { genes: Vec::new(), min_coord, max_coord },
            );
        }
        set
    }

    #[test]
    fn longest_span_fills_the_drawing_width() {
        let set = span_set(&[(100, 500), (200, 600), (1, 901)]);
        let scale = find_scale(&set, 450.0).unwrap();
        assert!((scale.factor() - 0.5).abs() < 1e-12);
        for (_, contig) in set.iter() {
            assert!(scale.to_drawing(contig.span() as f64) <= 450.0 + 1e-9);
        }
        assert!((scale.to_drawing(900.0) - 450.0).abs() < 1e-9);
    }

    #[test]
    fn scale_is_bounded_for_awkward_spans() {
        for span in [1, 3, 7, 449, 451, 999_983, 12_345_679] {
            let set = span_set(&[(10, 10 + span), (0, span / 2)]);
            let scale = find_scale(&set, 450.0).unwrap();
            let drawn = scale.to_drawing(span as f64);
            assert!(drawn <= 450.0 + 1e-9 && (drawn - 450.0).abs() < 1e-6, "span {span}");
        }
    }

    #[test]
    fn zero_or_negative_spans_are_degenerate() {
        assert!(matches!(find_scale(&AnnotationSet::new(), 450.0), Err(SyntenyError::DegenerateInput)));
        assert!(matches!(find_scale(&span_set(&[(5, 5)]), 450.0), Err(SyntenyError::DegenerateInput)));
        assert!(matches!(find_scale(&span_set(&[(50, 10)]), 450.0), Err(SyntenyError::DegenerateInput)));
    }
}
