mod canvas;
mod colors;
mod error;
mod gff;
mod layout;
mod scale;
mod scale_bar;

use clap::Parser;
use log::{debug, info};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::colors::{color_genes, to_hex, Palette};
use crate::error::{Result, SyntenyError};
use crate::gff::{load_annotations, AnnotationSet, BoundsPolicy};
use crate::layout::{draw_tracks, Geometry};
use crate::scale::find_scale;
use crate::scale_bar::draw_scale_bar;

#[derive(Parser)]
#[command(name = "gffsynteny")]
#[command(about = "Draw gene synteny from gff files.", long_about = None)]
struct Args {
    // MANDATORY OPTIONS
    /// Comma-separated list of gff files to plot, one track each.
    #[arg(short = 'g', long = "gff", value_name = "FILES", value_delimiter = ',', required = true)]
    gff: Vec<PathBuf>,

    // Drawing Options
    /// Color palette for gene categories.
    #[arg(short = 'P', long = "Pastel", value_name = "NAME", default_value = "Pastel1")]
    pastel: String,

    /// Write the SVG to this FILE.
    #[arg(short = 'o', long = "out", value_name = "FILE", default_value = "test.svg")]
    out: PathBuf,

    /// How the drawn range of each contig is derived from its genes.
    #[arg(short = 'b', long = "bounds", value_enum, default_value_t = BoundsPolicy::FileOrder)]
    bounds: BoundsPolicy,

    /// Distance in bp between scale bar ticks.
    #[arg(long = "tick-interval", value_name = "bp", default_value_t = 1000,
          value_parser = clap::value_parser!(i64).range(1..))]
    tick_interval: i64,

    /// Distance in bp between strand chevrons.
    #[arg(long = "chevron-spacing", value_name = "bp", default_value_t = 700.0,
          value_parser = positive_f64)]
    chevron_spacing: f64,

    // Threading
    /// Number of threads to use for reading files.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn positive_f64(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{} is not a positive number", s))
    }
}

/// Settings of one run, resolved from the command line.
#[derive(Debug, Clone)]
struct RenderOptions {
    inputs: Vec<PathBuf>,
    out: PathBuf,
    palette: Palette,
    bounds: BoundsPolicy,
    geometry: Geometry,
}

impl RenderOptions {
    fn from_args(args: &Args) -> Result<Self> {
        Ok(RenderOptions {
            inputs: args.gff.clone(),
            out: args.out.clone(),
            palette: Palette::by_name(&args.pastel)?,
            bounds: args.bounds,
            geometry: Geometry {
                tick_interval: args.tick_interval,
                chevron_spacing: args.chevron_spacing,
                ..Geometry::default()
            },
        })
    }
}

/// Lay out all tracks and the scale bar and return the SVG document.
fn render_svg(annotations: &AnnotationSet, options: &RenderOptions) -> Result<String> {
    let geometry = &options.geometry;

    let scale = find_scale(annotations, geometry.drawing_width)?;
    let colors = color_genes(annotations, options.palette)?;
    debug!("{} categories:", colors.len());
    for (category, rgb) in colors.iter() {
        debug!("{:>10} {}", to_hex(rgb), category);
    }

    let mut canvas = geometry.canvas(annotations.len());
    info!("Drawing {} tracks on a {}x{} canvas", annotations.len(), canvas.width, canvas.height);

    draw_tracks(&mut canvas, annotations, &scale, &colors, geometry);
    draw_scale_bar(&mut canvas, &scale, annotations.longest_span(), geometry);
    debug!("{} shapes drawn", canvas.shapes().len());

    Ok(canvas.to_svg())
}

/// Read, lay out and write. The output file is only created once the whole
/// document has been rendered.
fn run(options: &RenderOptions) -> Result<()> {
    info!(
        "Contig bounds: {}",
        match options.bounds {
            BoundsPolicy::FileOrder => "first gene start to last gene end (file order)",
            BoundsPolicy::Extent => "smallest start to largest end",
        }
    );

    let annotations = load_annotations(&options.inputs, options.bounds)?;
    if annotations.is_empty() {
        return Err(SyntenyError::DegenerateInput);
    }

    let svg = render_svg(&annotations, options)?;

    info!("Saving to {:?}...", options.out);
    write_output(&options.out, &svg)
}

/// Write next to `path` and rename into place, so `path` is either the
/// complete document or untouched.
fn write_output(path: &Path, contents: &str) -> Result<()> {
    let write_err = |source| SyntenyError::Write {
        path: path.to_path_buf(),
        source,
    };

    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", name));

    let written = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        })
        .and_then(|_| std::fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            eprintln!("Warning: could not configure {} threads: {}", threads, e);
        }
    }

    let result = RenderOptions::from_args(&args).and_then(|options| run(&options));
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Done.");
}
