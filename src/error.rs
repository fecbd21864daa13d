use std::path::PathBuf;

/// Everything that can stop a rendering run. All variants are fatal.
#[derive(Debug, thiserror::Error)]
pub enum SyntenyError {
    #[error("{}:{line}: malformed record: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no gene spans to compute a scale from (need at least one file with a non-empty gene range)")]
    DegenerateInput,

    #[error("palette {palette} has {available} colors but {required} gene categories need one")]
    PaletteExhausted {
        palette: String,
        available: usize,
        required: usize,
    },

    #[error("unknown palette {name:?} (known: {known})")]
    UnknownPalette { name: String, known: String },

    #[error("cannot read {}: {source}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SyntenyError>;
