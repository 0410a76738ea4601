use std::path::PathBuf;

/// Result alias that carries the custom [`BeatmapError`] type.
pub type Result<T> = std::result::Result<T, BeatmapError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum BeatmapError {
    /// The `[General]` section declared a game mode other than standard.
    #[error("unsupported mode `{mode}`")]
    UnsupportedMode { mode: String },
    /// The header pass finished without identity metadata or timing points.
    #[error("corrupted beatmap source `{}`", path.display())]
    CorruptedSource { path: PathBuf },
    /// The backing file could not be opened. Callers treat this as a broken
    /// precondition rather than a parse outcome.
    #[error("beatmap source `{}` is unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Invalid or unreadable parser configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors raised while reading lines.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl BeatmapError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Whether the error came out of header validation, as opposed to the
    /// source or the configuration being broken.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMode { .. } | Self::CorruptedSource { .. }
        )
    }
}
