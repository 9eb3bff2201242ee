use thiserror::Error;

pub type EditResult<T> = Result<T, EditError>;

/// Errors that leave `Session::interpret`.
///
/// Bad escape sequences and out-of-bounds edits are not errors: the first are
/// logged and dropped, the second beep.
#[derive(Debug, Error)]
pub enum EditError {
    /// The output sink refused the bytes. The session should be discarded.
    #[error("sink failure: {0}")]
    Sink(#[from] std::io::Error),

    /// The editor found its own bookkeeping in an impossible state.
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Edit(#[from] EditError),
}

pub type InfraResult<T> = Result<T, InfraError>;
