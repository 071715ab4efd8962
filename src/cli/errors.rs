use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Target resolution must be a positive number of metres, got: {value}")]
    InvalidResolution { value: f64 },

    #[error("Could not open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Pipeline(#[from] s2stack::Error),
}
