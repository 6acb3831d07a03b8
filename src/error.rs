use thiserror::Error;

/// Faults surfaced to the user at the boundary of a command.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid folder link or ID: {0}")]
    InvalidReference(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Conversion failed for {name}: {message}")]
    ConversionFault { name: String, message: String },

    #[error("Could not place {name} in the sheet: {message}")]
    PlacementFault { name: String, message: String },

    #[error("Cancelled")]
    Cancelled,

    #[error("No access token available: {0}")]
    Credential(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl AppError {
    /// Title used for the alert shown when this error ends a command.
    pub fn title(&self) -> &'static str {
        match self {
            AppError::InvalidReference(_) => "Invalid folder",
            AppError::NotFound(_) => "Nothing to do",
            AppError::ConversionFault { .. } => "Conversion error",
            AppError::PlacementFault { .. } => "Placement error",
            AppError::Cancelled => "Cancelled",
            AppError::Credential(_) | AppError::Config(_) => "Setup error",
            _ => "Error",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
