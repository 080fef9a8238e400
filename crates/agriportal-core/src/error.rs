use thiserror::Error;
use uuid::Uuid;

/// All errors that can occur in agriportal-core.
#[derive(Debug, Error)]
pub enum AgriportalError {
    #[error("Row not found: {resource}/{id}")]
    NotFound { resource: String, id: String },

    #[error("Row already exists: {resource}/{id}")]
    RowExists { resource: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid action payload: {0}")]
    InvalidPayload(String),

    /// The undo/redo callback failed after the history cursor already moved.
    #[error("Could not {direction} action {action_id}: {source}")]
    Reversal {
        action_id: Uuid,
        direction: &'static str,
        #[source]
        source: Box<AgriportalError>,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl AgriportalError {
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn row_exists(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RowExists {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Exit code the CLI should use when this error ends the process.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NotFound { .. } => ExitCode::NotFound,
            Self::Validation(_) | Self::InvalidPayload(_) | Self::ConfigError(_) => {
                ExitCode::InvalidArgs
            }
            Self::RowExists { .. } => ExitCode::Conflict,
            Self::Io(_) => ExitCode::FileSystemError,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Exit codes used by the `agriportal` binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    Conflict = 7,
}

pub type Result<T> = std::result::Result<T, AgriportalError>;
