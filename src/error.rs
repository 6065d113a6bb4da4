use serde::Serialize;

/// All errors that can end a generation request or a file operation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Request failed ({status}): {message}")]
    Transport { status: u16, message: String },

    #[error("Response has no body to stream")]
    MissingBody,

    #[error("Malformed stream payload: {source} (line: {line})")]
    Protocol {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Generation was cancelled")]
    Cancelled,

    #[error("{0}")]
    Custom(String),
}

// Tauri requires error types to implement Serialize for IPC transport.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_display_string() {
        let err = AppError::Transport {
            status: 422,
            message: "description is required".into(),
        };
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            "\"Request failed (422): description is required\""
        );
    }
}
