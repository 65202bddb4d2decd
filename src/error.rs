use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content server error: {0}")]
    Server(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomshotError {
    pub fn config(message: impl Into<String>) -> Self {
        DomshotError::Config(message.into())
    }

    pub fn capture(message: impl Into<String>) -> Self {
        DomshotError::Capture(message.into())
    }

    /// Coarse classification so callers can tell bad input apart from an
    /// environment or runtime failure when asserting on errors in tests.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DomshotError::Config(_) => ErrorCategory::Config,
            DomshotError::Io(_) | DomshotError::Server(_) => ErrorCategory::Server,
            DomshotError::Browser(_)
            | DomshotError::Capture(_)
            | DomshotError::Serialization(_) => ErrorCategory::Capture,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let remediation = match self {
            DomshotError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("serve") {
                    "Pass `serve` as a list of directories (e.g. serve = [\"public\"])."
                } else if lower.contains("viewport") {
                    "Use WIDTHxHEIGHT (e.g. --viewport 800x600)."
                } else {
                    "Check option names and shapes; run with --verbose for details."
                }
            }
            DomshotError::Server(_) | DomshotError::Io(_) => {
                "Check free ports and filesystem permissions, then retry."
            }
            DomshotError::Browser(_) | DomshotError::Capture(_) => {
                "Ensure Chromium is installed and launchable; set launch.executable to point at a specific binary."
            }
            DomshotError::Serialization(_) => {
                "Inspect the page or options JSON that failed to (de)serialize."
            }
        };
        ErrorPayload::new(self.category(), self.to_string(), remediation)
    }
}

pub type Result<T> = std::result::Result<T, DomshotError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Server,
    Capture,
}

/// Machine-readable error shape emitted by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
