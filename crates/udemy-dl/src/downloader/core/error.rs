//! Error types for the course downloader with context and recovery information

use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;

use crate::curriculum::LectureId;

/// Every way a run, or a single lecture inside a run, can go wrong
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Invalid or inconsistent user input (range bounds, credentials)
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
        suggestion: Option<String>,
    },

    /// Login rejected by the platform
    #[error("Login failed: {message}")]
    Authentication { message: String },

    /// Course id or curriculum could not be discovered
    #[error("Course discovery failed: {message}")]
    Discovery {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single lecture's video source could not be determined
    #[error("Cannot resolve video source for lecture {lecture_id}: {reason}")]
    Resolution { lecture_id: LectureId, reason: String },

    /// HTTP-related errors with context
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a status we cannot use
    #[error("Request to '{url}' returned HTTP {status}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Network timeout
    #[error("Request to '{url}' timed out after {duration_secs}s (try increasing timeout or check network)")]
    NetworkTimeout { url: String, duration_secs: u64 },

    /// The server does not honour byte ranges, so a partial file cannot be continued
    #[error("Server for '{url}' does not support resuming transfers")]
    ResumeUnsupported { url: String },

    /// File system I/O errors with file context
    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// URL parsing errors with helpful suggestions
    #[error("Invalid URL '{url}': {suggestion}")]
    InvalidUrl {
        url: String,
        suggestion: String,
        #[source]
        source: url::ParseError,
    },

    /// Response body did not have the expected shape
    #[error("Failed to parse {context}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Download cancelled by user or system
    #[error("Download cancelled: {reason}")]
    Cancelled { reason: String, url: Option<String> },
}

/// Types of file operations for error context
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Read,
    Write,
    Create,
    Move,
    Metadata,
    CreateDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Move => write!(f, "moving"),
            FileOperation::Metadata => write!(f, "reading metadata"),
            FileOperation::CreateDir => write!(f, "creating directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    /// Shorthand for a configuration error tied to one command-line field
    pub fn config<M: Into<String>>(field: &str, message: M) -> Self {
        DownloadError::Configuration {
            message: message.into(),
            field: Some(field.to_string()),
            suggestion: None,
        }
    }

    /// Shorthand for a discovery error without an underlying cause
    pub fn discovery<M: Into<String>>(message: M) -> Self {
        DownloadError::Discovery {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap any error raised while discovering the course
    pub fn into_discovery(self, message: &str) -> Self {
        match self {
            e @ DownloadError::Discovery { .. } => e,
            other => DownloadError::Discovery {
                message: format!("{}: {}", message, other),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Errors that end the whole run rather than a single lecture
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DownloadError::Configuration { .. }
                | DownloadError::Authentication { .. }
                | DownloadError::Discovery { .. }
        )
    }

    /// The resumable transfer method is not available for this source
    pub fn is_capability_error(&self) -> bool {
        matches!(self, DownloadError::ResumeUnsupported { .. })
    }

    /// Get error category for logging and summaries
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::Configuration { .. } => "configuration",
            DownloadError::Authentication { .. } => "authentication",
            DownloadError::Discovery { .. } => "discovery",
            DownloadError::Resolution { .. } => "resolution",
            DownloadError::HttpRequest { .. } => "http_request",
            DownloadError::UnexpectedStatus { .. } => "unexpected_status",
            DownloadError::NetworkTimeout { .. } => "network_timeout",
            DownloadError::ResumeUnsupported { .. } => "resume_unsupported",
            DownloadError::FileSystem { .. } => "file_system",
            DownloadError::InvalidUrl { .. } => "invalid_url",
            DownloadError::Parse { .. } => "parse",
            DownloadError::Cancelled { .. } => "cancelled",
        }
    }

    /// Get severity level for error prioritization
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DownloadError::Configuration { .. } => ErrorSeverity::Critical,
            DownloadError::Authentication { .. } => ErrorSeverity::Critical,
            DownloadError::Discovery { .. } => ErrorSeverity::Critical,
            DownloadError::Resolution { .. } => ErrorSeverity::Medium,
            DownloadError::HttpRequest { .. } => ErrorSeverity::Medium,
            DownloadError::UnexpectedStatus { .. } => ErrorSeverity::Medium,
            DownloadError::NetworkTimeout { .. } => ErrorSeverity::Medium,
            DownloadError::ResumeUnsupported { .. } => ErrorSeverity::Low,
            DownloadError::FileSystem { .. } => ErrorSeverity::High,
            DownloadError::InvalidUrl { .. } => ErrorSeverity::High,
            DownloadError::Parse { .. } => ErrorSeverity::Medium,
            DownloadError::Cancelled { .. } => ErrorSeverity::Low,
        }
    }

    /// Get user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            DownloadError::Configuration { suggestion, .. } => suggestion.as_deref(),
            DownloadError::Authentication { .. } => {
                Some("Check your username and password, or log in through the website once to clear any captcha")
            }
            DownloadError::NetworkTimeout { .. } => {
                Some("Check your internet connection or try increasing the timeout value")
            }
            DownloadError::InvalidUrl { suggestion, .. } => Some(suggestion),
            DownloadError::Cancelled { .. } => {
                Some("Run the same command again to resume the partial download")
            }
            _ => None,
        }
    }

    /// Create a detailed error report for debugging
    pub fn detailed_report(&self) -> String {
        let mut report = format!("Error: {}\n", self);
        report.push_str(&format!("Category: {}\n", self.category()));
        report.push_str(&format!("Severity: {:?}\n", self.severity()));
        report.push_str(&format!("Fatal: {}\n", self.is_fatal()));

        if let Some(suggestion) = self.suggestion() {
            report.push_str(&format!("Suggestion: {}\n", suggestion));
        }

        if let Some(source) = self.source() {
            report.push_str(&format!("Root cause: {}\n", source));
        }

        report
    }
}

/// Error severity levels for prioritization
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl From<std::io::Error> for DownloadError {
    fn from(error: std::io::Error) -> Self {
        DownloadError::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: FileOperation::Read, // Default assumption
            source: error,
        }
    }
}

impl From<url::ParseError> for DownloadError {
    fn from(error: url::ParseError) -> Self {
        let suggestion = match error {
            url::ParseError::EmptyHost => "URL must have a valid hostname",
            url::ParseError::InvalidPort => "Port number must be between 1 and 65535",
            url::ParseError::RelativeUrlWithoutBase => {
                "URL must be absolute (include http:// or https://)"
            }
            _ => "Check URL format and try again",
        }
        .to_string();

        DownloadError::InvalidUrl {
            url: "<unparseable>".to_string(),
            suggestion,
            source: error,
        }
    }
}
