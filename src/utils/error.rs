use std::panic::Location;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("URL '{url}' not recognized as any of: {known}")]
    UnrecognizedProvider { url: String, known: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Fetch failed: {message} (raised at {location})")]
    FetchError {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("HTTP request failed: {source}")]
    HttpError {
        source: reqwest::Error,
        location: &'static Location<'static>,
    },

    #[error("Failed to parse {provider} payload: {message} (raised at {location})")]
    ParseError {
        provider: String,
        message: String,
        location: &'static Location<'static>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Custom entry processor or summary renderer failure. Always recovered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("custom callback failed: {0}")]
pub struct ProcessorError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MenuError {
    /// Fetch failure tagged with the caller's source location.
    #[track_caller]
    pub fn fetch(message: impl Into<String>) -> Self {
        MenuError::FetchError {
            message: message.into(),
            location: Location::caller(),
        }
    }

    /// Payload parse failure tagged with the caller's source location.
    #[track_caller]
    pub fn parse(provider: &str, message: impl Into<String>) -> Self {
        Self::parse_at(provider, message, Location::caller())
    }

    /// Parse failure for a location captured earlier, for helpers that
    /// report on behalf of their caller.
    pub fn parse_at(
        provider: &str,
        message: impl Into<String>,
        location: &'static Location<'static>,
    ) -> Self {
        MenuError::ParseError {
            provider: provider.to_string(),
            message: message.into(),
            location,
        }
    }

    /// Where the error was raised, for variants that record it.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            MenuError::FetchError { location, .. }
            | MenuError::HttpError { location, .. }
            | MenuError::ParseError { location, .. } => Some(*location),
            _ => None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        MenuError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MenuError::UnrecognizedProvider { .. }
            | MenuError::ConfigError { .. }
            | MenuError::InvalidConfigValueError { .. }
            | MenuError::MissingConfigError { .. }
            | MenuError::TomlError(_) => ErrorCategory::Configuration,
            MenuError::FetchError { .. } | MenuError::HttpError { .. } => ErrorCategory::Network,
            MenuError::ParseError { .. } | MenuError::SerializationError(_) => ErrorCategory::Data,
            MenuError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MenuError::UnrecognizedProvider { .. } => {
                "Use a menu URL from one of the supported providers"
            }
            MenuError::ConfigError { .. }
            | MenuError::InvalidConfigValueError { .. }
            | MenuError::MissingConfigError { .. }
            | MenuError::TomlError(_) => "Check the configuration file and try again",
            MenuError::FetchError { .. } | MenuError::HttpError { .. } => {
                "Check network connectivity; the menu will be retried automatically"
            }
            MenuError::ParseError { .. } | MenuError::SerializationError(_) => {
                "The provider may have changed its page format"
            }
            MenuError::IoError(_) => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MenuError::UnrecognizedProvider { url, .. } => {
                format!("The menu URL '{}' is not supported", url)
            }
            MenuError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            other => other.to_string(),
        }
    }
}

// `?` on a reqwest error records the line of the `?`.
impl From<reqwest::Error> for MenuError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        MenuError::HttpError {
            source,
            location: Location::caller(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MenuError>;
