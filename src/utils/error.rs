use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Invalid date '{value}'")]
    InvalidDateFormat { value: String },

    #[error("Unrecognized date argument '{keyword}', expected 'today' or 'yesterday'")]
    UnrecognizedDateKeyword { keyword: String },

    #[error("--dates takes 1 or 2 arguments, got {count}")]
    InvalidArgumentCount { count: usize },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API request failed: {0}")]
    TransportError(#[from] reqwest_middleware::Error),

    #[error("HTTP status {status} from {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UserInput,
    Configuration,
    Network,
    Data,
    System,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::InvalidDateFormat { .. }
            | EtlError::UnrecognizedDateKeyword { .. }
            | EtlError::InvalidArgumentCount { .. } => ErrorCategory::UserInput,
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            EtlError::ApiError(_) | EtlError::TransportError(_) | EtlError::HttpStatusError { .. } => {
                ErrorCategory::Network
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::UserInput | ErrorCategory::Configuration | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::InvalidDateFormat { value } => {
                format!("'{}' is not a valid date, expected DD-MM-YYYY", value)
            }
            EtlError::UnrecognizedDateKeyword { keyword } => {
                format!("'{}' is not a recognized date keyword", keyword)
            }
            EtlError::InvalidArgumentCount { count } => {
                format!("--dates expects 1 or 2 values, {} were given", count)
            }
            EtlError::HttpStatusError { status, url } => {
                format!("The API at {} answered with HTTP {}", url, status)
            }
            EtlError::ApiError(_) | EtlError::TransportError(_) => {
                "Could not reach the API".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::UserInput => {
                "Pass two DD-MM-YYYY dates or one of 'today'/'yesterday' to --dates"
            }
            ErrorCategory::Configuration => "Check the JSON configuration file passed to --config",
            ErrorCategory::Network => "Verify the API URL and your network connection, then retry",
            ErrorCategory::Data => "Inspect the API response; the data may not be tabular",
            ErrorCategory::System => "Check disk space and permissions on the output directory",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
