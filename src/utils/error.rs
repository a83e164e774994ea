use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data file not found: {path} ({hint})")]
    DataNotFound { path: String, hint: String },

    #[error("Not enough rows: need at least {required}, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Credentials error ({path}): {message}")]
    CredentialsError { path: String, message: String },

    #[error("Download failed with status {status}: {url}")]
    DownloadError { status: u16, url: String },

    #[error("Input closed before the game finished")]
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Data,
    Network,
    Io,
    Processing,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProjectError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProjectError::ConfigValidationError { .. }
            | ProjectError::InvalidConfigValueError { .. }
            | ProjectError::MissingConfigError { .. }
            | ProjectError::TomlError(_) => ErrorCategory::Config,
            ProjectError::CsvError(_)
            | ProjectError::DataNotFound { .. }
            | ProjectError::InsufficientData { .. } => ErrorCategory::Data,
            ProjectError::ApiError(_)
            | ProjectError::DownloadError { .. }
            | ProjectError::CredentialsError { .. } => ErrorCategory::Network,
            ProjectError::IoError(_) | ProjectError::ZipError(_) => ErrorCategory::Io,
            ProjectError::SerializationError(_) | ProjectError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
            ProjectError::InputClosed => ErrorCategory::User,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProjectError::InputClosed => ErrorSeverity::Low,
            ProjectError::ApiError(_) | ProjectError::DownloadError { .. } => {
                ErrorSeverity::Medium
            }
            ProjectError::IoError(_) | ProjectError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ProjectError::DataNotFound { .. } => {
                "Place the file under the data directory or run the download command first"
                    .to_string()
            }
            ProjectError::InsufficientData { required, .. } => format!(
                "Provide a dataset with at least {} rows that carry a parseable price",
                required
            ),
            ProjectError::CredentialsError { .. } => {
                "Create an API token on kaggle.com (Account -> Create API Token) and save it as kaggle.json"
                    .to_string()
            }
            ProjectError::DownloadError { status, .. } if *status == 401 || *status == 403 => {
                "Check the Kaggle username and key in kaggle.json".to_string()
            }
            ProjectError::DownloadError { .. } | ProjectError::ApiError(_) => {
                "Check the network connection and the dataset slug, then retry".to_string()
            }
            ProjectError::TomlError(_) => {
                "Make sure the configuration file is valid TOML".to_string()
            }
            ProjectError::ConfigValidationError { field, .. }
            | ProjectError::InvalidConfigValueError { field, .. }
            | ProjectError::MissingConfigError { field } => {
                format!("Fix the '{}' setting in the configuration or on the command line", field)
            }
            ProjectError::CsvError(_) => "Check that the dataset is a well-formed CSV file".to_string(),
            ProjectError::InputClosed => "Run the game again in an interactive terminal".to_string(),
            ProjectError::IoError(_) | ProjectError::ZipError(_) => {
                "Check file permissions and free disk space".to_string()
            }
            ProjectError::SerializationError(_) | ProjectError::ProcessingError { .. } => {
                "Run with --verbose for details".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Config => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
            ErrorCategory::User => self.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectError>;
