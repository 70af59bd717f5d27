use thiserror::Error;

/// Errors raised while validating, encoding or categorizing one submission.
#[derive(Debug, Error)]
pub enum CategorizeError {
    #[error("Answer set is incomplete, missing: {}", missing.join(", "))]
    IncompleteInput { missing: Vec<String> },
    #[error("Answer {value:?} is not a known option for question {question}")]
    UnknownCategory { question: String, value: String },
    #[error("Feature row does not match the model schema: {0}")]
    SchemaMismatch(String),
    #[error("Model returned class {0}, which has no segment label")]
    UnknownClassIndex(i64),
    #[error("Model returned a malformed score vector: {0}")]
    MalformedScores(String),
}

impl CategorizeError {
    /// True for errors the submitter can fix by resubmitting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CategorizeError::IncompleteInput { .. })
    }

    /// User-facing guidance for recoverable errors.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            CategorizeError::IncompleteInput { .. } => {
                Some("Please select an option for all questions before submitting.")
            }
            _ => None,
        }
    }
}

/// Failure to append a record to the response store. Never fatal to a submission.
#[derive(Debug, Error)]
pub enum PersistenceWriteError {
    #[error("Failed to write response store: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode response row: {0}")]
    Csv(#[from] csv::Error),
    #[error("Response store header does not match record layout (expected {expected:?}, found {found:?})")]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Failure to load or validate a model artifact. Fatal at process start.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Failed to read or write model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode MessagePack model: {0}")]
    MessagePack(#[from] rmp_serde::decode::Error),
    #[error("Failed to encode model to MessagePack: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("Failed to parse JSON model: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid model artifact: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
}
