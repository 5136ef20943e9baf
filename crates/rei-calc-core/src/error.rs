use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReiCalcError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ReiCalcError {
    /// Name of the input that failed validation, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ReiCalcError::InvalidInput { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ReiCalcError {
    fn from(e: serde_json::Error) -> Self {
        ReiCalcError::SerializationError(e.to_string())
    }
}
