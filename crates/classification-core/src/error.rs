use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fitting error: {0}")]
    Fitting(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;
