use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrivacyError {
    #[error("invalid pii pattern `{name}`: {reason}")]
    InvalidPattern { name: String, reason: String },
    #[error("sensitive mask must not be empty")]
    EmptyMask,
}

pub type PrivacyResult<T> = Result<T, PrivacyError>;
