//! Error types for threshold BLS operations

use thiserror::Error;

/// Result type alias for threshold BLS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sharing keys, collecting signature shares
/// or recovering signatures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Threshold parameters outside `1 <= t <= n`
    #[error("Invalid threshold parameters: required {required}, total {total}")]
    InvalidThreshold { required: usize, total: usize },

    /// Key material equal to the field's zero element
    #[error("Secret key share is equal to zero or corrupt")]
    ZeroKey,

    /// The share set has already produced a signature
    #[error("Signature share set was already merged")]
    AlreadyMerged,

    /// A share for this signer index was already accepted
    #[error("Already have this index: {0}")]
    DuplicateIndex(usize),

    /// An absent share was submitted
    #[error("Null signature share")]
    MissingShare,

    /// Participant index is 0 or greater than the number of signers
    #[error("Index out of range: {index} (total signers {total})")]
    IndexOutOfRange { index: usize, total: usize },

    /// Not enough shares to reach the threshold
    #[error("Not enough shares: required {required}, got {actual}")]
    ThresholdNotMet { required: usize, actual: usize },

    /// Two parallel inputs disagree in length
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A message or share reached a participant it was not addressed to
    #[error("Misaddressed: expected participant {expected}, got {actual}")]
    Misaddressed { expected: usize, actual: usize },

    /// A DKG contribution does not match the sender's commitments
    #[error("Contribution from participant {from} to participant {to} does not match commitments")]
    ContributionMismatch { from: usize, to: usize },

    /// Contributions cannot be checked without the sender's commitments
    #[error("No commitments from participant {0}")]
    MissingCommitments(usize),

    /// Decimal, hex or point encoding could not be parsed
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Message could not be mapped onto the curve
    #[error("Hash to curve failed: {0}")]
    HashToCurve(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<ark_serialize::SerializationError> for Error {
    fn from(e: ark_serialize::SerializationError) -> Self {
        Error::InvalidEncoding(e.to_string())
    }
}
