pub mod diagram;
pub mod document;
pub mod tabular;

use thiserror::Error;

use crate::models::Record;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed input at line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("malformed input: {0}")]
    Other(String),
}

/// Common capability set shared by C6/C7/C8, per `spec.md` §9 design note
/// "Polymorphism over codec dialects".
pub trait RecordCodec {
    fn encode(&self, records: &[Record]) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Record>, CodecError>;
    fn media_type(&self) -> &'static str;
    fn extension(&self) -> &'static str;
}
