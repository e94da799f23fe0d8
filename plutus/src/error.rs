/*!
This module defines the primary error type for the on-chain data codec.

The `Error` enum covers every failure the codec can report, from low-level
CBOR syntax errors to schema-level mismatches discovered while encoding or
decoding typed values.
*/

use super::*;
use thiserror::Error;

/// The primary error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The encoded constructor id does not match the expected shape.
    #[error("Constructor id {found} does not match {shape} (id {expected})")]
    ShapeMismatch {
        shape: String,
        expected: u64,
        found: u64,
    },

    /// A value carries a different number of fields than its shape declares.
    #[error("{shape} declares {expected} fields, found {found}")]
    FieldCount {
        shape: String,
        expected: usize,
        found: usize,
    },

    /// A field's runtime value does not satisfy its declared type.
    #[error("{shape}.{field} declares {expected}, found {found}")]
    FieldType {
        shape: String,
        field: String,
        expected: String,
        found: &'static str,
    },

    /// An integer outside the range the canonical integer forms can carry.
    #[error("Integer {0} is outside the encodable range")]
    IntOutOfRange(i128),

    /// No alternative of a closed union matched the input.
    #[error("No union alternative matched, tried: {tried}")]
    AlternativesExhausted { tried: String },

    /// The top-level input is not something the codec recognises at all.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Structurally invalid framing above the CBOR syntax layer.
    #[error("Malformed encoding: {0}")]
    Malformed(String),

    /// A JSON value whose shape matches none of the recognised tags.
    #[error("Unrecognised JSON value: {0}")]
    MalformedJson(String),

    /// Opaque payloads are carried as raw bytes and have no JSON rendering.
    #[error("Opaque data cannot be represented as JSON")]
    OpaqueNotRepresentable,

    /// Additional data after the end of the encoded value.
    #[error("Additional data after end of encoded value")]
    AdditionalData,

    /// An error from the CBOR syntax layer.
    #[error(transparent)]
    InvalidCbor(#[from] cbor::decode::Error),

    /// An error from the JSON parser.
    #[error(transparent)]
    InvalidJson(#[from] serde_json::Error),

    /// A generic error for when parsing a specific field fails.
    #[error("Failed to parse {field}: {source}")]
    InvalidField {
        /// The name of the field that failed to parse.
        field: String,
        /// The underlying error that caused the failure.
        source: Box<Error>,
    },
}

/// A trait for mapping errors to a `Error::InvalidField`.
/// This is useful for providing more context when a parsing error occurs.
pub trait CaptureFieldErr<T> {
    /// Maps the error to a `Error::InvalidField` with the given field name.
    fn map_field_err(self, field: &str) -> Result<T, Error>;
}

impl<T, E: Into<Error>> CaptureFieldErr<T> for core::result::Result<T, E> {
    fn map_field_err(self, field: &str) -> Result<T, Error> {
        self.map_err(|e| Error::InvalidField {
            field: field.into(),
            source: Box::new(e.into()),
        })
    }
}
