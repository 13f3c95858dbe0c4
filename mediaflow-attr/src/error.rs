//! Error types for attribute dictionaries

use thiserror::Error;

use crate::types::AttrType;

/// Attribute dictionary error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttrError {
    /// A type code above the shorthand base that no registry entry covers.
    #[error("unknown shorthand code {0:#04x}")]
    UnknownShorthand(u8),
    /// A type code that is neither a base type nor a shorthand.
    #[error("invalid attribute type code {0:#04x}")]
    InvalidType(u8),
    /// A long-form command was issued without an attribute name.
    #[error("attribute name required for non-shorthand type {0:?}")]
    MissingName(AttrType),
    /// The requested attribute is not in the dictionary.
    #[error("attribute not found")]
    NotFound,
    /// A fixed-size attribute was given a value of the wrong length.
    #[error("value of {got} bytes for fixed-size attribute of {expected} bytes")]
    SizeMismatch {
        /// Size mandated by the base type.
        expected: usize,
        /// Size the caller supplied.
        got: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AttrError>;
