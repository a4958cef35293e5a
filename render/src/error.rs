//! Error type.
//!
//! This is the shared error type for the whole crate. Description validation
//! failures are recoverable and carry the name of the offending object;
//! contract violations (allocator misuse, out-of-range indices) are panics,
//! not errors.

use std::{error, fmt};

#[derive(Clone, Debug)]
pub enum Error {
    /// A pipeline resource signature description failed validation.
    InvalidSignatureDesc { signature: String, message: String },
    /// A pipeline state description failed validation.
    InvalidPipelineDesc { pipeline: String, message: String },
    /// A resource lookup or binding operation failed.
    InvalidBinding { resource: String, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidSignatureDesc { signature, message } => {
                write!(f, "invalid resource signature '{}': {}", signature, message)
            }
            Error::InvalidPipelineDesc { pipeline, message } => {
                write!(f, "invalid pipeline state '{}': {}", pipeline, message)
            }
            Error::InvalidBinding { resource, message } => {
                write!(f, "invalid binding for resource '{}': {}", resource, message)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = ::std::result::Result<T, Error>;
