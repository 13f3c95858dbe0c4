//! mediaflow-attr - Inline attribute dictionaries
//!
//! This crate stores typed key/value attributes inline inside a single
//! contiguous buffer, so that dictionaries can be duplicated, pooled and
//! transmitted over streams with one copy. It includes:
//!
//! - The closed attribute type enumeration and value encodings
//! - The shorthand registry of well-known attributes
//! - The dictionary itself (get/set/delete/iterate/dup)
//! - A pooled dictionary manager
//! - A tagged command protocol over dictionaries
//! - Rational numbers (aspect ratios, frame rates)

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod dict;
pub mod error;
pub mod mgr;
pub mod rational;
pub mod shorthand;
pub mod types;

// Re-export commonly used types
pub use command::{DictReply, DictRequest};
pub use dict::{Dict, Entries, Entry};
pub use error::{AttrError, Result};
pub use mgr::{DictMgr, DICT_EXTRA_SIZE, DICT_MIN_SIZE};
pub use rational::Rational;
pub use shorthand::{Shorthand, SHORTHANDS, SHORTHAND_BASE};
pub use types::AttrType;
