//! Tagged command protocol over dictionaries
//!
//! Attributes are addressed the way they appear on the wire: a shorthand code
//! on its own, or a base type code together with a name. The protocol is the
//! remote surface of the dictionary; in-process callers use the typed methods
//! on [`Dict`] directly.

use smallvec::SmallVec;

use crate::dict::Dict;
use crate::error::{AttrError, Result};
use crate::shorthand;
use crate::shorthand::SHORTHAND_BASE;
use crate::types::AttrType;

/// A value carried out of the dictionary. Fixed-size values fit inline.
pub type Value = SmallVec<[u8; 16]>;

/// Dictionary commands.
#[derive(Debug)]
pub enum DictRequest<'a> {
    /// Duplicate the dictionary.
    Dup,
    /// Advance the iteration cursor past the given record; start from a
    /// terminator `code` to obtain the first record.
    Iterate {
        /// Name of the previous record (long form only).
        name: Option<&'a str>,
        /// Wire code of the previous record.
        code: u8,
    },
    /// Read an attribute value.
    Get {
        /// Name (required for base type codes).
        name: Option<&'a str>,
        /// Wire code.
        code: u8,
    },
    /// Write an attribute value.
    Set {
        /// Name (required for base type codes).
        name: Option<&'a str>,
        /// Wire code.
        code: u8,
        /// Value bytes.
        value: &'a [u8],
    },
    /// Remove an attribute.
    Delete {
        /// Name (required for base type codes).
        name: Option<&'a str>,
        /// Wire code.
        code: u8,
    },
    /// Resolve a shorthand code to its registered name and base type.
    Name {
        /// Shorthand code.
        code: u8,
    },
}

/// Replies to [`DictRequest`] commands.
#[derive(Debug)]
pub enum DictReply {
    /// Command completed with nothing to report.
    Done,
    /// The duplicated dictionary.
    Dict(Dict),
    /// The record under the advanced cursor; a terminator `code` ends the
    /// iteration.
    Entry {
        /// Name of the record (long form only).
        name: Option<String>,
        /// Wire code of the record.
        code: u8,
    },
    /// The value read by `Get`.
    Value(Value),
    /// Whether the attribute deleted by `Delete` existed.
    Existed(bool),
    /// The resolution of a shorthand code.
    Shorthand {
        /// Registered name.
        name: &'static str,
        /// Registered base type.
        base: AttrType,
    },
}

impl Dict {
    /// Process one protocol command.
    pub fn control(&mut self, request: DictRequest<'_>) -> Result<DictReply> {
        match request {
            DictRequest::Dup => Ok(DictReply::Dict(self.dup())),
            DictRequest::Iterate { name, code } => {
                let mut name = name.map(str::to_owned);
                let mut code = code;
                self.iterate(&mut name, &mut code);
                Ok(DictReply::Entry { name, code })
            }
            DictRequest::Get { name, code } => {
                let (name, ty) = resolve(name, code)?;
                let value = self.get(name, ty).ok_or(AttrError::NotFound)?;
                Ok(DictReply::Value(Value::from_slice(value)))
            }
            DictRequest::Set { name, code, value } => {
                let (name, ty) = resolve(name, code)?;
                if let Some(expected) = ty.fixed_size() {
                    if value.len() != expected {
                        return Err(AttrError::SizeMismatch {
                            expected,
                            got: value.len(),
                        });
                    }
                }
                self.set(name, ty, value);
                Ok(DictReply::Done)
            }
            DictRequest::Delete { name, code } => {
                let (name, ty) = resolve(name, code)?;
                Ok(DictReply::Existed(self.delete(name, ty)))
            }
            DictRequest::Name { code } => {
                let entry = shorthand::by_code(code).ok_or(AttrError::UnknownShorthand(code))?;
                Ok(DictReply::Shorthand {
                    name: entry.name,
                    base: entry.base,
                })
            }
        }
    }
}

/// Resolve a wire address to `(name, base type)`.
fn resolve(name: Option<&str>, code: u8) -> Result<(&str, AttrType)> {
    if code > SHORTHAND_BASE {
        let entry = shorthand::by_code(code).ok_or(AttrError::UnknownShorthand(code))?;
        return Ok((entry.name, entry.base));
    }
    let ty = AttrType::from_code(code).ok_or(AttrError::InvalidType(code))?;
    if ty == AttrType::End {
        return Err(AttrError::InvalidType(code));
    }
    let name = name.ok_or(AttrError::MissingName(ty))?;
    Ok((name, ty))
}
