//! The inline dictionary
//!
//! Every attribute lives inside one resizable buffer, as a sequence of
//! records terminated by a single [`AttrType::End`] byte:
//!
//! ```text
//! long form            type(1) | size_be(2) | name bytes, NUL | value
//! shorthand, variable  code(1) | size_be(2) | value
//! shorthand, fixed     code(1) | value
//! ```
//!
//! `size` covers everything after itself (for long form, name + NUL + value)
//! and must fit in 16 bits. Records keep insertion order; `(name, type)` pairs
//! are unique. Well-known names are always written in shorthand form, but
//! lookups also match long-form records so buffers produced by senders without
//! the registry still resolve.

use std::ops::Range;

use crate::mgr::DictMgr;
use crate::rational::Rational;
use crate::shorthand;
use crate::shorthand::SHORTHAND_BASE;
use crate::types::AttrType;

/// A dictionary of typed attributes packed into a contiguous buffer.
pub struct Dict {
    mgr: DictMgr,
    /// Allocated space; the used prefix is `size` bytes.
    buf: Vec<u8>,
    size: usize,
}

/// Location of one record inside the buffer.
struct RecordView {
    value_start: usize,
    /// Bytes reserved for the value in the buffer.
    stored_len: usize,
}

impl Dict {
    pub(crate) fn from_raw(mgr: DictMgr, buf: Vec<u8>) -> Self {
        debug_assert_eq!(buf[0], AttrType::End as u8);
        Self { mgr, buf, size: 1 }
    }

    /// Used size of the buffer, including the terminator.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Allocated size of the buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The used prefix of the buffer, in wire format.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.size]
    }

    /// Duplicate the dictionary through a fresh allocation from the same
    /// manager.
    pub fn dup(&self) -> Dict {
        let mut copy = self.mgr.alloc(self.size);
        copy.buf[..self.size].copy_from_slice(&self.buf[..self.size]);
        copy.size = self.size;
        copy
    }

    /// Value bytes of the attribute `(name, ty)`, or `None` when absent.
    ///
    /// String values run up to and including their first NUL, so a string
    /// shrunk in place reports its logical size rather than the size of the
    /// slot it still occupies.
    pub fn get(&self, name: &str, ty: AttrType) -> Option<&[u8]> {
        let view = self.record_view(self.find(name, ty)?)?;
        let mut len = view.stored_len;
        if ty == AttrType::String {
            len = string_len(&self.buf[view.value_start..view.value_start + view.stored_len]);
        }
        Some(&self.buf[view.value_start..view.value_start + len])
    }

    /// Store `value` under `(name, ty)`, replacing any previous value.
    ///
    /// Well-known `(name, ty)` pairs are shorthand-encoded. A record with an
    /// identical storage footprint is overwritten in place; a shorter string
    /// shrinks in place with its tail zeroed; anything else is deleted and
    /// re-appended at the end of the buffer, growing it when needed.
    pub fn set(&mut self, name: &str, ty: AttrType, value: &[u8]) {
        let slot = self.set_reserve(name, ty, value.len());
        slot.copy_from_slice(value);
    }

    /// Reserve a value slot of `value_len` bytes under `(name, ty)` and
    /// return it for the caller to fill. The slot is only valid until the
    /// next mutation; its previous content is unspecified.
    pub fn set_reserve(&mut self, name: &str, ty: AttrType, value_len: usize) -> &mut [u8] {
        let slot = self.reserve_slot(name, ty, value_len);
        &mut self.buf[slot]
    }

    fn reserve_slot(&mut self, name: &str, ty: AttrType, value_len: usize) -> Range<usize> {
        assert!(
            ty != AttrType::End,
            "cannot store an attribute of the terminator type"
        );
        if let Some(fixed) = ty.fixed_size() {
            assert!(
                value_len == fixed,
                "fixed-size attribute {ty:?} takes {fixed} bytes, got {value_len}"
            );
        }
        assert!(value_len <= u16::MAX as usize, "attribute value too large");

        if let Some(offset) = self.find(name, ty) {
            if let Some(view) = self.record_view(offset) {
                if ty.fixed_size().is_some() || view.stored_len == value_len {
                    return view.value_start..view.value_start + value_len;
                }
                if ty == AttrType::String && view.stored_len > value_len {
                    // Shrink in place, zeroing the superfluous bytes.
                    let start = view.value_start;
                    self.buf[start + value_len..start + view.stored_len].fill(0);
                    return start..start + value_len;
                }
            }
            self.delete(name, ty);
        }

        let code = shorthand::code_of(name, ty);
        let header_size = match code {
            Some(_) if ty.fixed_size().is_some() => 1,
            Some(_) => 3,
            None => {
                assert!(
                    name.len() + 1 + value_len <= u16::MAX as usize,
                    "attribute record too large"
                );
                3 + name.len() + 1
            }
        };

        let end = self.size - 1;
        let total = end + header_size + value_len + 1;
        if total > self.buf.len() {
            self.buf.resize(total + self.mgr.extra_size(), 0);
        }
        debug_assert_eq!(self.buf[end], AttrType::End as u8);

        let mut at = end;
        match code {
            Some(code) if ty.fixed_size().is_some() => {
                self.buf[at] = code;
                at += 1;
            }
            Some(code) => {
                self.buf[at] = code;
                self.buf[at + 1] = (value_len >> 8) as u8;
                self.buf[at + 2] = (value_len & 0xff) as u8;
                at += 3;
            }
            None => {
                let record_size = name.len() + 1 + value_len;
                self.buf[at] = ty as u8;
                self.buf[at + 1] = (record_size >> 8) as u8;
                self.buf[at + 2] = (record_size & 0xff) as u8;
                at += 3;
                self.buf[at..at + name.len()].copy_from_slice(name.as_bytes());
                self.buf[at + name.len()] = 0;
                at += name.len() + 1;
            }
        }
        self.buf[at + value_len] = AttrType::End as u8;
        self.size = total;
        at..at + value_len
    }

    /// Remove the attribute `(name, ty)`. Returns whether it existed.
    pub fn delete(&mut self, name: &str, ty: AttrType) -> bool {
        debug_assert!(ty != AttrType::End);
        let Some(offset) = self.find(name, ty) else {
            return false;
        };
        let Some(end) = self.next_record(offset) else {
            return false;
        };
        self.buf.copy_within(end..self.size, offset);
        self.size -= end - offset;
        true
    }

    /// Iterate over the attributes in insertion order.
    pub fn iter(&self) -> Entries<'_> {
        Entries {
            dict: self,
            offset: Some(0),
        }
    }

    /// Cursor-protocol iteration. Start with `*code == AttrType::End as u8`;
    /// each call rewrites `name` and `code` with the next record (shorthands
    /// yield no name) and terminates by setting `code` back to the terminator.
    pub fn iterate(&self, name: &mut Option<String>, code: &mut u8) {
        let offset = if *code == AttrType::End as u8 {
            Some(0)
        } else {
            self.find_by_code(name.as_deref(), *code)
                .and_then(|offset| self.next_record(offset))
        };
        let record = offset.filter(|&offset| {
            self.buf
                .get(offset)
                .is_some_and(|&c| c != AttrType::End as u8)
        });
        let Some(offset) = record else {
            *code = AttrType::End as u8;
            *name = None;
            return;
        };
        *code = self.buf[offset];
        *name = if *code > SHORTHAND_BASE {
            None
        } else {
            self.record_name(offset).map(str::to_owned)
        };
    }

    /// Resolve a shorthand code to its registered `(name, base type)` pair.
    pub fn shorthand_name(&self, code: u8) -> Option<(&'static str, AttrType)> {
        shorthand::by_code(code).map(|entry| (entry.name, entry.base))
    }

    // Record walking

    /// Offset of the record following the one at `offset`, or `None` at the
    /// terminator or on a corrupt buffer.
    fn next_record(&self, offset: usize) -> Option<usize> {
        let code = *self.buf.get(offset)?;
        if code == AttrType::End as u8 {
            return None;
        }
        if code > SHORTHAND_BASE {
            let entry = shorthand::by_code(code)?;
            if let Some(fixed) = entry.base.fixed_size() {
                return Some(offset + 1 + fixed);
            }
        }
        Some(offset + 3 + self.record_size(offset)?)
    }

    /// 16-bit size field of a record carrying one.
    fn record_size(&self, offset: usize) -> Option<usize> {
        let hi = *self.buf.get(offset + 1)? as usize;
        let lo = *self.buf.get(offset + 2)? as usize;
        Some(hi << 8 | lo)
    }

    /// Name of a long-form record.
    fn record_name(&self, offset: usize) -> Option<&str> {
        let size = self.record_size(offset)?;
        let bytes = self.buf.get(offset + 3..offset + 3 + size)?;
        let nul = bytes.iter().position(|&b| b == 0)?;
        std::str::from_utf8(&bytes[..nul]).ok()
    }

    /// Find the record storing `(name, ty)` in either representation.
    fn find(&self, name: &str, ty: AttrType) -> Option<usize> {
        let mut offset = 0;
        loop {
            let code = *self.buf.get(offset)?;
            if code == AttrType::End as u8 {
                return None;
            }
            if code > SHORTHAND_BASE {
                if let Some(entry) = shorthand::by_code(code) {
                    if entry.base == ty && entry.name == name {
                        return Some(offset);
                    }
                }
            } else if code == ty as u8 && self.record_name(offset) == Some(name) {
                return Some(offset);
            }
            offset = self.next_record(offset)?;
        }
    }

    /// Find a record by its exact wire representation: a shorthand code, or a
    /// base type code plus name.
    fn find_by_code(&self, name: Option<&str>, code: u8) -> Option<usize> {
        let mut offset = 0;
        loop {
            let record = *self.buf.get(offset)?;
            if record == AttrType::End as u8 {
                return None;
            }
            if record == code && (code > SHORTHAND_BASE || self.record_name(offset) == name) {
                return Some(offset);
            }
            offset = self.next_record(offset)?;
        }
    }

    fn record_view(&self, offset: usize) -> Option<RecordView> {
        let code = *self.buf.get(offset)?;
        if code > SHORTHAND_BASE {
            let entry = shorthand::by_code(code)?;
            return match entry.base.fixed_size() {
                Some(fixed) => Some(RecordView {
                    value_start: offset + 1,
                    stored_len: fixed,
                }),
                None => Some(RecordView {
                    value_start: offset + 3,
                    stored_len: self.record_size(offset)?,
                }),
            };
        }
        let size = self.record_size(offset)?;
        let name_len = self
            .buf
            .get(offset + 3..offset + 3 + size)?
            .iter()
            .position(|&b| b == 0)?;
        Some(RecordView {
            value_start: offset + 4 + name_len,
            stored_len: size - name_len - 1,
        })
    }

    // Typed accessors

    /// Set a presence flag.
    pub fn set_void(&mut self, name: &str) {
        self.set(name, AttrType::Void, &[]);
    }

    /// Whether a presence flag is set.
    pub fn get_void(&self, name: &str) -> bool {
        self.get(name, AttrType::Void).is_some()
    }

    /// Set a boolean attribute.
    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.set(name, AttrType::Bool, &[value as u8]);
    }

    /// Read a boolean attribute.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name, AttrType::Bool).map(|v| v[0] != 0)
    }

    /// Set a 1-byte unsigned attribute.
    pub fn set_small_unsigned(&mut self, name: &str, value: u8) {
        self.set(name, AttrType::SmallUnsigned, &[value]);
    }

    /// Read a 1-byte unsigned attribute.
    pub fn get_small_unsigned(&self, name: &str) -> Option<u8> {
        self.get(name, AttrType::SmallUnsigned).map(|v| v[0])
    }

    /// Set a 1-byte signed attribute.
    pub fn set_small_int(&mut self, name: &str, value: i8) {
        self.set(name, AttrType::SmallInt, &[value as u8]);
    }

    /// Read a 1-byte signed attribute.
    pub fn get_small_int(&self, name: &str) -> Option<i8> {
        self.get(name, AttrType::SmallInt).map(|v| v[0] as i8)
    }

    /// Set an 8-byte unsigned attribute.
    pub fn set_unsigned(&mut self, name: &str, value: u64) {
        self.set(name, AttrType::Unsigned, &value.to_be_bytes());
    }

    /// Read an 8-byte unsigned attribute.
    pub fn get_unsigned(&self, name: &str) -> Option<u64> {
        let value = self.get(name, AttrType::Unsigned)?;
        Some(u64::from_be_bytes(value.try_into().ok()?))
    }

    /// Set an 8-byte signed attribute.
    pub fn set_int(&mut self, name: &str, value: i64) {
        self.set(name, AttrType::Int, &value.to_be_bytes());
    }

    /// Read an 8-byte signed attribute.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        let value = self.get(name, AttrType::Int)?;
        Some(i64::from_be_bytes(value.try_into().ok()?))
    }

    /// Set a float attribute.
    pub fn set_float(&mut self, name: &str, value: f64) {
        self.set(name, AttrType::Float, &value.to_bits().to_be_bytes());
    }

    /// Read a float attribute.
    pub fn get_float(&self, name: &str) -> Option<f64> {
        let value = self.get(name, AttrType::Float)?;
        Some(f64::from_bits(u64::from_be_bytes(value.try_into().ok()?)))
    }

    /// Set a rational attribute.
    pub fn set_rational(&mut self, name: &str, value: Rational) {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&value.num.to_be_bytes());
        bytes[8..].copy_from_slice(&value.den.to_be_bytes());
        self.set(name, AttrType::Rational, &bytes);
    }

    /// Read a rational attribute.
    pub fn get_rational(&self, name: &str) -> Option<Rational> {
        let value = self.get(name, AttrType::Rational)?;
        if value.len() != 16 {
            return None;
        }
        Some(Rational {
            num: i64::from_be_bytes(value[..8].try_into().ok()?),
            den: u64::from_be_bytes(value[8..].try_into().ok()?),
        })
    }

    /// Set a string attribute, stored with its trailing NUL.
    pub fn set_string(&mut self, name: &str, value: &str) {
        let slot = self.set_reserve(name, AttrType::String, value.len() + 1);
        slot[..value.len()].copy_from_slice(value.as_bytes());
        slot[value.len()] = 0;
    }

    /// Read a string attribute.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        let value = self.get(name, AttrType::String)?;
        let nul = value.iter().position(|&b| b == 0).unwrap_or(value.len());
        std::str::from_utf8(&value[..nul]).ok()
    }

    /// Set an opaque byte attribute.
    pub fn set_opaque(&mut self, name: &str, value: &[u8]) {
        self.set(name, AttrType::Opaque, value);
    }

    /// Read an opaque byte attribute.
    pub fn get_opaque(&self, name: &str) -> Option<&[u8]> {
        self.get(name, AttrType::Opaque)
    }
}

impl Drop for Dict {
    fn drop(&mut self) {
        self.mgr.recycle(std::mem::take(&mut self.buf));
    }
}

impl std::fmt::Debug for Dict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dict")
            .field("size", &self.size)
            .field("capacity", &self.buf.len())
            .finish()
    }
}

/// One attribute yielded by [`Dict::iter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    /// Wire type code: a base type for long-form records, otherwise a
    /// shorthand code.
    pub code: u8,
    /// Name of a long-form record; `None` for shorthands.
    pub name: Option<&'a str>,
    /// Value bytes, with the length semantics of [`Dict::get`].
    pub value: &'a [u8],
}

/// Insertion-order iterator over dictionary records.
pub struct Entries<'a> {
    dict: &'a Dict,
    offset: Option<usize>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset?;
        let code = *self.dict.buf.get(offset)?;
        if code == AttrType::End as u8 {
            self.offset = None;
            return None;
        }
        let view = self.dict.record_view(offset)?;
        let base = if code > SHORTHAND_BASE {
            shorthand::by_code(code)?.base
        } else {
            AttrType::from_code(code)?
        };
        let mut len = view.stored_len;
        if base == AttrType::String {
            len = string_len(&self.dict.buf[view.value_start..view.value_start + view.stored_len]);
        }
        self.offset = self.dict.next_record(offset);
        Some(Entry {
            code,
            name: if code > SHORTHAND_BASE {
                None
            } else {
                self.dict.record_name(offset)
            },
            value: &self.dict.buf[view.value_start..view.value_start + len],
        })
    }
}

/// Logical length of a stored string value: up to and including the first
/// NUL, or the whole slot when none is present.
fn string_len(value: &[u8]) -> usize {
    value
        .iter()
        .position(|&b| b == 0)
        .map_or(value.len(), |nul| nul + 1)
}
