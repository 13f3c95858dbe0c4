//! Registry of well-known shorthand attributes
//!
//! Shorthand codes and their ordering are part of the wire contract: every
//! serializer and deserializer of dictionary buffers must agree on the same
//! code-to-entry mapping. Entry `i` is addressed by code
//! `SHORTHAND_BASE + 1 + i`.

use crate::types::AttrType;

/// Highest base type code; every code strictly above it is a shorthand.
pub const SHORTHAND_BASE: u8 = 0x10;

/// A well-known attribute: a name bound to a base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shorthand {
    /// Attribute name
    pub name: &'static str,
    /// Base type of the value
    pub base: AttrType,
}

const fn sh(name: &'static str, base: AttrType) -> Shorthand {
    Shorthand { name, base }
}

/// The registry, in wire order.
pub const SHORTHANDS: [Shorthand; 31] = [
    sh("f.disc", AttrType::Void),
    sh("f.random", AttrType::Void),
    sh("f.error", AttrType::Void),
    sh("f.def", AttrType::String),
    sh("f.rawdef", AttrType::String),
    sh("f.program", AttrType::String),
    sh("f.lang", AttrType::String),
    sh("k.systime", AttrType::Unsigned),
    sh("k.systime.rap", AttrType::Unsigned),
    sh("k.pts", AttrType::Unsigned),
    sh("k.pts.orig", AttrType::Unsigned),
    sh("k.pts.sys", AttrType::Unsigned),
    sh("k.dts", AttrType::Unsigned),
    sh("k.dts.orig", AttrType::Unsigned),
    sh("k.dts.sys", AttrType::Unsigned),
    sh("k.vbvdelay", AttrType::Unsigned),
    sh("k.duration", AttrType::Unsigned),
    sh("b.start", AttrType::Void),
    sh("b.end", AttrType::Void),
    sh("p.num", AttrType::Unsigned),
    sh("p.hsize", AttrType::Unsigned),
    sh("p.vsize", AttrType::Unsigned),
    sh("p.hsizevis", AttrType::Unsigned),
    sh("p.vsizevis", AttrType::Unsigned),
    sh("p.hposition", AttrType::Unsigned),
    sh("p.vposition", AttrType::Unsigned),
    sh("p.aspect", AttrType::Rational),
    sh("p.progressive", AttrType::Void),
    sh("p.tf", AttrType::Void),
    sh("p.bf", AttrType::Void),
    sh("p.tff", AttrType::Void),
];

/// Look up a shorthand by its wire code.
///
/// Out-of-range codes are rejected uniformly, whether below the base or past
/// the end of the registry.
pub fn by_code(code: u8) -> Option<&'static Shorthand> {
    if code <= SHORTHAND_BASE {
        return None;
    }
    SHORTHANDS.get((code - SHORTHAND_BASE - 1) as usize)
}

/// Wire code of a well-known `(name, base type)` pair, if registered.
pub fn code_of(name: &str, base: AttrType) -> Option<u8> {
    SHORTHANDS
        .iter()
        .position(|entry| entry.base == base && entry.name == name)
        .map(|index| SHORTHAND_BASE + 1 + index as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes_are_pinned() {
        // The exact assignments are the wire contract.
        assert_eq!(code_of("f.disc", AttrType::Void), Some(0x11));
        assert_eq!(code_of("f.def", AttrType::String), Some(0x14));
        assert_eq!(code_of("k.systime", AttrType::Unsigned), Some(0x18));
        assert_eq!(code_of("k.pts", AttrType::Unsigned), Some(0x1a));
        assert_eq!(code_of("k.dts", AttrType::Unsigned), Some(0x1d));
        assert_eq!(code_of("b.start", AttrType::Void), Some(0x22));
        assert_eq!(code_of("p.num", AttrType::Unsigned), Some(0x24));
        assert_eq!(code_of("p.aspect", AttrType::Rational), Some(0x2b));
        assert_eq!(code_of("p.tff", AttrType::Void), Some(0x2f));
    }

    #[test]
    fn test_by_code_bounds() {
        assert!(by_code(0).is_none());
        assert!(by_code(SHORTHAND_BASE).is_none());
        assert!(by_code(SHORTHAND_BASE + 1).is_some());
        assert!(by_code(SHORTHAND_BASE + SHORTHANDS.len() as u8).is_some());
        assert!(by_code(SHORTHAND_BASE + SHORTHANDS.len() as u8 + 1).is_none());
        assert!(by_code(255).is_none());
    }

    #[test]
    fn test_code_of_requires_matching_base() {
        assert_eq!(code_of("k.pts", AttrType::Unsigned), Some(0x1a));
        assert_eq!(code_of("k.pts", AttrType::String), None);
        assert_eq!(code_of("nonexistent", AttrType::Void), None);
    }

    #[test]
    fn test_roundtrip_all_entries() {
        for (index, entry) in SHORTHANDS.iter().enumerate() {
            let code = SHORTHAND_BASE + 1 + index as u8;
            assert_eq!(code_of(entry.name, entry.base), Some(code));
            let found = by_code(code).unwrap();
            assert_eq!(found.name, entry.name);
            assert_eq!(found.base, entry.base);
        }
    }
}
