//! Frame records
//!
//! A [`Uref`] pairs an attribute dictionary with an optional opaque byte
//! block. Attributes describe the block (timestamps, picture geometry,
//! flow membership); the block carries the payload itself. Blocks are
//! shared-owned snapshots: duplicating a record shares the bytes and copies
//! the attributes.
//!
//! The accessor families mirror the attribute namespaces: `f.*` flow
//! attributes, `k.*` clock attributes, `p.*` picture attributes.

use bytes::Bytes;
use mediaflow_attr::{Dict, DictMgr};

macro_rules! void_attr {
    ($set:ident, $get:ident, $delete:ident, $name:literal) => {
        #[doc = concat!("Set the `", $name, "` flag.")]
        pub fn $set(&mut self) {
            self.attrs.set_void($name);
        }

        #[doc = concat!("Whether the `", $name, "` flag is set.")]
        pub fn $get(&self) -> bool {
            self.attrs.get_void($name)
        }

        #[doc = concat!("Clear the `", $name, "` flag.")]
        pub fn $delete(&mut self) -> bool {
            self.attrs
                .delete($name, mediaflow_attr::AttrType::Void)
        }
    };
}

macro_rules! unsigned_attr {
    ($set:ident, $get:ident, $delete:ident, $name:literal) => {
        #[doc = concat!("Set the `", $name, "` attribute.")]
        pub fn $set(&mut self, value: u64) {
            self.attrs.set_unsigned($name, value);
        }

        #[doc = concat!("Read the `", $name, "` attribute.")]
        pub fn $get(&self) -> Option<u64> {
            self.attrs.get_unsigned($name)
        }

        #[doc = concat!("Remove the `", $name, "` attribute.")]
        pub fn $delete(&mut self) -> bool {
            self.attrs
                .delete($name, mediaflow_attr::AttrType::Unsigned)
        }
    };
}

macro_rules! string_attr {
    ($set:ident, $get:ident, $delete:ident, $name:literal) => {
        #[doc = concat!("Set the `", $name, "` attribute.")]
        pub fn $set(&mut self, value: &str) {
            self.attrs.set_string($name, value);
        }

        #[doc = concat!("Read the `", $name, "` attribute.")]
        pub fn $get(&self) -> Option<&str> {
            self.attrs.get_string($name)
        }

        #[doc = concat!("Remove the `", $name, "` attribute.")]
        pub fn $delete(&mut self) -> bool {
            self.attrs
                .delete($name, mediaflow_attr::AttrType::String)
        }
    };
}

macro_rules! rational_attr {
    ($set:ident, $get:ident, $delete:ident, $name:literal) => {
        #[doc = concat!("Set the `", $name, "` attribute.")]
        pub fn $set(&mut self, value: mediaflow_attr::Rational) {
            self.attrs.set_rational($name, value);
        }

        #[doc = concat!("Read the `", $name, "` attribute.")]
        pub fn $get(&self) -> Option<mediaflow_attr::Rational> {
            self.attrs.get_rational($name)
        }

        #[doc = concat!("Remove the `", $name, "` attribute.")]
        pub fn $delete(&mut self) -> bool {
            self.attrs
                .delete($name, mediaflow_attr::AttrType::Rational)
        }
    };
}

pub(crate) use rational_attr;
pub(crate) use string_attr;
pub(crate) use unsigned_attr;
pub(crate) use void_attr;

mod clock;
mod flow;
mod pic;

pub use clock::CLOCK_FREQ;

/// A frame record: attributes plus an optional payload block.
#[derive(Debug)]
pub struct Uref {
    attrs: Dict,
    block: Option<Bytes>,
}

impl Uref {
    /// Allocate an empty record through the dictionary manager.
    pub fn new(mgr: &DictMgr) -> Self {
        Self {
            attrs: mgr.alloc(0),
            block: None,
        }
    }

    /// Assemble a record from its parts.
    pub fn from_parts(attrs: Dict, block: Option<Bytes>) -> Self {
        Self { attrs, block }
    }

    /// The attribute dictionary.
    pub fn attrs(&self) -> &Dict {
        &self.attrs
    }

    /// The attribute dictionary, mutably.
    pub fn attrs_mut(&mut self) -> &mut Dict {
        &mut self.attrs
    }

    /// The payload block, if any.
    pub fn block(&self) -> Option<&Bytes> {
        self.block.as_ref()
    }

    /// Replace the payload block.
    pub fn set_block(&mut self, block: Bytes) {
        self.block = Some(block);
    }

    /// Detach the payload block.
    pub fn take_block(&mut self) -> Option<Bytes> {
        self.block.take()
    }

    /// Duplicate the record: attributes are copied, the block is shared.
    pub fn dup(&self) -> Uref {
        Uref {
            attrs: self.attrs.dup(),
            block: self.block.clone(),
        }
    }
}
