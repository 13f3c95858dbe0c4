//! Byte-stream accumulator
//!
//! Framers append input records and parse the logical concatenation of their
//! payload blocks. The accumulator keeps the records themselves so that when
//! a consume retires the head, the attributes of the record promoted in its
//! place can be handed back to the owner (timestamps ride on the record whose
//! bytes start the frame).
//!
//! Bytes are delivered in append order and consumption is monotonic. Borrowed
//! peeks must end before the next mutation, which the borrow checker enforces.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use mediaflow_attr::Dict;

use crate::uref::Uref;

/// Accumulates input records into one logical byte stream.
#[derive(Debug, Default)]
pub struct OctetStream {
    /// The front record is the head; its first `head_consumed` payload bytes
    /// are gone.
    chunks: VecDeque<Uref>,
    head_consumed: usize,
}

impl OctetStream {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a record carrying payload. Returns whether it became the head
    /// of the stream, in which case the owner should adopt its timestamps.
    pub fn append(&mut self, uref: Uref) -> bool {
        debug_assert!(uref.block().is_some(), "appended record carries no payload");
        let became_head = self.chunks.is_empty();
        self.chunks.push_back(uref);
        became_head
    }

    /// Remaining bytes in the logical stream.
    pub fn len(&self) -> usize {
        self.slices().map(<[u8]>::len).sum()
    }

    /// Whether no bytes remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The head record, if any.
    pub fn head(&self) -> Option<&Uref> {
        self.chunks.front()
    }

    /// Attributes of the head record, for in-progress annotations.
    pub fn head_attrs_mut(&mut self) -> Option<&mut Dict> {
        self.chunks.front_mut().map(Uref::attrs_mut)
    }

    /// Search for `pattern` at or after `*offset`. On a match, `*offset` is
    /// set to its position. Matches may span record boundaries.
    pub fn find(&self, pattern: &[u8], offset: &mut usize) -> bool {
        if pattern.is_empty() {
            return true;
        }
        let total = self.len();
        let mut at = *offset;
        while at + pattern.len() <= total {
            if self.matches_at(at, pattern) {
                *offset = at;
                return true;
            }
            at += 1;
        }
        false
    }

    /// Copy `dst.len()` bytes starting at `offset` into `dst`. Returns false
    /// when the range runs past the end of the stream.
    pub fn extract(&self, offset: usize, dst: &mut [u8]) -> bool {
        let mut written = 0;
        let mut skip = offset;
        for slice in self.slices() {
            if skip >= slice.len() {
                skip -= slice.len();
                continue;
            }
            let slice = &slice[skip..];
            skip = 0;
            let take = (dst.len() - written).min(slice.len());
            dst[written..written + take].copy_from_slice(&slice[..take]);
            written += take;
            if written == dst.len() {
                return true;
            }
        }
        written == dst.len()
    }

    /// Borrow `len` bytes starting at `offset`: a direct view when the range
    /// is contiguous, otherwise a copy into `scratch` (which must hold at
    /// least `len` bytes).
    pub fn peek<'a>(&'a self, offset: usize, len: usize, scratch: &'a mut [u8]) -> Option<&'a [u8]> {
        assert!(scratch.len() >= len, "peek scratch too small");
        let mut skip = offset;
        for slice in self.slices() {
            if skip < slice.len() {
                if skip + len <= slice.len() {
                    return Some(&slice[skip..skip + len]);
                }
                break;
            }
            skip -= slice.len();
        }
        let scratch = &mut scratch[..len];
        self.extract(offset, scratch).then_some(&*scratch)
    }

    /// Copy of `len` bytes starting at `offset`, zero-copy when the range is
    /// contiguous inside the head record.
    pub fn copy_range(&self, offset: usize, len: usize) -> Option<Bytes> {
        if let Some(block) = self.chunks.front().and_then(Uref::block) {
            let start = self.head_consumed + offset;
            if start + len <= block.len() {
                return Some(block.slice(start..start + len));
            }
        }
        let mut out = BytesMut::with_capacity(len);
        let mut skip = offset;
        for slice in self.slices() {
            if skip >= slice.len() {
                skip -= slice.len();
                continue;
            }
            let slice = &slice[skip..];
            skip = 0;
            let take = (len - out.len()).min(slice.len());
            out.extend_from_slice(&slice[..take]);
            if out.len() == len {
                break;
            }
        }
        (out.len() == len).then(|| out.freeze())
    }

    /// Drop the first `n` bytes. Returns the records promoted to head while
    /// consuming, in order, as attribute-only copies; the owner reads their
    /// timestamps from them.
    pub fn consume(&mut self, mut n: usize) -> Vec<Uref> {
        let mut promoted = Vec::new();
        while n > 0 {
            let Some(head) = self.chunks.front() else {
                break;
            };
            let head_len = head.block().map_or(0, Bytes::len);
            let available = head_len - self.head_consumed;
            if n < available {
                self.head_consumed += n;
                break;
            }
            n -= available;
            self.chunks.pop_front();
            self.head_consumed = 0;
            if let Some(new_head) = self.chunks.front() {
                promoted.push(Uref::from_parts(new_head.attrs().dup(), None));
            }
        }
        promoted
    }

    /// Discard everything.
    pub fn clean(&mut self) {
        self.chunks.clear();
        self.head_consumed = 0;
    }

    fn slices(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.chunks.iter().enumerate().map(move |(index, uref)| {
            let block = uref.block().map_or(&[][..], |block| &block[..]);
            if index == 0 {
                &block[self.head_consumed..]
            } else {
                block
            }
        })
    }

    fn matches_at(&self, offset: usize, pattern: &[u8]) -> bool {
        let mut remaining = pattern;
        let mut skip = offset;
        for slice in self.slices() {
            if skip >= slice.len() {
                skip -= slice.len();
                continue;
            }
            let slice = &slice[skip..];
            skip = 0;
            let take = remaining.len().min(slice.len());
            if slice[..take] != remaining[..take] {
                return false;
            }
            remaining = &remaining[take..];
            if remaining.is_empty() {
                return true;
            }
        }
        false
    }
}
