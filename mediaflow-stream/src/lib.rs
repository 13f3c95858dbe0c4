//! mediaflow-stream - Frame records and stream plumbing
//!
//! This crate carries the pieces shared by every framer and pipe:
//!
//! - [`Uref`], a frame record pairing an attribute dictionary with an opaque
//!   byte block, plus the flow/clock/picture accessor families
//! - [`OctetStream`], the byte-stream accumulator framers parse from
//! - The [`Event`]/[`Probe`] interfaces for asynchronous notifications and
//!   the [`FrameSink`] output interface

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod event;
pub mod stream;
pub mod uref;

// Re-export commonly used types
pub use event::{Event, FrameSink, Probe};
pub use stream::OctetStream;
pub use uref::{Uref, CLOCK_FREQ};
