//! mediaflow-mp2v - MPEG-2 video elementary stream framer
//!
//! This crate rebuilds complete video frames from arbitrary chunks of an
//! ISO 13818-2 elementary stream. The framer:
//!
//! - delimits frames on start-code boundaries
//! - extracts and caches sequence headers, sequence extensions and display
//!   extensions, deriving a new output flow definition when they change
//! - parses picture headers and picture coding extensions into picture
//!   numbers, field flags and durations
//! - spreads incoming timestamps onto the right pictures and tracks
//!   discontinuities and random-access points

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod framer;
pub mod syntax;

// Re-export commonly used types
pub use error::{Mp2vError, Result};
pub use framer::{Command, Mp2vFramer, Reply, UrefMp2vExt, EXPECTED_FLOW_DEF};
