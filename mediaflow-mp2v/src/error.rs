//! Error types for the MPEG-2 framer

use thiserror::Error;

/// Structural errors inside a delimited frame. Any of them drops the frame
/// and loses synchronization; the next sequence start code re-acquires it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Mp2vError {
    /// A header runs past the end of the frame.
    #[error("truncated {0} header")]
    Truncated(&'static str),
    /// The frame-rate code is reserved or invalid.
    #[error("invalid frame rate code {0}")]
    InvalidFrameRate(u8),
    /// The aspect-ratio code is reserved or invalid.
    #[error("invalid aspect ratio code {0}")]
    InvalidAspect(u8),
    /// The level part of the profile/level indication is not a known level.
    #[error("invalid level {0}")]
    InvalidLevel(u8),
    /// The chroma-format code is reserved or invalid.
    #[error("invalid chroma format {0}")]
    InvalidChroma(u8),
    /// An extension start code carries the wrong identifier for its position.
    #[error("wrong header extension {0}")]
    WrongExtension(u8),
    /// A frame was emitted without a picture header.
    #[error("frame without picture header")]
    MissingPicture,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Mp2vError>;
