//! DualStream Media Synchronization Library
//!
//! Presents one or more independently demuxed/decoded media sources as a
//! single logical input for stereoscopic playback: a flattened, globally
//! addressable set of video and audio streams, detection of separate
//! stereo pairs, split-phase paired frame reads that stitch two decoded
//! views into one dual-view frame, and seeks kept synchronized across all
//! sources.
//!
//! The demuxing/decoding engine itself is not part of this crate; it is
//! consumed through the [`ports::MediaSource`] and [`ports::SourceOpener`]
//! traits.

pub mod error;
pub mod format;
pub mod frame;
pub mod input;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use error::{DualStreamError, DualStreamResult};
pub use format::{
    AudioFormatTemplate, ChromaLocation, ColorSpace, PixelLayout, SampleFormat, StereoLayout,
    ValueRange, VideoFormatTemplate,
};
pub use frame::{AudioBlob, Plane, VideoFrame};
pub use input::{ActiveVideo, InputSummary, MediaInput};
pub use ports::{MediaSource, SourceOpener};
