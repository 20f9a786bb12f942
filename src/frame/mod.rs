//! Decoded frame and audio blob types
//!
//! Frame data is reference counted so that stitching two views into a
//! dual-view frame moves plane handles instead of copying pixels.

use std::sync::Arc;

use crate::format::{AudioFormatTemplate, VideoFormatTemplate};

/// One plane of decoded pixel data
#[derive(Debug, Clone, Default)]
pub struct Plane {
    pub data: Arc<[u8]>,
    /// Bytes per row, including any decoder padding
    pub stride: usize,
}

impl Plane {
    /// Create a plane from owned bytes
    pub fn new(data: Vec<u8>, stride: usize) -> Self {
        Self {
            data: data.into(),
            stride,
        }
    }

    /// Whether the plane carries any data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A decoded video frame, mono or dual-view
///
/// `planes[view][plane]` holds up to two views of up to three planes each.
/// Mono frames fill view 0 only. Unused slots stay empty.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub format: VideoFormatTemplate,
    pub planes: [[Plane; 3]; 2],
    /// Presentation timestamp in microseconds
    pub presentation_time: i64,
}

impl VideoFrame {
    /// Create an empty frame advertising the given format
    pub fn with_format(format: VideoFormatTemplate) -> Self {
        Self {
            format,
            planes: Default::default(),
            presentation_time: 0,
        }
    }

    /// Plane handles for one view
    pub fn view(&self, view: usize) -> &[Plane; 3] {
        &self.planes[view]
    }
}

/// A decoded chunk of audio samples
#[derive(Debug, Clone)]
pub struct AudioBlob {
    pub format: AudioFormatTemplate,
    pub data: Arc<[u8]>,
    /// Presentation timestamp in microseconds
    pub presentation_time: i64,
}

impl AudioBlob {
    /// Create a blob from owned bytes
    pub fn new(format: AudioFormatTemplate, data: Vec<u8>, presentation_time: i64) -> Self {
        Self {
            format,
            data: data.into(),
            presentation_time,
        }
    }

    /// Size of the sample data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob carries any data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
