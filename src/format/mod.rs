//! Stream format descriptions
//!
//! Format templates describe what a decoded stream delivers without carrying
//! any frame data themselves. A template is copied out of a source at probe
//! time and, for video, re-derived whenever the stereo layout or the active
//! stream changes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the two views of a stereoscopic frame are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StereoLayout {
    /// Single view only
    Mono,
    /// Two independent streams, one per view
    Separate,
    /// Views packed side by side at full width
    LeftRight,
    /// Views packed side by side at half width
    LeftRightHalf,
    /// Views stacked at full height
    TopBottom,
    /// Views stacked at half height
    TopBottomHalf,
    /// Views interleaved on alternating rows
    EvenOddRows,
}

impl StereoLayout {
    /// Human-readable label, with the swap marker appended when set
    pub fn label(self, swap: bool) -> String {
        if swap {
            format!("{}-swap", self)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for StereoLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StereoLayout::Mono => "mono",
            StereoLayout::Separate => "separate",
            StereoLayout::LeftRight => "left-right",
            StereoLayout::LeftRightHalf => "left-right-half",
            StereoLayout::TopBottom => "top-bottom",
            StereoLayout::TopBottomHalf => "top-bottom-half",
            StereoLayout::EvenOddRows => "even-odd-rows",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for StereoLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mono" => Ok(StereoLayout::Mono),
            "separate" => Ok(StereoLayout::Separate),
            "left-right" => Ok(StereoLayout::LeftRight),
            "left-right-half" => Ok(StereoLayout::LeftRightHalf),
            "top-bottom" => Ok(StereoLayout::TopBottom),
            "top-bottom-half" => Ok(StereoLayout::TopBottomHalf),
            "even-odd-rows" => Ok(StereoLayout::EvenOddRows),
            _ => Err(format!("Unknown stereo layout: {}", s)),
        }
    }
}

/// Pixel plane arrangement of a decoded video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// Packed 8-bit BGRA, single plane
    Bgra32,
    /// Planar YUV without chroma subsampling
    Yuv444p,
    /// Planar YUV with horizontal chroma subsampling
    Yuv422p,
    /// Planar YUV with horizontal and vertical chroma subsampling
    Yuv420p,
}

impl PixelLayout {
    /// Number of planes a frame of this layout carries
    pub fn plane_count(self) -> usize {
        match self {
            PixelLayout::Bgra32 => 1,
            _ => 3,
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelLayout::Bgra32 => "bgra32",
            PixelLayout::Yuv444p => "yuv444p",
            PixelLayout::Yuv422p => "yuv422p",
            PixelLayout::Yuv420p => "yuv420p",
        };
        write!(f, "{}", name)
    }
}

/// Color space of the decoded pixel values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Srgb,
    Yuv601,
    Yuv709,
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorSpace::Srgb => "srgb",
            ColorSpace::Yuv601 => "yuv601",
            ColorSpace::Yuv709 => "yuv709",
        };
        write!(f, "{}", name)
    }
}

/// Value range of the decoded samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueRange {
    /// Full 0-255 range
    Full,
    /// Broadcast 16-235 (16-240 chroma) range
    Mpeg,
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueRange::Full => "full",
            ValueRange::Mpeg => "mpeg",
        };
        write!(f, "{}", name)
    }
}

/// Position of the chroma samples relative to luma
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChromaLocation {
    Center,
    Left,
    TopLeft,
}

impl fmt::Display for ChromaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChromaLocation::Center => "center",
            ChromaLocation::Left => "left",
            ChromaLocation::TopLeft => "topleft",
        };
        write!(f, "{}", name)
    }
}

/// Sample format of decoded audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    S16,
    F32,
    D64,
}

impl SampleFormat {
    /// Bytes per sample for one channel
    pub fn sample_size(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::F32 => 4,
            SampleFormat::D64 => 8,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::F32 => "f32",
            SampleFormat::D64 => "d64",
        };
        write!(f, "{}", name)
    }
}

/// Format template for a video stream
///
/// `width`/`height` are the per-view dimensions derived from the raw frame
/// according to the stereo layout; `raw_width`/`raw_height` are the pre-crop
/// dimensions of the combined frame as stored in the container and are what
/// layout parity checks run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFormatTemplate {
    pub width: u32,
    pub height: u32,
    pub raw_width: u32,
    pub raw_height: u32,
    pub aspect_ratio: f64,
    pub stereo_layout: StereoLayout,
    pub stereo_layout_swap: bool,
    pub pixel_layout: PixelLayout,
    pub color_space: ColorSpace,
    pub value_range: ValueRange,
    pub chroma_location: ChromaLocation,
}

impl Default for VideoFormatTemplate {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            raw_width: 0,
            raw_height: 0,
            aspect_ratio: 0.0,
            stereo_layout: StereoLayout::Mono,
            stereo_layout_swap: false,
            pixel_layout: PixelLayout::Yuv420p,
            color_space: ColorSpace::Yuv601,
            value_range: ValueRange::Mpeg,
            chroma_location: ChromaLocation::Center,
        }
    }
}

impl VideoFormatTemplate {
    /// Whether this template describes an actual stream
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Recompute the per-view dimensions from the raw frame dimensions
    /// according to the current stereo layout.
    ///
    /// Split layouts halve one axis; row-interleaved and separate layouts
    /// keep the full raw dimensions per view.
    pub fn set_view_dimensions(&mut self) {
        self.width = self.raw_width;
        self.height = self.raw_height;
        match self.stereo_layout {
            StereoLayout::LeftRight | StereoLayout::LeftRightHalf => {
                self.width = self.raw_width / 2;
            }
            StereoLayout::TopBottom | StereoLayout::TopBottomHalf => {
                self.height = self.raw_height / 2;
            }
            StereoLayout::Mono | StereoLayout::Separate | StereoLayout::EvenOddRows => {}
        }
    }

    /// Short description used in flattened stream names
    pub fn format_info(&self) -> String {
        format!(
            "{}x{}, {:.3}:1",
            self.raw_width, self.raw_height, self.aspect_ratio
        )
    }

    /// Full description used in the open-time summary
    pub fn format_name(&self) -> String {
        format!(
            "{}x{}, {:.3}:1, {}, {}/{}/{}",
            self.raw_width,
            self.raw_height,
            self.aspect_ratio,
            self.pixel_layout,
            self.color_space,
            self.value_range,
            self.chroma_location
        )
    }

    /// Whether another stream can serve as the second view of a separate
    /// stereo pair with this one.
    ///
    /// Everything that affects the decoded pixel interpretation must match.
    /// Raw (pre-crop) dimensions may differ between the two streams.
    pub fn is_compatible_view(&self, other: &VideoFormatTemplate) -> bool {
        self.width == other.width
            && self.height == other.height
            && (self.aspect_ratio - other.aspect_ratio).abs() <= f64::EPSILON
            && self.pixel_layout == other.pixel_layout
            && self.color_space == other.color_space
            && self.value_range == other.value_range
            && self.chroma_location == other.chroma_location
    }
}

/// Format template for an audio stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormatTemplate {
    pub channels: u32,
    pub sample_rate: u32,
    pub sample_format: SampleFormat,
}

impl Default for AudioFormatTemplate {
    fn default() -> Self {
        Self {
            channels: 0,
            sample_rate: 0,
            sample_format: SampleFormat::S16,
        }
    }
}

impl AudioFormatTemplate {
    /// Whether this template describes an actual stream
    pub fn is_valid(&self) -> bool {
        self.channels > 0 && self.sample_rate > 0
    }

    /// Short description used in flattened stream names
    pub fn format_info(&self) -> String {
        format!("{} ch, {} Hz", self.channels, self.sample_rate)
    }

    /// Full description used in the open-time summary
    pub fn format_name(&self) -> String {
        format!(
            "{} ch, {} Hz, {}",
            self.channels, self.sample_rate, self.sample_format
        )
    }
}
