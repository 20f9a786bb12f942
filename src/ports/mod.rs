// Ports - Interface definitions (contracts)

use async_trait::async_trait;

use crate::error::DualStreamResult;
use crate::format::{AudioFormatTemplate, VideoFormatTemplate};
use crate::frame::{AudioBlob, VideoFrame};

/// Port for one opened media container
///
/// A source owns its demuxer/decoder state and exposes its streams by local
/// index. Reads are split-phase: `start_*` kicks off decoding of the next
/// frame or chunk without blocking, the matching async `finish_*` resolves
/// when the data is ready. `None` from a finish means the stream ended, not
/// an error. Implementations decide how decoding actually runs (worker
/// threads, async I/O); callers only rely on start-before-finish per stream.
#[async_trait]
pub trait MediaSource: Send {
    /// URL this source was opened from
    fn url(&self) -> &str;

    /// Number of video streams in this source
    fn video_stream_count(&self) -> usize;

    /// Number of audio streams in this source
    fn audio_stream_count(&self) -> usize;

    /// Format template of a video stream
    fn video_format(&self, stream: usize) -> &VideoFormatTemplate;

    /// Format template of an audio stream
    fn audio_format(&self, stream: usize) -> &AudioFormatTemplate;

    /// Frame rate of a video stream as a numerator/denominator pair
    fn video_frame_rate(&self, stream: usize) -> (u32, u32);

    /// Duration of a video stream in microseconds
    fn video_duration(&self, stream: usize) -> i64;

    /// Duration of an audio stream in microseconds
    fn audio_duration(&self, stream: usize) -> i64;

    /// Number of metadata tags
    fn tag_count(&self) -> usize;

    /// Name of a metadata tag
    fn tag_name(&self, index: usize) -> &str;

    /// Value of a metadata tag
    fn tag_value(&self, index: usize) -> &str;

    /// Mark a video stream as active; inactive streams may be skipped
    /// during demuxing
    fn set_video_stream_active(&mut self, stream: usize, active: bool);

    /// Mark an audio stream as active
    fn set_audio_stream_active(&mut self, stream: usize, active: bool);

    /// Kick off decoding of the next frame of a video stream
    fn start_video_read(&mut self, stream: usize);

    /// Wait for the frame requested by the matching `start_video_read`;
    /// `None` signals end of stream
    async fn finish_video_read(&mut self, stream: usize) -> Option<VideoFrame>;

    /// Kick off decoding of up to `size` bytes of an audio stream
    fn start_audio_read(&mut self, stream: usize, size: usize);

    /// Wait for the chunk requested by the matching `start_audio_read`;
    /// `None` signals end of stream
    async fn finish_audio_read(&mut self, stream: usize) -> Option<AudioBlob>;

    /// Seek all streams of this source to an absolute position in
    /// microseconds
    async fn seek(&mut self, position: i64) -> DualStreamResult<()>;

    /// Current read position in microseconds, `None` when unknown
    fn current_position(&self) -> Option<i64>;

    /// Release demuxer/decoder resources
    fn close(&mut self);
}

/// Port for opening media sources from URLs
#[async_trait]
pub trait SourceOpener: Send + Sync {
    /// Open a URL as a media source; fails on unreadable or unsupported
    /// input
    async fn open(&self, url: &str) -> DualStreamResult<Box<dyn MediaSource>>;
}
