//! Media input aggregation
//!
//! [`MediaInput`] presents one or more opened media sources as a single
//! logical input with a flattened, globally indexed set of video and audio
//! streams. It detects whether two video streams can serve as a separate
//! stereo pair, keeps stream activation and seeks synchronized across all
//! sources, and stitches the two independently decoded views of a separate
//! pair into one dual-view frame.

mod stream_map;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DualStreamResult;
use crate::format::{AudioFormatTemplate, StereoLayout, VideoFormatTemplate};
use crate::frame::{AudioBlob, VideoFrame};
use crate::ports::{MediaSource, SourceOpener};
use crate::utils::time;

use stream_map::StreamMap;

/// Tag holding the leading-advertisement skip offset in 3dtv.at releases
const SKIP_TAG: &str = "StereoscopicSkip";

/// Which video stream(s) drive frame reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveVideo {
    /// One video stream, by global index
    Single(usize),
    /// Two independent streams forming a separate stereo pair
    Pair(usize, usize),
}

impl ActiveVideo {
    /// Global index of the primary stream (view 0 for a pair)
    pub fn primary(self) -> usize {
        match self {
            ActiveVideo::Single(stream) => stream,
            ActiveVideo::Pair(first, _) => first,
        }
    }
}

/// Serializable snapshot of an opened input, backing the logged summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSummary {
    pub id: String,
    pub duration_micros: i64,
    pub stereo_layout: Option<String>,
    pub video_streams: Vec<String>,
    pub audio_streams: Vec<String>,
}

/// One or more media sources presented as a single logical input
///
/// Streams of each kind are addressed by a global index over the virtual
/// concatenation of all sources' streams, in source order. The advertised
/// video format is derived from the active stream's template with the
/// chosen stereo layout applied; it is never stored separately, so it
/// cannot drift from the selection that produced it.
pub struct MediaInput {
    sources: Vec<Box<dyn MediaSource>>,
    id: String,
    video_map: StreamMap,
    audio_map: StreamMap,
    tags: Vec<(String, String)>,
    video_stream_names: Vec<String>,
    audio_stream_names: Vec<String>,
    active_video: Option<ActiveVideo>,
    active_audio: Option<usize>,
    video_layout: StereoLayout,
    video_layout_swap: bool,
    initial_skip: i64,
    duration: i64,
    supports_separate_stereo: bool,
    video_read_pending: bool,
    audio_read_pending: bool,
}

/// Last path segment of a URL, accepting both separator styles
fn basename(url: &str) -> &str {
    match url.rfind(['/', '\\']) {
        Some(i) => &url[i + 1..],
        None => url,
    }
}

impl MediaInput {
    /// Create an empty input; `open` makes it usable
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            id: String::new(),
            video_map: StreamMap::default(),
            audio_map: StreamMap::default(),
            tags: Vec::new(),
            video_stream_names: Vec::new(),
            audio_stream_names: Vec::new(),
            active_video: None,
            active_audio: None,
            video_layout: StereoLayout::Mono,
            video_layout_swap: false,
            initial_skip: 0,
            duration: -1,
            supports_separate_stereo: false,
            video_read_pending: false,
            audio_read_pending: false,
        }
    }

    /// Open every URL through the opener and probe the aggregate input.
    ///
    /// Any source failing to open fails the whole call; sources opened so
    /// far are closed again and the input stays in its empty state.
    pub async fn open<S: AsRef<str>>(
        &mut self,
        urls: &[S],
        opener: &dyn SourceOpener,
    ) -> DualStreamResult<()> {
        assert!(!urls.is_empty(), "open requires at least one source URL");
        assert!(self.sources.is_empty(), "input is already open");

        let mut sources: Vec<Box<dyn MediaSource>> = Vec::with_capacity(urls.len());
        for url in urls {
            match opener.open(url.as_ref()).await {
                Ok(source) => sources.push(source),
                Err(err) => {
                    for mut source in sources {
                        source.close();
                    }
                    return Err(err);
                }
            }
        }
        self.sources = sources;

        // Input id: base filenames joined in source order
        self.id = self
            .sources
            .iter()
            .map(|s| basename(s.url()))
            .collect::<Vec<_>>()
            .join("/");

        let multi_source = self.sources.len() > 1;

        // Aggregate tags, ordinal-prefixed when more than one source
        for (i, source) in self.sources.iter().enumerate() {
            let prefix = if multi_source {
                format!("{} - ", i + 1)
            } else {
                String::new()
            };
            for t in 0..source.tag_count() {
                self.tags.push((
                    format!("{}{}", prefix, source.tag_name(t)),
                    format!("{}{}", prefix, source.tag_value(t)),
                ));
            }
        }

        // Flattened stream tables
        self.video_map = StreamMap::build(self.sources.iter().map(|s| s.video_stream_count()));
        self.audio_map = StreamMap::build(self.sources.iter().map(|s| s.audio_stream_count()));

        // Stream name labels, prefixed by source ordinal and, within a
        // multi-stream source, by an intra-source ordinal
        for (i, source) in self.sources.iter().enumerate() {
            let prefix = if multi_source {
                format!("{} - ", i + 1)
            } else {
                String::new()
            };
            for j in 0..source.video_stream_count() {
                let inner = if source.video_stream_count() > 1 {
                    format!("{} - ", j + 1)
                } else {
                    String::new()
                };
                self.video_stream_names.push(format!(
                    "{}{}{}",
                    prefix,
                    inner,
                    source.video_format(j).format_info()
                ));
            }
        }
        for (i, source) in self.sources.iter().enumerate() {
            let prefix = if multi_source {
                format!("{} - ", i + 1)
            } else {
                String::new()
            };
            for j in 0..source.audio_stream_count() {
                let inner = if source.audio_stream_count() > 1 {
                    format!("{} - ", j + 1)
                } else {
                    String::new()
                };
                self.audio_stream_names.push(format!(
                    "{}{}{}",
                    prefix,
                    inner,
                    source.audio_format(j).format_info()
                ));
            }
        }

        // Duration: minimum over every stream of every source, active or
        // not, so a later stream switch can never exceed the advertised
        // duration
        self.duration = i64::MAX;
        for source in &self.sources {
            for j in 0..source.video_stream_count() {
                self.duration = self.duration.min(source.video_duration(j));
            }
            for j in 0..source.audio_stream_count() {
                self.duration = self.duration.min(source.audio_duration(j));
            }
        }

        // Advertisement skip offset; absent or unparsable means none.
        // The tag lookup runs over prefixed names, so this only ever
        // matches for single-source inputs.
        self.initial_skip = self.tag_value_by_name(SKIP_TAG).parse().unwrap_or(0);

        // A separate stereo pair needs exactly two video streams whose
        // decoded pixels are interchangeable
        self.supports_separate_stereo = if self.video_map.total() == 2 {
            let (o0, s0) = self.video_map.resolve(0);
            let (o1, s1) = self.video_map.resolve(1);
            self.sources[o0]
                .video_format(s0)
                .is_compatible_view(self.sources[o1].video_format(s1))
        } else {
            false
        };

        // Default active streams
        if self.supports_separate_stereo {
            let (o0, s0) = self.video_map.resolve(0);
            self.active_video = Some(ActiveVideo::Pair(0, 1));
            self.video_layout = StereoLayout::Separate;
            self.video_layout_swap = self.sources[o0].video_format(s0).stereo_layout_swap;
            self.apply_video_activation();
        } else if self.video_map.total() > 0 {
            let (o, s) = self.video_map.resolve(0);
            let template = self.sources[o].video_format(s);
            self.active_video = Some(ActiveVideo::Single(0));
            self.video_layout = template.stereo_layout;
            self.video_layout_swap = template.stereo_layout_swap;
            self.apply_video_activation();
        }
        if self.audio_map.total() > 0 {
            self.select_audio(0);
        }

        self.log_summary();
        Ok(())
    }

    /// Identifier of this input: base filenames joined by `/`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of aggregated metadata tags
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Name of an aggregated tag
    pub fn tag_name(&self, index: usize) -> &str {
        &self.tags[index].0
    }

    /// Value of an aggregated tag
    pub fn tag_value(&self, index: usize) -> &str {
        &self.tags[index].1
    }

    /// Value of the first tag with the given name, empty when absent
    pub fn tag_value_by_name(&self, name: &str) -> &str {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Total number of video streams across all sources
    pub fn video_stream_count(&self) -> usize {
        self.video_map.total()
    }

    /// Total number of audio streams across all sources
    pub fn audio_stream_count(&self) -> usize {
        self.audio_map.total()
    }

    /// Human-readable label of a flattened video stream
    pub fn video_stream_name(&self, stream: usize) -> &str {
        &self.video_stream_names[stream]
    }

    /// Human-readable label of a flattened audio stream
    pub fn audio_stream_name(&self, stream: usize) -> &str {
        &self.audio_stream_names[stream]
    }

    /// Duration in microseconds, -1 while closed
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Microseconds of leading advertisement content to skip
    pub fn initial_skip(&self) -> i64 {
        self.initial_skip
    }

    /// Whether the input's two video streams can form a separate stereo
    /// pair
    pub fn supports_separate_stereo(&self) -> bool {
        self.supports_separate_stereo
    }

    /// Current video selection, `None` when the input has no video
    pub fn active_video(&self) -> Option<ActiveVideo> {
        self.active_video
    }

    /// Global index of the active audio stream
    pub fn active_audio(&self) -> Option<usize> {
        self.active_audio
    }

    /// Video format advertised to consumers, derived from the active
    /// stream's template with the chosen layout applied.
    ///
    /// Panics when no video stream is active.
    pub fn video_format_template(&self) -> VideoFormatTemplate {
        let active = self.active_video.expect("no active video stream");
        let (source, stream) = self.video_map.resolve(active.primary());
        let mut template = self.sources[source].video_format(stream).clone();
        template.stereo_layout = self.video_layout;
        template.stereo_layout_swap = self.video_layout_swap;
        template.set_view_dimensions();
        template
    }

    /// Audio format advertised to consumers.
    ///
    /// Panics when no audio stream is active.
    pub fn audio_blob_template(&self) -> AudioFormatTemplate {
        let active = self.active_audio.expect("no active audio stream");
        let (source, stream) = self.audio_map.resolve(active);
        self.sources[source].audio_format(stream).clone()
    }

    /// Frame rate of the active video stream as numerator/denominator
    pub fn video_frame_rate(&self) -> (u32, u32) {
        let active = self.active_video.expect("no active video stream");
        let (source, stream) = self.video_map.resolve(active.primary());
        self.sources[source].video_frame_rate(stream)
    }

    /// Duration of one frame of the active video stream in microseconds
    pub fn video_frame_duration(&self) -> i64 {
        let (num, den) = self.video_frame_rate();
        den as i64 * 1_000_000 / num as i64
    }

    /// Whether the active video stream can be presented in the given
    /// layout
    pub fn layout_is_supported(&self, layout: StereoLayout, _swap: bool) -> bool {
        let Some(active) = self.active_video else {
            return false;
        };
        let (source, stream) = self.video_map.resolve(active.primary());
        let template = self.sources[source].video_format(stream);
        match layout {
            StereoLayout::LeftRight | StereoLayout::LeftRightHalf => template.raw_width % 2 == 0,
            StereoLayout::TopBottom | StereoLayout::TopBottomHalf | StereoLayout::EvenOddRows => {
                template.raw_height % 2 == 0
            }
            StereoLayout::Separate => self.supports_separate_stereo,
            StereoLayout::Mono => true,
        }
    }

    /// Present the active video in a different stereo layout.
    ///
    /// The layout must be supported per [`layout_is_supported`]; violating
    /// that is a programming error.
    ///
    /// Switching into `Separate` re-seeks every source to the first pair
    /// stream's current position, since the second stream's read cursor
    /// has not been advancing while inactive. The seek is skipped when
    /// that position is unknown.
    ///
    /// [`layout_is_supported`]: MediaInput::layout_is_supported
    pub async fn set_layout(&mut self, layout: StereoLayout, swap: bool) -> DualStreamResult<()> {
        assert!(
            self.layout_is_supported(layout, swap),
            "stereo layout {} is not supported by the active stream",
            layout.label(swap)
        );
        self.video_layout = layout;
        self.video_layout_swap = swap;
        if layout == StereoLayout::Separate {
            self.active_video = Some(ActiveVideo::Pair(0, 1));
            self.apply_video_activation();
            let (source, _) = self.video_map.resolve(0);
            if let Some(position) = self.sources[source].current_position() {
                debug!(position, "re-syncing pair streams after layout change");
                self.seek(position).await?;
            }
        } else if matches!(self.active_video, Some(ActiveVideo::Pair(..))) {
            // Leaving the separate layout collapses the pair back to its
            // primary stream
            self.active_video = Some(ActiveVideo::Single(0));
            self.apply_video_activation();
        }
        Ok(())
    }

    /// Make a video stream the active one.
    ///
    /// Under the `Separate` layout there is exactly one selectable
    /// pseudo-stream driving both physical streams, so the index argument
    /// cannot change which streams are active. Otherwise the previously
    /// chosen layout and swap carry over to the new stream, which must
    /// support them.
    pub async fn select_video(&mut self, stream: usize) -> DualStreamResult<()> {
        assert!(
            stream < self.video_map.total(),
            "video stream index {} out of range ({} streams)",
            stream,
            self.video_map.total()
        );
        if self.video_layout == StereoLayout::Separate {
            self.apply_video_activation();
            return Ok(());
        }
        let (layout, swap) = (self.video_layout, self.video_layout_swap);
        self.active_video = Some(ActiveVideo::Single(stream));
        self.set_layout(layout, swap).await?;
        self.apply_video_activation();
        Ok(())
    }

    /// Make an audio stream the active one; every other audio stream
    /// across every source is deactivated
    pub fn select_audio(&mut self, stream: usize) {
        assert!(
            stream < self.audio_map.total(),
            "audio stream index {} out of range ({} streams)",
            stream,
            self.audio_map.total()
        );
        self.active_audio = Some(stream);
        let (source, local) = self.audio_map.resolve(stream);
        for i in 0..self.sources.len() {
            for j in 0..self.sources[i].audio_stream_count() {
                self.sources[i].set_audio_stream_active(j, i == source && j == local);
            }
        }
    }

    /// Push the current video selection down to the sources' activation
    /// flags
    fn apply_video_activation(&mut self) {
        let Some(active) = self.active_video else {
            return;
        };
        let wanted: Vec<(usize, usize)> = match (self.video_layout, active) {
            // Both pair streams decode, whatever the nominal selection
            (StereoLayout::Separate, _) => {
                vec![self.video_map.resolve(0), self.video_map.resolve(1)]
            }
            (_, selection) => vec![self.video_map.resolve(selection.primary())],
        };
        for i in 0..self.sources.len() {
            for j in 0..self.sources[i].video_stream_count() {
                self.sources[i].set_video_stream_active(j, wanted.contains(&(i, j)));
            }
        }
    }

    /// Kick off the next video frame read on the active stream, or on
    /// both pair streams under the `Separate` layout.
    ///
    /// Must be paired with one `finish_video_read`; overlapping starts are
    /// a protocol violation.
    pub fn start_video_read(&mut self) {
        let active = self.active_video.expect("no active video stream");
        assert!(!self.video_read_pending, "video read already in flight");
        if self.video_layout == StereoLayout::Separate {
            let (o0, s0) = self.video_map.resolve(0);
            let (o1, s1) = self.video_map.resolve(1);
            self.sources[o0].start_video_read(s0);
            self.sources[o1].start_video_read(s1);
        } else {
            let (source, stream) = self.video_map.resolve(active.primary());
            self.sources[source].start_video_read(stream);
        }
        self.video_read_pending = true;
    }

    /// Wait for the frame requested by `start_video_read`.
    ///
    /// Under the `Separate` layout both pending sub-reads are awaited; the
    /// two views are stitched into one dual-view frame adopting view 0's
    /// presentation time. If either view is missing the whole frame is
    /// missing, never a half-filled one. `None` otherwise means the
    /// stream ended.
    pub async fn finish_video_read(&mut self) -> Option<VideoFrame> {
        let active = self.active_video.expect("no active video stream");
        assert!(self.video_read_pending, "finish without matching start");
        self.video_read_pending = false;
        if self.video_layout == StereoLayout::Separate {
            let (o0, s0) = self.video_map.resolve(0);
            let (o1, s1) = self.video_map.resolve(1);
            let (f0, f1) = if o0 == o1 {
                // Same source: one decoder context, reads serialize
                let source = &mut self.sources[o0];
                let f0 = source.finish_video_read(s0).await;
                let f1 = source.finish_video_read(s1).await;
                (f0, f1)
            } else {
                // Independent sources decode concurrently; global stream
                // order guarantees o0 < o1
                let (head, tail) = self.sources.split_at_mut(o1);
                tokio::join!(
                    head[o0].finish_video_read(s0),
                    tail[0].finish_video_read(s1)
                )
            };
            let (f0, f1) = (f0?, f1?);
            let mut frame = VideoFrame::with_format(self.video_format_template());
            let [view0, _] = f0.planes;
            let [view1, _] = f1.planes;
            frame.planes = [view0, view1];
            frame.presentation_time = f0.presentation_time;
            Some(frame)
        } else {
            let (source, stream) = self.video_map.resolve(active.primary());
            let decoded = self.sources[source].finish_video_read(stream).await?;
            let mut frame = VideoFrame::with_format(self.video_format_template());
            let [view0, _] = decoded.planes;
            frame.planes[0] = view0;
            frame.presentation_time = decoded.presentation_time;
            Some(frame)
        }
    }

    /// Kick off an audio read of up to `size` bytes on the active stream
    pub fn start_audio_read(&mut self, size: usize) {
        let active = self.active_audio.expect("no active audio stream");
        assert!(!self.audio_read_pending, "audio read already in flight");
        let (source, stream) = self.audio_map.resolve(active);
        self.sources[source].start_audio_read(stream, size);
        self.audio_read_pending = true;
    }

    /// Wait for the chunk requested by `start_audio_read`; `None` means
    /// the stream ended
    pub async fn finish_audio_read(&mut self) -> Option<AudioBlob> {
        let active = self.active_audio.expect("no active audio stream");
        assert!(self.audio_read_pending, "finish without matching start");
        self.audio_read_pending = false;
        let (source, stream) = self.audio_map.resolve(active);
        self.sources[source].finish_audio_read(stream).await
    }

    /// Seek every source, active streams or not, to an absolute position
    /// in microseconds.
    ///
    /// Sources are seeked in order and the first failure propagates; no
    /// rollback is attempted, so callers should re-probe positions after
    /// an error. Must not be called while a read is in flight.
    pub async fn seek(&mut self, position: i64) -> DualStreamResult<()> {
        debug_assert!(
            !self.video_read_pending && !self.audio_read_pending,
            "seek while a read is in flight"
        );
        for source in &mut self.sources {
            source.seek(position).await?;
        }
        Ok(())
    }

    /// Close all sources and reset to the empty state. A closed input may
    /// be opened again; closing twice is a no-op.
    pub fn close(&mut self) {
        for mut source in self.sources.drain(..) {
            source.close();
        }
        self.id.clear();
        self.video_map.clear();
        self.audio_map.clear();
        self.tags.clear();
        self.video_stream_names.clear();
        self.audio_stream_names.clear();
        self.active_video = None;
        self.active_audio = None;
        self.video_layout = StereoLayout::Mono;
        self.video_layout_swap = false;
        self.initial_skip = 0;
        self.duration = -1;
        self.supports_separate_stereo = false;
        self.video_read_pending = false;
        self.audio_read_pending = false;
    }

    /// Serializable snapshot of the opened input
    pub fn summary(&self) -> InputSummary {
        InputSummary {
            id: self.id.clone(),
            duration_micros: self.duration,
            stereo_layout: self
                .active_video
                .map(|_| self.video_layout.label(self.video_layout_swap)),
            video_streams: self.video_stream_names.clone(),
            audio_streams: self.audio_stream_names.clone(),
        }
    }

    /// One-time informational report after a successful open
    fn log_summary(&self) {
        info!("Input: {}", self.id);
        info!("    Duration: {}", time::format_micros(self.duration));
        if self.active_video.is_some() {
            info!(
                "    Stereo layout: {}",
                self.video_layout.label(self.video_layout_swap)
            );
        }
        for i in 0..self.video_map.total() {
            let (source, stream) = self.video_map.resolve(i);
            info!(
                "    Video {}: {}",
                self.video_stream_names[i],
                self.sources[source].video_format(stream).format_name()
            );
        }
        if self.video_map.total() == 0 {
            info!("    No video.");
        }
        for i in 0..self.audio_map.total() {
            let (source, stream) = self.audio_map.resolve(i);
            info!(
                "    Audio {}: {}",
                self.audio_stream_names[i],
                self.sources[source].audio_format(stream).format_name()
            );
        }
        if self.audio_map.total() == 0 {
            info!("    No audio.");
        }
    }
}

impl Default for MediaInput {
    fn default() -> Self {
        Self::new()
    }
}
