//! Shared stub sources for driving MediaInput in tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dualstream::{
    AudioBlob, AudioFormatTemplate, DualStreamError, DualStreamResult, MediaSource, Plane,
    SourceOpener, VideoFormatTemplate, VideoFrame,
};

/// Externally observable state of a stub source, shared with the test
#[derive(Debug, Default)]
pub struct SourceState {
    pub active_video: Vec<bool>,
    pub active_audio: Vec<bool>,
    pub seeks: Vec<i64>,
    pub audio_requests: Vec<usize>,
    pub closed: bool,
}

struct VideoStream {
    template: VideoFormatTemplate,
    frame_rate: (u32, u32),
    duration: i64,
    frames: VecDeque<VideoFrame>,
    pending: bool,
}

struct AudioStream {
    template: AudioFormatTemplate,
    duration: i64,
    blobs: VecDeque<AudioBlob>,
    pending: bool,
}

/// Scriptable in-memory media source
pub struct StubSource {
    url: String,
    video: Vec<VideoStream>,
    audio: Vec<AudioStream>,
    tags: Vec<(String, String)>,
    position: Option<i64>,
    fail_seek: bool,
    state: Arc<Mutex<SourceState>>,
}

impl StubSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            video: Vec::new(),
            audio: Vec::new(),
            tags: Vec::new(),
            position: None,
            fail_seek: false,
            state: Arc::new(Mutex::new(SourceState::default())),
        }
    }

    pub fn with_video_stream(mut self, template: VideoFormatTemplate, duration: i64) -> Self {
        self.video.push(VideoStream {
            template,
            frame_rate: (30, 1),
            duration,
            frames: VecDeque::new(),
            pending: false,
        });
        self.state.lock().unwrap().active_video.push(false);
        self
    }

    /// Override the frame rate of the most recently added video stream
    pub fn with_frame_rate(mut self, num: u32, den: u32) -> Self {
        self.video
            .last_mut()
            .expect("no video stream added yet")
            .frame_rate = (num, den);
        self
    }

    pub fn with_audio_stream(mut self, template: AudioFormatTemplate, duration: i64) -> Self {
        self.audio.push(AudioStream {
            template,
            duration,
            blobs: VecDeque::new(),
            pending: false,
        });
        self.state.lock().unwrap().active_audio.push(false);
        self
    }

    pub fn with_tag(mut self, name: &str, value: &str) -> Self {
        self.tags.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }

    pub fn queue_video_frame(mut self, stream: usize, frame: VideoFrame) -> Self {
        self.video[stream].frames.push_back(frame);
        self
    }

    pub fn queue_audio_blob(mut self, stream: usize, blob: AudioBlob) -> Self {
        self.audio[stream].blobs.push_back(blob);
        self
    }

    /// Handle for inspecting this source after MediaInput takes it over
    pub fn state(&self) -> Arc<Mutex<SourceState>> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl MediaSource for StubSource {
    fn url(&self) -> &str {
        &self.url
    }

    fn video_stream_count(&self) -> usize {
        self.video.len()
    }

    fn audio_stream_count(&self) -> usize {
        self.audio.len()
    }

    fn video_format(&self, stream: usize) -> &VideoFormatTemplate {
        &self.video[stream].template
    }

    fn audio_format(&self, stream: usize) -> &AudioFormatTemplate {
        &self.audio[stream].template
    }

    fn video_frame_rate(&self, stream: usize) -> (u32, u32) {
        self.video[stream].frame_rate
    }

    fn video_duration(&self, stream: usize) -> i64 {
        self.video[stream].duration
    }

    fn audio_duration(&self, stream: usize) -> i64 {
        self.audio[stream].duration
    }

    fn tag_count(&self) -> usize {
        self.tags.len()
    }

    fn tag_name(&self, index: usize) -> &str {
        &self.tags[index].0
    }

    fn tag_value(&self, index: usize) -> &str {
        &self.tags[index].1
    }

    fn set_video_stream_active(&mut self, stream: usize, active: bool) {
        self.state.lock().unwrap().active_video[stream] = active;
    }

    fn set_audio_stream_active(&mut self, stream: usize, active: bool) {
        self.state.lock().unwrap().active_audio[stream] = active;
    }

    fn start_video_read(&mut self, stream: usize) {
        let s = &mut self.video[stream];
        assert!(!s.pending, "overlapping video read on stub stream");
        s.pending = true;
    }

    async fn finish_video_read(&mut self, stream: usize) -> Option<VideoFrame> {
        let s = &mut self.video[stream];
        assert!(s.pending, "finish without start on stub stream");
        s.pending = false;
        s.frames.pop_front()
    }

    fn start_audio_read(&mut self, stream: usize, size: usize) {
        let s = &mut self.audio[stream];
        assert!(!s.pending, "overlapping audio read on stub stream");
        s.pending = true;
        self.state.lock().unwrap().audio_requests.push(size);
    }

    async fn finish_audio_read(&mut self, stream: usize) -> Option<AudioBlob> {
        let s = &mut self.audio[stream];
        assert!(s.pending, "finish without start on stub stream");
        s.pending = false;
        s.blobs.pop_front()
    }

    async fn seek(&mut self, position: i64) -> DualStreamResult<()> {
        if self.fail_seek {
            return Err(DualStreamError::SeekFailed {
                url: self.url.clone(),
                position,
                message: "stub seek failure".to_string(),
            });
        }
        self.position = Some(position);
        self.state.lock().unwrap().seeks.push(position);
        Ok(())
    }

    fn current_position(&self) -> Option<i64> {
        self.position
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed = true;
    }
}

/// Opener handing out pre-built stub sources by URL
#[derive(Default)]
pub struct StubOpener {
    sources: Mutex<HashMap<String, StubSource>>,
}

impl StubOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(self, source: StubSource) -> Self {
        self.sources
            .lock()
            .unwrap()
            .insert(source.url.clone(), source);
        self
    }
}

#[async_trait]
impl SourceOpener for StubOpener {
    async fn open(&self, url: &str) -> DualStreamResult<Box<dyn MediaSource>> {
        self.sources
            .lock()
            .unwrap()
            .remove(url)
            .map(|s| Box::new(s) as Box<dyn MediaSource>)
            .ok_or_else(|| DualStreamError::OpenFailed {
                url: url.to_string(),
                message: "no such stub source".to_string(),
            })
    }
}

/// Valid video template with square pixels and matching raw dimensions
pub fn video_template(width: u32, height: u32) -> VideoFormatTemplate {
    VideoFormatTemplate {
        width,
        height,
        raw_width: width,
        raw_height: height,
        aspect_ratio: width as f64 / height as f64,
        ..Default::default()
    }
}

/// Valid audio template
pub fn audio_template(channels: u32, sample_rate: u32) -> AudioFormatTemplate {
    AudioFormatTemplate {
        channels,
        sample_rate,
        ..Default::default()
    }
}

/// Mono frame whose view-0 planes are filled with a marker byte
pub fn marked_frame(template: &VideoFormatTemplate, marker: u8, pts: i64) -> VideoFrame {
    let mut frame = VideoFrame::with_format(template.clone());
    for plane in 0..3 {
        frame.planes[0][plane] = Plane::new(vec![marker; 64], 64);
    }
    frame.presentation_time = pts;
    frame
}

/// Audio blob filled with a marker byte
pub fn marked_blob(template: &AudioFormatTemplate, marker: u8, len: usize, pts: i64) -> AudioBlob {
    AudioBlob::new(template.clone(), vec![marker; len], pts)
}
