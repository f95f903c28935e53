//! # Transcoding
//!
//! The boundary between clip selection and actual media work.
//!
//! A [`Transcoder`] receives a [`RenderJob`] describing the clips to join,
//! the soundtrack to lay over them and where to write the result. How the
//! bytes get produced is entirely the transcoder's business; the default
//! implementation shells out to `ffmpeg`.

mod ffmpeg;

pub use ffmpeg::{concat_list, FfmpegCommand, FfmpegTranscoder};

use crate::error::ClipResult;
use std::path::PathBuf;

/// Soundtrack volume multiplier
pub const AUDIO_VOLUME: f64 = 0.8;

/// Upper bound on the audio fade-out, in seconds
pub const FADE_DURATION_SECONDS: f64 = 2.0;

/// Fade-out length as a fraction of the total duration
pub const FADE_DURATION_PERCENTAGE: f64 = 0.1;

/// Everything a transcoder needs to produce one output video
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    /// Clips to concatenate, in playback order
    pub clips: Vec<PathBuf>,
    /// Background audio
    pub audio: PathBuf,
    /// Destination file
    pub output: PathBuf,
    /// Audio volume multiplier
    pub volume: f64,
}

/// Produces the final video for a [`RenderJob`].
pub trait Transcoder {
    fn render(&self, job: &RenderJob) -> ClipResult<()>;
}

impl<T: Transcoder + ?Sized> Transcoder for &T {
    fn render(&self, job: &RenderJob) -> ClipResult<()> {
        (**self).render(job)
    }
}

/// Audio fade-out for a video of `duration` seconds, as `(start, length)`.
///
/// The fade lasts `min(2s, 10% of duration)` and ends exactly at `duration`.
pub fn fade_window(duration: f64) -> (f64, f64) {
    let length = FADE_DURATION_SECONDS.min(duration * FADE_DURATION_PERCENTAGE);
    ((duration - length).max(0.0), length)
}
