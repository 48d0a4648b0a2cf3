//! Source-stream inspection via `ffprobe`.
//!
//! The decoder needs four facts about a container before it can drive the
//! rawvideo pipe: dimensions, frame rate and duration. `inspect_source`
//! asks ffprobe for exactly those entries on the first video stream and
//! validates them up front, so a container that cannot support the
//! sampling arithmetic is rejected before ffmpeg is ever spawned.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Validated facts about a video source.
///
/// Dimensions and frame rate are guaranteed positive, so the sampling and
/// timestamp arithmetic below is total.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Container duration in seconds (0 when the container omits it)
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Video codec name
    pub codec: String,
}

impl SourceInfo {
    /// Source frames per sampled frame for a given interval.
    ///
    /// An interval of 0 means every frame is sampled.
    pub fn sampling_step(&self, sample_interval_secs: f64) -> u64 {
        (self.fps * sample_interval_secs).round().max(1.0) as u64
    }

    /// Bytes per frame on an rgb24 rawvideo pipe.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Timestamp of a source frame, strictly increasing in the index.
    pub fn timestamp_of(&self, frame_index: u64) -> f64 {
        frame_index as f64 / self.fps
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Inspect the first video stream of a container.
///
/// Fails with [`MediaError::Unopenable`] when ffprobe rejects the file and
/// with [`MediaError::InvalidVideo`] when the stream cannot drive frame
/// sampling (no video stream, zero dimensions, unusable frame rate).
pub async fn inspect_source(path: impl AsRef<Path>) -> MediaResult<SourceInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name,width,height,r_frame_rate,avg_frame_rate",
            "-show_entries",
            "format=duration",
            "-print_format",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::unopenable(
            path,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let probe: ProbeOutput = serde_json::from_slice(&output.stdout)?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| MediaError::InvalidVideo("no video stream".to_string()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        (w, h) => {
            return Err(MediaError::InvalidVideo(format!(
                "unusable dimensions {:?}x{:?}",
                w, h
            )))
        }
    };

    // ffprobe reports two rates; either may be the degenerate `0/0`.
    let fps = [&stream.avg_frame_rate, &stream.r_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|r| frame_rate(r))
        .ok_or_else(|| MediaError::InvalidVideo("unusable frame rate".to_string()))?;

    let duration = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(SourceInfo {
        duration,
        width,
        height,
        fps,
        codec: stream.codec_name.unwrap_or_default(),
    })
}

/// Parse an ffprobe rate: a `num/den` fraction or a bare decimal.
///
/// Non-positive rates are rejected so callers can fall through to the next
/// candidate.
fn frame_rate(s: &str) -> Option<f64> {
    let value = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den <= 0.0 {
                return None;
            }
            num / den
        }
        None => s.parse().ok()?,
    };
    (value > 0.0).then_some(value)
}
