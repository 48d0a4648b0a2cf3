//! Lazy frame decoding via `ffmpeg -f rawvideo`.

use std::path::Path;
use std::process::Stdio;

use image::RgbImage;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::probe::{inspect_source, SourceInfo};

/// A decoded, sampled video frame.
///
/// Frames are stage-local: the decoder hands ownership downstream and the
/// buffer is dropped once all work referencing it completes.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Source frame number
    pub index: u64,
    /// 0-based ordinal among sampled frames
    pub sample_index: u64,
    /// Timestamp in seconds, strictly increasing across the sequence
    pub timestamp: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGB pixel data
    pub image: RgbImage,
}

/// Lazy, finite, non-restartable frame sequence.
///
/// Spawns `ffmpeg -f rawvideo -pix_fmt rgb24` and reads exact-size frames
/// from its stdout. Frame `f` is emitted iff
/// `f % max(1, round(fps * sample_interval)) == 0`. The child process is
/// killed when the decoder is dropped.
#[derive(Debug)]
pub struct FrameDecoder {
    info: SourceInfo,
    child: Child,
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
    step: u64,
    frame_len: usize,
    next_index: u64,
    samples_emitted: u64,
    done: bool,
}

impl FrameDecoder {
    /// Inspect the container and spawn the decoding child process.
    ///
    /// Fails with [`MediaError::Unopenable`] or [`MediaError::InvalidVideo`]
    /// when the container cannot drive the pipeline.
    pub async fn open(path: impl AsRef<Path>, sample_interval_secs: f64) -> MediaResult<Self> {
        let path = path.as_ref();
        let info = inspect_source(path).await?;

        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::unopenable(path, e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::unopenable(path, "no stdout pipe".to_string()))?;
        let stderr = child.stderr.take();

        let step = info.sampling_step(sample_interval_secs);
        let frame_len = info.frame_len();

        info!(
            path = %path.display(),
            fps = info.fps,
            width = info.width,
            height = info.height,
            duration = info.duration,
            step,
            "Frame decoder opened"
        );

        Ok(Self {
            info,
            child,
            stdout,
            stderr,
            step,
            frame_len,
            next_index: 0,
            samples_emitted: 0,
            done: false,
        })
    }

    /// Source information captured at open time.
    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    /// Number of sampled frames emitted so far.
    pub fn samples_emitted(&self) -> u64 {
        self.samples_emitted
    }

    /// Yield the next sampled frame, or `None` at end of stream.
    ///
    /// A short read mid-frame surfaces as [`MediaError::TruncatedStream`];
    /// the sequence cannot be resumed afterwards.
    pub async fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.done {
            return Ok(None);
        }

        loop {
            let mut buf = vec![0u8; self.frame_len];
            let filled = self.fill_frame(&mut buf).await?;

            if filled == 0 {
                self.done = true;
                return self.finish().await;
            }
            if filled < self.frame_len {
                self.done = true;
                return Err(MediaError::TruncatedStream(format!(
                    "frame {} ended after {} of {} bytes",
                    self.next_index, filled, self.frame_len
                )));
            }

            let index = self.next_index;
            self.next_index += 1;

            if index % self.step != 0 {
                continue;
            }

            let image = RgbImage::from_raw(self.info.width, self.info.height, buf)
                .ok_or_else(|| {
                    MediaError::TruncatedStream("frame buffer size mismatch".to_string())
                })?;

            let frame = Frame {
                index,
                sample_index: self.samples_emitted,
                timestamp: self.info.timestamp_of(index),
                width: self.info.width,
                height: self.info.height,
                image,
            };
            self.samples_emitted += 1;

            debug!(
                frame = frame.index,
                sample = frame.sample_index,
                timestamp = frame.timestamp,
                "Sampled frame decoded"
            );

            return Ok(Some(frame));
        }
    }

    async fn fill_frame(&mut self, buf: &mut [u8]) -> MediaResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.stdout.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Handle clean end of stream: collect the child's verdict.
    async fn finish(&mut self) -> MediaResult<Option<Frame>> {
        let mut stderr_text = String::new();
        if let Some(mut stderr) = self.stderr.take() {
            stderr.read_to_string(&mut stderr_text).await.ok();
        }
        let status = self.child.wait().await?;

        if !status.success() {
            let message = if stderr_text.trim().is_empty() {
                format!("ffmpeg exited with {}", status)
            } else {
                stderr_text.trim().to_string()
            };
            // Nothing decoded at all means the container itself was bad.
            if self.samples_emitted == 0 && self.next_index == 0 {
                return Err(MediaError::TruncatedStream(format!(
                    "no frames decoded: {}",
                    message
                )));
            }
            warn!(frames = self.next_index, "Decoder child reported errors: {}", message);
            return Err(MediaError::TruncatedStream(message));
        }

        info!(
            frames_read = self.next_index,
            frames_sampled = self.samples_emitted,
            "Frame decoding complete"
        );
        Ok(None)
    }

    /// Stop decoding early; the child process is killed.
    pub async fn cancel(&mut self) {
        self.done = true;
        self.child.start_kill().ok();
        self.child.wait().await.ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_rejects_missing_file() {
        let err = FrameDecoder::open("/nonexistent/video.mp4", 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
