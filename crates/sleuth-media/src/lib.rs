//! FFmpeg CLI wrapper for the analysis pipeline.
//!
//! This crate provides:
//! - Source-stream inspection via targeted `ffprobe` queries
//! - Lazy raw-RGB frame decoding at a sampling interval
//! - Frame quality scoring (brightness, sharpness, contrast)
//! - Person-crop extraction with PNG encoding

pub mod crop;
pub mod decode;
pub mod error;
pub mod probe;
pub mod quality;

pub use crop::{crop_quality, encode_frame_png, extract_crop};
pub use decode::{Frame, FrameDecoder};
pub use error::{MediaError, MediaResult};
pub use probe::{inspect_source, SourceInfo};
pub use quality::frame_quality;
