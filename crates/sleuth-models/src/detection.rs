//! Person detections from the detector service.

use serde::{Deserialize, Serialize};

use crate::bbox::BBox;

/// A single detection returned by the detector service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in source-frame pixel coordinates
    pub bbox: BBox,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
    /// COCO class name (the pipeline only consumes `"person"`)
    pub class_name: String,
}

impl Detection {
    /// Create a person detection.
    pub fn person(bbox: BBox, confidence: f32) -> Self {
        Self {
            bbox,
            confidence,
            class_name: "person".to_string(),
        }
    }

    /// Check if this detection is a person.
    pub fn is_person(&self) -> bool {
        self.class_name == "person"
    }
}
