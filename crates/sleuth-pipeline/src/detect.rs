//! Detection batching stage.
//!
//! Accumulates gate-accepted frames into batches and fans each batch out as
//! concurrent single-frame requests to the detector service. Frame identity
//! is preserved: results are forwarded downstream in source order, so the
//! track registry always sees frames in the order they were decoded.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use sleuth_media::{encode_frame_png, Frame};
use sleuth_ml_client::DetectorClient;
use sleuth_models::Detection;

use crate::batch::fill_batch;
use crate::config::PipelineConfig;
use crate::termination::TerminationCoordinator;

/// A frame paired with its person detections.
pub struct FrameDetections {
    pub frame: Frame,
    pub detections: Vec<Detection>,
}

/// Run the detection stage until the upstream channel closes or the
/// pipeline is cancelled.
///
/// Individual request failures drop only the affected frame; a whole batch
/// failing never aborts the pipeline. Results of a batch in flight when
/// cancellation fires are discarded.
pub async fn run_detection_stage(
    config: Arc<PipelineConfig>,
    detector: Arc<DetectorClient>,
    coordinator: TerminationCoordinator,
    mut frames_rx: mpsc::Receiver<Frame>,
    results_tx: mpsc::Sender<FrameDetections>,
) {
    loop {
        let first = match frames_rx.recv().await {
            Some(frame) => frame,
            None => break,
        };
        if coordinator.is_cancelled() {
            break;
        }

        let (batch, closed) = fill_batch(
            &mut frames_rx,
            first,
            config.detection_batch_size,
            config.batch_timeout,
        )
        .await;

        debug!(frames = batch.len(), "Dispatching detection batch");

        let results = join_all(batch.into_iter().map(|frame| {
            let detector = Arc::clone(&detector);
            let confidence = config.detection_confidence;
            async move { detect_frame(&detector, frame, confidence).await }
        }))
        .await;

        if coordinator.is_cancelled() {
            // In-flight requests are not cancelled mid-flight, but their
            // results are discarded once the pipeline is shutting down.
            break;
        }

        for item in results.into_iter().flatten() {
            if results_tx.send(item).await.is_err() {
                return;
            }
        }

        if closed {
            break;
        }
    }
}

async fn detect_frame(
    detector: &DetectorClient,
    frame: Frame,
    confidence: f32,
) -> Option<FrameDetections> {
    let png = match encode_frame_png(&frame) {
        Ok(png) => png,
        Err(e) => {
            warn!(frame = frame.index, error = %e, "Frame PNG encoding failed; frame dropped");
            return None;
        }
    };

    match detector.detect(png, confidence, false).await {
        Ok(detections) => {
            let persons: Vec<Detection> =
                detections.into_iter().filter(|d| d.is_person()).collect();
            debug!(
                frame = frame.index,
                persons = persons.len(),
                "Detection completed"
            );
            Some(FrameDetections {
                frame,
                detections: persons,
            })
        }
        Err(e) => {
            warn!(frame = frame.index, error = %e, "Detection request failed; frame dropped");
            None
        }
    }
}
