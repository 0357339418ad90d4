/// Capture replay
///
/// Replays a recorded detection stream through the labeler. Each frame of
/// the capture is "rendered" (its annotation is opened) in order, while
/// its detection results are held back for a configurable number of
/// frames before delivery, mimicking asynchronous GPU readback. Latency 0
/// delivers results on the frame that requested them.
use std::collections::VecDeque;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::labeler::BoundingBoxLabeler;
use crate::record_builder::{BoundingBox, DetectedObject};
use crate::sensor::LogSensor;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayCapture {
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayFrame {
    pub frame: u64,
    pub objects: Vec<ReplayObject>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayObject {
    pub instance_id: u32,
    pub labels: Vec<String>,
    pub bbox: Vec<f32>, // [x, y, width, height]
}

impl ReplayCapture {
    /// Parse a capture from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read capture file {}: {}", path.display(), e))?;
        Self::from_str(&content)
    }

    /// Parse a capture from a JSON string
    pub fn from_str(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("Failed to parse capture JSON: {}", e))
    }

    /// Filter out objects that cannot be labeled and report what was
    /// dropped. Returns the number of skipped objects and warnings.
    pub fn validate_and_clean(&mut self) -> (usize, Vec<String>) {
        let mut warnings = Vec::new();
        let mut skipped_count = 0;

        for frame in &mut self.frames {
            let frame_id = frame.frame;
            let original_count = frame.objects.len();

            frame.objects.retain(|object| {
                if object.bbox.len() != 4 {
                    warnings.push(format!(
                        "Skipping object {} in frame {}: invalid bbox format (expected 4 values, got {})",
                        object.instance_id, frame_id, object.bbox.len()
                    ));
                    return false;
                }
                if object.labels.is_empty() {
                    warnings.push(format!(
                        "Skipping object {} in frame {}: empty label set",
                        object.instance_id, frame_id
                    ));
                    return false;
                }
                true
            });

            skipped_count += original_count - frame.objects.len();
        }

        (skipped_count, warnings)
    }

    pub fn total_objects(&self) -> usize {
        self.frames.iter().map(|f| f.objects.len()).sum()
    }
}

impl ReplayObject {
    fn to_detected(&self) -> DetectedObject {
        DetectedObject {
            instance_id: self.instance_id,
            labels: self.labels.clone(),
            bbox: BoundingBox {
                x: self.bbox[0],
                y: self.bbox[1],
                width: self.bbox[2],
                height: self.bbox[3],
            },
        }
    }
}

/// Drives a capture through a labeler, delaying detection delivery
pub struct ReplaySession {
    latency_frames: usize,
    in_flight: VecDeque<(u64, Vec<DetectedObject>)>,
}

impl ReplaySession {
    pub fn new(latency_frames: usize) -> Self {
        Self {
            latency_frames,
            in_flight: VecDeque::new(),
        }
    }

    /// Replay the whole capture. Every frame's results are delivered
    /// exactly once; results still in flight when the capture ends are
    /// flushed at the end.
    pub fn run(
        &mut self,
        capture: &ReplayCapture,
        labeler: &BoundingBoxLabeler<LogSensor>,
        sensor: &LogSensor,
    ) {
        for frame in &capture.frames {
            sensor.set_frame(frame.frame);
            labeler.on_frame_begin(frame.frame);

            let objects: Vec<DetectedObject> =
                frame.objects.iter().map(|o| o.to_detected()).collect();
            self.in_flight.push_back((frame.frame, objects));

            // Readback completes `latency_frames` frames after the request.
            while self.in_flight.len() > self.latency_frames {
                let (ready_frame, objects) = self.in_flight.pop_front().unwrap();
                labeler.on_detections_ready(ready_frame, &objects);
            }
        }

        // End of capture: drain whatever is still in flight.
        while let Some((ready_frame, objects)) = self.in_flight.pop_front() {
            labeler.on_detections_ready(ready_frame, &objects);
        }

        info!(
            "Replay finished: {} frame(s), {} annotation(s) reported",
            capture.frames.len(),
            sensor.reported_annotations()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label_config::{LabelConfig, LabelEntry};
    use std::sync::Arc;

    fn capture_json() -> &'static str {
        r#"{
            "frames": [
                {"frame": 1, "objects": [
                    {"instance_id": 1, "labels": ["car"], "bbox": [0.0, 0.0, 10.0, 10.0]}
                ]},
                {"frame": 2, "objects": [
                    {"instance_id": 2, "labels": ["pedestrian"], "bbox": [5.0, 5.0, 2.0, 6.0]},
                    {"instance_id": 3, "labels": ["tree"], "bbox": [1.0, 1.0, 3.0, 9.0]}
                ]},
                {"frame": 3, "objects": []}
            ]
        }"#
    }

    fn config() -> LabelConfig {
        LabelConfig {
            entries: vec![
                LabelEntry { id: 1, label: "car".to_string(), segmentation_value: 1 },
                LabelEntry { id: 2, label: "pedestrian".to_string(), segmentation_value: 2 },
            ],
            auto_assign_ids: false,
            starting_id: 0,
        }
    }

    fn labeler(sensor: &Arc<LogSensor>, sync_readback: bool) -> BoundingBoxLabeler<LogSensor> {
        BoundingBoxLabeler::new(
            Arc::clone(sensor),
            config(),
            "bounding_box",
            "2D bounding box",
            sync_readback,
        )
        .unwrap()
    }

    #[test]
    fn capture_parsing_and_counts() {
        let capture = ReplayCapture::from_str(capture_json()).unwrap();
        assert_eq!(capture.frames.len(), 3);
        assert_eq!(capture.total_objects(), 3);
    }

    #[test]
    fn validate_drops_malformed_objects() {
        let json = r#"{
            "frames": [
                {"frame": 1, "objects": [
                    {"instance_id": 1, "labels": ["car"], "bbox": [0.0, 0.0, 10.0]},
                    {"instance_id": 2, "labels": [], "bbox": [0.0, 0.0, 1.0, 1.0]},
                    {"instance_id": 3, "labels": ["car"], "bbox": [0.0, 0.0, 1.0, 1.0]}
                ]}
            ]
        }"#;
        let mut capture = ReplayCapture::from_str(json).unwrap();
        let (skipped, warnings) = capture.validate_and_clean();
        assert_eq!(skipped, 2);
        assert_eq!(warnings.len(), 2);
        assert_eq!(capture.total_objects(), 1);
        assert_eq!(capture.frames[0].objects[0].instance_id, 3);
    }

    #[test]
    fn synchronous_replay_reports_every_frame() {
        let capture = ReplayCapture::from_str(capture_json()).unwrap();
        let sensor = Arc::new(LogSensor::new());
        let labeler = labeler(&sensor, true);

        ReplaySession::new(0).run(&capture, &labeler, &sensor);

        assert_eq!(sensor.reported_annotations(), 3);
        assert_eq!(labeler.pending_frames(), 0);
    }

    #[test]
    fn delayed_replay_flushes_the_tail() {
        let capture = ReplayCapture::from_str(capture_json()).unwrap();
        let sensor = Arc::new(LogSensor::new());
        let labeler = labeler(&sensor, false);

        // Two frames of readback latency on a three frame capture: the
        // last two frames only resolve during the end-of-capture drain.
        ReplaySession::new(2).run(&capture, &labeler, &sensor);

        assert_eq!(sensor.reported_annotations(), 3);
        assert_eq!(labeler.pending_frames(), 0);
    }
}
