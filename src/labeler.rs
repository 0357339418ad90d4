/// 2D bounding box labeler
///
/// Glues the pieces together for one reporting session: owns the label
/// configuration, opens a pending annotation when a frame begins, and
/// turns each frame's detection results into reported records.
use std::sync::{Arc, Mutex};

use log::info;

use crate::annotation_correlator::AnnotationCorrelator;
use crate::label_config::LabelConfig;
use crate::overlay::OverlaySink;
use crate::record_builder::{DetectedObject, RecordBuilder};
use crate::sensor::{AnnotationDefinition, AnnotationSensor};

pub struct BoundingBoxLabeler<S: AnnotationSensor> {
    config: LabelConfig,
    correlator: AnnotationCorrelator<S>,
    builder: Mutex<RecordBuilder>,
    overlay: Option<Box<dyn OverlaySink + Send + Sync>>,
}

impl<S: AnnotationSensor> BoundingBoxLabeler<S> {
    /// Create a labeler and register its annotation definition with the
    /// host. A missing (empty) label configuration is a fatal setup error.
    pub fn new(
        sensor: Arc<S>,
        config: LabelConfig,
        annotation_id: &str,
        annotation_name: &str,
        sync_readback: bool,
    ) -> Result<Self, String> {
        if config.is_empty() {
            return Err(
                "No label configuration supplied; the labeler cannot initialize without one"
                    .to_string(),
            );
        }

        let definition = AnnotationDefinition {
            id: annotation_id.to_string(),
            name: annotation_name.to_string(),
            spec: config.entries.clone(),
        };
        sensor.register_definition(&definition);

        info!(
            "Bounding box labeler initialized with {} label entries",
            config.len()
        );

        Ok(Self {
            config,
            correlator: AnnotationCorrelator::new(sensor, annotation_id, sync_readback),
            builder: Mutex::new(RecordBuilder::new()),
            overlay: None,
        })
    }

    /// Attach an overlay sink receiving each reported frame's records
    pub fn with_overlay(mut self, overlay: Box<dyn OverlaySink + Send + Sync>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    /// Called once when a frame begins rendering
    pub fn on_frame_begin(&self, frame_id: u64) {
        self.correlator.open_for_frame(frame_id);
    }

    /// Called when detection results for a frame become available.
    ///
    /// Returns true when the frame was open and its annotation was
    /// reported. Results for unknown or already-closed frames are
    /// dropped silently.
    pub fn on_detections_ready(&self, frame_id: u64, objects: &[DetectedObject]) -> bool {
        let mut builder = self.builder.lock().unwrap();
        let records = builder.build(objects, &self.config);

        let reported = self.correlator.try_close_for_frame(frame_id, records);
        if reported {
            // Overlay runs after the report so it can never affect it.
            if let Some(overlay) = &self.overlay {
                overlay.frame_records(frame_id, records);
            }
        }
        reported
    }

    /// Number of frames opened but not yet reported
    pub fn pending_frames(&self) -> usize {
        self.correlator.pending_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label_config::LabelEntry;
    use crate::record_builder::{BoundingBox, BoundingBoxRecord};
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct RecordingSensor {
        frame: AtomicU64,
        issued: AtomicU64,
        definitions: Mutex<Vec<AnnotationDefinition>>,
        reports: Mutex<Vec<Vec<BoundingBoxRecord>>>,
    }

    impl AnnotationSensor for RecordingSensor {
        type Handle = u64;

        fn register_definition(&self, definition: &AnnotationDefinition) {
            self.definitions.lock().unwrap().push(definition.clone());
        }

        fn request_annotation_handle(&self, _definition_id: &str) -> u64 {
            self.issued.fetch_add(1, Ordering::SeqCst)
        }

        fn report(&self, _handle: u64, records: &[BoundingBoxRecord]) {
            self.reports.lock().unwrap().push(records.to_vec());
        }

        fn current_frame(&self) -> u64 {
            self.frame.load(Ordering::SeqCst)
        }
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

    fn object(instance_id: u32, label: &str) -> DetectedObject {
        DetectedObject {
            instance_id,
            labels: vec![label.to_string()],
            bbox: BoundingBox { x: 0.0, y: 0.0, width: 5.0, height: 5.0 },
        }
    }

    #[test]
    fn empty_config_is_a_fatal_setup_error() {
        let sensor = Arc::new(RecordingSensor::default());
        let empty = LabelConfig {
            entries: Vec::new(),
            auto_assign_ids: false,
            starting_id: 0,
        };

        let result = BoundingBoxLabeler::new(sensor, empty, "bounding_box", "2D bounding box", false);
        assert!(result.is_err());
    }

    #[test]
    fn definition_is_registered_at_startup() {
        let sensor = Arc::new(RecordingSensor::default());
        let labeler = BoundingBoxLabeler::new(
            Arc::clone(&sensor),
            config(),
            "bounding_box",
            "2D bounding box",
            false,
        )
        .unwrap();

        let definitions = sensor.definitions.lock().unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].id, "bounding_box");
        assert_eq!(definitions[0].spec.len(), 2);
        drop(definitions);

        assert_eq!(labeler.pending_frames(), 0);
    }

    #[test]
    fn detections_close_the_matching_frame() {
        let sensor = Arc::new(RecordingSensor::default());
        let labeler = BoundingBoxLabeler::new(
            Arc::clone(&sensor),
            config(),
            "bounding_box",
            "2D bounding box",
            false,
        )
        .unwrap();

        labeler.on_frame_begin(1);
        labeler.on_frame_begin(2);

        let objects = vec![object(7, "car"), object(8, "unknown")];
        assert!(labeler.on_detections_ready(1, &objects));
        assert_eq!(labeler.pending_frames(), 1);

        let reports = sensor.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].len(), 1);
        assert_eq!(reports[0][0].instance_id, 7);
        assert_eq!(reports[0][0].label_id, 1);
    }

    #[test]
    fn detections_for_unknown_frames_are_dropped() {
        let sensor = Arc::new(RecordingSensor::default());
        let labeler = BoundingBoxLabeler::new(
            Arc::clone(&sensor),
            config(),
            "bounding_box",
            "2D bounding box",
            false,
        )
        .unwrap();

        assert!(!labeler.on_detections_ready(42, &[object(1, "car")]));
        assert!(sensor.reports.lock().unwrap().is_empty());
    }

    #[test]
    fn overlay_receives_reported_records() {
        struct CountingOverlay {
            frames: Mutex<Vec<(u64, usize)>>,
        }

        impl OverlaySink for CountingOverlay {
            fn frame_records(&self, frame_id: u64, records: &[BoundingBoxRecord]) {
                self.frames.lock().unwrap().push((frame_id, records.len()));
            }
        }

        let overlay = Arc::new(CountingOverlay { frames: Mutex::new(Vec::new()) });

        struct SharedOverlay(Arc<CountingOverlay>);
        impl OverlaySink for SharedOverlay {
            fn frame_records(&self, frame_id: u64, records: &[BoundingBoxRecord]) {
                self.0.frame_records(frame_id, records);
            }
        }

        let sensor = Arc::new(RecordingSensor::default());
        let labeler = BoundingBoxLabeler::new(
            Arc::clone(&sensor),
            config(),
            "bounding_box",
            "2D bounding box",
            false,
        )
        .unwrap()
        .with_overlay(Box::new(SharedOverlay(Arc::clone(&overlay))));

        labeler.on_frame_begin(1);
        labeler.on_detections_ready(1, &[object(1, "car")]);

        // Closed frames do not notify the overlay again.
        labeler.on_detections_ready(1, &[object(2, "car")]);

        let frames = overlay.frames.lock().unwrap();
        assert_eq!(*frames, vec![(1, 1)]);
    }
}
