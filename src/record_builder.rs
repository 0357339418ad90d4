/// Per-frame bounding box record construction
///
/// Builds the reported record list for one frame from the detection
/// results, dropping objects whose label set resolves to nothing.
use serde::{Deserialize, Serialize};

use crate::label_config::{LabelConfig, LabelEntry};

/// Axis-aligned bounding box in sensor/image space
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Convert (x, y, w, h) to top-left and bottom-right corners
    pub fn to_corners(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// One detection produced by the host's rendering/detection pipeline.
///
/// `labels` is the ordered label set of the entity this detection came
/// from; the order is a priority list, not an unordered bag.
#[derive(Debug, Clone)]
pub struct DetectedObject {
    pub instance_id: u32,
    pub labels: Vec<String>,
    pub bbox: BoundingBox,
}

/// The reported annotation unit for one matched detected object
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BoundingBoxRecord {
    pub label_id: i32,
    pub label_name: String,
    pub instance_id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBoxRecord {
    pub fn new(entry: &LabelEntry, object: &DetectedObject) -> Self {
        Self {
            label_id: entry.id,
            label_name: entry.label.clone(),
            instance_id: object.instance_id,
            x: object.bbox.x,
            y: object.bbox.y,
            width: object.bbox.width,
            height: object.bbox.height,
        }
    }
}

/// Builds the record list for each frame into a reusable buffer.
///
/// The buffer is reallocated only when the frame's detected-object count
/// differs from the count it was last sized for; when the count is stable
/// across frames it is cleared and refilled in place.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    buffer: Vec<BoundingBoxRecord>,
    sized_for: usize,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            sized_for: 0,
        }
    }

    /// Build the records for one frame, in detection order.
    ///
    /// Unmatched objects are dropped, so the output length is the matched
    /// count, which may be less than `objects.len()`.
    pub fn build(
        &mut self,
        objects: &[DetectedObject],
        config: &LabelConfig,
    ) -> &[BoundingBoxRecord] {
        if objects.len() != self.sized_for {
            self.buffer = Vec::with_capacity(objects.len());
            self.sized_for = objects.len();
        } else {
            self.buffer.clear();
        }

        for object in objects {
            if let Some((entry, _index)) = config.resolve(&object.labels) {
                self.buffer.push(BoundingBoxRecord::new(entry, object));
            }
        }

        &self.buffer
    }

    /// Object count the internal buffer was last allocated for
    pub fn allocated_for(&self) -> usize {
        self.sized_for
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
            bbox: BoundingBox { x: 1.0, y: 2.0, width: 3.0, height: 4.0 },
        }
    }

    #[test]
    fn record_preserves_entry_and_object_fields() {
        let config = config();
        let object = DetectedObject {
            instance_id: 42,
            labels: vec!["pedestrian".to_string()],
            bbox: BoundingBox { x: 10.5, y: 20.25, width: 100.0, height: 200.0 },
        };

        let mut builder = RecordBuilder::new();
        let records = builder.build(std::slice::from_ref(&object), &config);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.label_id, 2);
        assert_eq!(record.label_name, "pedestrian");
        assert_eq!(record.instance_id, 42);
        assert_eq!(record.x, 10.5);
        assert_eq!(record.y, 20.25);
        assert_eq!(record.width, 100.0);
        assert_eq!(record.height, 200.0);
    }

    #[test]
    fn unmatched_objects_are_dropped_in_order() {
        let config = config();
        let objects = vec![
            object(1, "car"),
            object(2, "unknown"),
            object(3, "pedestrian"),
        ];

        let mut builder = RecordBuilder::new();
        let records = builder.build(&objects, &config);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].instance_id, 1);
        assert_eq!(records[1].instance_id, 3);
    }

    #[test]
    fn buffer_reallocates_only_when_object_count_changes() {
        let config = config();
        let mut builder = RecordBuilder::new();

        // Object counts 3, 3, 5, 1 across four frames; the second frame has
        // one unmatched object so its output is shorter than its input.
        let frame1 = vec![object(1, "car"), object(2, "car"), object(3, "car")];
        let frame2 = vec![object(4, "car"), object(5, "unknown"), object(6, "car")];
        let frame3 = vec![
            object(7, "car"),
            object(8, "car"),
            object(9, "pedestrian"),
            object(10, "car"),
            object(11, "car"),
        ];
        let frame4 = vec![object(12, "pedestrian")];

        assert_eq!(builder.build(&frame1, &config).len(), 3);
        assert_eq!(builder.allocated_for(), 3);

        assert_eq!(builder.build(&frame2, &config).len(), 2);
        assert_eq!(builder.allocated_for(), 3);

        assert_eq!(builder.build(&frame3, &config).len(), 5);
        assert_eq!(builder.allocated_for(), 5);

        assert_eq!(builder.build(&frame4, &config).len(), 1);
        assert_eq!(builder.allocated_for(), 1);
    }

    #[test]
    fn bbox_corners() {
        let bbox = BoundingBox { x: 10.0, y: 20.0, width: 30.0, height: 40.0 };
        assert_eq!(bbox.to_corners(), (10.0, 20.0, 40.0, 60.0));
    }
}
