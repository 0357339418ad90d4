/// Bounding box overlay output
///
/// Optional per-frame consumer of the finished records, used to eyeball
/// what the labeler is reporting. Strictly one-way: the labeler never
/// depends on a sink's completion or success, and reporting has already
/// happened by the time a sink is notified.
use log::debug;

use crate::record_builder::BoundingBoxRecord;

/// Maximum number of records printed per frame before truncating
const MAX_OVERLAY_LINES: usize = 10;

/// One-way consumer of per-frame record lists
pub trait OverlaySink {
    fn frame_records(&self, frame_id: u64, records: &[BoundingBoxRecord]);
}

/// Prints record overlays to the log
#[derive(Debug, Default)]
pub struct ConsoleOverlay;

impl ConsoleOverlay {
    pub fn new() -> Self {
        Self
    }
}

impl OverlaySink for ConsoleOverlay {
    fn frame_records(&self, frame_id: u64, records: &[BoundingBoxRecord]) {
        if records.is_empty() {
            return;
        }

        for record in records.iter().take(MAX_OVERLAY_LINES) {
            debug!(
                "frame {}: {} [{:.0},{:.0}] {:.0}x{:.0}",
                frame_id, record.label_name, record.x, record.y, record.width, record.height
            );
        }

        if records.len() > MAX_OVERLAY_LINES {
            debug!(
                "frame {}: ... {} more",
                frame_id,
                records.len() - MAX_OVERLAY_LINES
            );
        }
    }
}
