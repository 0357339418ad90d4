/// Frame/result correlation for asynchronous annotation readback
///
/// The render pipeline and the detection-results pipeline run
/// independently of each other: an annotation is requested when a frame
/// starts rendering, but its detection results may only come back a few
/// frames later, and not necessarily in submission order. This module
/// holds the open annotation handle for every in-flight frame in a table
/// keyed by frame identifier, which is the only correlation mechanism
/// between the two event streams. Ordering assumptions between the
/// streams are never relied on.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::warn;

use crate::record_builder::BoundingBoxRecord;
use crate::sensor::AnnotationSensor;

/// Tracks one pending annotation handle per in-flight frame.
///
/// `open_for_frame` and `try_close_for_frame` may be called from
/// different threads or callback contexts; the pending table is the only
/// shared mutable state and is guarded accordingly.
pub struct AnnotationCorrelator<S: AnnotationSensor> {
    sensor: Arc<S>,
    definition_id: String,
    sync_readback: bool,
    pending: Mutex<HashMap<u64, S::Handle>>,
}

impl<S: AnnotationSensor> AnnotationCorrelator<S> {
    /// `sync_readback` declares that the host guarantees results arrive on
    /// the frame they were requested; it only enables an ordering
    /// diagnostic and never changes reporting behavior.
    pub fn new(sensor: Arc<S>, definition_id: &str, sync_readback: bool) -> Self {
        Self {
            sensor,
            definition_id: definition_id.to_string(),
            sync_readback,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Open a pending annotation for a frame that begins rendering.
    ///
    /// Opening a frame id that is already open is a logic error in the
    /// caller; the new handle silently replaces the old one.
    pub fn open_for_frame(&self, frame_id: u64) {
        let handle = self.sensor.request_annotation_handle(&self.definition_id);
        self.pending.lock().unwrap().insert(frame_id, handle);
    }

    /// Close and report the pending annotation for `frame_id`.
    ///
    /// Returns false without reporting when no entry is open for that
    /// frame (results for a frame that was never opened or was already
    /// closed). That is a normal condition under asynchronous readback
    /// and is tolerated silently.
    pub fn try_close_for_frame(&self, frame_id: u64, records: &[BoundingBoxRecord]) -> bool {
        let handle = match self.pending.lock().unwrap().remove(&frame_id) {
            Some(handle) => handle,
            None => return false,
        };

        if self.sync_readback {
            let current = self.sensor.current_frame();
            if frame_id != current {
                // Diagnostic only; the keyed lookup above already
                // correlated the result correctly.
                warn!(
                    "Readback is declared synchronous but frame {} closed while the host is on frame {}",
                    frame_id, current
                );
            }
        }

        self.sensor.report(handle, records);
        true
    }

    /// Number of frames still waiting for detection results
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
