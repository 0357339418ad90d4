/// Sensor/host boundary
///
/// The labeler never renders or detects anything itself; it talks to the
/// host's sensor stack through this interface. The host issues annotation
/// handles when asked, accepts finished reports, and exposes its frame
/// counter for ordering diagnostics.
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;
use serde::{Deserialize, Serialize};

use crate::label_config::LabelEntry;
use crate::record_builder::BoundingBoxRecord;

/// Annotation-type descriptor registered with the host once at startup.
///
/// The `spec` payload is the exported label entry array, so downstream
/// consumers can map reported label ids back to names without access to
/// the original configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnnotationDefinition {
    pub id: String,
    pub name: String,
    pub spec: Vec<LabelEntry>,
}

/// Host-side sensor abstraction consumed by the labeler
pub trait AnnotationSensor {
    /// Opaque pending-annotation handle issued per frame
    type Handle;

    /// Register the annotation-type descriptor. Called once at setup.
    fn register_definition(&self, definition: &AnnotationDefinition);

    /// Request a pending annotation handle for the current frame
    fn request_annotation_handle(&self, definition_id: &str) -> Self::Handle;

    /// Report a finished annotation. Consumes the handle.
    fn report(&self, handle: Self::Handle, records: &[BoundingBoxRecord]);

    /// The host's current frame counter
    fn current_frame(&self) -> u64;
}

/// Handle issued by [`LogSensor`]
#[derive(Debug)]
pub struct LogHandle {
    pub definition_id: String,
    pub sequence: u64,
}

/// Console-backed sensor used by the replay CLI.
///
/// Stands in for a real rendering host: handles are sequence numbers and
/// reports are logged, with the record payload serialized to JSON so the
/// output can be eyeballed or grepped.
#[derive(Debug, Default)]
pub struct LogSensor {
    frame: AtomicU64,
    issued: AtomicU64,
    reported: AtomicU64,
}

impl LogSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the simulated host frame counter
    pub fn set_frame(&self, frame: u64) {
        self.frame.store(frame, Ordering::SeqCst);
    }

    pub fn issued_handles(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn reported_annotations(&self) -> u64 {
        self.reported.load(Ordering::SeqCst)
    }
}

impl AnnotationSensor for LogSensor {
    type Handle = LogHandle;

    fn register_definition(&self, definition: &AnnotationDefinition) {
        info!(
            "Registered annotation definition \"{}\" ({}) with {} label entries",
            definition.name,
            definition.id,
            definition.spec.len()
        );
    }

    fn request_annotation_handle(&self, definition_id: &str) -> LogHandle {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst);
        LogHandle {
            definition_id: definition_id.to_string(),
            sequence,
        }
    }

    fn report(&self, handle: LogHandle, records: &[BoundingBoxRecord]) {
        self.reported.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::to_string(records)
            .unwrap_or_else(|e| format!("<serialization failed: {}>", e));
        info!(
            "Annotation {}#{}: {} record(s) {}",
            handle.definition_id,
            handle.sequence,
            records.len(),
            payload
        );
    }

    fn current_frame(&self) -> u64 {
        self.frame.load(Ordering::SeqCst)
    }
}
