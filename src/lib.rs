//! framelabeler: 2D bounding box annotation for rendered scenes.
//!
//! For every rendered frame the labeler computes a bounding box record per
//! visible labeled object and reports it through the host's sensor
//! abstraction. The host drives it with two events: frame-begin and
//! detection-results-ready, which may arrive on different threads and out
//! of order under asynchronous readback.
pub mod annotation_correlator;
pub mod build_info;
pub mod config;
pub mod label_config;
pub mod labeler;
pub mod logging;
pub mod overlay;
pub mod record_builder;
pub mod replay;
pub mod sensor;
pub mod settings;

pub use annotation_correlator::AnnotationCorrelator;
pub use label_config::{LabelConfig, LabelEntry};
pub use labeler::BoundingBoxLabeler;
pub use overlay::{ConsoleOverlay, OverlaySink};
pub use record_builder::{BoundingBox, BoundingBoxRecord, DetectedObject, RecordBuilder};
pub use sensor::{AnnotationDefinition, AnnotationSensor, LogSensor};
