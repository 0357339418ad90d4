use once_cell::sync::Lazy;
use crate::settings::UserSettings;

// Default values for configuration
// These serve as fallback values and can be used for "reset to defaults" functionality
pub const DEFAULT_READBACK_LATENCY_FRAMES: usize = 2;
pub const DEFAULT_SYNC_READBACK: bool = false;
pub const DEFAULT_SHOW_OVERLAY: bool = true;
pub const DEFAULT_ANNOTATION_ID: &str = "bounding_box";
pub const DEFAULT_ANNOTATION_NAME: &str = "2D bounding box";

pub struct Config {
    pub sync_readback: bool,                // Whether readback is declared synchronous
    pub readback_latency_frames: usize,     // Replay delivery delay in frames
    pub show_overlay: bool,                 // Log reported records as an overlay
    pub annotation_id: String,              // Registered annotation type id
    pub annotation_name: String,            // Registered annotation type display name
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    // Load settings from YAML file
    let settings = UserSettings::load(None);

    Config {
        sync_readback: settings.sync_readback,
        readback_latency_frames: settings.readback_latency_frames,
        show_overlay: settings.show_overlay,
        annotation_id: settings.annotation_id,
        annotation_name: settings.annotation_name,
    }
});
