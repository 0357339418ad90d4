use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use log::{debug, info, warn, error};

/// User-specific settings that persist across capture sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    /// Treat readback as synchronous and flag frame-ordering anomalies
    #[serde(default)]
    pub sync_readback: bool,

    /// Deliver detection results this many frames after the request
    #[serde(default = "default_readback_latency_frames")]
    pub readback_latency_frames: usize,

    /// Print reported records as an overlay in the log
    #[serde(default = "default_show_overlay")]
    pub show_overlay: bool,

    /// Stable identifier of the registered annotation type
    #[serde(default = "default_annotation_id")]
    pub annotation_id: String,

    /// Human-readable name of the registered annotation type
    #[serde(default = "default_annotation_name")]
    pub annotation_name: String,
}

fn default_readback_latency_frames() -> usize {
    2
}

fn default_show_overlay() -> bool {
    true
}

fn default_annotation_id() -> String {
    "bounding_box".to_string()
}

fn default_annotation_name() -> String {
    "2D bounding box".to_string()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            sync_readback: false,
            readback_latency_frames: 2,
            show_overlay: true,
            annotation_id: "bounding_box".to_string(),
            annotation_name: "2D bounding box".to_string(),
        }
    }
}

impl UserSettings {
    /// Get the path to the settings file
    /// On macOS: ~/Library/Application Support/framelabeler/settings.yaml
    /// On Linux: ~/.config/framelabeler/settings.yaml
    /// On Windows: C:\Users\<user>\AppData\Roaming\framelabeler\settings.yaml
    pub fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        let app_config_dir = config_dir.join("framelabeler");
        app_config_dir.join("settings.yaml")
    }

    /// Load settings from the YAML file
    /// If custom_path is provided, uses that path; otherwise uses the default settings path
    pub fn load(custom_path: Option<&str>) -> Self {
        let path = match custom_path {
            Some(p) => {
                info!("Using custom settings path: {}", p);
                PathBuf::from(p)
            }
            None => Self::settings_path(),
        };

        if !path.exists() {
            info!("Settings file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => {
                match serde_yaml::from_str::<UserSettings>(&contents) {
                    Ok(settings) => {
                        info!("Loaded settings from {:?}", path);
                        debug!("Settings: sync_readback={}, latency={}, show_overlay={}",
                            settings.sync_readback, settings.readback_latency_frames, settings.show_overlay);
                        settings
                    }
                    Err(e) => {
                        error!("Failed to parse settings file at {:?}: {}", path, e);
                        warn!("Using default settings");
                        Self::default()
                    }
                }
            }
            Err(e) => {
                error!("Failed to read settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to the YAML file while preserving comments
    pub fn save(&self) -> Result<(), String> {
        let path = Self::settings_path();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create settings directory: {}", e))?;
            }
        }

        // If file exists, try to preserve comments by doing in-place value updates
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    let updated = self.update_yaml_values(&contents);
                    fs::write(&path, updated)
                        .map_err(|e| format!("Failed to write settings file: {}", e))?;
                    info!("Saved settings to {:?} (comments preserved)", path);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Failed to read existing settings file for comment preservation: {}", e);
                    // Fall through to create new file
                }
            }
        }

        // File doesn't exist or couldn't be read, create with comments
        let yaml = self.to_yaml_with_comments();
        fs::write(&path, yaml)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Update YAML values while preserving existing comments and structure
    fn update_yaml_values(&self, yaml_content: &str) -> String {
        let mut result = yaml_content.to_string();

        // Update each field using regex to replace the value while keeping comments
        result = Self::replace_yaml_value(&result, "sync_readback", &self.sync_readback.to_string());
        result = Self::replace_yaml_value(&result, "readback_latency_frames", &self.readback_latency_frames.to_string());
        result = Self::replace_yaml_value(&result, "show_overlay", &self.show_overlay.to_string());
        result = Self::replace_yaml_value(&result, "annotation_id", &format!("\"{}\"", self.annotation_id));
        result = Self::replace_yaml_value(&result, "annotation_name", &format!("\"{}\"", self.annotation_name));

        result
    }

    /// Replace a YAML key's value while preserving the rest of the line
    fn replace_yaml_value(yaml: &str, key: &str, new_value: &str) -> String {
        let pattern = format!(r"(?m)^(\s*{}\s*:\s*).*$", regex::escape(key));
        let replacement = format!("${{1}}{}", new_value);

        // Use regex crate for replacement
        match regex::Regex::new(&pattern) {
            Ok(re) => re.replace_all(yaml, replacement.as_str()).to_string(),
            Err(e) => {
                warn!("Failed to create regex for key '{}': {}", key, e);
                yaml.to_string()
            }
        }
    }

    /// Generate YAML content with comments for new files
    fn to_yaml_with_comments(&self) -> String {
        format!(
            r#"# framelabeler User Settings
# This file is loaded automatically when the application starts.
# Settings specified here will override the default values.

# Treat readback as synchronous: results are expected on the same frame
# they were requested, and a mismatch is flagged as a warning
sync_readback: {}

# Number of frames between an annotation request and the delivery of its
# detection results during replay (0 = same frame)
readback_latency_frames: {}

# Print reported records as an overlay in the log
show_overlay: {}

# Stable identifier of the registered annotation type
annotation_id: "{}"

# Human-readable name of the registered annotation type
annotation_name: "{}"
"#,
            self.sync_readback,
            self.readback_latency_frames,
            self.show_overlay,
            self.annotation_id,
            self.annotation_name
        )
    }
}
