/// Label configuration parsing and resolution
///
/// A label configuration is an ordered list of label entries. The order of
/// entries is significant: it participates in the tie-break rule used when
/// an object carries several candidate labels.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One canonical label an object can resolve to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelEntry {
    #[serde(default)]
    pub id: i32,
    pub label: String,
    #[serde(default)]
    pub segmentation_value: i32,
}

/// Ordered set of label entries loaded from a YAML or JSON file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelConfig {
    pub entries: Vec<LabelEntry>,

    /// Overwrite entry ids with sequential values at load time
    #[serde(default)]
    pub auto_assign_ids: bool,

    /// First id handed out when auto-assigning (0 or 1)
    #[serde(default)]
    pub starting_id: i32,
}

impl LabelConfig {
    /// Load a label configuration from a YAML or JSON file.
    ///
    /// The format is picked from the file extension; anything that is not
    /// `.json` is treated as YAML.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read label configuration {}: {}", path.display(), e))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, String> {
        let mut config: LabelConfig = serde_yaml::from_str(content)
            .map_err(|e| format!("Failed to parse label configuration YAML: {}", e))?;
        config.apply_auto_ids();
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, String> {
        let mut config: LabelConfig = serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse label configuration JSON: {}", e))?;
        config.apply_auto_ids();
        Ok(config)
    }

    /// Rewrite entry ids sequentially starting at `starting_id`
    fn apply_auto_ids(&mut self) {
        if !self.auto_assign_ids {
            return;
        }
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.id = self.starting_id + i as i32;
        }
    }

    /// Validate the configuration and filter out unusable entries.
    /// Returns the number of skipped entries and warnings.
    pub fn validate_and_clean(&mut self) -> (usize, Vec<String>) {
        let mut warnings = Vec::new();

        if self.starting_id != 0 && self.starting_id != 1 {
            warnings.push(format!(
                "starting_id must be 0 or 1, got {}; using 0",
                self.starting_id
            ));
            self.starting_id = 0;
            self.apply_auto_ids();
        }

        let original_count = self.entries.len();
        let mut seen: HashSet<String> = HashSet::new();

        self.entries.retain(|entry| {
            if entry.label.is_empty() {
                warnings.push(format!("Skipping entry {}: empty label string", entry.id));
                return false;
            }
            if !seen.insert(entry.label.clone()) {
                warnings.push(format!(
                    "Skipping entry {}: duplicate label \"{}\"",
                    entry.id, entry.label
                ));
                return false;
            }
            true
        });

        let skipped_count = original_count - self.entries.len();
        (skipped_count, warnings)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolve an object's label set against this configuration.
    ///
    /// The object's own label ordering drives priority: each of its labels
    /// is tried in turn, and the first one that names any configuration
    /// entry wins. The configuration order only decides between entries
    /// matching the same label string. Comparison is exact (case-sensitive).
    ///
    /// Returns the matching entry and its index in the configuration, or
    /// `None` when nothing matches (callers skip the object in that case).
    pub fn resolve(&self, label_set: &[String]) -> Option<(&LabelEntry, usize)> {
        for label in label_set {
            for (index, entry) in self.entries.iter().enumerate() {
                if entry.label == *label {
                    return Some((entry, index));
                }
            }
        }
        None
    }
}
