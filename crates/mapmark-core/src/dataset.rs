//! Marker datasets
//!
//! A dataset is an ordered list of labeled positions. It can come from the
//! built-in table of US state capitals or from a TOML file:
//!
//! ```toml
//! [[marker]]
//! label = "AL"
//! position = [14.0, -1.0, 0.0]
//! ```
//!
//! Labels name the marker groups, so they must be non-empty and unique.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse dataset: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Marker {0} has an empty label")]
    EmptyLabel(usize),
    #[error("Duplicate marker label: {0}")]
    DuplicateLabel(String),
}

/// One labeled point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerEntry {
    pub label: String,
    pub position: [f64; 3],
}

impl MarkerEntry {
    pub fn new(label: &str, position: [f64; 3]) -> Self {
        Self {
            label: label.to_string(),
            position,
        }
    }

    pub fn position(&self) -> DVec3 {
        DVec3::from_array(self.position)
    }
}

/// An ordered, validated set of markers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, rename = "marker")]
    entries: Vec<MarkerEntry>,
}

impl Dataset {
    /// Build a dataset, rejecting empty or duplicate labels
    pub fn new(entries: Vec<MarkerEntry>) -> Result<Self, DatasetError> {
        let dataset = Self { entries };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Load a dataset from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a dataset from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, DatasetError> {
        let dataset: Dataset = toml::from_str(content)?;
        dataset.validate()?;
        Ok(dataset)
    }

    fn validate(&self) -> Result<(), DatasetError> {
        let mut seen = HashSet::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.label.trim().is_empty() {
                return Err(DatasetError::EmptyLabel(i));
            }
            if !seen.insert(entry.label.as_str()) {
                return Err(DatasetError::DuplicateLabel(entry.label.clone()));
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[MarkerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&MarkerEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// State capitals placed on the full-resolution US map, in map units
    pub fn us_state_capitals() -> Self {
        let entries = US_STATE_CAPITALS
            .iter()
            .map(|&(label, x, y, z)| MarkerEntry::new(label, [x, y, z]))
            .collect();
        Self { entries }
    }
}

const US_STATE_CAPITALS: [(&str, f64, f64, f64); 50] = [
    ("AL", 14.0, -1.0, 0.0),
    ("AK", -3.0, -25.0, 0.0),
    ("AZ", -25.5, 1.0, 0.0),
    ("AR", 5.5, 1.0, 0.0),
    ("CA", -37.5, 13.0, 0.0),
    ("CO", -13.0, 11.0, 0.0),
    ("CT", 32.0, 18.5, 0.0),
    ("DE", 29.5, 13.0, 0.0),
    ("FL", 19.0, -6.0, 0.0),
    ("GA", 18.0, 0.0, 0.0),
    ("HI", -35.0, -25.0, 0.0),
    ("ID", -28.0, 21.0, 0.0),
    ("IL", 9.0, 11.0, 0.0),
    ("IN", 14.0, 11.5, 0.0),
    ("IA", 3.0, 14.0, 0.0),
    ("KS", 0.0, 9.0, 0.0),
    ("KY", 16.0, 9.0, 0.0),
    ("LA", 8.0, -7.0, 0.0),
    ("ME", 35.0, 24.0, 0.0),
    ("MD", 28.0, 13.0, 0.0),
    ("MA", 34.0, 20.5, 0.0),
    ("MI", 16.0, 17.0, 0.0),
    ("MN", 4.0, 21.0, 0.0),
    ("MS", 9.0, -3.0, 0.0),
    ("MO", 5.5, 8.5, 0.0),
    ("MT", -21.0, 25.5, 0.0),
    ("NE", -1.0, 16.0, 0.0),
    ("NV", -35.0, 14.0, 0.0),
    ("NH", 33.0, 22.0, 0.0),
    ("NJ", 30.0, 15.0, 0.0),
    ("NM", -15.5, 3.5, 0.0),
    ("NY", 30.0, 20.0, 0.0),
    ("NC", 26.0, 5.5, 0.0),
    ("ND", -6.5, 24.0, 0.0),
    ("OH", 18.5, 12.0, 0.0),
    ("OK", -2.5, 2.5, 0.0),
    ("OR", -36.0, 25.5, 0.0),
    ("PA", 23.0, 14.0, 0.0),
    ("RI", 34.0, 19.0, 0.0),
    ("SC", 23.0, 2.0, 0.0),
    ("SD", -10.0, 19.0, 0.0),
    ("TN", 14.0, 4.5, 0.0),
    ("TX", -3.0, -7.5, 0.0),
    ("UT", -23.0, 14.0, 0.0),
    ("VT", 31.0, 23.0, 0.0),
    ("VA", 27.0, 9.0, 0.0),
    ("WA", -34.0, 30.0, 0.0),
    ("WV", 21.0, 9.5, 0.0),
    ("WI", 9.0, 17.0, 0.0),
    ("WY", -13.0, 14.0, 0.0),
];

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_table() {
        let dataset = Dataset::us_state_capitals();
        assert_eq!(dataset.len(), 50);
        assert!(dataset.validate().is_ok());
        assert_eq!(dataset.entries()[0].label, "AL");
        assert_eq!(dataset.get("WA").unwrap().position, [-34.0, 30.0, 0.0]);

        // positions are distinct, so marker names never collide
        let positions: HashSet<String> = dataset
            .entries()
            .iter()
            .map(|e| format!("{:?}", e.position))
            .collect();
        assert_eq!(positions.len(), 50);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
[[marker]]
label = "AL"
position = [14.0, -1.0, 0.0]

[[marker]]
label = "AK"
position = [-3.0, -25.0, 0.0]
"#;

        let dataset = Dataset::from_toml(toml).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.entries()[1].position(), DVec3::new(-3.0, -25.0, 0.0));
    }

    #[test]
    fn test_duplicate_label() {
        let toml = r#"
[[marker]]
label = "AL"
position = [14.0, -1.0, 0.0]

[[marker]]
label = "AL"
position = [1.0, 1.0, 0.0]
"#;

        let err = Dataset::from_toml(toml).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateLabel(ref l) if l == "AL"));
    }

    #[test]
    fn test_empty_label() {
        let err = Dataset::new(vec![MarkerEntry::new(" ", [0.0; 3])]).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyLabel(0)));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("markers.toml");
        std::fs::write(&path, "[[marker]]\nlabel = \"HI\"\nposition = [-35.0, -25.0, 0.0]\n")
            .unwrap();

        let dataset = Dataset::from_file(&path).unwrap();
        assert_eq!(dataset.get("HI").unwrap().position(), DVec3::new(-35.0, -25.0, 0.0));
        assert!(matches!(
            Dataset::from_file(&temp_dir.path().join("missing.toml")),
            Err(DatasetError::IoError(_))
        ));
    }

    #[test]
    fn test_empty_document() {
        assert!(Dataset::from_toml("").unwrap().is_empty());
    }
}
