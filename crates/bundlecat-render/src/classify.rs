use crate::labels::{LabelSet, CONFIGS_LOCATION_LABEL, DB_LOCATION_LABEL};
use serde::Serialize;
use std::fmt;

/// Physical representation of a catalog image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogFormat {
    LegacyDatabase,
    FileBased,
    Unknown,
}

impl CatalogFormat {
    /// Whether the image carries a catalog the merge path can render.
    pub fn has_catalog_content(self) -> bool {
        !matches!(self, CatalogFormat::Unknown)
    }
}

impl fmt::Display for CatalogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogFormat::LegacyDatabase => write!(f, "legacy-database"),
            CatalogFormat::FileBased => write!(f, "file-based"),
            CatalogFormat::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify an index image by its location labels.
///
/// A configs label wins over a database label when both are present.
pub fn classify(labels: &LabelSet) -> CatalogFormat {
    if labels.contains(CONFIGS_LOCATION_LABEL) {
        CatalogFormat::FileBased
    } else if labels.contains(DB_LOCATION_LABEL) {
        CatalogFormat::LegacyDatabase
    } else {
        CatalogFormat::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_label_is_legacy() {
        let labels = LabelSet::new().with(DB_LOCATION_LABEL, "/database/index.db");
        assert_eq!(classify(&labels), CatalogFormat::LegacyDatabase);
        assert!(classify(&labels).has_catalog_content());
    }

    #[test]
    fn configs_label_is_file_based() {
        let labels = LabelSet::new().with(CONFIGS_LOCATION_LABEL, "/configs");
        assert_eq!(classify(&labels), CatalogFormat::FileBased);
    }

    #[test]
    fn both_labels_prefer_file_based() {
        let labels = LabelSet::new()
            .with(DB_LOCATION_LABEL, "/database/index.db")
            .with(CONFIGS_LOCATION_LABEL, "/configs");
        assert_eq!(classify(&labels), CatalogFormat::FileBased);
    }

    #[test]
    fn no_labels_is_unknown() {
        let labels = LabelSet::new().with("maintainer", "someone");
        assert_eq!(classify(&labels), CatalogFormat::Unknown);
        assert!(!classify(&labels).has_catalog_content());
    }

    #[test]
    fn display_names() {
        assert_eq!(CatalogFormat::LegacyDatabase.to_string(), "legacy-database");
        assert_eq!(CatalogFormat::FileBased.to_string(), "file-based");
        assert_eq!(CatalogFormat::Unknown.to_string(), "unknown");
    }
}
