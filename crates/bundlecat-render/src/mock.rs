use crate::labels::{LabelSet, CHANNELS_LABEL, CONFIGS_LOCATION_LABEL, PACKAGE_LABEL};
use crate::source::{CatalogRenderer, LabelSource};
use crate::{LabelError, RenderError};
use bundlecat_schema::{
    Bundle, Channel, ChannelEntry, DeclarativeConfig, Package, Property, PROPERTY_CSV_METADATA,
    SCHEMA_BUNDLE, SCHEMA_CHANNEL, SCHEMA_PACKAGE,
};
use std::collections::HashMap;
use std::sync::Mutex;

struct MockImage {
    labels: LabelSet,
    catalog: Option<DeclarativeConfig>,
}

/// In-memory image source. Records every label read and render call.
#[derive(Default)]
pub struct MockSource {
    images: HashMap<String, MockImage>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_image(
        mut self,
        image: &str,
        labels: LabelSet,
        catalog: Option<DeclarativeConfig>,
    ) -> Self {
        self.add_image(image, labels, catalog);
        self
    }

    pub fn add_image(&mut self, image: &str, labels: LabelSet, catalog: Option<DeclarativeConfig>) {
        self.images
            .insert(image.to_owned(), MockImage { labels, catalog });
    }

    /// Calls made so far, as `labels:<image>` or `render:<image>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn render_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("render:"))
            .count()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl LabelSource for MockSource {
    fn labels(&self, image: &str) -> Result<LabelSet, LabelError> {
        self.record(format!("labels:{image}"));
        self.images
            .get(image)
            .map(|i| i.labels.clone())
            .ok_or_else(|| LabelError::ImageNotFound(image.to_owned()))
    }
}

impl CatalogRenderer for MockSource {
    fn render(&self, image: &str) -> Result<DeclarativeConfig, RenderError> {
        self.record(format!("render:{image}"));
        let found = self
            .images
            .get(image)
            .ok_or_else(|| RenderError::ImageNotFound(image.to_owned()))?;
        found
            .catalog
            .clone()
            .ok_or_else(|| RenderError::NoContent(image.to_owned()))
    }
}

/// Labels of a bundle image declaring `package` and `channels`.
pub fn bundle_labels(package: &str, channels: &str) -> LabelSet {
    LabelSet::new()
        .with(PACKAGE_LABEL, package)
        .with(CHANNELS_LABEL, channels)
}

/// Labels of a file-based index image.
pub fn file_based_index_labels() -> LabelSet {
    LabelSet::new().with(CONFIGS_LOCATION_LABEL, "/configs")
}

/// What rendering a single bundle image yields: its package, one channel
/// holding the bundle, and the bundle with a CSV metadata property.
pub fn bundle_render(package: &str, channel: &str, bundle: &str) -> DeclarativeConfig {
    DeclarativeConfig {
        packages: vec![Package {
            schema: SCHEMA_PACKAGE.to_owned(),
            name: package.to_owned(),
            default_channel: channel.to_owned(),
            icon: None,
            description: None,
            properties: Vec::new(),
        }],
        channels: vec![Channel {
            schema: SCHEMA_CHANNEL.to_owned(),
            name: channel.to_owned(),
            package: package.to_owned(),
            entries: vec![ChannelEntry::new(bundle)],
            properties: Vec::new(),
        }],
        bundles: vec![Bundle {
            schema: SCHEMA_BUNDLE.to_owned(),
            name: bundle.to_owned(),
            package: package.to_owned(),
            image: format!("quay.io/example/{package}-bundle:{bundle}"),
            properties: vec![
                Property {
                    property_type: "olm.package".to_owned(),
                    value: serde_json::json!({ "packageName": package, "version": "1.0.0" }),
                },
                Property {
                    property_type: PROPERTY_CSV_METADATA.to_owned(),
                    value: serde_json::json!({
                        "installModes": [
                            { "type": "OwnNamespace", "supported": true },
                            { "type": "SingleNamespace", "supported": true },
                            { "type": "MultiNamespace", "supported": false },
                            { "type": "AllNamespaces", "supported": true }
                        ]
                    }),
                },
            ],
            related_images: Vec::new(),
        }],
        others: Vec::new(),
    }
}
