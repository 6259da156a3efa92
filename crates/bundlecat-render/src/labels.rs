use crate::LabelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Present on index images whose catalog is a legacy database.
pub const DB_LOCATION_LABEL: &str = "operators.operatorframework.io.index.database.v1";
/// Present on index images that ship a file-based catalog.
pub const CONFIGS_LOCATION_LABEL: &str = "operators.operatorframework.io.index.configs.v1";

pub const PACKAGE_LABEL: &str = "operators.operatorframework.io.bundle.package.v1";
pub const CHANNELS_LABEL: &str = "operators.operatorframework.io.bundle.channels.v1";
pub const DEFAULT_CHANNEL_LABEL: &str = "operators.operatorframework.io.bundle.channel.default.v1";

/// Labels from an image configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Package and channel a bundle image declares for itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleLabels {
    pub package: String,
    /// First entry of the comma-separated channels label. The default
    /// channel label is not consulted.
    pub channel: String,
}

impl BundleLabels {
    pub fn from_labels(image: &str, labels: &LabelSet) -> Result<Self, LabelError> {
        let package = required(image, labels, PACKAGE_LABEL)?.to_owned();

        let channels = required(image, labels, CHANNELS_LABEL)?;
        let channel = channels
            .split(',')
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LabelError::EmptyLabel {
                image: image.to_owned(),
                label: CHANNELS_LABEL.to_owned(),
            })?
            .to_owned();

        Ok(Self { package, channel })
    }
}

fn required<'a>(image: &str, labels: &'a LabelSet, label: &str) -> Result<&'a str, LabelError> {
    let value = labels.get(label).ok_or_else(|| LabelError::MissingLabel {
        image: image.to_owned(),
        label: label.to_owned(),
    })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(LabelError::EmptyLabel {
            image: image.to_owned(),
            label: label.to_owned(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle_labels(channels: &str) -> LabelSet {
        LabelSet::new()
            .with(PACKAGE_LABEL, "etcd")
            .with(CHANNELS_LABEL, channels)
    }

    #[test]
    fn takes_first_channel() {
        let labels = BundleLabels::from_labels("b", &bundle_labels("stable, alpha")).unwrap();
        assert_eq!(labels.package, "etcd");
        assert_eq!(labels.channel, "stable");
    }

    #[test]
    fn default_channel_label_does_not_pick_the_channel() {
        let set = bundle_labels("stable,alpha").with(DEFAULT_CHANNEL_LABEL, "alpha");
        let labels = BundleLabels::from_labels("b", &set).unwrap();
        assert_eq!(
            labels,
            BundleLabels {
                package: "etcd".to_owned(),
                channel: "stable".to_owned(),
            }
        );
    }

    #[test]
    fn missing_package_label_is_an_error() {
        let set = LabelSet::new().with(CHANNELS_LABEL, "stable");
        let err = BundleLabels::from_labels("quay.io/x/b:v1", &set).unwrap_err();
        assert!(err.to_string().contains(PACKAGE_LABEL));
        assert!(matches!(err, LabelError::MissingLabel { .. }));
    }

    #[test]
    fn empty_first_channel_is_an_error() {
        let err = BundleLabels::from_labels("b", &bundle_labels(",stable")).unwrap_err();
        assert!(matches!(err, LabelError::EmptyLabel { .. }));
    }

    #[test]
    fn label_set_serializes_as_map() {
        let set: LabelSet = [("a", "1"), ("b", "2")].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"a":"1","b":"2"}"#);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next(), Some(("a", "1")));
    }
}
