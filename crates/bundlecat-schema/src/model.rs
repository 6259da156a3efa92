use crate::declcfg::{DeclarativeConfig, Icon, Property, RelatedImage};
use crate::types::{BundleName, ChannelName, PackageName};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("package name must not be empty")]
    EmptyPackageName,
    #[error("duplicate package '{0}'")]
    DuplicatePackage(String),
    #[error("package '{0}' contains a channel with an empty name")]
    EmptyChannelName(String),
    #[error("package '{0}' contains a bundle with an empty name")]
    EmptyBundleName(String),
    #[error("channel '{channel}' references unknown package '{package}'")]
    UnknownChannelPackage { package: String, channel: String },
    #[error("package '{package}' has duplicate channel '{channel}'")]
    DuplicateChannel { package: String, channel: String },
    #[error("bundle '{bundle}' references unknown package '{package}'")]
    UnknownBundlePackage { package: String, bundle: String },
    #[error("package '{package}' has duplicate bundle '{bundle}'")]
    DuplicateBundle { package: String, bundle: String },
    #[error("package '{package}', channel '{channel}': duplicate entry '{entry}'")]
    DuplicateEntry {
        package: String,
        channel: String,
        entry: String,
    },
    #[error(
        "package '{package}', channel '{channel}': entry '{entry}' does not name a bundle of the package"
    )]
    DanglingEntry {
        package: String,
        channel: String,
        entry: String,
    },
    #[error("package '{package}' default channel '{channel}' is not one of its channels")]
    UnknownDefaultChannel { package: String, channel: String },
    #[error("package '{0}' has no channels")]
    NoChannels(String),
    #[error("package '{package}', channel '{channel}' has no entries")]
    EmptyChannel { package: String, channel: String },
    #[error("package '{package}', channel '{channel}': expected exactly one channel head, found {heads:?}")]
    ChannelHeads {
        package: String,
        channel: String,
        heads: Vec<String>,
    },
    #[error("package '{package}': bundle '{bundle}' is not an entry of any channel")]
    OrphanBundle { package: String, bundle: String },
}

/// Name-resolved view of a snapshot, keyed for order-insensitive comparison.
///
/// Channel entry order is kept; everything else is sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub packages: BTreeMap<PackageName, ModelPackage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPackage {
    pub name: PackageName,
    pub default_channel: ChannelName,
    pub description: Option<String>,
    pub icon: Option<Icon>,
    pub properties: Vec<Property>,
    pub channels: BTreeMap<ChannelName, ModelChannel>,
    pub bundles: BTreeMap<BundleName, ModelBundle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelChannel {
    pub name: ChannelName,
    pub entries: Vec<ModelEntry>,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub bundle: BundleName,
    pub replaces: Option<BundleName>,
    pub skips: Vec<BundleName>,
    pub skip_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelBundle {
    pub name: BundleName,
    pub image: String,
    pub properties: Vec<Property>,
    pub related_images: Vec<RelatedImage>,
}

/// Resolve every name reference in `cfg` into a [`Model`].
///
/// Fails on the first record that cannot be placed: empty or duplicate
/// names, references to absent packages, entries naming absent bundles,
/// or a default channel the package does not declare.
pub fn convert_to_model(cfg: &DeclarativeConfig) -> Result<Model, ValidationError> {
    let mut packages = BTreeMap::new();

    for pkg in &cfg.packages {
        if pkg.name.trim().is_empty() {
            return Err(ValidationError::EmptyPackageName);
        }
        let name = PackageName::new(&pkg.name);
        if packages.contains_key(&name) {
            return Err(ValidationError::DuplicatePackage(pkg.name.clone()));
        }
        packages.insert(
            name.clone(),
            ModelPackage {
                name,
                default_channel: ChannelName::new(&pkg.default_channel),
                description: pkg.description.clone(),
                icon: pkg.icon.clone(),
                properties: pkg.properties.clone(),
                channels: BTreeMap::new(),
                bundles: BTreeMap::new(),
            },
        );
    }

    for bundle in &cfg.bundles {
        let Some(pkg) = packages.get_mut(bundle.package.as_str()) else {
            return Err(ValidationError::UnknownBundlePackage {
                package: bundle.package.clone(),
                bundle: bundle.name.clone(),
            });
        };
        if bundle.name.trim().is_empty() {
            return Err(ValidationError::EmptyBundleName(bundle.package.clone()));
        }
        let name = BundleName::new(&bundle.name);
        if pkg.bundles.contains_key(&name) {
            return Err(ValidationError::DuplicateBundle {
                package: bundle.package.clone(),
                bundle: bundle.name.clone(),
            });
        }
        pkg.bundles.insert(
            name.clone(),
            ModelBundle {
                name,
                image: bundle.image.clone(),
                properties: bundle.properties.clone(),
                related_images: bundle.related_images.clone(),
            },
        );
    }

    for channel in &cfg.channels {
        let Some(pkg) = packages.get_mut(channel.package.as_str()) else {
            return Err(ValidationError::UnknownChannelPackage {
                package: channel.package.clone(),
                channel: channel.name.clone(),
            });
        };
        if channel.name.trim().is_empty() {
            return Err(ValidationError::EmptyChannelName(channel.package.clone()));
        }
        let name = ChannelName::new(&channel.name);
        if pkg.channels.contains_key(&name) {
            return Err(ValidationError::DuplicateChannel {
                package: channel.package.clone(),
                channel: channel.name.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut entries = Vec::with_capacity(channel.entries.len());
        for entry in &channel.entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(ValidationError::DuplicateEntry {
                    package: channel.package.clone(),
                    channel: channel.name.clone(),
                    entry: entry.name.clone(),
                });
            }
            if !pkg.bundles.contains_key(entry.name.as_str()) {
                return Err(ValidationError::DanglingEntry {
                    package: channel.package.clone(),
                    channel: channel.name.clone(),
                    entry: entry.name.clone(),
                });
            }
            entries.push(ModelEntry {
                bundle: BundleName::new(&entry.name),
                replaces: entry.replaces.as_deref().map(BundleName::from),
                skips: entry.skips.iter().map(BundleName::new).collect(),
                skip_range: entry.skip_range.clone(),
            });
        }

        pkg.channels.insert(
            name.clone(),
            ModelChannel {
                name,
                entries,
                properties: channel.properties.clone(),
            },
        );
    }

    for pkg in packages.values() {
        if !pkg.channels.is_empty() && !pkg.channels.contains_key(&pkg.default_channel) {
            return Err(ValidationError::UnknownDefaultChannel {
                package: pkg.name.to_string(),
                channel: pkg.default_channel.to_string(),
            });
        }
    }

    Ok(Model { packages })
}

impl Model {
    /// Check graph invariants that hold for any installable catalog.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for pkg in self.packages.values() {
            if pkg.channels.is_empty() {
                return Err(ValidationError::NoChannels(pkg.name.to_string()));
            }

            let mut listed: BTreeSet<&BundleName> = BTreeSet::new();
            for channel in pkg.channels.values() {
                if channel.entries.is_empty() {
                    return Err(ValidationError::EmptyChannel {
                        package: pkg.name.to_string(),
                        channel: channel.name.to_string(),
                    });
                }
                let heads = channel.heads();
                if heads.len() != 1 {
                    return Err(ValidationError::ChannelHeads {
                        package: pkg.name.to_string(),
                        channel: channel.name.to_string(),
                        heads: heads.iter().map(ToString::to_string).collect(),
                    });
                }
                listed.extend(channel.entries.iter().map(|e| &e.bundle));
            }

            if let Some(orphan) = pkg.bundles.keys().find(|b| !listed.contains(b)) {
                return Err(ValidationError::OrphanBundle {
                    package: pkg.name.to_string(),
                    bundle: orphan.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn bundle_count(&self) -> usize {
        self.packages.values().map(|p| p.bundles.len()).sum()
    }

    pub fn channel_count(&self) -> usize {
        self.packages.values().map(|p| p.channels.len()).sum()
    }
}

impl ModelChannel {
    /// Entries that no other entry of the channel replaces or skips.
    pub fn heads(&self) -> Vec<&BundleName> {
        let superseded: BTreeSet<&BundleName> = self
            .entries
            .iter()
            .flat_map(|e| e.replaces.iter().chain(e.skips.iter()))
            .collect();
        self.entries
            .iter()
            .map(|e| &e.bundle)
            .filter(|b| !superseded.contains(b))
            .collect()
    }
}

/// Convert `cfg` to a [`Model`] and check it.
pub fn validate(cfg: &DeclarativeConfig) -> Result<Model, ValidationError> {
    let model = convert_to_model(cfg)?;
    model.validate()?;
    debug!(
        "validated catalog: {} packages, {} channels, {} bundles",
        model.packages.len(),
        model.channel_count(),
        model.bundle_count()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declcfg::{
        Bundle, Channel, ChannelEntry, Package, SCHEMA_BUNDLE, SCHEMA_CHANNEL, SCHEMA_PACKAGE,
    };

    fn package(name: &str, default_channel: &str) -> Package {
        Package {
            schema: SCHEMA_PACKAGE.to_owned(),
            name: name.to_owned(),
            default_channel: default_channel.to_owned(),
            icon: None,
            description: None,
            properties: Vec::new(),
        }
    }

    fn channel(package: &str, name: &str, entries: Vec<ChannelEntry>) -> Channel {
        Channel {
            schema: SCHEMA_CHANNEL.to_owned(),
            name: name.to_owned(),
            package: package.to_owned(),
            entries,
            properties: Vec::new(),
        }
    }

    fn bundle(package: &str, name: &str) -> Bundle {
        Bundle {
            schema: SCHEMA_BUNDLE.to_owned(),
            name: name.to_owned(),
            package: package.to_owned(),
            image: format!("quay.io/example/{name}"),
            properties: Vec::new(),
            related_images: Vec::new(),
        }
    }

    fn single(pkg: &str, chan: &str, bundle_name: &str) -> DeclarativeConfig {
        DeclarativeConfig {
            packages: vec![package(pkg, chan)],
            channels: vec![channel(pkg, chan, vec![ChannelEntry::new(bundle_name)])],
            bundles: vec![bundle(pkg, bundle_name)],
            others: Vec::new(),
        }
    }

    #[test]
    fn accepts_minimal_catalog() {
        let model = validate(&single("foo", "stable", "foo.v1.0.0")).unwrap();
        let pkg = &model.packages["foo"];
        assert_eq!(pkg.default_channel, "stable".to_owned());
        assert_eq!(pkg.channels["stable"].entries.len(), 1);
        assert_eq!(model.bundle_count(), 1);
    }

    #[test]
    fn rejects_dangling_entry() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        cfg.channels[0].entries.push(ChannelEntry {
            name: "foo.v2.0.0".to_owned(),
            replaces: Some("foo.v1.0.0".to_owned()),
            ..ChannelEntry::default()
        });
        let err = validate(&cfg).unwrap_err();
        assert!(matches!(err, ValidationError::DanglingEntry { ref entry, .. } if entry == "foo.v2.0.0"));
    }

    #[test]
    fn rejects_entry_pointing_at_other_package_bundle() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        let bar = single("bar", "alpha", "bar.v0.1.0");
        cfg.packages.extend(bar.packages);
        cfg.bundles.extend(bar.bundles);
        cfg.channels
            .push(channel("bar", "alpha", vec![ChannelEntry::new("foo.v1.0.0")]));
        assert!(matches!(
            validate(&cfg),
            Err(ValidationError::DanglingEntry { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_package_names() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        let mut dup = package("foo", "stable");
        dup.description = Some("different".to_owned());
        cfg.packages.push(dup);
        assert_eq!(
            validate(&cfg).unwrap_err(),
            ValidationError::DuplicatePackage("foo".to_owned())
        );
    }

    #[test]
    fn rejects_channel_for_unknown_package() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        cfg.channels
            .push(channel("ghost", "stable", vec![ChannelEntry::new("x")]));
        assert!(matches!(
            validate(&cfg),
            Err(ValidationError::UnknownChannelPackage { .. })
        ));
    }

    #[test]
    fn rejects_bundle_for_unknown_package() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        cfg.bundles.push(bundle("ghost", "ghost.v1"));
        assert!(matches!(
            validate(&cfg),
            Err(ValidationError::UnknownBundlePackage { .. })
        ));
    }

    #[test]
    fn rejects_unknown_default_channel() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        cfg.packages[0].default_channel = "fast".to_owned();
        assert!(matches!(
            validate(&cfg),
            Err(ValidationError::UnknownDefaultChannel { .. })
        ));
    }

    #[test]
    fn rejects_package_without_channels() {
        let cfg = DeclarativeConfig {
            packages: vec![package("foo", "stable")],
            ..DeclarativeConfig::default()
        };
        assert_eq!(
            validate(&cfg).unwrap_err(),
            ValidationError::NoChannels("foo".to_owned())
        );
    }

    #[test]
    fn rejects_multiple_heads() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        cfg.bundles.push(bundle("foo", "foo.v2.0.0"));
        cfg.channels[0].entries.push(ChannelEntry::new("foo.v2.0.0"));
        let err = validate(&cfg).unwrap_err();
        assert!(matches!(err, ValidationError::ChannelHeads { ref heads, .. } if heads.len() == 2));
    }

    #[test]
    fn replaces_chain_has_single_head() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        cfg.bundles.push(bundle("foo", "foo.v2.0.0"));
        cfg.channels[0].entries.push(ChannelEntry {
            name: "foo.v2.0.0".to_owned(),
            replaces: Some("foo.v1.0.0".to_owned()),
            ..ChannelEntry::default()
        });
        let model = validate(&cfg).unwrap();
        let heads = model.packages["foo"].channels["stable"].heads();
        assert_eq!(heads, vec![&BundleName::new("foo.v2.0.0")]);
    }

    #[test]
    fn rejects_orphan_bundle() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        cfg.bundles.push(bundle("foo", "foo.v0.9.0"));
        assert!(matches!(
            validate(&cfg),
            Err(ValidationError::OrphanBundle { ref bundle, .. }) if bundle == "foo.v0.9.0"
        ));
    }

    #[test]
    fn rejects_duplicate_entry() {
        let mut cfg = single("foo", "stable", "foo.v1.0.0");
        cfg.channels[0].entries.push(ChannelEntry::new("foo.v1.0.0"));
        assert!(matches!(
            validate(&cfg),
            Err(ValidationError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn model_ignores_record_order() {
        let mut a = single("foo", "stable", "foo.v1.0.0");
        let b_part = single("bar", "alpha", "bar.v0.1.0");
        a.packages.extend(b_part.packages.clone());
        a.channels.extend(b_part.channels.clone());
        a.bundles.extend(b_part.bundles.clone());

        let mut reversed = a.clone();
        reversed.packages.reverse();
        reversed.channels.reverse();
        reversed.bundles.reverse();

        assert_eq!(validate(&a).unwrap(), validate(&reversed).unwrap());
    }
}
