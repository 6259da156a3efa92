use crate::CoreError;
use bundlecat_schema::{DeclarativeConfig, Package};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// How the merger decides that a bundle's package already lives in the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DedupPolicy {
    /// The whole package record must be structurally equal.
    #[default]
    #[serde(rename = "exact")]
    ExactMatch,
    /// Same package name counts as present; differing metadata is a conflict.
    #[serde(rename = "name")]
    NameMatch,
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupPolicy::ExactMatch => write!(f, "exact"),
            DedupPolicy::NameMatch => write!(f, "name"),
        }
    }
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(DedupPolicy::ExactMatch),
            "name" => Ok(DedupPolicy::NameMatch),
            other => Err(format!(
                "unknown dedup policy '{other}' (expected 'exact' or 'name')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeOutcome {
    /// The source carried no package record.
    NothingToMerge,
    AlreadyPresent,
    Appended,
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeOutcome::NothingToMerge => write!(f, "nothing-to-merge"),
            MergeOutcome::AlreadyPresent => write!(f, "already-present"),
            MergeOutcome::Appended => write!(f, "appended"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Merged {
    pub catalog: DeclarativeConfig,
    pub outcome: MergeOutcome,
}

fn find_present<'a>(
    target: &'a DeclarativeConfig,
    package: &Package,
    policy: DedupPolicy,
) -> Result<Option<&'a Package>, CoreError> {
    match policy {
        DedupPolicy::ExactMatch => Ok(target.packages.iter().find(|p| *p == package)),
        DedupPolicy::NameMatch => match target.packages.iter().find(|p| p.name == package.name) {
            Some(existing) if existing != package => Err(CoreError::PackageConflict {
                package: package.name.clone(),
            }),
            found => Ok(found),
        },
    }
}

/// Fold a rendered bundle into an index snapshot.
///
/// Only the first package, bundle, channel and other of `source` are
/// appended. `target` is never modified; the result is a fresh snapshot.
pub fn merge(
    target: &DeclarativeConfig,
    source: &DeclarativeConfig,
    policy: DedupPolicy,
) -> Result<Merged, CoreError> {
    let Some(package) = source.packages.first() else {
        debug!("bundle render has no package record, index left unchanged");
        return Ok(Merged {
            catalog: target.clone(),
            outcome: MergeOutcome::NothingToMerge,
        });
    };

    if find_present(target, package, policy)?.is_some() {
        info!("package {} already present in index", package.name);
        return Ok(Merged {
            catalog: target.clone(),
            outcome: MergeOutcome::AlreadyPresent,
        });
    }

    let (Some(bundle), Some(channel)) = (source.bundles.first(), source.channels.first()) else {
        return Err(CoreError::IncompleteRender {
            package: package.name.clone(),
            bundles: source.bundles.len(),
            channels: source.channels.len(),
        });
    };

    let mut catalog = target.clone();
    catalog.packages.push(package.clone());
    catalog.bundles.push(bundle.clone());
    catalog.channels.push(channel.clone());
    if let Some(other) = source.others.first() {
        catalog.others.push(other.clone());
    }
    info!(
        "appended package {} (bundle {}, channel {}) to index",
        package.name, bundle.name, channel.name
    );
    Ok(Merged {
        catalog,
        outcome: MergeOutcome::Appended,
    })
}
