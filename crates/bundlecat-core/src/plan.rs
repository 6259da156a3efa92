use crate::config::same_image;
use crate::CoreError;
use bundlecat_render::{BundleLabels, CatalogFormat};
use serde::Serialize;
use std::fmt;

/// What a minimal catalog is built around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinimalCatalog {
    pub bundle_image: String,
    pub package: String,
    pub channel: String,
}

/// How a bundle ends up in a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum CompositionPlan {
    /// Render the index and fold the bundle into it.
    Merge {
        index_image: String,
        bundle_image: String,
    },
    /// No usable index: synthesize a one-package catalog.
    Build(MinimalCatalog),
}

impl CompositionPlan {
    /// `index_format` is `None` when the index labels were not read, which
    /// only happens for the default index image.
    pub fn select(
        index_image: &str,
        default_index_image: &str,
        bundle_image: &str,
        labels: &BundleLabels,
        index_format: Option<CatalogFormat>,
    ) -> Result<Self, CoreError> {
        if same_image(index_image, default_index_image) {
            return Ok(CompositionPlan::Build(MinimalCatalog {
                bundle_image: bundle_image.to_owned(),
                package: labels.package.clone(),
                channel: labels.channel.clone(),
            }));
        }
        match index_format {
            Some(format) if format.has_catalog_content() => Ok(CompositionPlan::Merge {
                index_image: index_image.to_owned(),
                bundle_image: bundle_image.to_owned(),
            }),
            _ => Err(CoreError::UnsupportedIndex {
                image: index_image.to_owned(),
            }),
        }
    }

    pub fn bundle_image(&self) -> &str {
        match self {
            CompositionPlan::Merge { bundle_image, .. } => bundle_image,
            CompositionPlan::Build(minimal) => &minimal.bundle_image,
        }
    }
}

impl fmt::Display for CompositionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositionPlan::Merge { index_image, .. } => write!(f, "merge into {index_image}"),
            CompositionPlan::Build(minimal) => write!(
                f,
                "build minimal catalog for {}/{}",
                minimal.package, minimal.channel
            ),
        }
    }
}
