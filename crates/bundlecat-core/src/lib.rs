//! Catalog composition for bundlecat.
//!
//! This crate ties the schema layer and the image sources together into the
//! `Composer`: it reads bundle and index labels, selects a `CompositionPlan`
//! (merge the bundle into an existing index catalog, or build a minimal
//! catalog around it), renders, merges or synthesizes, validates, serializes,
//! and derives the `InstallHandoff` the installer needs. Every step either
//! succeeds or the whole composition fails; no partial catalog is returned.

pub mod build;
pub mod bundle;
pub mod config;
pub mod engine;
pub mod handoff;
pub mod merge;
pub mod plan;

pub use build::build_minimal;
pub use bundle::{expect_single_bundle, render_bundle};
pub use config::{ComposerConfig, DEFAULT_INDEX_IMAGE};
pub use engine::{finalize_catalog, ComposeRequest, Composer, Composition};
pub use handoff::{catalog_name_for_package, supported_install_modes, InstallHandoff};
pub use merge::{merge, DedupPolicy, MergeOutcome, Merged};
pub use plan::{CompositionPlan, MinimalCatalog};

use bundlecat_render::{LabelError, RenderError};
use bundlecat_schema::{EncodingError, InitError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("label error: {0}")]
    Label(#[from] LabelError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("rendering bundle image '{image}' produced {count} bundles, expected exactly one")]
    UnexpectedBundleCount { image: String, count: usize },
    #[error("package init error: {0}")]
    Init(#[from] InitError),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("file-based catalog contents cannot be empty")]
    EmptyOutput,
    #[error(
        "bundle render for package '{package}' is incomplete: {bundles} bundles, {channels} channels"
    )]
    IncompleteRender {
        package: String,
        bundles: usize,
        channels: usize,
    },
    #[error("package '{package}' already exists in the index with different metadata")]
    PackageConflict { package: String },
    #[error("index image '{image}' has neither a database nor a configs location label")]
    UnsupportedIndex { image: String },
    #[error("bundle name '{name}' does not yield a catalog directory inside the work dir")]
    UnsafeCatalogPath { name: String },
    #[error("render worker failed: {0}")]
    Worker(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
