//! Image-facing collaborators for bundlecat.
//!
//! This crate implements the seams the composition core talks through: the
//! `LabelSource` and `CatalogRenderer` traits, the label set read from an
//! image configuration with the well-known catalog and bundle keys, the
//! catalog format classifier, a directory-backed `LocalImageStore`, and an
//! in-memory `MockSource` for tests.

pub mod classify;
pub mod labels;
pub mod mock;
pub mod source;
pub mod store;

pub use classify::{classify, CatalogFormat};
pub use labels::{
    BundleLabels, LabelSet, CHANNELS_LABEL, CONFIGS_LOCATION_LABEL, DB_LOCATION_LABEL,
    DEFAULT_CHANNEL_LABEL, PACKAGE_LABEL,
};
pub use mock::MockSource;
pub use source::{CatalogRenderer, CatalogSource, LabelSource};
pub use store::{image_key, LocalImageStore};

use bundlecat_schema::{DecodeError, EncodingError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("image '{0}' not found")]
    ImageNotFound(String),
    #[error("image '{image}' has no '{label}' label")]
    MissingLabel { image: String, label: String },
    #[error("image '{image}' label '{label}' is empty")]
    EmptyLabel { image: String, label: String },
    #[error("failed to read labels of image '{image}': {reason}")]
    Unreadable { image: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image '{0}' not found")]
    ImageNotFound(String),
    #[error("image '{0}' carries no declarative catalog content")]
    NoContent(String),
    #[error("failed to read catalog content of image '{image}': {source}")]
    Io {
        image: String,
        source: std::io::Error,
    },
    #[error("failed to decode catalog content of image '{image}': {source}")]
    Decode { image: String, source: DecodeError },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("image store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("image store encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("image reference must not be empty")]
    EmptyReference,
}
