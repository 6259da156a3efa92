//! Declarative catalog snapshots for bundlecat.
//!
//! This crate defines the schema layer: the serde-typed snapshot records
//! (`DeclarativeConfig` with its packages, channels, bundles and passthrough
//! records), package synthesis (`init_package`), conversion into a
//! name-resolved structural model with integrity checks (`validate`), and the
//! deterministic JSON wire encoding (`write_json` / `parse_json`).

pub mod declcfg;
pub mod encode;
pub mod init;
pub mod model;
pub mod types;

pub use declcfg::{
    Bundle, Channel, ChannelEntry, DeclarativeConfig, Icon, Other, Package, Property,
    RelatedImage, PROPERTY_CSV_METADATA, SCHEMA_BUNDLE, SCHEMA_CHANNEL, SCHEMA_PACKAGE,
};
pub use encode::{
    parse_json, read_catalog_file, to_json_string, write_json, DecodeError, EncodingError,
};
pub use init::{init_package, InitError};
pub use model::{
    convert_to_model, validate, Model, ModelBundle, ModelChannel, ModelEntry, ModelPackage,
    ValidationError,
};
pub use types::{BundleName, ChannelName, PackageName};
