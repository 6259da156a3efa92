use crate::CoreError;
use bundlecat_render::BundleLabels;
use bundlecat_schema::{Bundle, PROPERTY_CSV_METADATA};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// File name of the serialized catalog inside the catalog directory.
pub const CATALOG_FILE_NAME: &str = "testFBC";

/// Everything the installer needs after a successful composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallHandoff {
    pub package_name: String,
    pub catalog_source_name: String,
    pub starting_csv: String,
    pub channel: String,
    pub supported_install_modes: Vec<String>,
    pub fbc_dir: PathBuf,
    pub fbc_file: PathBuf,
}

pub fn catalog_name_for_package(package: &str) -> String {
    format!("{package}-catalog")
}

/// Install mode types the bundle's CSV metadata marks as supported,
/// sorted and deduplicated.
pub fn supported_install_modes(bundle: &Bundle) -> Vec<String> {
    let Some(metadata) = bundle.property(PROPERTY_CSV_METADATA) else {
        return Vec::new();
    };
    let Some(modes) = metadata.value.get("installModes").and_then(|m| m.as_array()) else {
        return Vec::new();
    };
    modes
        .iter()
        .filter(|m| m.get("supported").and_then(serde_json::Value::as_bool) == Some(true))
        .filter_map(|m| m.get("type").and_then(serde_json::Value::as_str))
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `<work_dir>/<first dot segment of the bundle name>-index`.
///
/// The directory name must be a single plain path component so the catalog
/// always lands directly under `work_dir`.
pub fn catalog_dir_for_bundle(work_dir: &Path, bundle_name: &str) -> Result<PathBuf, CoreError> {
    let unsafe_path = || CoreError::UnsafeCatalogPath {
        name: bundle_name.to_owned(),
    };
    let prefix = bundle_name.split('.').next().unwrap_or_default();
    if prefix.is_empty() || prefix.contains(['/', '\\']) {
        return Err(unsafe_path());
    }
    let dir_name = format!("{prefix}-index");
    let mut components = Path::new(&dir_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(work_dir.join(dir_name)),
        _ => Err(unsafe_path()),
    }
}

impl InstallHandoff {
    pub fn derive(
        work_dir: &Path,
        labels: &BundleLabels,
        bundle: &Bundle,
    ) -> Result<Self, CoreError> {
        let fbc_dir = catalog_dir_for_bundle(work_dir, &bundle.name)?;
        let fbc_file = fbc_dir.join(CATALOG_FILE_NAME);
        Ok(Self {
            package_name: labels.package.clone(),
            catalog_source_name: catalog_name_for_package(&labels.package),
            starting_csv: bundle.name.clone(),
            channel: labels.channel.clone(),
            supported_install_modes: supported_install_modes(bundle),
            fbc_dir,
            fbc_file,
        })
    }
}
