use crate::labels::LabelSet;
use crate::source::{CatalogRenderer, LabelSource};
use crate::{LabelError, RenderError, StoreError};
use bundlecat_schema::{parse_json, to_json_string, DeclarativeConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const REFERENCE_FILE: &str = "ref";
const LABELS_FILE: &str = "labels.json";
const CONFIGS_DIR: &str = "configs";
const CATALOG_FILE: &str = "catalog.json";

/// Directory name for an image reference inside the store.
pub fn image_key(reference: &str) -> String {
    blake3::hash(reference.trim().as_bytes())
        .to_hex()
        .to_string()
}

/// Directory-backed image store.
///
/// Each image lives under `images/<blake3(reference)>/` with the reference
/// text in `ref`, its labels in `labels.json`, and any file-based catalog
/// content as `*.json` record streams below `configs/`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    #[inline]
    pub fn image_dir(&self, reference: &str) -> PathBuf {
        self.images_dir().join(image_key(reference))
    }

    #[inline]
    pub fn configs_dir(&self, reference: &str) -> PathBuf {
        self.image_dir(reference).join(CONFIGS_DIR)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.image_dir(reference).join(REFERENCE_FILE).exists()
    }

    /// Add or replace an image. Without a catalog the image keeps only labels.
    pub fn import(
        &self,
        reference: &str,
        labels: &LabelSet,
        catalog: Option<&DeclarativeConfig>,
    ) -> Result<PathBuf, StoreError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(StoreError::EmptyReference);
        }

        let dir = self.image_dir(reference);
        fs::create_dir_all(&dir)?;
        let labels_json = serde_json::to_vec_pretty(labels)?;
        write_atomic(&dir, &dir.join(LABELS_FILE), &labels_json)?;

        let configs = dir.join(CONFIGS_DIR);
        if configs.exists() {
            fs::remove_dir_all(&configs)?;
        }
        if let Some(cfg) = catalog {
            fs::create_dir_all(&configs)?;
            let content = to_json_string(cfg)?;
            write_atomic(&configs, &configs.join(CATALOG_FILE), content.as_bytes())?;
        }

        write_atomic(&dir, &dir.join(REFERENCE_FILE), reference.as_bytes())?;
        debug!("imported image {reference} into {}", dir.display());
        Ok(dir)
    }

    /// All image references in the store, sorted.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let dir = self.images_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut refs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path().join(REFERENCE_FILE);
            if path.exists() {
                refs.push(fs::read_to_string(path)?.trim().to_owned());
            }
        }
        refs.sort();
        Ok(refs)
    }
}

fn write_atomic(dir: &Path, dest: &Path, data: &[u8]) -> Result<(), std::io::Error> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

impl LabelSource for LocalImageStore {
    fn labels(&self, image: &str) -> Result<LabelSet, LabelError> {
        if !self.contains(image) {
            return Err(LabelError::ImageNotFound(image.to_owned()));
        }
        let path = self.image_dir(image).join(LABELS_FILE);
        let unreadable = |reason: String| LabelError::Unreadable {
            image: image.to_owned(),
            reason,
        };
        let content = fs::read_to_string(&path).map_err(|e| unreadable(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| unreadable(e.to_string()))
    }
}

impl CatalogRenderer for LocalImageStore {
    fn render(&self, image: &str) -> Result<DeclarativeConfig, RenderError> {
        if !self.contains(image) {
            return Err(RenderError::ImageNotFound(image.to_owned()));
        }
        let configs = self.configs_dir(image);
        if !configs.is_dir() {
            return Err(RenderError::NoContent(image.to_owned()));
        }

        let io_err = |source: std::io::Error| RenderError::Io {
            image: image.to_owned(),
            source,
        };
        let mut files = Vec::new();
        collect_json_files(&configs, &mut files).map_err(io_err)?;
        files.sort();

        let mut cfg = DeclarativeConfig::default();
        for file in &files {
            let content = fs::read_to_string(file).map_err(io_err)?;
            let part = parse_json(&content).map_err(|source| RenderError::Decode {
                image: image.to_owned(),
                source,
            })?;
            cfg.packages.extend(part.packages);
            cfg.channels.extend(part.channels);
            cfg.bundles.extend(part.bundles);
            cfg.others.extend(part.others);
        }
        debug!(
            "rendered {image} from {} files: {} packages, {} bundles",
            files.len(),
            cfg.packages.len(),
            cfg.bundles.len()
        );
        Ok(cfg)
    }
}
