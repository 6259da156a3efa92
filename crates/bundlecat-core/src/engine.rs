use crate::build::build_minimal;
use crate::bundle::render_bundle;
use crate::config::ComposerConfig;
use crate::handoff::InstallHandoff;
use crate::merge::merge;
use crate::plan::CompositionPlan;
use crate::CoreError;
use bundlecat_render::{classify, BundleLabels, CatalogSource};
use bundlecat_schema::{to_json_string, validate, Bundle, DeclarativeConfig};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// What to compose: a bundle image and the index it should land in.
#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    pub bundle_image: String,
    /// `None` selects the configured default index image.
    pub index_image: Option<String>,
    /// File holding the package description for minimal catalogs.
    pub description: Option<PathBuf>,
}

impl ComposeRequest {
    pub fn new(bundle_image: impl Into<String>) -> Self {
        Self {
            bundle_image: bundle_image.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_index(mut self, index_image: impl Into<String>) -> Self {
        self.index_image = Some(index_image.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, path: impl Into<PathBuf>) -> Self {
        self.description = Some(path.into());
        self
    }
}

/// Result of a successful composition.
#[derive(Debug, Clone)]
pub struct Composition {
    pub plan: CompositionPlan,
    pub catalog: DeclarativeConfig,
    /// Serialized `catalog`, never empty.
    pub content: String,
    pub handoff: InstallHandoff,
}

impl Composition {
    /// Atomically write `content` to the hand-off's catalog file.
    pub fn write_catalog(&self) -> Result<&Path, CoreError> {
        let dir = &self.handoff.fbc_dir;
        std::fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(self.content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.handoff.fbc_file).map_err(|e| e.error)?;
        info!("wrote catalog to {}", self.handoff.fbc_file.display());
        Ok(&self.handoff.fbc_file)
    }
}

/// Validate a snapshot and serialize it.
pub fn finalize_catalog(catalog: &DeclarativeConfig) -> Result<String, CoreError> {
    if let Err(e) = validate(catalog) {
        warn!("composed catalog failed validation: {e}");
        return Err(e.into());
    }
    let content = to_json_string(catalog)?;
    if content.is_empty() {
        return Err(CoreError::EmptyOutput);
    }
    Ok(content)
}

/// Composes bundle images into file-based catalogs.
///
/// Every call to `compose` either returns a validated, serialized catalog
/// with its hand-off or an error; nothing is written until the caller asks
/// for it through `Composition::write_catalog`.
pub struct Composer<S: CatalogSource> {
    source: S,
    config: ComposerConfig,
}

impl<S: CatalogSource> Composer<S> {
    pub fn new(source: S, config: ComposerConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Read labels and decide how the request would be composed, without
    /// rendering anything.
    pub fn plan(
        &self,
        request: &ComposeRequest,
    ) -> Result<(CompositionPlan, BundleLabels), CoreError> {
        let bundle_image = request.bundle_image.trim();
        let labels = self.source.labels(bundle_image)?;
        let bundle_labels = BundleLabels::from_labels(bundle_image, &labels)?;
        debug!(
            "bundle {bundle_image}: package {}, channel {}",
            bundle_labels.package, bundle_labels.channel
        );

        let index_image = request
            .index_image
            .as_deref()
            .unwrap_or(&self.config.default_index_image)
            .trim();
        let index_format = if self.config.is_default_index(index_image) {
            None
        } else {
            let format = classify(&self.source.labels(index_image)?);
            debug!("index {index_image} classified as {format}");
            Some(format)
        };

        let plan = CompositionPlan::select(
            index_image,
            &self.config.default_index_image,
            bundle_image,
            &bundle_labels,
            index_format,
        )?;
        Ok((plan, bundle_labels))
    }

    pub fn compose(&self, request: &ComposeRequest) -> Result<Composition, CoreError> {
        let (plan, labels) = self.plan(request)?;
        info!("composing {}: {plan}", plan.bundle_image());

        let (catalog, bundle) = match &plan {
            CompositionPlan::Merge {
                index_image,
                bundle_image,
            } => {
                let (index, rendered) = self.render_pair(index_image, bundle_image)?;
                let bundle = first_bundle(rendered.bundles.first(), bundle_image)?;
                let merged = merge(&index, &rendered, self.config.dedup_policy)?;
                info!("merge outcome: {}", merged.outcome);
                (merged.catalog, bundle)
            }
            CompositionPlan::Build(minimal) => {
                let rendered = render_bundle(&self.source, &minimal.bundle_image)?;
                let bundle = first_bundle(rendered.bundles.first(), &minimal.bundle_image)?;
                let catalog = match &request.description {
                    Some(path) => {
                        let mut file = open_description(path)?;
                        build_minimal(rendered, minimal, Some(&mut file as &mut dyn Read))?
                    }
                    None => build_minimal(rendered, minimal, None)?,
                };
                (catalog, bundle)
            }
        };

        let content = finalize_catalog(&catalog)?;
        let handoff = InstallHandoff::derive(&self.config.work_dir, &labels, &bundle)?;
        info!(
            "composed catalog for {} ({} packages, {} bundles)",
            handoff.package_name,
            catalog.packages.len(),
            catalog.bundles.len()
        );
        Ok(Composition {
            plan,
            catalog,
            content,
            handoff,
        })
    }

    fn render_pair(
        &self,
        index_image: &str,
        bundle_image: &str,
    ) -> Result<(DeclarativeConfig, DeclarativeConfig), CoreError> {
        if !self.config.parallel_render {
            debug!("rendering index image {index_image}");
            let index = self.source.render(index_image)?;
            let bundle = render_bundle(&self.source, bundle_image)?;
            return Ok((index, bundle));
        }

        let source = &self.source;
        let (index, bundle) = thread::scope(|s| {
            let index = s.spawn(move || source.render(index_image));
            let bundle = s.spawn(move || render_bundle(source, bundle_image));
            (index.join(), bundle.join())
        });
        let index = index
            .map_err(|_| CoreError::Worker(format!("rendering {index_image} panicked")))??;
        let bundle = bundle
            .map_err(|_| CoreError::Worker(format!("rendering {bundle_image} panicked")))??;
        Ok((index, bundle))
    }
}

fn first_bundle(bundle: Option<&Bundle>, image: &str) -> Result<Bundle, CoreError> {
    bundle.cloned().ok_or_else(|| CoreError::UnexpectedBundleCount {
        image: image.to_owned(),
        count: 0,
    })
}

fn open_description(path: &Path) -> Result<File, CoreError> {
    File::open(path).map_err(|e| CoreError::Init(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_INDEX_IMAGE;
    use crate::merge::DedupPolicy;
    use bundlecat_render::mock::{bundle_labels, bundle_render, file_based_index_labels};
    use bundlecat_render::{LabelError, LabelSet, MockSource, DB_LOCATION_LABEL};
    use bundlecat_schema::InitError;

    const BUNDLE: &str = "quay.io/example/foo-bundle:v1.0.0";
    const INDEX: &str = "quay.io/example/index:v1";

    fn source() -> MockSource {
        MockSource::new()
            .with_image(
                BUNDLE,
                bundle_labels("foo", "stable,beta"),
                Some(bundle_render("foo", "stable", "foo.v1.0.0")),
            )
            .with_image(
                INDEX,
                file_based_index_labels(),
                Some(bundle_render("bar", "alpha", "bar.v0.1.0")),
            )
    }

    fn composer(source: MockSource) -> (tempfile::TempDir, Composer<MockSource>) {
        let dir = tempfile::tempdir().unwrap();
        let config = ComposerConfig {
            work_dir: dir.path().to_path_buf(),
            ..ComposerConfig::default()
        };
        (dir, Composer::new(source, config))
    }

    #[test]
    fn default_index_builds_minimal_catalog() {
        let (_dir, composer) = composer(source());
        let composition = composer.compose(&ComposeRequest::new(BUNDLE)).unwrap();
        assert!(matches!(composition.plan, CompositionPlan::Build(_)));
        assert_eq!(composition.catalog.packages.len(), 1);
        assert_eq!(composition.catalog.channels[0].name, "stable");
        assert_eq!(composition.handoff.starting_csv, "foo.v1.0.0");
        assert!(!composition.content.is_empty());
        // default index labels are never read
        assert!(!composer
            .source()
            .calls()
            .contains(&format!("labels:{DEFAULT_INDEX_IMAGE}")));
    }

    #[test]
    fn padded_default_index_in_config_still_builds() {
        let (_dir, mut composer) = composer(source());
        composer.config.default_index_image = format!("  {DEFAULT_INDEX_IMAGE} ");
        for request in [
            ComposeRequest::new(BUNDLE),
            ComposeRequest::new(BUNDLE).with_index(DEFAULT_INDEX_IMAGE),
        ] {
            let composition = composer.compose(&request).unwrap();
            assert!(matches!(composition.plan, CompositionPlan::Build(_)));
        }
        let label_reads: Vec<_> = composer
            .source()
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("labels:"))
            .collect();
        assert_eq!(label_reads, vec![format!("labels:{BUNDLE}"); 2]);
    }

    #[test]
    fn bundle_named_like_a_path_is_rejected() {
        let mut rendered = bundle_render("foo", "stable", "foo.v1.0.0");
        rendered.bundles[0].name = "/etc/evil.v1.0.0".to_owned();
        let source = MockSource::new().with_image(
            BUNDLE,
            bundle_labels("foo", "stable"),
            Some(rendered),
        );
        let (dir, composer) = composer(source);
        let err = composer.compose(&ComposeRequest::new(BUNDLE)).unwrap_err();
        assert!(matches!(err, CoreError::UnsafeCatalogPath { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn file_based_index_merges() {
        let (_dir, composer) = composer(source());
        let composition = composer
            .compose(&ComposeRequest::new(BUNDLE).with_index(INDEX))
            .unwrap();
        assert!(matches!(composition.plan, CompositionPlan::Merge { .. }));
        let names: Vec<_> = composition
            .catalog
            .packages
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["bar", "foo"]);
        assert_eq!(composer.source().render_count(), 2);
    }

    #[test]
    fn parallel_render_gives_same_catalog() {
        let (_dir, sequential) = composer(source());
        let (_dir2, mut parallel) = composer(source());
        parallel.config.parallel_render = true;
        let request = ComposeRequest::new(BUNDLE).with_index(INDEX);
        let a = sequential.compose(&request).unwrap();
        let b = parallel.compose(&request).unwrap();
        assert_eq!(a.content, b.content);
    }

    #[test]
    fn legacy_database_index_merges() {
        let mut source = source();
        source.add_image(
            "quay.io/example/db-index:v1",
            LabelSet::new().with(DB_LOCATION_LABEL, "/database/index.db"),
            Some(bundle_render("bar", "alpha", "bar.v0.1.0")),
        );
        let (_dir, composer) = composer(source);
        let plan = composer
            .plan(&ComposeRequest::new(BUNDLE).with_index("quay.io/example/db-index:v1"))
            .unwrap()
            .0;
        assert!(matches!(plan, CompositionPlan::Merge { .. }));
    }

    #[test]
    fn unlabeled_index_is_unsupported() {
        let mut source = source();
        source.add_image("plain:latest", LabelSet::new(), None);
        let (_dir, composer) = composer(source);
        let err = composer
            .compose(&ComposeRequest::new(BUNDLE).with_index("plain:latest"))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedIndex { .. }));
        assert_eq!(composer.source().render_count(), 0);
    }

    #[test]
    fn label_failure_aborts_before_render() {
        let (_dir, composer) = composer(source());
        let err = composer
            .compose(&ComposeRequest::new("quay.io/example/missing:v1"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Label(LabelError::ImageNotFound(_))));
        assert_eq!(composer.source().render_count(), 0);
    }

    #[test]
    fn missing_description_file_is_init_error() {
        let (dir, composer) = composer(source());
        let request = ComposeRequest::new(BUNDLE).with_description(dir.path().join("nope.md"));
        let err = composer.compose(&request).unwrap_err();
        assert!(matches!(err, CoreError::Init(InitError::Description(_))));
    }

    #[test]
    fn name_policy_merges_present_package_once() {
        let mut source = source();
        source.add_image(
            "quay.io/example/foo-index:v1",
            file_based_index_labels(),
            Some(bundle_render("foo", "stable", "foo.v1.0.0")),
        );
        let (_dir, mut composer) = composer(source);
        composer.config.dedup_policy = DedupPolicy::NameMatch;
        let composition = composer
            .compose(&ComposeRequest::new(BUNDLE).with_index("quay.io/example/foo-index:v1"))
            .unwrap();
        assert_eq!(composition.catalog.packages.len(), 1);
    }

    #[test]
    fn write_catalog_persists_content() {
        let (_dir, composer) = composer(source());
        let composition = composer.compose(&ComposeRequest::new(BUNDLE)).unwrap();
        let path = composition.write_catalog().unwrap();
        assert!(path.ends_with("foo-index/testFBC"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), composition.content);
    }

    #[test]
    fn finalize_rejects_invalid_catalog() {
        let mut cfg = bundle_render("foo", "stable", "foo.v1.0.0");
        cfg.channels[0].entries[0].name = "foo.v9".to_owned();
        assert!(matches!(
            finalize_catalog(&cfg),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn finalize_rejects_empty_catalog() {
        assert!(matches!(
            finalize_catalog(&DeclarativeConfig::default()),
            Err(CoreError::EmptyOutput)
        ));
    }
}
