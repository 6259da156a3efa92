use crate::CoreError;
use bundlecat_render::CatalogRenderer;
use bundlecat_schema::DeclarativeConfig;
use tracing::debug;

/// Fail unless `cfg` holds exactly one bundle.
pub fn expect_single_bundle(image: &str, cfg: &DeclarativeConfig) -> Result<(), CoreError> {
    if cfg.bundles.len() == 1 {
        Ok(())
    } else {
        Err(CoreError::UnexpectedBundleCount {
            image: image.to_owned(),
            count: cfg.bundles.len(),
        })
    }
}

/// Render a bundle image and enforce the single-bundle contract.
pub fn render_bundle<R: CatalogRenderer + ?Sized>(
    renderer: &R,
    image: &str,
) -> Result<DeclarativeConfig, CoreError> {
    debug!("rendering bundle image {image}");
    let cfg = renderer.render(image)?;
    expect_single_bundle(image, &cfg)?;
    Ok(cfg)
}
