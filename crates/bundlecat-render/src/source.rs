use crate::labels::LabelSet;
use crate::{LabelError, RenderError};
use bundlecat_schema::DeclarativeConfig;

/// Reads the configuration labels of an image.
pub trait LabelSource: Send + Sync {
    fn labels(&self, image: &str) -> Result<LabelSet, LabelError>;
}

/// Resolves an image reference into its declarative catalog content.
///
/// Index images render to their whole catalog; bundle images render to a
/// snapshot holding that bundle (and usually its package and channel).
/// Retrying transient pulls is the implementation's business.
pub trait CatalogRenderer: Send + Sync {
    fn render(&self, image: &str) -> Result<DeclarativeConfig, RenderError>;
}

/// Anything that can both label and render images.
pub trait CatalogSource: LabelSource + CatalogRenderer {}

impl<T: LabelSource + CatalogRenderer> CatalogSource for T {}

impl<T: LabelSource + ?Sized> LabelSource for &T {
    fn labels(&self, image: &str) -> Result<LabelSet, LabelError> {
        (**self).labels(image)
    }
}

impl<T: CatalogRenderer + ?Sized> CatalogRenderer for &T {
    fn render(&self, image: &str) -> Result<DeclarativeConfig, RenderError> {
        (**self).render(image)
    }
}
