use super::EXIT_SUCCESS;
use bundlecat_render::{CatalogRenderer, LocalImageStore};
use bundlecat_schema::to_json_string;
use std::path::Path;

/// Print an image's catalog content as a record stream. The output is JSON
/// in either mode.
pub fn run(store_path: &Path, image: &str) -> Result<u8, String> {
    let store = LocalImageStore::new(store_path);
    let cfg = store
        .render(image)
        .map_err(|e| format!("render error: {e}"))?;
    let content = to_json_string(&cfg).map_err(|e| format!("encoding error: {e}"))?;
    print!("{content}");
    Ok(EXIT_SUCCESS)
}
