use super::{colorize_format, json_pretty, EXIT_SUCCESS};
use bundlecat_render::{classify, LabelSource, LocalImageStore};
use std::path::Path;

pub fn run(store_path: &Path, image: &str, json: bool) -> Result<u8, String> {
    let store = LocalImageStore::new(store_path);
    let labels = store
        .labels(image)
        .map_err(|e| format!("label error: {e}"))?;
    let format = classify(&labels);
    if json {
        let payload = serde_json::json!({
            "image": image,
            "format": format,
            "has_catalog_content": format.has_catalog_content(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{image}: {}", colorize_format(format));
    }
    Ok(EXIT_SUCCESS)
}
