use super::{json_pretty, EXIT_SUCCESS};
use bundlecat_render::LocalImageStore;
use std::path::Path;

pub fn run(store_path: &Path, json: bool) -> Result<u8, String> {
    let store = LocalImageStore::new(store_path);
    let refs = store.list().map_err(|e| format!("store error: {e}"))?;
    if json {
        println!("{}", json_pretty(&refs)?);
    } else if refs.is_empty() {
        println!("no images in store");
    } else {
        for reference in &refs {
            println!("{reference}");
        }
    }
    Ok(EXIT_SUCCESS)
}
