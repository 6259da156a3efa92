use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use bundlecat_core::{ComposeRequest, Composer, ComposerConfig, DedupPolicy};
use bundlecat_render::LocalImageStore;
use std::path::{Path, PathBuf};

/// Flags that override the loaded configuration.
#[derive(Debug, Default)]
pub struct Overrides {
    pub work_dir: Option<PathBuf>,
    pub dedup: Option<DedupPolicy>,
    pub parallel: bool,
}

impl Overrides {
    pub fn apply(self, mut config: ComposerConfig) -> ComposerConfig {
        if let Some(dir) = self.work_dir {
            config.work_dir = dir;
        }
        if let Some(policy) = self.dedup {
            config.dedup_policy = policy;
        }
        if self.parallel {
            config.parallel_render = true;
        }
        config
    }
}

pub fn run(
    store_path: &Path,
    config: ComposerConfig,
    request: &ComposeRequest,
    write: bool,
    json: bool,
) -> Result<u8, String> {
    let composer = Composer::new(LocalImageStore::new(store_path), config);

    let pb = (!json).then(|| spinner(&format!("composing {}", request.bundle_image)));
    let composition = match composer.compose(request) {
        Ok(c) => c,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "composition failed");
            }
            return Err(e.to_string());
        }
    };
    if let Some(pb) = &pb {
        spin_ok(pb, &composition.plan.to_string());
    }

    if write {
        composition
            .write_catalog()
            .map_err(|e| format!("failed to write catalog: {e}"))?;
    }

    let handoff = &composition.handoff;
    if json {
        let payload = serde_json::json!({
            "plan": composition.plan,
            "handoff": handoff,
            "written": write,
            "catalog": composition.content,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("package:         {}", handoff.package_name);
        println!("catalog source:  {}", handoff.catalog_source_name);
        println!("starting csv:    {}", handoff.starting_csv);
        println!("channel:         {}", handoff.channel);
        println!(
            "install modes:   {}",
            if handoff.supported_install_modes.is_empty() {
                "(none)".to_owned()
            } else {
                handoff.supported_install_modes.join(", ")
            }
        );
        if write {
            println!("catalog file:    {}", handoff.fbc_file.display());
        } else {
            println!("catalog file:    {} (not written)", handoff.fbc_file.display());
        }
    }
    Ok(EXIT_SUCCESS)
}
