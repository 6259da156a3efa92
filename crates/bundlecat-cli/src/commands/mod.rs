pub mod classify;
pub mod completions;
pub mod compose;
pub mod images;
pub mod import;
pub mod render;
pub mod validate;

use bundlecat_core::ComposerConfig;
use bundlecat_render::CatalogFormat;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_RENDER_ERROR: u8 = 2;
pub const EXIT_VALIDATION_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        style("{spinner:.cyan} {msg}")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(style("{msg}"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(style("{msg}"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_format(format: CatalogFormat) -> String {
    use console::Style;
    let text = format.to_string();
    match format {
        CatalogFormat::FileBased => Style::new().green().apply_to(text).to_string(),
        CatalogFormat::LegacyDatabase => Style::new().yellow().apply_to(text).to_string(),
        CatalogFormat::Unknown => Style::new().dim().apply_to(text).to_string(),
    }
}

/// `--config` when given, otherwise the per-user config file or defaults.
pub fn load_config(path: Option<&Path>) -> Result<ComposerConfig, String> {
    match path {
        Some(p) => ComposerConfig::load(p),
        None => ComposerConfig::load_default(),
    }
    .map_err(|e| e.to_string())
}
