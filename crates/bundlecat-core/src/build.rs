use crate::bundle::expect_single_bundle;
use crate::plan::MinimalCatalog;
use crate::CoreError;
use bundlecat_schema::{init_package, Channel, ChannelEntry, DeclarativeConfig, SCHEMA_CHANNEL};
use std::io::Read;
use tracing::debug;

/// Synthesize a one-package, one-channel catalog around a rendered bundle.
///
/// The package and channel records in `rendered` are replaced. Bundles and
/// other records are carried over as rendered.
pub fn build_minimal(
    rendered: DeclarativeConfig,
    request: &MinimalCatalog,
    description: Option<&mut dyn Read>,
) -> Result<DeclarativeConfig, CoreError> {
    expect_single_bundle(&request.bundle_image, &rendered)?;
    let package = init_package(&request.package, &request.channel, description)?;

    let bundles = rendered.bundles;
    let channel = Channel {
        schema: SCHEMA_CHANNEL.to_owned(),
        name: package.default_channel.clone(),
        package: package.name.clone(),
        entries: bundles.iter().map(|b| ChannelEntry::new(&b.name)).collect(),
        properties: Vec::new(),
    };
    debug!(
        "built minimal catalog: package {}, channel {}",
        package.name, channel.name
    );

    Ok(DeclarativeConfig {
        packages: vec![package],
        channels: vec![channel],
        bundles,
        others: rendered.others,
    })
}
