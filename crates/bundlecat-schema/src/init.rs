use crate::declcfg::{Package, SCHEMA_PACKAGE};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("package name must not be empty")]
    EmptyPackageName,
    #[error("default channel for package '{0}' must not be empty")]
    EmptyDefaultChannel(String),
    #[error("failed to read package description: {0}")]
    Description(#[from] std::io::Error),
}

/// Synthesize an `olm.package` record.
///
/// The description stream is read to the end and must be valid UTF-8. A
/// description that is empty or only whitespace is left unset.
pub fn init_package(
    name: &str,
    default_channel: &str,
    description: Option<&mut dyn Read>,
) -> Result<Package, InitError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InitError::EmptyPackageName);
    }
    let default_channel = default_channel.trim();
    if default_channel.is_empty() {
        return Err(InitError::EmptyDefaultChannel(name.to_owned()));
    }

    let description = match description {
        Some(reader) => {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            Some(text).filter(|t| !t.trim().is_empty())
        }
        None => None,
    };

    Ok(Package {
        schema: SCHEMA_PACKAGE.to_owned(),
        name: name.to_owned(),
        default_channel: default_channel.to_owned(),
        icon: None,
        description,
        properties: Vec::new(),
    })
}
