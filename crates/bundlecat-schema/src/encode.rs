use crate::declcfg::{
    DeclarativeConfig, Other, SCHEMA_BUNDLE, SCHEMA_CHANNEL, SCHEMA_PACKAGE,
};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("catalog write error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog record {index} has no 'schema' field")]
    MissingSchema { index: usize },
    #[error("catalog record {index} ({schema}) is invalid: {source}")]
    InvalidRecord {
        index: usize,
        schema: String,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct SchemaHeader {
    #[serde(default)]
    schema: Option<String>,
}

/// Write `cfg` as a stream of pretty-printed JSON records.
///
/// Output order depends only on content: for each package name referenced
/// by any record (sorted), the package record, its channels and its bundles
/// (each sorted by name), then its other records in input order. Other
/// records without a package come last. Other records are written verbatim.
pub fn write_json<W: Write>(cfg: &DeclarativeConfig, mut w: W) -> Result<(), EncodingError> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    names.extend(cfg.packages.iter().map(|p| p.name.as_str()));
    names.extend(cfg.channels.iter().map(|c| c.package.as_str()));
    names.extend(cfg.bundles.iter().map(|b| b.package.as_str()));
    names.extend(cfg.others.iter().filter_map(|o| o.package.as_deref()));

    for name in names {
        for pkg in cfg.packages.iter().filter(|p| p.name == name) {
            write_record(&mut w, pkg)?;
        }

        let mut channels: Vec<_> = cfg.channels.iter().filter(|c| c.package == name).collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        for channel in channels {
            write_record(&mut w, channel)?;
        }

        let mut bundles: Vec<_> = cfg.bundles.iter().filter(|b| b.package == name).collect();
        bundles.sort_by(|a, b| a.name.cmp(&b.name));
        for bundle in bundles {
            write_record(&mut w, bundle)?;
        }

        for other in cfg
            .others
            .iter()
            .filter(|o| o.package.as_deref() == Some(name))
        {
            write_other(&mut w, other)?;
        }
    }

    for other in cfg.others.iter().filter(|o| o.package.is_none()) {
        write_other(&mut w, other)?;
    }

    w.flush()?;
    Ok(())
}

fn write_record<W: Write, T: serde::Serialize>(w: &mut W, record: &T) -> Result<(), EncodingError> {
    serde_json::to_writer_pretty(&mut *w, record)?;
    w.write_all(b"\n")?;
    Ok(())
}

fn write_other<W: Write>(w: &mut W, other: &Other) -> Result<(), EncodingError> {
    w.write_all(other.blob.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Encode `cfg` into a string using [`write_json`].
pub fn to_json_string(cfg: &DeclarativeConfig) -> Result<String, EncodingError> {
    let mut buf = Vec::new();
    write_json(cfg, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// Decode a stream of JSON catalog records, dispatching on each record's `schema`.
pub fn parse_json(input: &str) -> Result<DeclarativeConfig, DecodeError> {
    let mut cfg = DeclarativeConfig::default();
    let stream = serde_json::Deserializer::from_str(input).into_iter::<Box<RawValue>>();

    for (index, item) in stream.enumerate() {
        let raw = item?;
        let text = raw.get();
        let header: SchemaHeader = serde_json::from_str(text)?;
        let Some(schema) = header.schema else {
            return Err(DecodeError::MissingSchema { index });
        };
        let invalid = |source: serde_json::Error| DecodeError::InvalidRecord {
            index,
            schema: schema.clone(),
            source,
        };

        match schema.as_str() {
            SCHEMA_PACKAGE => cfg
                .packages
                .push(serde_json::from_str(text).map_err(invalid)?),
            SCHEMA_CHANNEL => cfg
                .channels
                .push(serde_json::from_str(text).map_err(invalid)?),
            SCHEMA_BUNDLE => cfg
                .bundles
                .push(serde_json::from_str(text).map_err(invalid)?),
            _ => cfg.others.push(Other::from_json(text).map_err(invalid)?),
        }
    }

    Ok(cfg)
}

pub fn read_catalog_file(path: impl AsRef<Path>) -> Result<DeclarativeConfig, DecodeError> {
    let content = fs::read_to_string(path)?;
    parse_json(&content)
}
