use serde::{Deserialize, Serialize};

pub const SCHEMA_PACKAGE: &str = "olm.package";
pub const SCHEMA_CHANNEL: &str = "olm.channel";
pub const SCHEMA_BUNDLE: &str = "olm.bundle";

/// Property type carrying the ClusterServiceVersion summary of a bundle.
pub const PROPERTY_CSV_METADATA: &str = "olm.csv.metadata";

/// In-memory snapshot of a declarative (file-based) catalog.
///
/// The four sequences keep the order in which records were rendered or
/// appended. Uniqueness and reference integrity are not enforced here; see
/// [`crate::model::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarativeConfig {
    pub packages: Vec<Package>,
    pub channels: Vec<Channel>,
    pub bundles: Vec<Bundle>,
    pub others: Vec<Other>,
}

impl DeclarativeConfig {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
            && self.channels.is_empty()
            && self.bundles.is_empty()
            && self.others.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub schema: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(rename = "base64data")]
    pub base64_data: String,
    pub mediatype: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub schema: String,
    pub name: String,
    pub package: String,
    pub entries: Vec<ChannelEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

/// One bundle's placement in a channel, with its upgrade edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_range: Option<String>,
}

impl ChannelEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub schema: String,
    pub name: String,
    pub package: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_images: Vec<RelatedImage>,
}

impl Bundle {
    /// First property of the given type, if any.
    pub fn property(&self, property_type: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.property_type == property_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type")]
    pub property_type: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedImage {
    #[serde(default)]
    pub name: String,
    pub image: String,
}

/// A record whose schema the structural model does not type.
///
/// `blob` holds the record's original JSON text and is written back as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Other {
    pub schema: String,
    pub package: Option<String>,
    pub name: Option<String>,
    pub blob: String,
}

#[derive(Deserialize)]
struct OtherHeader {
    schema: String,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl Other {
    /// Wrap a raw JSON object, reading only its `schema`, `package` and `name` keys.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let header: OtherHeader = serde_json::from_str(raw)?;
        Ok(Self {
            schema: header.schema,
            package: header.package.filter(|p| !p.is_empty()),
            name: header.name.filter(|n| !n.is_empty()),
            blob: raw.trim().to_owned(),
        })
    }
}
