use std::fmt;

use serde::{Deserialize, Serialize};

/// Upstream item identifier. Thingiverse sends numbers, but ids are opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThingId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThingId::Number(n) => write!(f, "{n}"),
            ThingId::Text(s) => f.write_str(s),
        }
    }
}

/// A catalog item as returned by `/popular` and `/things/{id}`.
///
/// Only the fields the proxy reads are modelled; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Thing {
    pub id: ThingId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub download_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub creator: Option<Creator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Creator {
    #[serde(default)]
    pub name: Option<String>,
}

/// One gallery entry from `/things/{id}/images`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThingImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sizes: Vec<ImageSize>,
}

/// A single rendition of a gallery image, e.g. `type = "display"`, `size = "large"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageSize {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub url: String,
}

impl ImageSize {
    /// Whether this rendition is the named variant.
    ///
    /// `display_large` matches `type = display, size = large`. Any name also
    /// matches a size or type spelled exactly like it, and renditions that
    /// carry neither are recognised by the name appearing in their URL.
    pub fn is_variant(&self, name: &str) -> bool {
        let kind = self.kind.as_deref();
        let size = self.size.as_deref();

        let compound = name
            .split_once('_')
            .is_some_and(|(want_kind, want_size)| kind == Some(want_kind) && size == Some(want_size));

        compound || size == Some(name) || kind == Some(name) || self.url.contains(name)
    }
}

/// List entry returned by `GET /api/models`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub id: ThingId,
    pub name: String,
    pub price: u32,
    pub image: Option<String>,
    pub category: &'static str,
    pub rating: f64,
    pub description: Option<String>,
    pub downloads: u64,
    pub like_count: Option<u64>,
}

/// Single item returned by `GET /api/models/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDetail {
    pub id: ThingId,
    pub name: String,
    pub price: u32,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub category: &'static str,
    pub rating: f64,
    pub description: Option<String>,
    pub downloads: u64,
    pub like_count: Option<u64>,
    pub creator: Option<String>,
    pub license: Option<String>,
}
