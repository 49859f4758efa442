//! IIIF Presentation manifest lookup over HTTP.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{GalleryError, Item, Manifest, ManifestSource, Metadata};
use crate::download::HttpClient;

/// `manifestId` assignment in the gallery page's viewer bootstrap script,
/// either JS (`manifestId = '...'`) or JSON (`"manifestId": "..."`) style.
#[allow(clippy::expect_used)]
static MANIFEST_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?manifestId["']?\s*[:=]\s*["']([^"']+)["']"#)
        .expect("manifest regex is valid") // Static pattern, safe to panic
});

/// Finds the manifest URL referenced by a gallery page, resolved against
/// `page_url` when relative.
#[must_use]
pub fn extract_manifest_url(html: &str, page_url: &str) -> Option<String> {
    let raw = MANIFEST_ID_PATTERN.captures(html)?.get(1)?.as_str().trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(absolute) => Some(absolute.into()),
        Err(_) => Url::parse(page_url)
            .ok()?
            .join(raw)
            .ok()
            .map(Into::into),
    }
}

/// Manifest source reading the gallery page, then the IIIF manifest it references.
#[derive(Debug, Clone)]
pub struct IiifManifestSource {
    client: HttpClient,
}

impl IiifManifestSource {
    /// Creates a source using `client` (and its cookie store) for both requests.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ManifestSource for IiifManifestSource {
    #[instrument(skip(self))]
    async fn resolve(&self, gallery_url: &str) -> Result<Manifest, GalleryError> {
        let html = self
            .client
            .get_text(gallery_url)
            .await
            .map_err(|source| GalleryError::Page {
                url: gallery_url.to_string(),
                source,
            })?;

        let manifest_url = extract_manifest_url(&html, gallery_url).ok_or_else(|| {
            GalleryError::ManifestNotFound {
                url: gallery_url.to_string(),
            }
        })?;
        debug!(manifest_url = %manifest_url, "manifest reference found");

        let body = self
            .client
            .get_text(&manifest_url)
            .await
            .map_err(|source| GalleryError::Manifest {
                url: manifest_url.clone(),
                source,
            })?;

        parse_manifest(&manifest_url, &body)
    }
}

/// Decodes a IIIF Presentation 2 manifest into metadata and items.
///
/// Canvases without an image are skipped. Missing canvas ids fall back to
/// the 1-based canvas position, missing labels to `pag. <position>`.
///
/// # Errors
///
/// Returns [`GalleryError::InvalidManifest`] if `body` is not a manifest.
pub(crate) fn parse_manifest(manifest_url: &str, body: &str) -> Result<Manifest, GalleryError> {
    let document: IiifManifest =
        serde_json::from_str(body).map_err(|source| GalleryError::InvalidManifest {
            url: manifest_url.to_string(),
            source,
        })?;

    let metadata: Metadata = document
        .metadata
        .into_iter()
        .map(|entry| (entry.label.text(), entry.value.text()))
        .filter(|(label, _)| !label.is_empty())
        .collect();

    let mut items = Vec::new();
    let canvases = document
        .sequences
        .into_iter()
        .next()
        .map(|sequence| sequence.canvases)
        .unwrap_or_default();

    for (position, canvas) in canvases.into_iter().enumerate() {
        let position = position + 1;
        let Some(image_url) = canvas
            .images
            .into_iter()
            .next()
            .map(|annotation| annotation.resource.id)
        else {
            warn!(position, "canvas without image skipped");
            continue;
        };
        let id = canvas.id.unwrap_or_else(|| position.to_string());
        let label = canvas
            .label
            .map(|label| label.text())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| format!("pag. {position}"));
        items.push(Item::new(id, label, image_url));
    }

    debug!(
        items = items.len(),
        metadata = metadata.len(),
        "manifest decoded"
    );
    Ok(Manifest {
        url: manifest_url.to_string(),
        metadata,
        items,
    })
}

#[derive(Debug, Deserialize)]
struct IiifManifest {
    #[serde(default)]
    metadata: Vec<MetadataEntry>,
    #[serde(default)]
    sequences: Vec<Sequence>,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    label: IiifText,
    value: IiifText,
}

#[derive(Debug, Deserialize)]
struct Sequence {
    #[serde(default)]
    canvases: Vec<Canvas>,
}

#[derive(Debug, Deserialize)]
struct Canvas {
    #[serde(rename = "@id")]
    id: Option<String>,
    label: Option<IiifText>,
    #[serde(default)]
    images: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    resource: Resource,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "@id")]
    id: String,
}

/// IIIF text: a plain string, a language-tagged value, or a list of either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IiifText {
    Plain(String),
    Localized(LocalizedValue),
    Many(Vec<IiifText>),
}

#[derive(Debug, Deserialize)]
struct LocalizedValue {
    #[serde(rename = "@value")]
    value: String,
}

impl IiifText {
    fn text(&self) -> String {
        match self {
            Self::Plain(text) => text.trim().to_string(),
            Self::Localized(localized) => localized.value.trim().to_string(),
            Self::Many(values) => values
                .iter()
                .map(Self::text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}
