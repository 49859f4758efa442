//! Gallery resolution: from a gallery page URL to an ordered list of items.
//!
//! A Portale Antenati gallery is one archival unit (for example a register of
//! births for one town and year). Its web page references a IIIF manifest
//! that lists every scanned page with a label and an image URL, plus
//! descriptive metadata used to name the destination folder.
//!
//! # Architecture
//!
//! - [`ManifestSource`] - Async trait resolving a gallery URL to a [`Manifest`]
//! - [`IiifManifestSource`] - Implementation over the shared HTTP client
//! - [`Gallery`] - Immutable per-run view: archive id, items, folder name
//! - [`ItemRange`] - 1-based inclusive selection of items to download

mod error;
mod iiif;

pub use error::GalleryError;
pub use iiif::{IiifManifestSource, extract_manifest_url};

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, instrument};
use url::Url;

use crate::naming;

/// Descriptive metadata of a gallery (label → value).
pub type Metadata = BTreeMap<String, String>;

/// Archive unit identifier embedded in gallery URLs (`.../an_ua19944535/...`).
#[allow(clippy::expect_used)]
static ARCHIVE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"an_ua\d+").expect("archive id regex is valid") // Static pattern, safe to panic
});

/// One page image of a gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: String,
    label: String,
    source_url: String,
}

impl Item {
    /// Creates an item.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            source_url: source_url.into(),
        }
    }

    /// Identifier, unique within the gallery.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable page label (e.g. `pag. 12`).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Image URL.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Returns a copy requesting an image resized to `width` pixels.
    ///
    /// Only the IIIF size segment of the URL changes.
    #[must_use]
    pub fn with_width(&self, width: u32) -> Self {
        Self {
            source_url: apply_size_hint(&self.source_url, width),
            ..self.clone()
        }
    }
}

/// Rewrites the size segment of a IIIF image URL to `<width>,`.
///
/// `.../full/full/0/default.jpg` and `.../full/max/0/default.jpg` become
/// `.../full/<width>,/0/default.jpg`. URLs without such a segment are
/// returned unchanged.
#[must_use]
pub fn apply_size_hint(url: &str, width: u32) -> String {
    let resized = format!("/full/{width},/");
    for full_size in ["/full/full/", "/full/max/"] {
        if let Some(pos) = url.rfind(full_size) {
            let mut rewritten = String::with_capacity(url.len() + resized.len());
            rewritten.push_str(&url[..pos]);
            rewritten.push_str(&resized);
            rewritten.push_str(&url[pos + full_size.len()..]);
            return rewritten;
        }
    }
    debug!(url = %url, "no IIIF size segment found; size hint ignored");
    url.to_string()
}

/// Resolved manifest contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// URL the manifest was fetched from.
    pub url: String,
    /// Descriptive metadata.
    pub metadata: Metadata,
    /// Items in manifest order.
    pub items: Vec<Item>,
}

/// Resolves a gallery URL to its manifest.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetches and decodes the manifest of the gallery at `gallery_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError`] when the page or manifest cannot be fetched
    /// or decoded.
    async fn resolve(&self, gallery_url: &str) -> Result<Manifest, GalleryError>;
}

/// Extracts the archive unit id from a gallery URL.
///
/// Prefers the `an_ua<digits>` token; falls back to the last non-empty path
/// segment. Returns `None` for URLs without a path.
#[must_use]
pub fn archive_id_from_url(gallery_url: &str) -> Option<String> {
    if let Some(found) = ARCHIVE_ID_PATTERN.find(gallery_url) {
        return Some(found.as_str().to_string());
    }
    let parsed = Url::parse(gallery_url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}

/// One gallery, immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery {
    archive_id: String,
    manifest_url: String,
    metadata: Metadata,
    items: Vec<Item>,
    directory_name: String,
}

impl Gallery {
    /// Builds a gallery from a resolved manifest.
    ///
    /// The directory name is derived from the metadata and `archive_id`.
    pub fn new(archive_id: impl Into<String>, manifest: Manifest) -> Self {
        let archive_id = archive_id.into();
        let directory_name = naming::folder_name(&manifest.metadata, &archive_id);
        Self {
            archive_id,
            manifest_url: manifest.url,
            metadata: manifest.metadata,
            items: manifest.items,
            directory_name,
        }
    }

    /// Resolves `gallery_url` through `source` into a gallery.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::InvalidUrl`] if no archive id can be derived,
    /// [`GalleryError::NoItems`] if the manifest lists no images, or any
    /// error reported by `source`.
    #[instrument(skip(source))]
    pub async fn resolve(
        source: &dyn ManifestSource,
        gallery_url: &str,
    ) -> Result<Self, GalleryError> {
        let archive_id =
            archive_id_from_url(gallery_url).ok_or_else(|| GalleryError::InvalidUrl {
                url: gallery_url.to_string(),
            })?;
        let manifest = source.resolve(gallery_url).await?;
        if manifest.items.is_empty() {
            return Err(GalleryError::NoItems { url: manifest.url });
        }

        let gallery = Self::new(archive_id, manifest);
        info!(
            archive_id = %gallery.archive_id,
            items = gallery.items.len(),
            directory = %gallery.directory_name,
            "gallery resolved"
        );
        Ok(gallery)
    }

    /// Archive unit identifier.
    #[must_use]
    pub fn archive_id(&self) -> &str {
        &self.archive_id
    }

    /// Manifest URL.
    #[must_use]
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// Descriptive metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// All items in manifest order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Filesystem-safe folder name for this gallery.
    #[must_use]
    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }

    /// Returns the items selected by `range`.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::InvalidRange`] if the range selects nothing.
    pub fn select(&self, range: ItemRange) -> Result<&[Item], GalleryError> {
        range.apply(&self.items)
    }
}

/// 1-based inclusive item selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRange {
    first: usize,
    last: Option<usize>,
}

impl Default for ItemRange {
    fn default() -> Self {
        Self::all()
    }
}

impl ItemRange {
    /// Selects items `first..=last` (1-based); `last = None` means until the end.
    #[must_use]
    pub fn new(first: usize, last: Option<usize>) -> Self {
        Self { first, last }
    }

    /// Selects every item.
    #[must_use]
    pub fn all() -> Self {
        Self {
            first: 1,
            last: None,
        }
    }

    /// Applies the range to `items`, clamping `last` to the item count.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::InvalidRange`] if `first` is zero, beyond the
    /// last item, or greater than `last`.
    pub fn apply<'a>(&self, items: &'a [Item]) -> Result<&'a [Item], GalleryError> {
        let invalid = || GalleryError::InvalidRange {
            first: self.first,
            last: self.last,
            available: items.len(),
        };

        if self.first == 0 || self.first > items.len() {
            return Err(invalid());
        }
        let last = self.last.unwrap_or(items.len()).min(items.len());
        if self.first > last {
            return Err(invalid());
        }
        Ok(&items[self.first - 1..last])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<Item> {
        (1..=n)
            .map(|i| {
                Item::new(
                    format!("c{i}"),
                    format!("pag. {i}"),
                    format!("https://iiif.example/{i}/full/full/0/default.jpg"),
                )
            })
            .collect()
    }

    #[test]
    fn test_apply_size_hint_rewrites_full_segment() {
        let url = "https://iiif-antenati.cultura.gov.it/iiif/2/abc/full/full/0/default.jpg";
        assert_eq!(
            apply_size_hint(url, 1200),
            "https://iiif-antenati.cultura.gov.it/iiif/2/abc/full/1200,/0/default.jpg"
        );
    }

    #[test]
    fn test_apply_size_hint_rewrites_max_segment() {
        let url = "https://iiif.example/img/full/max/0/default.jpg";
        assert_eq!(
            apply_size_hint(url, 800),
            "https://iiif.example/img/full/800,/0/default.jpg"
        );
    }

    #[test]
    fn test_apply_size_hint_leaves_other_urls_untouched() {
        let url = "https://example.com/scan-1.jpg";
        assert_eq!(apply_size_hint(url, 800), url);
    }

    #[test]
    fn test_item_with_width_keeps_id_and_label() {
        let item = items(1).remove(0);
        let resized = item.with_width(640);
        assert_eq!(resized.id(), item.id());
        assert_eq!(resized.label(), item.label());
        assert!(resized.source_url().contains("/full/640,/"));
    }

    #[test]
    fn test_archive_id_from_ark_url() {
        let url = "https://antenati.cultura.gov.it/ark:/12657/an_ua19944535/w9DWR8x";
        assert_eq!(archive_id_from_url(url).unwrap(), "an_ua19944535");
    }

    #[test]
    fn test_archive_id_falls_back_to_last_segment() {
        let url = "https://example.com/gallery/abc123/";
        assert_eq!(archive_id_from_url(url).unwrap(), "abc123");
    }

    #[test]
    fn test_archive_id_none_without_path() {
        assert!(archive_id_from_url("https://example.com/").is_none());
        assert!(archive_id_from_url("not a url").is_none());
    }

    #[test]
    fn test_range_all_selects_everything() {
        let items = items(5);
        assert_eq!(ItemRange::all().apply(&items).unwrap().len(), 5);
    }

    #[test]
    fn test_range_first_and_last_are_inclusive() {
        let items = items(10);
        let selected = ItemRange::new(3, Some(5)).apply(&items).unwrap();
        let labels: Vec<&str> = selected.iter().map(Item::label).collect();
        assert_eq!(labels, vec!["pag. 3", "pag. 4", "pag. 5"]);
    }

    #[test]
    fn test_range_last_is_clamped() {
        let items = items(4);
        let selected = ItemRange::new(2, Some(99)).apply(&items).unwrap();
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn test_range_rejects_first_beyond_end() {
        let items = items(4);
        let result = ItemRange::new(5, None).apply(&items);
        assert!(matches!(
            result,
            Err(GalleryError::InvalidRange {
                first: 5,
                available: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_range_rejects_first_after_last_and_zero() {
        let items = items(4);
        assert!(ItemRange::new(3, Some(2)).apply(&items).is_err());
        assert!(ItemRange::new(0, None).apply(&items).is_err());
    }

    #[test]
    fn test_gallery_new_derives_directory_name() {
        let mut metadata = Metadata::new();
        metadata.insert("Titolo".to_string(), "Nati 1820".to_string());
        let gallery = Gallery::new(
            "an_ua1",
            Manifest {
                url: "https://example.com/manifest.json".to_string(),
                metadata,
                items: items(2),
            },
        );
        assert_eq!(gallery.archive_id(), "an_ua1");
        assert_eq!(gallery.directory_name(), "nati-1820-an-ua1");
        assert_eq!(gallery.items().len(), 2);
        assert_eq!(gallery.select(ItemRange::new(2, None)).unwrap().len(), 1);
    }
}
