//! Folder and file name generation.
//!
//! Names are derived deterministically: the same label and content type
//! always yield the same file name, so re-running a gallery targets the same
//! paths.

use crate::gallery::Metadata;

/// Metadata keys (Italian, as published by the archive) joined into the folder name.
const FOLDER_NAME_KEYS: [&str; 2] = ["Contesto archivistico", "Titolo"];

/// Fallback stem for labels that slug to nothing.
const UNTITLED: &str = "untitled";

/// Converts `value` into a lowercase, filesystem- and URL-safe slug.
///
/// Accented Latin letters are folded to ASCII; every run of other
/// characters becomes a single `-`; leading and trailing separators are
/// removed.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_separator = false;

    for ch in value.chars() {
        let folded = fold_to_ascii(ch);
        let mut emitted = false;
        for c in folded.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !out.is_empty() {
                    out.push('-');
                }
                pending_separator = false;
                out.push(c.to_ascii_lowercase());
                emitted = true;
            }
        }
        if !emitted {
            pending_separator = true;
        }
    }
    out
}

fn fold_to_ascii(ch: char) -> String {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "O",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'ç' => "c",
        'Ç' => "C",
        'ñ' => "n",
        'Ñ' => "N",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        _ => return ch.to_string(),
    };
    folded.to_string()
}

/// Builds the gallery folder name from its metadata and archive id.
///
/// Pattern: `slug(<archival context>-<title>-<archive id>)`; missing metadata
/// keys are skipped.
#[must_use]
pub fn folder_name(metadata: &Metadata, archive_id: &str) -> String {
    let parts: Vec<&str> = FOLDER_NAME_KEYS
        .iter()
        .filter_map(|key| metadata.get(*key).map(String::as_str))
        .chain(std::iter::once(archive_id))
        .filter(|part| !part.trim().is_empty())
        .collect();
    let slug = slugify(&parts.join("-"));
    if slug.is_empty() {
        UNTITLED.to_string()
    } else {
        slug
    }
}

/// Builds the file name of an item: `slug(label)` plus the extension implied
/// by `content_type`.
///
/// Returns `None` when no extension can be derived from the content type.
#[must_use]
pub fn file_name(label: &str, content_type: &str) -> Option<String> {
    let extension = extension_from_content_type(content_type)?;
    let stem = slugify(label);
    let stem = if stem.is_empty() { UNTITLED } else { &stem };
    Some(format!("{stem}{extension}"))
}

/// Maps a `Content-Type` header value to a file extension (with leading dot).
///
/// Parameters such as `; charset=utf-8` are ignored and matching is
/// case-insensitive. Unknown types yield `None`.
#[must_use]
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let extension = match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/tiff" => ".tif",
        "image/webp" => ".webp",
        "image/jp2" | "image/jpx" => ".jp2",
        "image/bmp" => ".bmp",
        "image/avif" => ".avif",
        "image/svg+xml" => ".svg",
        "application/pdf" => ".pdf",
        "text/html" => ".html",
        "text/plain" => ".txt",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        _ => return None,
    };
    Some(extension)
}
