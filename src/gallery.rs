//! The persisted gallery of rasterized patterns.
//!
//! The whole gallery is one blob under one key. Every mutation reads the
//! current collection, changes it in memory, and writes the full collection
//! back with a single `set`. Mutations through one [`GalleryStore`] are
//! serialized by an internal lock; separate stores sharing a key are last
//! writer wins.
//!
//! # Blob format
//!
//! ```json
//! { "version": 1, "entries": ["<base64 png>", "<base64 png>"] }
//! ```
//!
//! A bare JSON array of base64 strings, as written by earlier releases, is
//! also accepted on load.

use std::sync::{Mutex, MutexGuard};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{DecodeError, GalleryError, GalleryResult};
use crate::raster::RasterImage;
use crate::store::KeyValueStore;

/// Key the gallery is stored under unless configured otherwise.
pub const DEFAULT_GALLERY_KEY: &str = "savedPatterns";

const BLOB_VERSION: u32 = 1;

// ============================================================================
// Configuration
// ============================================================================

/// Settings for a [`GalleryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryConfig {
    /// Persistence key holding the collection.
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    DEFAULT_GALLERY_KEY.to_string()
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self { key: default_key() }
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// One saved image, held in encoded (PNG) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    bytes: Vec<u8>,
}

impl GalleryEntry {
    /// Encoded bytes, ready for copy, share or export.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn decode(&self) -> Result<RasterImage, DecodeError> {
        codec::decode(&self.bytes)
    }

    /// Exact pixel comparison against an image.
    pub fn matches(&self, image: &RasterImage) -> bool {
        self.decode().is_ok_and(|decoded| decoded == *image)
    }
}

/// Ordered collection of saved images; insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GalleryEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &GalleryEntry> {
        self.entries.iter()
    }

    /// Decodes every entry for display.
    pub fn images(&self) -> Result<Vec<RasterImage>, DecodeError> {
        self.entries.iter().map(GalleryEntry::decode).collect()
    }

    /// Index of the first entry whose pixels equal `image` exactly.
    pub fn position_of(&self, image: &RasterImage) -> Option<usize> {
        self.entries.iter().position(|entry| entry.matches(image))
    }

    fn push_encoded(&mut self, bytes: Vec<u8>) {
        self.entries.push(GalleryEntry { bytes });
    }
}

impl<'a> IntoIterator for &'a Gallery {
    type Item = &'a GalleryEntry;
    type IntoIter = std::slice::Iter<'a, GalleryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Blob format
// ============================================================================

#[derive(Serialize, Deserialize)]
struct GalleryBlob {
    version: u32,
    entries: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBlob {
    Current(GalleryBlob),
    Legacy(Vec<String>),
}

/// Parses a stored blob, skipping entries that do not decode.
///
/// Returns `None` when the blob as a whole is unreadable.
fn parse_blob(bytes: &[u8]) -> Option<Gallery> {
    let encoded = match serde_json::from_slice::<StoredBlob>(bytes) {
        Ok(StoredBlob::Current(blob)) if blob.version == BLOB_VERSION => blob.entries,
        Ok(StoredBlob::Current(blob)) => {
            tracing::warn!(version = blob.version, "unsupported gallery blob version");
            return None;
        }
        Ok(StoredBlob::Legacy(entries)) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "malformed gallery blob");
            return None;
        }
    };

    let mut gallery = Gallery::new();
    for (index, entry) in encoded.iter().enumerate() {
        let Ok(bytes) = BASE64.decode(entry) else {
            tracing::warn!(index, "skipping gallery entry with invalid base64");
            continue;
        };
        if let Err(e) = codec::decode(&bytes) {
            tracing::warn!(index, error = %e, "skipping undecodable gallery entry");
            continue;
        }
        gallery.push_encoded(bytes);
    }
    Some(gallery)
}

fn serialize_blob(gallery: &Gallery) -> GalleryResult<Vec<u8>> {
    let blob = GalleryBlob {
        version: BLOB_VERSION,
        entries: gallery.iter().map(|e| BASE64.encode(e.bytes())).collect(),
    };
    serde_json::to_vec(&blob).map_err(|e| GalleryError::serde(e.to_string()))
}

// ============================================================================
// GalleryStore
// ============================================================================

/// Reads and mutates the gallery held in a [`KeyValueStore`].
pub struct GalleryStore<S: KeyValueStore> {
    store: S,
    config: GalleryConfig,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> GalleryStore<S> {
    /// Uses the default `"savedPatterns"` key.
    pub fn new(store: S) -> Self {
        Self::with_config(store, GalleryConfig::default())
    }

    pub fn with_config(store: S, config: GalleryConfig) -> Self {
        Self {
            store,
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the persisted gallery.
    ///
    /// Never fails: a missing, unreadable or malformed blob is an empty
    /// gallery, and individual entries that do not decode are skipped.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %self.config.key))]
    pub fn load(&self) -> Gallery {
        self.read().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "gallery read failed, treating as empty");
            Gallery::new()
        })
    }

    /// Like [`load`](Self::load), but a failing store read is an error so
    /// that mutations never overwrite a collection they could not read.
    fn read(&self) -> GalleryResult<Gallery> {
        let Some(bytes) = self.store.get(&self.config.key)? else {
            return Ok(Gallery::new());
        };
        let gallery = parse_blob(&bytes).unwrap_or_default();
        tracing::debug!(entries = gallery.len(), "loaded gallery");
        Ok(gallery)
    }

    /// Encodes `image` and appends it to the end of the gallery.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %self.config.key), err(Display))]
    pub fn append(&self, image: &RasterImage) -> GalleryResult<Gallery> {
        let encoded = codec::encode(image)?;
        self.mutate(|gallery| {
            gallery.push_encoded(encoded);
            Ok(())
        })
    }

    /// Removes the entry at `index`.
    #[tracing::instrument(level = "debug", skip(self), fields(key = %self.config.key), err(Display))]
    pub fn remove(&self, index: usize) -> GalleryResult<Gallery> {
        self.mutate(|gallery| {
            if index >= gallery.len() {
                return Err(GalleryError::IndexOutOfRange {
                    index,
                    len: gallery.len(),
                });
            }
            gallery.entries.remove(index);
            Ok(())
        })
    }

    /// Removes the first entry whose pixels equal `image` byte for byte.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %self.config.key), err(Display))]
    pub fn remove_matching(&self, image: &RasterImage) -> GalleryResult<Gallery> {
        self.mutate(|gallery| {
            let index = gallery
                .position_of(image)
                .ok_or(GalleryError::NoMatchingEntry)?;
            gallery.entries.remove(index);
            Ok(())
        })
    }

    /// Overwrites the whole gallery with `images`, in order.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %self.config.key), err(Display))]
    pub fn replace_all(
        &self,
        images: impl IntoIterator<Item = RasterImage>,
    ) -> GalleryResult<Gallery> {
        let mut replacement = Gallery::new();
        for image in images {
            replacement.push_encoded(codec::encode(&image)?);
        }
        let _guard = self.lock();
        self.write(&replacement)?;
        Ok(replacement)
    }

    /// Overwrites the gallery with an empty collection.
    pub fn clear(&self) -> GalleryResult<Gallery> {
        self.replace_all(std::iter::empty())
    }

    /// Read-modify-write of the whole collection under the write lock.
    ///
    /// Nothing is written if `change` fails.
    fn mutate(
        &self,
        change: impl FnOnce(&mut Gallery) -> GalleryResult<()>,
    ) -> GalleryResult<Gallery> {
        let _guard = self.lock();
        let mut gallery = self.read()?;
        change(&mut gallery)?;
        self.write(&gallery)?;
        Ok(gallery)
    }

    fn write(&self, gallery: &Gallery) -> GalleryResult<()> {
        let blob = serialize_blob(gallery)?;
        self.store.set(&self.config.key, &blob)?;
        tracing::debug!(entries = gallery.len(), bytes = blob.len(), "saved gallery");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// Tests
// ============================================================================
