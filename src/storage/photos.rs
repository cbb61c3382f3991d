// SPDX-License-Identifier: MPL-2.0

//! Photo list mirrored into a key-value slot
//!
//! The slot holds a JSON array of data URLs. It is read once when the store
//! is loaded and rewritten in full after every mutation, so the persisted
//! list always equals the in-memory list once a mutation returns.

use super::KeyValueStore;
use crate::constants::storage::PHOTOS_KEY;
use crate::errors::{PhotoError, StorageError};
use crate::pipelines::photo::encoding::parse_data_url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One captured photo, stored as a `data:image/<fmt>;base64,...` URL
///
/// Its position in the [`PhotoStore`] is its only identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Photo(String);

impl Photo {
    /// Wrap a data URL after checking it is one
    pub fn from_data_url(url: impl Into<String>) -> Result<Self, PhotoError> {
        let url = url.into();
        parse_data_url(&url)?;
        Ok(Self(url))
    }

    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    /// MIME type from the URL header, e.g. `image/png`
    pub fn mime_type(&self) -> Option<&str> {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
    }

    /// Encoded image bytes carried by the URL
    pub fn decode_bytes(&self) -> Result<Vec<u8>, PhotoError> {
        parse_data_url(&self.0).map(|(_, bytes)| bytes)
    }

    pub fn decode_image(&self) -> Result<image::DynamicImage, PhotoError> {
        let bytes = self.decode_bytes()?;
        image::load_from_memory(&bytes).map_err(|e| PhotoError::DecodingFailed(e.to_string()))
    }

    /// Size of the encoded payload in bytes
    pub fn encoded_len(&self) -> usize {
        self.decode_bytes().map(|b| b.len()).unwrap_or(0)
    }
}

impl std::fmt::Display for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered photo collection backed by a persisted slot
pub struct PhotoStore {
    photos: Vec<Photo>,
    backing: Box<dyn KeyValueStore>,
    revision: u64,
}

impl PhotoStore {
    /// Read the persisted list
    ///
    /// A missing slot is an empty gallery. A slot that is not a JSON array
    /// of strings is logged and treated as empty; it is only replaced by the
    /// next mutation.
    pub fn load(backing: Box<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let photos = match backing.get(PHOTOS_KEY)? {
            None => {
                debug!("No persisted photos");
                Vec::new()
            }
            Some(text) => match serde_json::from_str::<Vec<Photo>>(&text) {
                Ok(photos) => photos,
                Err(e) => {
                    warn!(error = %e, "Persisted photo list is malformed, starting empty");
                    Vec::new()
                }
            },
        };

        info!(count = photos.len(), "Photo store loaded");
        Ok(Self {
            photos,
            backing,
            revision: 0,
        })
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Photo> {
        self.photos.get(index)
    }

    /// Counter bumped by every committed mutation
    ///
    /// Two equal values mean the list has not changed in between.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Add a photo at the end and persist the list
    pub fn append(&mut self, photo: Photo) -> Result<(), StorageError> {
        let mut next = self.photos.clone();
        next.push(photo);
        self.commit(next)?;
        info!(count = self.photos.len(), "Photo appended");
        Ok(())
    }

    /// Remove the photo at `index` and persist the list
    pub fn remove(&mut self, index: usize) -> Result<Photo, StorageError> {
        let len = self.photos.len();
        if index >= len {
            return Err(StorageError::IndexOutOfRange { index, len });
        }

        let mut next = self.photos.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!(index, count = self.photos.len(), "Photo removed");
        Ok(removed)
    }

    // Write first, so a failed write leaves memory matching the slot
    fn commit(&mut self, next: Vec<Photo>) -> Result<(), StorageError> {
        let text = serde_json::to_string(&next)?;
        self.backing.set(PHOTOS_KEY, &text)?;
        self.photos = next;
        self.revision = self.revision.wrapping_add(1);
        Ok(())
    }
}

impl std::fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoStore")
            .field("len", &self.photos.len())
            .finish_non_exhaustive()
    }
}
