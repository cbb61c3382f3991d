// SPDX-License-Identifier: MPL-2.0

//! Mini Gallery - camera capture into a persisted photo gallery
//!
//! This library provides the core functionality of the Mini Gallery
//! application: a camera controller that starts, stops and switches between
//! front and rear cameras, and a photo store that keeps captured stills as
//! data URLs in a persisted key-value slot.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Camera controller, application model and message handling
//! - [`backends`]: Camera backend abstraction (V4L2 and virtual cameras)
//! - [`pipelines`]: Frame readback and photo encoding
//! - [`storage`]: Key-value slots and the photo store
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal user interface
//!
//! # Example
//!
//! ```no_run
//! use mini_gallery::backends::camera::CameraBackendManager;
//! use mini_gallery::storage::{MemoryStore, PhotoStore};
//! use mini_gallery::{AppModel, Config, Message};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let manager = CameraBackendManager::new(&config);
//! let store = PhotoStore::load(Box::new(MemoryStore::new()))?;
//! let mut app = AppModel::new(config, manager, store);
//!
//! app.update(Message::StartCamera).await;
//! app.update(Message::TakePhoto).await;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppModel, CameraController, Message};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use storage::{Photo, PhotoStore};
