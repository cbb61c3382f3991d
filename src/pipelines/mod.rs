// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for photo capture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │   data: URL  │
//! │  (RGBA/YUV)  │     │  - frame → RGB    │     │  (PNG/JPEG)  │
//! │              │     │  - mirror         │     │              │
//! │              │     │  - encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! CPU-bound stages run on blocking workers so the preview keeps updating.

pub mod photo;
