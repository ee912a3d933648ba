//! Release resolution layer
//!
//! Turns raw version strings scraped from a repository into release series,
//! and classifies a batch of components against the dominant release.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │   Remote    │────▶│   Catalog   │◀────│  Classifier  │
//! │  (refresh)  │     │ (series map)│     │ (alignment)  │
//! └─────────────┘     └─────────────┘     └──────────────┘
//!                            ▲                    │
//!                            │                    ▼
//!                     ┌─────────────┐     ┌──────────────┐
//!                     │  Resolver   │     │    Forge     │
//!                     │ (tag parse) │     │ (tag lookup) │
//!                     └─────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: Release series table and per-series component matrix
//! - [`classifier`]: Dominant release detection and per-record status
//! - [`error`]: Error types for catalog and forge operations
//! - [`forge`]: Upstream tag and commit lookup: pins deployed commits to tags
//!   and recommends concrete versions
//! - [`remote`]: Remote catalog refresh with silent fallback
//! - [`resolver`]: Version tag to release series resolution
//! - [`types`]: Component records shared by the scanner and the report

pub mod catalog;
pub mod classifier;
pub mod error;
pub mod forge;
pub mod remote;
pub mod resolver;
pub mod types;
