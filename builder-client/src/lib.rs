//! # Surface Builder Client
//!
//! HTTP implementations of the collaborator traits defined in
//! `builder-core`:
//!
//! - [`ApiClient`] implements `WidgetService` (widget library lookups)
//! - [`ApiClient`] implements `AssetResolver` (storage path presigning)
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use builder_client::ApiClient;
//! use builder_core::{WidgetCacheConfig, WidgetRef, WidgetResolver};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::new("https://api.example.com/v1", None)?;
//! let resolver = WidgetResolver::new(Arc::new(api), WidgetCacheConfig::default());
//! let hero = resolver.resolve_widget(&WidgetRef::new("app-1", "hero")).await?;
//! println!("{}", hero.name);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod client;

pub use client::{ApiClient, ClientError};
