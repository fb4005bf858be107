//! Control-plane core for pixel-matrix displays.
//!
//! Two independent pieces:
//!
//! - [`topic`]: bridges a publish/subscribe transport onto per-plugin topics. Each plugin's
//!   topics are reachable under `/display/uid/<uid>` and `/display/alias/<alias>`. JSON
//!   payloads are forwarded to the plugin, and a payload carrying a base64 `file` is stored in
//!   the file system first.
//! - [`matrix`]: addresses a rectangular LED panel in `(x, y)` coordinates over a strip-order
//!   [`driver::PixelDriver`], with sixteen runtime-switchable wiring [`layout`]s and
//!   brightness capped by the supply's power budget.
//!
//! # Glossary
//!
//! - **Topology:** how the LED strip is folded into the panel, see [`layout::Topology`].
//! - **Probe:** mapping a coordinate without clamping, so off-panel coordinates are detectable.
//! - **Base URI:** the per-plugin subscription prefix, see [`topic::base_uri_by_uid`].
//!
//! # Features
//!
//! - `host`: std build with the [`fs::StdFileSystem`] adapter; the integration tests need it.
//! - `defmt`: log through `defmt` instead of the `log` facade.
#![cfg_attr(not(feature = "host"), no_std)]

extern crate alloc;

// Must come first so the logging macros are visible in every module below.
#[macro_use]
mod fmt;

pub mod color;
pub mod driver;
mod error;
#[cfg(feature = "host")]
pub mod fs;
pub mod layout;
pub mod matrix;
pub mod topic;

pub use crate::error::{Error, Result};
