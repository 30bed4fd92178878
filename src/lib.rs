//! `nuana` extracts per-particle features from reconstructed neutrino
//! events and matches them to the simulated ("truth") particles that
//! produced them.
//!
//! For each event passing the [selection](config::Selection) the
//! reconstructed daughters of the neutrino hypothesis are collected
//! together with their track length, track score, calorimetry and
//! generation. Each daughter is matched to the simulated particle that
//! deposited the most energy in its hits. Primary simulated particles
//! without reconstructed counterpart are listed separately.
//!
//! # How to use
//!
//! Have a look at `demos/minimal.rs`.
//!
//! ## Most relevant modules
//!
//! - [prelude] exports a list of the most relevant classes and objects
//! - [analysis] contains the event loop
//! - [rows] extracts the rows of a single event
//! - [event] for the event data products
//! - [config] for the analysis settings
//! - [table] for the output table
//!

/// Association tables between event products
pub mod assns;
/// Event loop
pub mod analysis;
/// Analysis settings
pub mod config;
/// Event data products
pub mod event;
/// Ancestry depth
pub mod generation;
/// Most important exports
pub mod prelude;
/// Per-event rows
pub mod rows;
/// Event selection
pub mod selection;
/// Neutrino slice
pub mod slice;
/// Output table
pub mod table;
/// Common traits
pub mod traits;
/// Matching to simulated particles
pub mod truth;

pub use crate::{
    analysis::{Analysis, AnalysisBuilder},
    rows::RowBuilder,
    table::Table,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_REV: Option<&str> = option_env!("VERGEN_GIT_SHA");
pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");
