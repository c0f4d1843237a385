//! # sheetnest core
//!
//! Shared types for the sheetnest polygon nesting engine.
//!
//! This crate holds everything that does not depend on the polygon model:
//! errors, strategy selection, the per-strategy configuration records, the
//! genetic-algorithm runner, and the run summary.
//!
//! ## Core Components
//!
//! - **Errors**: [`Error`], [`Result`]
//! - **Configuration**: [`NestConfig`] with one record per strategy
//!   ([`NfpConfig`], [`PlacementConfig`], [`GravityConfig`], [`GaConfig`], [`SatConfig`])
//! - **GA framework**: [`GaRunner`], [`GaProblem`], [`Individual`], [`order_crossover`]
//! - **Results**: [`RunSummary`]
//!
//! ## Strategies
//!
//! | Strategy | Speed | Quality | Geometry |
//! |----------|-------|---------|----------|
//! | `Greedy` | Medium | High | any, holes used for nesting |
//! | `Gravity` | Slow | Medium | any |
//! | `Genetic` | Medium | Medium | bounding boxes (grid fill) |
//! | `Sat` | Fast | Basic | convex only |
//!
//! ## Configuration
//!
//! ```rust
//! use sheetnest_core::{GravityConfig, NestConfig, Strategy};
//!
//! let config = NestConfig::new(1200.0, 800.0)
//!     .with_strategy(Strategy::Gravity)
//!     .with_sheet_spacing(20.0)
//!     .with_gravity(GravityConfig::new().with_step_size(2.5).with_seed(42));
//!
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod config;
pub mod error;
pub mod ga;
pub mod result;

// Re-exports
pub use config::{
    ConcavePolicy, FillDirection, GravityConfig, NestConfig, NfpConfig, PlacementConfig,
    SatConfig, Strategy,
};
pub use error::{Error, Result};
pub use ga::{order_crossover, GaConfig, GaProblem, GaResult, GaRunner, Individual};
pub use result::RunSummary;
