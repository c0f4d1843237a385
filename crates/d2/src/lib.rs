//! # sheetnest 2D
//!
//! Polygon nesting onto rectangular sheets.
//!
//! Parts (polygons with optional holes) are packed onto as many fixed-size
//! sheets as needed without overlapping each other or leaving the sheet.
//! Parts that fit nowhere are reported, never dropped silently.
//!
//! ## Features
//!
//! - Polygons with holes; smaller parts nest inside the holes of larger ones
//! - No-fit polygons from convex decomposition and Minkowski sums, cached per
//!   template pair and relative angle
//! - Incremental per-sheet forbidden regions
//! - Discrete rotations evaluated in parallel
//! - Four strategies: greedy NFP, gravity + anneal, genetic, separating axis
//! - R-tree broad phase for collision queries
//!
//! ## Quick Start
//!
//! ```rust
//! use sheetnest_d2::{NestConfig, Nester, Part, Polygon2D, Strategy};
//!
//! let square = Part::new("square", Polygon2D::rectangle(30.0, 30.0), 2.0, 4).unwrap();
//! let mut parts = square.instances(5);
//! parts.push(Part::new("disc", Polygon2D::circle(10.0, 24), 2.0, 1).unwrap());
//!
//! let config = NestConfig::new(100.0, 100.0).with_strategy(Strategy::Greedy);
//! let result = Nester::new(config).nest(&parts).unwrap();
//!
//! println!(
//!     "{} parts on {} sheets, utilization {}",
//!     result.summary.placed,
//!     result.summary.sheets_used,
//!     result.summary.utilization_percent()
//! );
//! assert!(result.unplaced.is_empty());
//! ```
//!
//! ## Polygons
//!
//! ```rust
//! use sheetnest_d2::Polygon2D;
//!
//! let rect = Polygon2D::rectangle(100.0, 50.0);
//! let l_shape = Polygon2D::l_shape(100.0, 80.0, 30.0, 30.0);
//! let frame = Polygon2D::frame(60.0, 10.0);
//! let custom = Polygon2D::new(vec![(0.0, 0.0), (100.0, 0.0), (50.0, 80.0)]);
//!
//! assert_eq!(frame.holes().len(), 1);
//! assert!(!l_shape.is_convex());
//! assert!((rect.area() - 5000.0).abs() < 1e-9);
//! assert!(custom.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `overlay` (default): polygon boolean operations through `i_overlay`.
//!   Without it the greedy and gravity strategies fail with
//!   [`Error::DependencyMissing`]; genetic and SAT still run.
//! - `serde`: serialization of the configuration records and run summary

pub mod clip;
pub mod collision;
pub mod geometry;
pub mod minkowski;
pub mod nester;
pub mod nfp;
pub mod part;
pub mod placement;
pub mod region;
pub mod sheet;
pub mod spatial_index;
pub mod strategy;

// Re-exports
pub use geometry::{Bounds, Polygon2D};
pub use nester::{NestResult, Nester, PlacementObserver};
pub use nfp::{NfpCache, NfpKey, PairNfp};
pub use part::Part;
pub use placement::{Placement, PlacementOptimizer};
pub use region::Region;
pub use sheet::{PlacedPart, Sheet};
pub use spatial_index::{SpatialEntry, SpatialIndex};
pub use strategy::{
    GeneticStrategy, GravityStrategy, GreedyStrategy, NestingStrategy, SatStrategy,
    StrategyContext, StrategyOutcome,
};
pub use sheetnest_core::{
    ConcavePolicy, Error, FillDirection, GaConfig, GravityConfig, NestConfig, NfpConfig,
    PlacementConfig, Result, RunSummary, SatConfig, Strategy,
};
