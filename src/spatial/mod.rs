//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree based spatial index for nearest-neighbor
//! and range queries on drawn tree nodes.

mod rtree;

pub use rtree::{NodePoint, SpatialIndex};
