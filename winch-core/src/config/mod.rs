//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware builds them from
//! its machine file at compile time and ships them as postcard binary data.

pub mod geometry;
pub mod types;

pub use geometry::*;
pub use types::*;
