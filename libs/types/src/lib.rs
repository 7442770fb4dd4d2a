//! Types library for the ISS state-vector tracker
//!
//! This library provides the core type definitions shared by the feed parser,
//! the snapshot store and the query service, so that every crate agrees on
//! what a validated sample looks like.
//!
//! # Modules
//! - `epoch`: Day-of-year UTC timestamps (`YYYY-DDDTHH:MM:SS.sssZ`)
//! - `sample`: State vectors (position + velocity at one epoch)
//! - `dataset`: Ordered, duplicate-free sample sets
//! - `errors`: Error taxonomy

// Public modules
pub mod epoch;
pub mod sample;
pub mod dataset;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::epoch::*;
    pub use crate::sample::*;
    pub use crate::dataset::*;
    pub use crate::errors::*;
}
