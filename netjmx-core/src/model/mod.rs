//! Charts and dimensions as the reporting host sees them.
//!
//! Both are plain data. The collector builds them during initialization and
//! afterwards only dimension values change.

mod chart;
mod dimension;

pub use chart::{Chart, ChartType, DEFAULT_PRIORITY};
pub use dimension::{Dimension, DimensionAlgorithm};
