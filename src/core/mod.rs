pub mod classifier;
pub mod collector;
pub mod engine;
pub mod ranker;
pub mod reporter;
pub mod significance;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{RankedEntry, RatingTable, RunReport};
pub use crate::domain::ports::{DataSource, Storage};
pub use crate::utils::error::Result;
