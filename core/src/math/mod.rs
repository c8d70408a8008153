pub mod special;
pub mod stats;

pub use stats::StatsHelper;
