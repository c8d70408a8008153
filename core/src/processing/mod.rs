pub mod comparison;
pub mod noise;
pub mod selection;

pub use comparison::{ChannelComparison, ComparisonStage, LogPoint};
pub use noise::{NoiseInput, NoiseStage};
pub use selection::{Selection, SelectionInput, SelectionStage};
