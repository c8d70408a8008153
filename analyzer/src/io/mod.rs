pub mod cells;
pub mod noise_map;
