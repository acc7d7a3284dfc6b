//! Handles serialising and saving data to disk in the _parquet_ file format.

pub mod trajectory;

pub use trajectory::save_trajectories;
