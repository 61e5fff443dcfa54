pub mod config;
pub mod resolver;

pub use config::{CheckpointBatch, CheckpointConfig};
pub use resolver::{resolve_batches, run_checkpoint};
