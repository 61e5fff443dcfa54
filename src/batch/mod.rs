pub mod dataset;
pub mod kwargs;
pub mod loaded;
pub mod markers;
pub mod types;

pub use dataset::{FrameKind, InMemoryDataset};
pub use kwargs::{BatchKwargs, KwargValue};
pub use loaded::Batch;
pub use markers::BatchMarkers;
pub use types::{
    BatchKwargsKind, EngineAvailability, EngineRegistry, ExecutionEngine, TypedBatchKwargs,
};
