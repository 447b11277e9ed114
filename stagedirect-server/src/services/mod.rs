//! Service layer: workflows spanning several storage calls

pub mod merge;

pub use merge::{MergeError, MergeService, MergeStage};
