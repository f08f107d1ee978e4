//! CLI command implementations.

mod ask;
mod build;

pub use ask::run_ask;
pub use build::run_build;
