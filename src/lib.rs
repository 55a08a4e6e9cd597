pub mod cli;
pub mod config;
pub mod engine;
pub mod model;
pub mod storage;

pub use engine::Engine;
pub use storage::Storage;
