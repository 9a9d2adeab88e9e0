pub mod config;
pub mod engine;
pub mod init;
pub mod persist;
pub mod pipeline;
pub mod resolver;
pub mod stats;
