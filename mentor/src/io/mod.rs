//! Side-effecting modules: configuration, the generation backend, and
//! transcript artifacts.

pub mod config;
pub mod generate;
pub mod transcript_log;
