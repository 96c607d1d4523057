// Infrastructure layer - runtime configuration
pub mod config;
