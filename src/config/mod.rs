/// Discord ids (channels, roles) loaded from environment variables
pub mod discord;

/// Market policy and team roster loading from config.toml
pub mod market;
