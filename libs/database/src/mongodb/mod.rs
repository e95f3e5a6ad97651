//! MongoDB client setup and probes.

mod config;
mod connector;
mod health;

pub use config::MongoConfig;
pub use connector::{connect_from_config, connect_from_config_with_retry, to_client_options};
pub use health::check_health;

pub use mongodb::{Client, Collection, Database};
