pub mod config;
pub mod credentials;

pub use config::{FetchTuning, PlexSettings, ServiceConfig};
pub use credentials::{AccessTokenProvider, EnvTokenProvider, StaticTokenProvider};
