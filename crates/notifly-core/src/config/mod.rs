//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use notifly_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Slack configured: {}", cfg.slack.is_configured());
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, load_defaults, save_config};
pub use schema::{
    Config, MailConfig, MailConfigUpdate, MailTransportConfig, MailTransportKind, SlackConfig,
    SlackConfigUpdate,
};
