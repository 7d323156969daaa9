//! Notifly Core — shared building blocks for the email and Slack dispatchers.
//!
//! This crate provides:
//! - **config**: typed settings for both channels, loaded from `~/.notifly/config.json`
//! - **template**: the `{{variable}}` / `{{#if}}` / `{{#each}}` renderer
//! - **types**: `SendResult`, `Sent`, `MessageLocation`, `SendError`
//! - **utils**: data directory and secret masking

pub mod config;
pub mod template;
pub mod types;
pub mod utils;

pub use template::{render, Template, TemplateData};
pub use types::{MessageLocation, SendError, SendResult, Sent};
