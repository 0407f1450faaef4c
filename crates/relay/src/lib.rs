//! Firehose relay service: configuration, wiring, and the webhook server.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod server;

pub use config::Config;
pub use server::{build_router, AppState};
