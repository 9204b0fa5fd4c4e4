//! Webhook endpoint of the expense bot.

pub use server::{ServerConfig, router, run, run_with_listener, spawn_with_listener};

mod server;
mod webhook;
