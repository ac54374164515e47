// src/lib.rs
// SRI Testing dashboard - client, polling driver and stand-in server for the test-run protocol

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod fixtures;
pub mod http;
pub mod report;
pub mod run;
pub mod web;

pub use client::{PollConfig, SriTestingClient};
pub use error::{DashboardError, Result};
