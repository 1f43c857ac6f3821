//! # sysdash - System Telemetry Aggregator
//!
//! Gathers CPU, memory, disk, network, battery, process and thermal metrics
//! from the host on every call and returns one consolidated [`Snapshot`] for
//! a dashboard to render.
//!
//! ## Features
//!
//! - **Degradable snapshots**: a failing source yields its documented default,
//!   never an error
//! - **Concurrent fan-out**: every source of a pass is queried at once
//! - **Derived state**: smoothed network throughput and 20-sample histories
//!   for CPU, memory and network
//! - **TTL caching**: filesystem, disk layout and battery queries are reused
//! - **Web API**: optional axum server exposing the snapshot as JSON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sysdash::{Aggregator, SysinfoProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut aggregator = Aggregator::with_defaults(Arc::new(SysinfoProvider::new()));
//!     let snapshot = aggregator.get_snapshot().await;
//!     println!("cpu {}% on {}", snapshot.cpu, snapshot.hostname);
//! }
//! ```

pub mod aggregate;
pub mod error;
pub mod metrics;
pub mod web;

// Re-export public API
pub use aggregate::{Aggregator, AggregatorConfig, SharedAggregator};
pub use error::{Result, SystemError};
pub use metrics::{
    collector::SysinfoProvider,
    data::{BatteryStatus, DiskLayout, DiskStats, FileSystemInfo, NetworkSpeed, Snapshot},
    traits::{MetricResult, MetricsProvider},
};

pub use web::{create_app, start_web_server, WebConfig};

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8080;
