//! Background log-shipping pipeline.
//!
//! Application threads hand normalized log records to a bounded in-memory
//! buffer; a single background task periodically drains that buffer into
//! batches, pushes each batch through a [`transport::Transport`], and adapts
//! its cadence to the outcome of previous attempts.
//!
//! ```text
//!    Producers (any thread/task)
//!         │ enqueue
//!         v
//!   ┌──────────────┐
//!   │  Collector   │  (bounded FIFO + retry queue)
//!   └──────┬───────┘
//!          │ drain
//!          v
//!   ┌──────────────┐      ┌─────────────────┐
//!   │  Background  │─────>│  Transport Port  │
//!   │   Service    │<─────│  (HTTP, test..)  │
//!   └──────┬───────┘      └─────────────────┘
//!          │ outcome
//!          v
//!   ┌──────────────┐
//!   │  Scheduler   │  (failure-driven backoff)
//!   └──────────────┘
//! ```
//!
//! Delivery is at-least-once across transient outages: batches that fail to
//! send are parked on a retry queue and resent, oldest first, before any
//! newly buffered records. Nothing in this pipeline panics the host
//! application; every fault is absorbed at the service boundary and turned
//! into scheduler feedback plus a log line.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod adapter;
pub mod collector;
pub mod config;
pub mod constants;
pub mod record;
pub mod scheduler;
pub mod service;
pub mod transport;
