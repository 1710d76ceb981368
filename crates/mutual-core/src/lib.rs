//! Core types and services of the Mutual swipe-reconciliation engine.
//!
//! Job seekers and employers swipe on each other. This crate records those
//! one-sided intents, derives the status of every pair from them, reopens
//! rejections for a second look and tallies acceptance analytics.
//!
//! It is free of HTTP and SQL dependencies; storage backends implement
//! [`store::SwipeStore`] and the services are generic over it.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures where they matter.
#![allow(async_fn_in_trait)]

pub mod actor;
pub mod analytics;
pub mod engine;
pub mod error;
pub mod machine;
pub mod memory;
pub mod record;
pub mod second_look;
pub mod store;
pub mod swipe;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
