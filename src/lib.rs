//! wattview - live history engine for SmartMeter-style home power meters
//!
//! This library polls a home power-meter device over HTTP, keeps the fetched
//! wattage samples in a capacity-bounded, gap-tolerant history, and exposes a
//! zoom/pan viewport over that history for rendering layers.
//!
//! ## Module Structure
//!
//! - [`history`] - The sample history buffer: append/prepend of fetched
//!   batches, gap filling, overlap trimming, block-averaged resampling
//! - [`viewport`] - The zoom/pan transform and the datasource trait a
//!   renderer draws from
//! - [`profile`] - Power profile documents and their XML parsing
//! - [`meter`] - The blocking HTTP client and the polling/backfill session

pub mod history;
pub mod meter;
pub mod profile;
pub mod viewport;
