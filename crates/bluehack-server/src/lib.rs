//! # bluehack-server
//!
//! HTTP server library for the bluehack BLE discovery recorder.
//!
//! This library provides the API handlers and state management for bluehack.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
