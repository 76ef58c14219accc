//! Meshdrop - mock asset-delivery endpoint
//!
//! Library exposing core modules for testing and reuse.

pub mod error;
pub mod web;
