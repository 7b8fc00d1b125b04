//! staticd - read-only static file server
//!
//! Core library: the HTTP transport and the file serving pipeline.

pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod pool;
pub mod server;
