//! Movie explorer library
//!
//! A TMDB client fronted by a session-scoped response cache with lazy TTL
//! expiry, plus favorites, plain-text rendering and the CLI definitions used
//! by the `moviex` binary.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod favorites;
pub mod render;
