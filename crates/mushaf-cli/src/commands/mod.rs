//! Command handlers

pub mod auth;
pub mod config;
pub mod edit;
pub mod media;
pub mod read;
pub mod status;
pub mod sync;
