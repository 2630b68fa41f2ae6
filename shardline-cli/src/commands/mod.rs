//! Command handlers

pub mod classify;
pub mod config;
pub mod explain;
