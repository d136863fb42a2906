//! moodlog library
//!
//! This library exposes the core functionality of moodlog for testing
//! and for embedding in other frontends.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
