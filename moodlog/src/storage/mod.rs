//! Storage module
//!
//! Provides durable file storage for captured video clips.

pub mod media_store;

pub use media_store::MediaStore;
