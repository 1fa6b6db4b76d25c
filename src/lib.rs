//! HEMS scenery: hospital helipad scenery package generation
//!
//! Resolves per-site jobs, builds a deterministic scene description, reuses
//! previously built artifacts through a content-addressed cache, and packages
//! each site into a zip archive.

pub mod atomic;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod init;
pub mod input;
pub mod job;
pub mod logging;
pub mod package;
pub mod pipeline;
pub mod resolve;
pub mod scene;
pub mod server;
pub mod site;
pub mod types;
pub mod writers;
