//! WOD Processor Library
//!
//! A Rust library for decoding World Ocean Database (WOD) native ASCII
//! casts. Each cast is a self-describing, variable-length record of
//! positional fields whose widths are announced in-stream.
//!
//! This library provides tools for:
//! - Decoding casts one at a time from any buffered byte source
//! - Reusing session buffers that grow to the largest cast seen
//! - Resolving standard depths for legacy standard-level casts
//! - Rendering casts as a text dump or a CSV depth matrix

pub mod blocks;
pub mod cli;
pub mod config;
pub mod constants;
pub mod cursor;
pub mod enrichment;
pub mod error;
pub mod field;
pub mod models;
pub mod processor;
pub mod reader;
pub mod render;
pub mod store;

// Re-export commonly used types
pub use config::{DepthSlice, ExportConfig, ReaderConfig, VariableSelection};
pub use error::{Result, WodError};
pub use models::{CastRecord, Field, FormatTag, LevelType, ProcessingStats};
pub use processor::CastProcessor;
pub use reader::{Cast, CastReader};
pub use render::{CastSink, CsvRenderer, DumpRenderer};
pub use store::{Axis, GrowableStore};
