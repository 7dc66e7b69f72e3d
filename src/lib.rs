#![forbid(unsafe_code)]

pub mod block;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod formats;
pub mod hints;
pub mod json_path;
pub mod listing;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod parse;
pub mod platforms;
pub mod reader;
pub mod registry;
pub mod resolve;
pub mod scoring;
pub mod validation;
