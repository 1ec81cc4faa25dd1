// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod filler;
pub mod oracle;
pub mod parser;
pub mod progress;
pub mod schema;
pub mod statement;
pub mod writer;

pub use error::{Error, Result};
