//! taskflow - in-memory task manager library
//!
//! This library provides the task store, the view projection (search,
//! filters, sorting, statistics) and the streaming task assistant behind
//! the taskflow CLI.
//!
//! # Core Concepts
//!
//! - **Tasks**: to-do items with priority, category and an optional due date
//! - **Store**: exclusively owns the task list; new tasks are prepended
//! - **Criteria**: search text, status/category/priority filters and a sort
//! - **Projection**: the filtered, sorted view plus whole-board statistics
//! - **Assistant**: advisory chat over a read-only snapshot of the tasks
//!
//! # Module Organization
//!
//! - `task`: Task model, builders and the in-memory store
//! - `view`: Filtering, sorting and statistics
//! - `board`: Session object pairing the store with the current criteria
//! - `assistant`: Conversation state, SSE decoding and the HTTP client
//! - `config`: Configuration loading from `taskflow.toml`
//! - `output`: Human and JSON output formatting
//! - `cli`: Command-line interface using clap
//! - `error`: Error types and result aliases

pub mod assistant;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod task;
pub mod view;

pub use error::{Error, Result};
