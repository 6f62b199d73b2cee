//! SQL processing module
//!
//! This module provides:
//! - `parser`: statement lexer and parser
//! - `types`: declared column types and rows
//! - `schema`: table and column schema definitions
//! - `condition`: WHERE-clause evaluation
//! - `executor`: statement execution
//! - `engine`: database registry, transactions and sessions

pub mod condition;
pub mod engine;
pub mod executor;
pub mod parser;
pub mod schema;
pub mod types;
