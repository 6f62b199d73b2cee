//! flatsql - a small file-backed relational store
//!
//! This crate provides:
//! - SQL-like statement parsing (lexer, parser, AST)
//! - Condition evaluation and constraint-checked row mutations
//! - Auto-commit and buffered transactions over flat text tables
//! - SQL dump and entity-relationship text export

pub mod config;
pub mod error;
pub mod export;
pub mod sql;
pub mod storage;
