//! astview CLI library.
//!
//! Drives the AST view pipeline from a terminal: `show` analyzes a file
//! once, `watch` re-analyzes it every time its contents change.

pub mod cli;
pub mod commands;
pub mod output;
