//! C and C++ declaration scanner
//!
//! This module turns fixture source text into an [`Inventory`]:
//! - [`lexer`]: Tokenization (source text → tokens, keeping doc comments
//!   and preprocessor lines)
//! - [`scanner`]: Scanner coordination, balanced-group skipping, includes
//! - `declarations`: Recognition of namespaces, types, functions and fields
//! - [`ast`]: Inventory types
//!
//! # Scope
//!
//! The scanner is shallow on purpose. It recognizes declarations by token
//! shape and brace structure, checks that every delimiter is balanced, and
//! skips function bodies except for `return <integer>;` statements. It does
//! not resolve names, expand macros, or evaluate expressions.

pub mod ast;
mod declarations;
pub mod lexer;
pub mod scanner;

pub use ast::{Access, DeclKind, Declaration, Include, Inventory, Modifier, Param, Signature, SourceLocation};
pub use scanner::{scan_source, ScanError, Scanner};
