//! # Introduction
//!
//! cfixtures holds a small corpus of C and C++ sample files used as parser
//! test input, together with the tooling that keeps the corpus honest: a
//! loader, a shallow declaration scanner, and a contract checker that
//! verifies every fixture still contains the constructs it claims to
//! exercise. A terminal browser shows fixtures next to what was found in
//! them.
//!
//! ## Pipeline
//!
//! ```text
//! corpus dir → Corpus::load → Fixture → Lexer → Scanner → Inventory → contract → report
//! ```
//!
//! 1. [`corpus`] loads fixtures, classifies them by dialect, and re-reads
//!    them on demand.
//! 2. [`scan`] tokenizes a fixture and records its declarations and
//!    includes.
//! 3. [`contract`] runs the structural checks on every fixture and the
//!    built-in expectations on the known ones.
//! 4. [`ui`] is the ratatui browser; not part of the stable library API.
//!
//! ## Corpus layout
//!
//! `c/` holds C fixtures, `cpp/` holds C++ fixtures, and top-level files are
//! classified by extension. The default corpus lives in
//! `tests/parser_test_corpus`.

pub mod contract;
pub mod corpus;
pub mod scan;
pub mod ui;

/// Corpus location used when none is given
pub const DEFAULT_CORPUS: &str = "tests/parser_test_corpus";
