//! Per-fixture contract checks
//!
//! Every fixture gets the structural checks: it re-reads identically, lexes,
//! scans with balanced delimiters, and declares something. C fixtures must
//! also stay clear of C++-only keywords. Fixtures listed in
//! [`expectations::EXPECTATIONS`] additionally have their claimed constructs
//! verified against the scanned inventory.

pub mod expectations;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::corpus::{Corpus, Dialect, Fixture};
use crate::scan::lexer::{Lexer, Token};
use crate::scan::{DeclKind, Inventory, Scanner};

pub use expectations::{expectation_for, Expectation, Requirement, Within};

/// A failed check, identified by fixture and check name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    pub path: String,
    pub check: String,
    pub detail: Option<String>,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} failed", self.path, self.check)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ContractViolation {}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Everything `check` learned about one fixture
#[derive(Debug, Clone, Serialize)]
pub struct FixtureReport {
    pub path: String,
    pub dialect: Dialect,
    pub lines: usize,
    pub declarations: usize,
    pub kinds: BTreeMap<DeclKind, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expectation: Option<&'static str>,
    pub checks: Vec<CheckOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip)]
    pub inventory: Option<Inventory>,
}

impl FixtureReport {
    fn new(fixture: &Fixture) -> Self {
        Self {
            path: fixture.path().to_string(),
            dialect: fixture.dialect(),
            lines: fixture.line_count(),
            declarations: 0,
            kinds: BTreeMap::new(),
            expectation: None,
            checks: Vec::new(),
            notes: Vec::new(),
            inventory: None,
        }
    }

    fn record(&mut self, name: impl Into<String>, outcome: Result<(), String>) {
        let name = name.into();
        let (passed, detail) = match outcome {
            Ok(()) => (true, None),
            Err(detail) => {
                warn!(path = %self.path, check = %name, detail = %detail, "contract.violation");
                (false, Some(detail))
            }
        };
        self.checks.push(CheckOutcome {
            name,
            passed,
            detail,
        });
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn violations(&self) -> impl Iterator<Item = ContractViolation> + '_ {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| ContractViolation {
                path: self.path.clone(),
                check: c.name.clone(),
                detail: c.detail.clone(),
            })
    }

    /// First violation as an error, if any
    pub fn ensure_passed(&self) -> Result<(), ContractViolation> {
        match self.violations().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

/// Reports for a whole corpus
#[derive(Debug, Clone, Serialize)]
pub struct CorpusReport {
    pub root: String,
    pub passed: usize,
    pub failed: usize,
    pub fixtures: Vec<FixtureReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl CorpusReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn violations(&self) -> impl Iterator<Item = ContractViolation> + '_ {
        self.fixtures.iter().flat_map(FixtureReport::violations)
    }

    pub fn get(&self, path: &str) -> Option<&FixtureReport> {
        self.fixtures.iter().find(|r| r.path == path)
    }
}

/// Run every applicable check on one fixture.
pub fn check_fixture(corpus: &Corpus, fixture: &Fixture) -> FixtureReport {
    let mut report = FixtureReport::new(fixture);
    report.record("stable on re-read", stable_reread(fixture));

    let tokens = match Lexer::new(fixture.content()).tokenize() {
        Ok(tokens) => {
            report.record("lexes cleanly", Ok(()));
            tokens
        }
        Err(err) => {
            report.record("lexes cleanly", Err(err.to_string()));
            report.notes.push("remaining checks skipped".to_string());
            return report;
        }
    };

    if fixture.dialect() == Dialect::C {
        report.record("no C++-only keywords", c_keywords(&tokens));
    }

    let inventory = match Scanner::from_tokens(tokens).scan() {
        Ok(inventory) => {
            report.record("delimiters balanced", Ok(()));
            inventory
        }
        Err(err) => {
            report.record("delimiters balanced", Err(err.to_string()));
            report.notes.push("remaining checks skipped".to_string());
            return report;
        }
    };

    report.declarations = inventory.declarations.len();
    report.kinds = inventory.kind_counts().into_iter().collect();
    report.record(
        "declares something",
        if inventory.declarations.is_empty() {
            Err("no declarations found".to_string())
        } else {
            Ok(())
        },
    );

    for include in inventory.local_includes() {
        if !corpus.resolves_include(fixture, &include.path) {
            report.notes.push(format!(
                "line {}: local include \"{}\" does not resolve inside the corpus",
                include.line, include.path
            ));
        }
    }

    if let Some(expectation) = expectation_for(fixture.path()) {
        report.expectation = Some(expectation.summary);
        for requirement in expectation.requirements {
            report.record(requirement.describe(), requirement.evaluate(&inventory));
        }
    }

    debug!(
        path = %report.path,
        declarations = report.declarations,
        passed = report.passed(),
        "contract.fixture"
    );
    report.inventory = Some(inventory);
    report
}

/// Check every fixture in the corpus.
pub fn check_corpus(corpus: &Corpus) -> CorpusReport {
    let fixtures: Vec<FixtureReport> = corpus.iter().map(|f| check_fixture(corpus, f)).collect();
    let failed = fixtures.iter().filter(|r| !r.passed()).count();

    let notes = expectations::EXPECTATIONS
        .iter()
        .filter(|e| !corpus.contains(e.path))
        .map(|e| format!("no fixture at {} ({})", e.path, e.summary))
        .collect();

    info!(
        fixtures = fixtures.len(),
        passed = fixtures.len() - failed,
        failed,
        "contract.summary"
    );

    CorpusReport {
        root: corpus.root().display().to_string(),
        passed: fixtures.len() - failed,
        failed,
        fixtures,
        notes,
    }
}

/// Read the fixture twice more and compare with what was loaded.
fn stable_reread(fixture: &Fixture) -> Result<(), String> {
    for attempt in 1..=2 {
        let bytes = fixture.reread().map_err(|err| first_line(&err.to_string()))?;
        if bytes != fixture.content().as_bytes() {
            return Err(format!("content changed on re-read {attempt}"));
        }
    }
    Ok(())
}

fn c_keywords(tokens: &[Token]) -> Result<(), String> {
    let found: Vec<String> = tokens
        .iter()
        .filter_map(|token| match token {
            Token::Keyword(kw, loc) if kw.is_cpp_only() => {
                Some(format!("`{}` at line {}", kw.as_str(), loc.line))
            }
            _ => None,
        })
        .collect();
    if found.is_empty() {
        Ok(())
    } else {
        Err(found.join(", "))
    }
}

// CorpusError's Display appends a backtrace.
fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}
