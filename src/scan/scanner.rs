//! Declaration scanner coordinator
//!
//! This module provides the [`Scanner`] struct and core scanning
//! infrastructure, including the error type, token helpers, and balanced
//! group skipping.
//!
//! # Scanner Architecture
//!
//! The scanner is a shallow recursive walker over the token stream:
//! - This module: Scanner struct, helper methods, item loop, and coordination
//! - `declarations`: namespaces, aggregates, enums, typedefs, functions and
//!   fields
//!
//! It never builds expression or statement trees. Function bodies and
//! initializers are skipped as balanced groups, which is also where
//! delimiter balance is verified.

use super::ast::*;
use super::lexer::{Keyword, LexError, Lexer, Token};
use std::fmt;

/// Scanner error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scan error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ScanError {}

impl From<LexError> for ScanError {
    fn from(err: LexError) -> Self {
        ScanError {
            message: err.message,
            location: err.location,
        }
    }
}

/// One entry of the enclosing-scope stack
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub(crate) name: String,
    pub(crate) kind: DeclKind,
    /// Access in effect for the next member; `None` outside type bodies
    pub(crate) access: Option<Access>,
}

impl Frame {
    pub(crate) fn new(name: String, kind: DeclKind) -> Self {
        Self {
            access: Access::default_for(kind),
            name,
            kind,
        }
    }
}

/// Walks a token stream and records declarations and includes
pub struct Scanner {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) scope: Vec<Frame>,
    pub(crate) declarations: Vec<Declaration>,
    pub(crate) includes: Vec<Include>,
}

impl Scanner {
    pub fn new(source: &str) -> Result<Self, ScanError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            scope: Vec::new(),
            declarations: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// Scan the whole file and return its inventory
    pub fn scan(mut self) -> Result<Inventory, ScanError> {
        self.scan_items()?;

        if !self.is_at_end() {
            return Err(ScanError {
                message: format!("Unexpected {} at file scope", self.peek()),
                location: self.current_location(),
            });
        }

        Ok(Inventory {
            declarations: self.declarations,
            includes: self.includes,
        })
    }

    /// Scan declarations until a closing '}' or end of file. The closing
    /// brace is left for the caller.
    pub(crate) fn scan_items(&mut self) -> Result<(), ScanError> {
        loop {
            let doc = self.take_doc_comments();

            match self.peek_token() {
                Token::Eof(_) | Token::RBrace(_) => return Ok(()),
                Token::Directive(text, loc) => {
                    self.advance();
                    self.record_directive(&text, loc);
                }
                Token::Semicolon(_) => {
                    self.advance();
                }
                Token::LBrace(_) => {
                    self.skip_group()?;
                }
                Token::Keyword(kw @ (Keyword::Public | Keyword::Private | Keyword::Protected), _)
                    if matches!(self.peek_ahead(1), Some(Token::Colon(_))) =>
                {
                    self.advance();
                    self.advance();
                    if let Some(frame) = self.scope.last_mut() {
                        frame.access = Some(match kw {
                            Keyword::Public => Access::Public,
                            Keyword::Protected => Access::Protected,
                            _ => Access::Private,
                        });
                    }
                }
                Token::Keyword(Keyword::Extern, _)
                    if matches!(self.peek_ahead(1), Some(Token::StringLiteral(..)))
                        && matches!(self.peek_ahead(2), Some(Token::LBrace(_))) =>
                {
                    // extern "C" { ... }
                    self.advance();
                    self.advance();
                    self.advance();
                    self.scan_items()?;
                    self.expect_rbrace("after linkage block")?;
                }
                Token::Keyword(Keyword::Friend, _) => {
                    self.skip_statement()?;
                }
                _ => self.scan_item(doc)?,
            }
        }
    }

    /// Collect consecutive doc comments into one cleaned block
    pub(crate) fn take_doc_comments(&mut self) -> Option<String> {
        let mut parts = Vec::new();
        while let Token::DocComment(text, _) = self.peek() {
            parts.push(text.clone());
            self.advance();
        }
        (!parts.is_empty()).then(|| parts.join("\n"))
    }

    fn record_directive(&mut self, text: &str, loc: SourceLocation) {
        let Some(rest) = text
            .strip_prefix("include_next")
            .or_else(|| text.strip_prefix("include"))
            .or_else(|| text.strip_prefix("import"))
        else {
            return;
        };
        let rest = rest.trim_start();

        let (system, close) = match rest.chars().next() {
            Some('<') => (true, '>'),
            Some('"') => (false, '"'),
            _ => return,
        };
        if let Some(end) = rest[1..].find(close) {
            self.includes.push(Include {
                path: rest[1..1 + end].to_string(),
                system,
                line: loc.line,
            });
        }
    }

    // ===== Scope helpers =====

    /// Names of all enclosing scopes, outermost first
    pub(crate) fn scope_path(&self) -> Vec<String> {
        self.scope.iter().map(|f| f.name.clone()).collect()
    }

    /// Innermost enclosing class, struct or union
    pub(crate) fn enclosing_type(&self) -> Option<&Frame> {
        self.scope
            .last()
            .filter(|f| matches!(f.kind, DeclKind::Class | DeclKind::Struct | DeclKind::Union))
    }

    /// Store a declaration. Direct members of a type pick up the access
    /// currently in effect.
    pub(crate) fn record(&mut self, mut decl: Declaration) -> usize {
        if decl.access.is_none() && decl.scope.len() == self.scope.len() {
            decl.access = self.enclosing_type().and_then(|frame| frame.access);
        }
        self.declarations.push(decl);
        self.declarations.len() - 1
    }

    // ===== Balanced groups =====

    /// Skip a balanced `(...)`, `[...]` or `{...}` group starting at the
    /// current token. Returns the closing token's line.
    pub(crate) fn skip_group(&mut self) -> Result<usize, ScanError> {
        self.skip_group_with(|_, _| {})
    }

    /// Skip a balanced group, handing each inner token and its brace depth to
    /// `visit`.
    pub(crate) fn skip_group_with<F>(&mut self, mut visit: F) -> Result<usize, ScanError>
    where
        F: FnMut(&[Token], usize),
    {
        let mut stack: Vec<(char, SourceLocation)> = Vec::new();

        loop {
            let token = self.peek_token();
            match &token {
                Token::LParen(loc) => stack.push((')', *loc)),
                Token::LBracket(loc) => stack.push((']', *loc)),
                Token::LBrace(loc) => stack.push(('}', *loc)),
                Token::RParen(loc) | Token::RBracket(loc) | Token::RBrace(loc) => {
                    let found = closer_char(&token);
                    match stack.pop() {
                        Some((expected, _)) if expected == found => {}
                        Some((expected, open)) => {
                            return Err(ScanError {
                                message: format!(
                                    "Expected '{}' to close group opened at line {}, found '{}'",
                                    expected, open.line, found
                                ),
                                location: *loc,
                            });
                        }
                        None => {
                            return Err(ScanError {
                                message: format!("Unexpected '{}'", found),
                                location: *loc,
                            });
                        }
                    }
                    if stack.is_empty() {
                        self.advance();
                        return Ok(loc.line);
                    }
                }
                Token::Eof(loc) => {
                    let (expected, open) = stack.last().copied().unwrap_or((')', *loc));
                    return Err(ScanError {
                        message: format!(
                            "Unclosed group opened at line {}, expected '{}'",
                            open.line, expected
                        ),
                        location: *loc,
                    });
                }
                _ => {}
            }

            let braces = stack.iter().filter(|(c, _)| *c == '}').count();
            visit(&self.tokens[self.position..], braces);
            self.advance();
        }
    }

    /// Skip a `<...>` template argument list, tolerating `>>`
    pub(crate) fn skip_angles(&mut self) -> Result<(), ScanError> {
        let open = self.current_location();
        let mut depth = 0usize;

        loop {
            match self.peek_token() {
                Token::Lt(_) => {
                    depth += 1;
                    self.advance();
                }
                Token::Gt(_) => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                }
                Token::GtGt(_) => {
                    depth = depth.saturating_sub(2);
                    self.advance();
                }
                Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) => {
                    self.skip_group()?;
                }
                Token::Semicolon(_) | Token::Eof(_) | Token::RBrace(_) => {
                    return Err(ScanError {
                        message: format!("Unclosed '<' opened at line {}", open.line),
                        location: self.current_location(),
                    });
                }
                _ => {
                    self.advance();
                }
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Skip to and past the next ';' at depth 0. A brace group that is not
    /// followed by ';' also ends the statement (`friend void f() {}`).
    pub(crate) fn skip_statement(&mut self) -> Result<usize, ScanError> {
        loop {
            match self.peek_token() {
                Token::Semicolon(loc) => {
                    self.advance();
                    return Ok(loc.line);
                }
                Token::LBrace(_) => {
                    let line = self.skip_group()?;
                    if !self.check(&Token::Semicolon(self.current_location())) {
                        return Ok(line);
                    }
                }
                Token::LParen(_) | Token::LBracket(_) => {
                    self.skip_group()?;
                }
                Token::RParen(loc) | Token::RBracket(loc) | Token::RBrace(loc) => {
                    return Err(ScanError {
                        message: format!("Unexpected {}", self.peek()),
                        location: loc,
                    });
                }
                Token::Eof(loc) => {
                    return Err(ScanError {
                        message: "Expected ';' before end of file".to_string(),
                        location: loc,
                    });
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn check_keyword(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_token(&self) -> Token {
        self.tokens[self.position].clone()
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<SourceLocation, ScanError> {
        if self.check(token) {
            let loc = self.current_location();
            self.advance();
            Ok(loc)
        } else {
            Err(ScanError {
                message: format!("{}, found {}", message, self.peek()),
                location: self.current_location(),
            })
        }
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<SourceLocation, ScanError> {
        self.expect_token(&Token::LBrace(self.current_location()), &format!("Expected '{{' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<SourceLocation, ScanError> {
        self.expect_token(&Token::RBrace(self.current_location()), &format!("Expected '}}' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ScanError> {
        if let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            Ok(name)
        } else {
            Err(ScanError {
                message: format!("Expected identifier, found {}", self.peek()),
                location: self.current_location(),
            })
        }
    }
}

fn closer_char(token: &Token) -> char {
    match token {
        Token::RParen(_) => ')',
        Token::RBracket(_) => ']',
        _ => '}',
    }
}

/// Scan C or C++ source text into an [`Inventory`]
pub fn scan_source(source: &str) -> Result<Inventory, ScanError> {
    Scanner::new(source)?.scan()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_simple_function() {
        let inventory = scan_source("int main() { return 0; }").unwrap();

        assert_eq!(inventory.declarations.len(), 1);
        let main = &inventory.declarations[0];
        assert_eq!(main.kind, DeclKind::Function);
        assert_eq!(main.name, "main");
        let sig = main.signature.as_ref().unwrap();
        assert!(sig.params.is_empty());
        assert!(sig.has_body);
        assert_eq!(sig.returns, vec![0]);
    }

    #[test]
    fn test_includes_recorded() {
        let inventory =
            scan_source("#include <stdio.h>\n#include \"local.h\"\n#define X 1\nint x;").unwrap();

        assert_eq!(inventory.includes.len(), 2);
        assert_eq!(inventory.includes[0].path, "stdio.h");
        assert!(inventory.includes[0].system);
        assert_eq!(inventory.includes[1].path, "local.h");
        assert!(!inventory.includes[1].system);
        assert_eq!(inventory.includes[1].line, 2);
    }

    #[test]
    fn test_unclosed_brace_reported() {
        let err = scan_source("int main() {\n  if (x) {\n    return 1;\n}\n").unwrap_err();
        assert!(err.message.contains("Unclosed group opened at line 1"), "{}", err);
    }

    #[test]
    fn test_mismatched_closer_reported() {
        let err = scan_source("int f(int a] { return a; }").unwrap_err();
        assert!(err.message.contains("Expected ')'"), "{}", err);
    }

    #[test]
    fn test_stray_closing_brace_reported() {
        let err = scan_source("int x;\n}\n").unwrap_err();
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_extern_c_block() {
        let inventory = scan_source("extern \"C\" {\nint f(void);\n}\n").unwrap();
        let f = inventory.find("f").unwrap();
        assert_eq!(f.kind, DeclKind::Function);
        assert!(!f.signature.as_ref().unwrap().has_body);
    }
}
