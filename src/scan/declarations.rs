//! Declaration scanning implementation
//!
//! This module recognizes the declarations a fixture inventory records:
//!
//! - Namespaces: `namespace A { ... }`, `namespace A::B { ... }`
//! - Aggregates: `class|struct|union Name [: bases] { ... };`
//! - Enums: `enum [class] Name [: type] { A, B = 2 };`
//! - Typedefs and alias declarations: `typedef struct { ... } Name;`,
//!   `using Name = type;`
//! - Functions, methods, constructors and destructors, both prototypes and
//!   definitions, including out-of-class `A::f() { ... }`
//! - Fields inside aggregates
//!
//! # Grammar (approximate)
//!
//! ```text
//! item        ::= namespace | aggregate | enum | typedef | using | declaration
//! aggregate   ::= ("class" | "struct" | "union") name? bases? "{" item* "}" declarators? ";"
//! declaration ::= head ( "(" params ")" qualifiers ( ";" | init_list? body ) | declarators ";" )
//! ```
//!
//! Anything the grammar does not cover is skipped as a balanced statement.

use super::ast::*;
use super::lexer::{Keyword, Token};
use super::scanner::{Frame, ScanError, Scanner};

/// Name and token positions of a function declarator
struct FunctionHead {
    name: String,
    qualifier: Vec<String>,
    /// Index of the opening '(' of the parameter list
    paren: usize,
}

impl Scanner {
    /// Scan one item at namespace, file, or class scope
    pub(crate) fn scan_item(&mut self, doc: Option<String>) -> Result<(), ScanError> {
        let start_line = self.current_location().line;

        if self.check_keyword(Keyword::Template) {
            self.advance();
            if self.check(&Token::Lt(self.current_location())) {
                self.skip_angles()?;
            }
        }

        let modifiers = self.take_modifiers();
        let first = self.declarations.len();
        let depth = self.scope.len();
        let mut whole_item = false;

        let result = match self.peek_token() {
            Token::Keyword(Keyword::Inline, _)
                if matches!(self.peek_ahead(1), Some(t) if t.is_keyword(Keyword::Namespace)) =>
            {
                self.advance();
                self.scan_namespace(doc, start_line)
            }
            Token::Keyword(Keyword::Namespace, _) => self.scan_namespace(doc, start_line),
            Token::Keyword(Keyword::Using, _) => self.scan_using(doc, start_line),
            Token::Keyword(Keyword::Typedef, _) => self.scan_typedef(doc, start_line),
            Token::Keyword(kw @ (Keyword::Class | Keyword::Struct | Keyword::Union), _)
                if self.is_aggregate_definition() =>
            {
                self.advance();
                let first = self.declarations.len();
                if self.scan_aggregate(aggregate_kind(kw), doc, start_line)?.is_none() {
                    self.rehome_anonymous(first, None);
                }
                self.finish_type_declarators()
            }
            Token::Keyword(Keyword::Enum, _) if self.is_enum_definition() => {
                self.advance();
                let first = self.declarations.len();
                if self.scan_enum(doc, start_line)?.is_none() {
                    self.rehome_anonymous(first, None);
                }
                self.finish_type_declarators()
            }
            Token::RParen(loc) | Token::RBracket(loc) => Err(ScanError {
                message: format!("Unexpected {}", self.peek()),
                location: loc,
            }),
            _ => {
                whole_item = true;
                self.scan_declaration(doc, start_line)
            }
        };
        result?;

        // Leading specifiers belong to what this item declares, not to the
        // members of a type body it defines.
        if !modifiers.is_empty() {
            for decl in &mut self.declarations[first..] {
                if whole_item || decl.scope.len() == depth {
                    let trailing = std::mem::take(&mut decl.modifiers);
                    decl.modifiers = modifiers.iter().copied().chain(trailing).collect();
                }
            }
        }
        Ok(())
    }

    /// Consume leading `static`, `extern`, `inline`, `virtual`, `explicit`
    /// and `constexpr`, in any order.
    fn take_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        loop {
            let modifier = match self.peek() {
                Token::Keyword(Keyword::Inline, _)
                    if matches!(self.peek_ahead(1), Some(t) if t.is_keyword(Keyword::Namespace)) =>
                {
                    break;
                }
                Token::Keyword(Keyword::Extern, _) if matches!(self.peek_ahead(1), Some(Token::StringLiteral(..))) => {
                    break;
                }
                Token::Keyword(Keyword::Static, _) => Modifier::Static,
                Token::Keyword(Keyword::Extern, _) => Modifier::Extern,
                Token::Keyword(Keyword::Inline, _) => Modifier::Inline,
                Token::Keyword(Keyword::Virtual, _) => Modifier::Virtual,
                Token::Keyword(Keyword::Explicit, _) => Modifier::Explicit,
                Token::Keyword(Keyword::Constexpr, _) => Modifier::Constexpr,
                _ => break,
            };
            self.advance();
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
        }
        modifiers
    }

    // ===== Namespaces =====

    /// Parse namespace definition: namespace [A[::B]] { items }
    fn scan_namespace(&mut self, doc: Option<String>, start_line: usize) -> Result<(), ScanError> {
        self.advance(); // consume 'namespace'

        let mut names = Vec::new();
        while let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            names.push(name);
            if !self.match_token(&Token::ColonColon(self.current_location())) {
                break;
            }
        }

        if self.check(&Token::Eq(self.current_location())) {
            // namespace alias
            self.skip_statement()?;
            return Ok(());
        }
        if names.is_empty() {
            names.push("(anonymous)".to_string());
        }

        self.expect_lbrace("after namespace name")?;

        let mut indices = Vec::with_capacity(names.len());
        for name in &names {
            let mut decl = Declaration::new(DeclKind::Namespace, name.clone(), self.scope_path(), start_line);
            if indices.is_empty() {
                decl.doc = doc.clone();
            }
            indices.push(self.record(decl));
            self.scope.push(Frame::new(name.clone(), DeclKind::Namespace));
        }

        self.scan_items()?;
        let end = self.expect_rbrace("after namespace body")?;

        for index in indices {
            self.declarations[index].end_line = end.line;
            self.scope.pop();
        }
        Ok(())
    }

    /// `using Name = type;` records an alias; other using-declarations are skipped
    fn scan_using(&mut self, doc: Option<String>, start_line: usize) -> Result<(), ScanError> {
        let is_alias = matches!(self.peek_ahead(1), Some(Token::Ident(..)))
            && matches!(self.peek_ahead(2), Some(Token::Eq(_)));

        if is_alias {
            self.advance();
            let name = self.expect_identifier()?;
            let end = self.skip_statement()?;
            let mut decl = Declaration::new(DeclKind::Typedef, name, self.scope_path(), start_line);
            decl.end_line = end;
            decl.doc = doc;
            self.record(decl);
        } else {
            self.skip_statement()?;
        }
        Ok(())
    }

    // ===== Aggregates =====

    /// Whether the current `class`/`struct`/`union` keyword starts a body
    /// definition rather than an elaborated type specifier.
    pub(crate) fn is_aggregate_definition(&self) -> bool {
        let mut n = 1;
        if matches!(self.peek_ahead(n), Some(Token::Ident(..))) {
            n += 1;
            while matches!(self.peek_ahead(n), Some(Token::ColonColon(_)))
                && matches!(self.peek_ahead(n + 1), Some(Token::Ident(..)))
            {
                n += 2;
            }
        }
        if matches!(self.peek_ahead(n), Some(t) if t.is_keyword(Keyword::Final)) {
            n += 1;
        }
        if matches!(self.peek_ahead(n), Some(Token::Colon(_))) {
            // base clause: look for '{' before ';'
            while let Some(token) = self.peek_ahead(n) {
                match token {
                    Token::LBrace(_) => return true,
                    Token::Semicolon(_) | Token::RBrace(_) | Token::Eof(_) => return false,
                    _ => n += 1,
                }
            }
            return false;
        }
        matches!(self.peek_ahead(n), Some(Token::LBrace(_)))
    }

    /// Parse aggregate definition after its keyword: [Name] [final] [: bases] { members }
    ///
    /// Returns the index of the recorded declaration, or `None` for an
    /// anonymous aggregate, whose members get an empty placeholder scope
    /// segment until the caller re-homes them.
    fn scan_aggregate(
        &mut self,
        kind: DeclKind,
        doc: Option<String>,
        start_line: usize,
    ) -> Result<Option<usize>, ScanError> {
        let mut name = None;
        if let Token::Ident(first, _) = self.peek_token() {
            self.advance();
            let mut full = first;
            while self.check(&Token::ColonColon(self.current_location())) {
                self.advance();
                full = self.expect_identifier()?;
            }
            name = Some(full);
        }

        while !self.check(&Token::LBrace(self.current_location())) {
            if self.check(&Token::Lt(self.current_location())) {
                self.skip_angles()?;
            } else if self.is_at_end() {
                break;
            } else {
                self.advance();
            }
        }
        self.expect_lbrace("before aggregate body")?;

        let index = name.as_ref().map(|name| {
            let mut decl = Declaration::new(kind, name.clone(), self.scope_path(), start_line);
            decl.doc = doc;
            self.record(decl)
        });

        self.scope.push(Frame::new(name.unwrap_or_default(), kind));
        self.scan_items()?;
        let end = self.expect_rbrace("after aggregate body")?;
        self.scope.pop();

        if let Some(index) = index {
            self.declarations[index].end_line = end.line;
        }
        Ok(index)
    }

    /// Consume `} a, *b;` declarators following a type body. Inside an
    /// aggregate they become fields.
    fn finish_type_declarators(&mut self) -> Result<(), ScanError> {
        if self.match_token(&Token::Semicolon(self.current_location())) {
            return Ok(());
        }
        let start = self.position;
        let line = self.current_location().line;
        self.skip_statement()?;

        if self.enclosing_type().is_some() {
            let names = declarator_names(&self.tokens[start..self.position]);
            for name in names {
                let decl = Declaration::new(DeclKind::Field, name, self.scope_path(), line);
                self.record(decl);
            }
        }
        Ok(())
    }

    /// Members of an anonymous body carry an empty scope segment. Replace it
    /// with the typedef name, or drop it so they belong to the enclosing scope.
    fn rehome_anonymous(&mut self, first: usize, name: Option<&str>) {
        let depth = self.scope.len();
        let access = self.enclosing_type().and_then(|frame| frame.access);
        for decl in &mut self.declarations[first..] {
            if decl.scope.get(depth).is_some_and(|s| s.is_empty()) {
                match name {
                    Some(name) => decl.scope[depth] = name.to_string(),
                    None => {
                        decl.scope.remove(depth);
                        if decl.scope.len() == depth {
                            decl.access = access;
                        }
                    }
                }
            }
        }
    }

    // ===== Enums =====

    pub(crate) fn is_enum_definition(&self) -> bool {
        let mut n = 1;
        while let Some(token) = self.peek_ahead(n) {
            match token {
                Token::LBrace(_) => return true,
                Token::Ident(..) | Token::Colon(_) | Token::ColonColon(_) | Token::Keyword(..) => n += 1,
                _ => return false,
            }
        }
        false
    }

    /// Parse enum definition after 'enum': [class] [Name] [: type] { enumerators }
    fn scan_enum(&mut self, doc: Option<String>, start_line: usize) -> Result<Option<usize>, ScanError> {
        if self.check_keyword(Keyword::Class) || self.check_keyword(Keyword::Struct) {
            self.advance();
        }

        let name = match self.peek_token() {
            Token::Ident(name, _) => {
                self.advance();
                Some(name)
            }
            _ => None,
        };

        // underlying type
        while !self.check(&Token::LBrace(self.current_location())) && !self.is_at_end() {
            self.advance();
        }
        self.expect_lbrace("before enumerator list")?;

        let index = name.as_ref().map(|name| {
            let mut decl = Declaration::new(DeclKind::Enum, name.clone(), self.scope_path(), start_line);
            decl.doc = doc;
            self.record(decl)
        });

        let mut enum_scope = self.scope_path();
        enum_scope.push(name.unwrap_or_default());

        loop {
            let enumerator_doc = self.take_doc_comments();
            match self.peek_token() {
                Token::RBrace(_) => break,
                Token::Directive(..) => {
                    self.advance();
                }
                Token::Ident(enumerator, loc) => {
                    self.advance();
                    let mut decl = Declaration::new(DeclKind::Enumerator, enumerator, enum_scope.clone(), loc.line);
                    decl.doc = enumerator_doc;
                    self.record(decl);
                    self.skip_enumerator_value()?;
                }
                _ => {
                    return Err(ScanError {
                        message: format!("Expected enumerator, found {}", self.peek()),
                        location: self.current_location(),
                    });
                }
            }
        }

        let end = self.expect_rbrace("after enumerator list")?;
        if let Some(index) = index {
            self.declarations[index].end_line = end.line;
        }
        Ok(index)
    }

    /// Skip `= value` and the separating ',' after an enumerator name
    fn skip_enumerator_value(&mut self) -> Result<(), ScanError> {
        loop {
            match self.peek_token() {
                Token::Comma(_) => {
                    self.advance();
                    return Ok(());
                }
                Token::RBrace(_) => return Ok(()),
                Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) => {
                    self.skip_group()?;
                }
                Token::Semicolon(loc) | Token::Eof(loc) => {
                    return Err(ScanError {
                        message: "Expected '}' after enumerator list".to_string(),
                        location: loc,
                    });
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ===== Typedefs =====

    /// Parse typedef: typedef (aggregate | enum | type) declarators ;
    fn scan_typedef(&mut self, doc: Option<String>, start_line: usize) -> Result<(), ScanError> {
        self.advance(); // consume 'typedef'
        let first_body_decl = self.declarations.len();

        let body = match self.peek_token() {
            Token::Keyword(kw @ (Keyword::Struct | Keyword::Union | Keyword::Class), _)
                if self.is_aggregate_definition() =>
            {
                self.advance();
                Some(self.scan_aggregate(aggregate_kind(kw), None, start_line)?)
            }
            Token::Keyword(Keyword::Enum, _) if self.is_enum_definition() => {
                self.advance();
                Some(self.scan_enum(None, start_line)?)
            }
            _ => None,
        };

        let start = self.position;
        let end = self.skip_statement()?;
        let names = declarator_names(&self.tokens[start..self.position]);

        let Some(primary) = names.first().cloned() else {
            return Err(ScanError {
                message: "Expected a name in typedef".to_string(),
                location: self.previous().location(),
            });
        };

        if let Some(None) = body {
            self.rehome_anonymous(first_body_decl, Some(&primary));
        }

        for (i, name) in names.into_iter().enumerate() {
            let mut decl = Declaration::new(DeclKind::Typedef, name, self.scope_path(), start_line);
            decl.end_line = end;
            if i == 0 {
                decl.doc = doc.clone();
            }
            self.record(decl);
        }
        Ok(())
    }

    // ===== Functions, fields and variables =====

    /// Parse a declaration that is not a type definition
    fn scan_declaration(&mut self, doc: Option<String>, start_line: usize) -> Result<(), ScanError> {
        let Some(head) = self.find_function_head()? else {
            return self.scan_variable(start_line);
        };

        // Move to the parameter list and capture it
        self.position = head.paren;
        let params_start = head.paren + 1;
        self.skip_group()?;
        let params = parse_params(&self.tokens[params_start..self.position - 1]);

        let mut signature = Signature {
            params,
            ..Signature::default()
        };
        let mut trailing = Vec::new();
        self.skip_function_qualifiers(&mut signature, &mut trailing)?;

        let end_line = match self.peek_token() {
            Token::Semicolon(loc) => {
                self.advance();
                loc.line
            }
            Token::Colon(_) => {
                self.skip_initializer_list()?;
                signature.has_body = true;
                self.scan_function_body(&mut signature.returns)?
            }
            Token::LBrace(_) => {
                signature.has_body = true;
                self.scan_function_body(&mut signature.returns)?
            }
            _ => self.skip_statement()?,
        };

        let kind = self.callable_kind(&head);
        let mut scope = self.scope_path();
        scope.extend(head.qualifier);

        let mut decl = Declaration::new(kind, head.name, scope, start_line);
        decl.end_line = end_line;
        decl.doc = doc;
        decl.signature = Some(signature);
        decl.modifiers = trailing;
        self.record(decl);
        Ok(())
    }

    fn callable_kind(&self, head: &FunctionHead) -> DeclKind {
        if head.name.starts_with('~') {
            return DeclKind::Destructor;
        }
        let owner = head
            .qualifier
            .last()
            .map(String::as_str)
            .or_else(|| self.enclosing_type().map(|f| f.name.as_str()));

        match owner {
            Some(owner) if owner == head.name => DeclKind::Constructor,
            Some(_) => DeclKind::Method,
            None => DeclKind::Function,
        }
    }

    /// Locate the declarator name and parameter list of a function
    /// declaration, or `None` when the declaration is a variable or field.
    fn find_function_head(&self) -> Result<Option<FunctionHead>, ScanError> {
        let mut i = self.position;

        loop {
            let token = &self.tokens[i];
            match token {
                Token::Semicolon(_) | Token::LBrace(_) | Token::RBrace(_) | Token::Eof(_) | Token::Eq(_) => {
                    return Ok(None);
                }
                Token::Keyword(Keyword::Operator, _) => {
                    return Ok(self.operator_head(i));
                }
                Token::LParen(_) => {
                    let named = i > self.position && matches!(self.tokens[i - 1], Token::Ident(..));
                    let constructs_object = matches!(
                        self.tokens.get(i + 1),
                        Some(
                            Token::IntLiteral(..)
                                | Token::FloatLiteral(..)
                                | Token::StringLiteral(..)
                                | Token::CharLiteral(..)
                        )
                    );
                    if named && !constructs_object {
                        return Ok(Some(self.head_at(i - 1, i)));
                    }
                    i = matching_close(&self.tokens, i).unwrap_or(self.tokens.len() - 1);
                }
                Token::LBracket(_) => {
                    i = matching_close(&self.tokens, i).unwrap_or(self.tokens.len() - 1);
                }
                Token::Lt(_) if i > self.position && is_type_like(&self.tokens[i - 1]) => {
                    i = matching_angle(&self.tokens, i).unwrap_or(i);
                }
                _ => {}
            }
            i += 1;
            if i >= self.tokens.len() {
                return Ok(None);
            }
        }
    }

    /// Build a head from the name token at `name_at`, walking back over
    /// `~` and `A::B::` qualifiers.
    fn head_at(&self, name_at: usize, paren: usize) -> FunctionHead {
        let mut name = self.tokens[name_at].ident().unwrap_or_default().to_string();
        let mut k = name_at;

        if k > self.position && matches!(self.tokens[k - 1], Token::Tilde(_)) {
            name.insert(0, '~');
            k -= 1;
        }

        let mut qualifier = Vec::new();
        while k >= self.position + 2 && matches!(self.tokens[k - 1], Token::ColonColon(_)) {
            match &self.tokens[k - 2] {
                Token::Ident(q, _) => qualifier.insert(0, q.clone()),
                _ => break,
            }
            k -= 2;
        }

        FunctionHead { name, qualifier, paren }
    }

    /// `operator==(...)`, `operator()(...)`, `operator new[](...)`
    fn operator_head(&self, at: usize) -> Option<FunctionHead> {
        let mut name = String::from("operator");
        let mut i = at + 1;

        if matches!(self.tokens.get(i), Some(Token::LParen(_))) && matches!(self.tokens.get(i + 1), Some(Token::RParen(_))) {
            name.push_str("()");
            i += 2;
        }
        while let Some(token) = self.tokens.get(i) {
            match token {
                Token::LParen(_) => {
                    let base = self.head_at(at, i);
                    return Some(FunctionHead { name, ..base });
                }
                Token::Semicolon(_) | Token::LBrace(_) | Token::Eof(_) => return None,
                Token::Ident(s, _) => {
                    name.push(' ');
                    name.push_str(s);
                }
                Token::Keyword(kw, _) => {
                    name.push(' ');
                    name.push_str(kw.as_str());
                }
                other => name.push_str(token_text(other)),
            }
            i += 1;
        }
        None
    }

    /// Trailing `const`, `noexcept`, `override`, `= 0`, `-> T` and friends
    fn skip_function_qualifiers(
        &mut self,
        signature: &mut Signature,
        modifiers: &mut Vec<Modifier>,
    ) -> Result<(), ScanError> {
        loop {
            match self.peek_token() {
                Token::Keyword(Keyword::Const, _) => {
                    signature.is_const = true;
                    self.advance();
                }
                Token::Keyword(Keyword::Noexcept, _) => {
                    modifiers.push(Modifier::Noexcept);
                    self.advance();
                    if self.check(&Token::LParen(self.current_location())) {
                        self.skip_group()?;
                    }
                }
                Token::Keyword(Keyword::Override, _) => {
                    modifiers.push(Modifier::Override);
                    self.advance();
                }
                Token::Keyword(Keyword::Final, _) => {
                    modifiers.push(Modifier::Final);
                    self.advance();
                }
                Token::Keyword(Keyword::Volatile, _) | Token::Amp(_) | Token::AndAnd(_) => {
                    self.advance();
                }
                Token::Ident(word, _) if word == "throw" || word.starts_with("__attribute") => {
                    self.advance();
                    if self.check(&Token::LParen(self.current_location())) {
                        self.skip_group()?;
                    }
                }
                Token::Eq(_) => {
                    // = 0, = default, = delete
                    self.advance();
                    self.advance();
                }
                Token::Arrow(_) => {
                    self.advance();
                    while !matches!(
                        self.peek(),
                        Token::LBrace(_) | Token::Semicolon(_) | Token::Eq(_) | Token::Eof(_)
                    ) {
                        if self.check(&Token::Lt(self.current_location())) {
                            self.skip_angles()?;
                        } else {
                            self.advance();
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip a constructor initializer list up to the body's '{'
    fn skip_initializer_list(&mut self) -> Result<(), ScanError> {
        self.advance(); // consume ':'
        loop {
            // member or base name, possibly qualified or templated
            while !matches!(
                self.peek(),
                Token::LParen(_) | Token::LBrace(_) | Token::Semicolon(_) | Token::Eof(_)
            ) {
                if self.check(&Token::Lt(self.current_location())) {
                    self.skip_angles()?;
                } else {
                    self.advance();
                }
            }
            if !matches!(self.peek(), Token::LParen(_) | Token::LBrace(_)) {
                return Err(ScanError {
                    message: format!("Expected initializer, found {}", self.peek()),
                    location: self.current_location(),
                });
            }
            self.skip_group()?;
            if self.check(&Token::Ellipsis(self.current_location())) {
                self.advance();
            }
            if !self.match_token(&Token::Comma(self.current_location())) {
                return Ok(());
            }
        }
    }

    /// Skip a function body, collecting `return <integer>;` values.
    /// Returns the line of the closing brace.
    fn scan_function_body(&mut self, returns: &mut Vec<i64>) -> Result<usize, ScanError> {
        if !self.check(&Token::LBrace(self.current_location())) {
            return Err(ScanError {
                message: format!("Expected '{{' before function body, found {}", self.peek()),
                location: self.current_location(),
            });
        }
        self.skip_group_with(|ahead, _| {
            if let Some(value) = returned_integer(ahead) {
                returns.push(value);
            }
        })
    }

    /// Variables at file or namespace scope are skipped; inside aggregates
    /// they are recorded as fields.
    fn scan_variable(&mut self, start_line: usize) -> Result<(), ScanError> {
        let start = self.position;
        let end = self.skip_statement()?;

        if self.enclosing_type().is_some() {
            let scope = self.scope_path();
            for name in declarator_names(&self.tokens[start..self.position]) {
                let mut decl = Declaration::new(DeclKind::Field, name, scope.clone(), start_line);
                decl.end_line = end;
                self.record(decl);
            }
        }
        Ok(())
    }
}

fn aggregate_kind(kw: Keyword) -> DeclKind {
    match kw {
        Keyword::Class => DeclKind::Class,
        Keyword::Union => DeclKind::Union,
        _ => DeclKind::Struct,
    }
}

/// Tokens that may precede a template argument list
fn is_type_like(token: &Token) -> bool {
    matches!(token, Token::Ident(..)) || matches!(token, Token::Keyword(kw, _) if kw.is_builtin_type())
}

/// Index of the bracket closing the group opened at `open`
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) => depth += 1,
            Token::RParen(_) | Token::RBracket(_) | Token::RBrace(_) => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            Token::Eof(_) => return None,
            _ => {}
        }
    }
    None
}

/// Index of the `>` closing the template argument list opened at `open`
fn matching_angle(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while let Some(token) = tokens.get(i) {
        match token {
            Token::Lt(_) => depth += 1,
            Token::Gt(_) => depth = depth.saturating_sub(1),
            Token::GtGt(_) => depth = depth.saturating_sub(2),
            Token::LParen(_) | Token::LBracket(_) => i = matching_close(tokens, i)?,
            Token::Semicolon(_) | Token::LBrace(_) | Token::RBrace(_) | Token::Eof(_) => return None,
            _ => {}
        }
        if depth == 0 {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// `return 0;` or `return -1;` at the head of `ahead`. Values outside the
/// `i64` range are not recorded.
fn returned_integer(ahead: &[Token]) -> Option<i64> {
    match ahead {
        [Token::Keyword(Keyword::Return, _), Token::IntLiteral(n, _), Token::Semicolon(_), ..] => {
            i64::try_from(*n).ok()
        }
        [Token::Keyword(Keyword::Return, _), Token::Minus(_), Token::IntLiteral(n, _), Token::Semicolon(_), ..] => {
            0i64.checked_sub_unsigned(*n)
        }
        _ => None,
    }
}

/// Split `tokens` on commas at depth 0, ignoring doc comments
fn split_top_level(tokens: &[Token]) -> Vec<Vec<&Token>> {
    let mut parts = vec![Vec::new()];
    let mut depth = 0usize;

    for token in tokens {
        match token {
            Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) | Token::Lt(_) => depth += 1,
            Token::RParen(_) | Token::RBracket(_) | Token::RBrace(_) | Token::Gt(_) => {
                depth = depth.saturating_sub(1)
            }
            Token::GtGt(_) => depth = depth.saturating_sub(2),
            Token::Comma(_) if depth == 0 => {
                parts.push(Vec::new());
                continue;
            }
            Token::DocComment(..) => continue,
            _ => {}
        }
        if let Some(part) = parts.last_mut() {
            part.push(token);
        }
    }

    parts.retain(|p| !p.is_empty());
    parts
}

/// Names introduced by a declarator list such as `int a, *b[4], c = 1;`
/// or `} Name, *PName;`. Function pointer declarators `(*cb)(int)` yield
/// the name inside the first group.
fn declarator_names(tokens: &[Token]) -> Vec<String> {
    let body = match tokens.last() {
        Some(Token::Semicolon(_)) => &tokens[..tokens.len() - 1],
        _ => tokens,
    };

    split_top_level(body)
        .into_iter()
        .filter_map(|part| declarator_name(&part))
        .collect()
}

fn declarator_name(part: &[&Token]) -> Option<String> {
    // (*name)(...) or (&name)[N]
    if let Some(i) = part
        .windows(2)
        .position(|w| matches!(w[0], Token::LParen(_)) && matches!(w[1], Token::Star(_) | Token::Amp(_)))
    {
        if let Some(Token::Ident(name, _)) = part.get(i + 2) {
            return Some(name.clone());
        }
    }

    let mut depth = 0usize;
    let mut last = None;
    for token in part {
        match token {
            Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) | Token::Lt(_) => depth += 1,
            Token::RParen(_) | Token::RBracket(_) | Token::RBrace(_) | Token::Gt(_) => {
                depth = depth.saturating_sub(1)
            }
            Token::GtGt(_) => depth = depth.saturating_sub(2),
            Token::Eq(_) | Token::Colon(_) if depth == 0 => break,
            Token::Ident(name, _) if depth == 0 => last = Some(name.clone()),
            _ => {}
        }
        if depth > 0 && last.is_some() && matches!(token, Token::LBracket(_) | Token::LBrace(_)) {
            break;
        }
    }
    last
}

/// Parse the tokens between a parameter list's parentheses
fn parse_params(tokens: &[Token]) -> Vec<Param> {
    let parts = split_top_level(tokens);
    if let [only] = parts.as_slice() {
        if let [t] = only.as_slice() {
            if t.is_keyword(Keyword::Void) {
                return Vec::new();
            }
        }
    }

    parts
        .into_iter()
        .map(|part| {
            let defaulted = part.iter().any(|t| matches!(t, Token::Eq(_)));
            let head: Vec<&Token> = part
                .iter()
                .copied()
                .take_while(|t| !matches!(t, Token::Eq(_)))
                .collect();
            Param {
                name: param_name(&head),
                defaulted,
            }
        })
        .collect()
}

/// A parameter is named when its last identifier follows at least one other
/// type-ish word: `int x`, `const std::string& s`, `TestStruct* ts`.
fn param_name(head: &[&Token]) -> Option<String> {
    if head.iter().any(|t| matches!(t, Token::Ellipsis(_))) {
        return None;
    }
    if let Some(name) = declarator_name(head).filter(|_| {
        head.windows(2)
            .any(|w| matches!(w[0], Token::LParen(_)) && matches!(w[1], Token::Star(_) | Token::Amp(_)))
    }) {
        return Some(name);
    }

    let mut depth = 0usize;
    let mut words = 0usize;
    let mut last_ident = None;
    for token in head {
        match token {
            Token::Lt(_) | Token::LBracket(_) | Token::LParen(_) => depth += 1,
            Token::Gt(_) | Token::RBracket(_) | Token::RParen(_) => depth = depth.saturating_sub(1),
            Token::GtGt(_) => depth = depth.saturating_sub(2),
            Token::Ident(name, _) if depth == 0 => {
                words += 1;
                last_ident = Some(name.clone());
            }
            Token::Keyword(kw, _) if depth == 0 && kw.is_builtin_type() => {
                words += 1;
                last_ident = None;
            }
            Token::ColonColon(_) if depth == 0 => {
                // std::string counts as one word
                words = words.saturating_sub(1);
            }
            _ => {}
        }
    }

    match head.last() {
        Some(Token::Ident(..)) | Some(Token::RBracket(_)) if words >= 2 => last_ident,
        _ => None,
    }
}

fn token_text(token: &Token) -> &'static str {
    match token {
        Token::Plus(_) => "+",
        Token::Minus(_) => "-",
        Token::Star(_) => "*",
        Token::Slash(_) => "/",
        Token::Percent(_) => "%",
        Token::EqEq(_) => "==",
        Token::NotEq(_) => "!=",
        Token::Lt(_) => "<",
        Token::Le(_) => "<=",
        Token::Gt(_) => ">",
        Token::Ge(_) => ">=",
        Token::AndAnd(_) => "&&",
        Token::OrOr(_) => "||",
        Token::Bang(_) => "!",
        Token::Amp(_) => "&",
        Token::Pipe(_) => "|",
        Token::Caret(_) => "^",
        Token::Tilde(_) => "~",
        Token::LtLt(_) => "<<",
        Token::GtGt(_) => ">>",
        Token::Eq(_) => "=",
        Token::CompoundAssign(op, _) => op,
        Token::PlusPlus(_) => "++",
        Token::MinusMinus(_) => "--",
        Token::Arrow(_) => "->",
        Token::Comma(_) => ",",
        Token::LBracket(_) => "[",
        Token::RBracket(_) => "]",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use crate::scan::ast::{Access, DeclKind, Declaration, Inventory, Modifier};
    use crate::scan::scan_source;

    fn qualified<'a>(inventory: &'a Inventory, name: &str) -> &'a Declaration {
        inventory
            .declarations
            .iter()
            .find(|d| d.qualified_name() == name)
            .unwrap_or_else(|| panic!("{name} should be recorded"))
    }

    #[test]
    fn test_typedef_anonymous_struct() {
        let source = "/** A point */\ntypedef struct {\n    int x;\n    char name[16];\n} Point;\n";
        let inventory = scan_source(source).unwrap();

        let point = inventory.find("Point").unwrap();
        assert_eq!(point.kind, DeclKind::Typedef);
        assert_eq!(point.doc.as_deref(), Some("A point"));
        assert_eq!(point.start_line, 2);
        assert_eq!(point.end_line, 5);

        let fields: Vec<_> = inventory.children(point).map(|d| d.name.as_str()).collect();
        assert_eq!(fields, vec!["x", "name"]);
        assert_eq!(inventory.count(DeclKind::Struct), 0);
    }

    #[test]
    fn test_typedef_tagged_struct_and_plain_typedef() {
        let source = "typedef struct Node { struct Node *next; } Node_t;\ntypedef unsigned long size_type;\ntypedef void (*callback)(int);";
        let inventory = scan_source(source).unwrap();

        let node = inventory.find("Node").unwrap();
        assert_eq!(node.kind, DeclKind::Struct);
        assert_eq!(inventory.children(node).count(), 1);
        assert_eq!(inventory.find("Node_t").unwrap().kind, DeclKind::Typedef);
        assert_eq!(inventory.find("size_type").unwrap().kind, DeclKind::Typedef);
        assert_eq!(inventory.find("callback").unwrap().kind, DeclKind::Typedef);
    }

    #[test]
    fn test_class_members() {
        let source = r#"
class Counter {
private:
    int value;
public:
    /** Build one */
    Counter(int value = 0) : value(value) {}
    ~Counter() {}
    int get() const { return value; }
    void set(int v);
    static Counter make();
};
"#;
        let inventory = scan_source(source).unwrap();

        let class = inventory.find("Counter").unwrap();
        assert_eq!(class.kind, DeclKind::Class);

        let ctor = inventory.of_kind(DeclKind::Constructor).next().unwrap();
        assert_eq!(ctor.scope, vec!["Counter".to_string()]);
        assert_eq!(ctor.doc.as_deref(), Some("Build one"));
        let sig = ctor.signature.as_ref().unwrap();
        assert_eq!(sig.params.len(), 1);
        assert!(sig.params[0].defaulted);
        assert_eq!(sig.params[0].name.as_deref(), Some("value"));
        assert!(sig.has_body);

        assert_eq!(inventory.count(DeclKind::Destructor), 1);
        assert_eq!(inventory.find("~Counter").unwrap().kind, DeclKind::Destructor);

        let get = inventory.find("get").unwrap();
        assert_eq!(get.kind, DeclKind::Method);
        assert!(get.signature.as_ref().unwrap().is_const);

        let set = inventory.find("set").unwrap();
        assert!(!set.signature.as_ref().unwrap().has_body);
        assert_eq!(inventory.find("make").unwrap().kind, DeclKind::Method);

        let fields: Vec<_> = inventory.of_kind(DeclKind::Field).map(|d| d.name.as_str()).collect();
        assert_eq!(fields, vec!["value"]);
    }

    #[test]
    fn test_namespace_nesting() {
        let source = "namespace a::b {\n  struct S { int v; };\n  void f(int p) {}\n}\nnamespace { int hidden; }";
        let inventory = scan_source(source).unwrap();

        assert_eq!(inventory.count(DeclKind::Namespace), 3);
        let b = inventory.find("b").unwrap();
        assert_eq!(b.qualified_name(), "a::b");
        assert_eq!(b.end_line, 4);
        assert_eq!(inventory.find("S").unwrap().qualified_name(), "a::b::S");
        assert_eq!(inventory.find("f").unwrap().kind, DeclKind::Function);
        assert!(inventory.find("(anonymous)").is_some());
        assert!(inventory.find("hidden").is_none());
    }

    #[test]
    fn test_anonymous_members_join_enclosing_type() {
        let source = "struct Value {\n  int tag;\n  union { int i; float f; };\n};\nenum { FLAG_A, FLAG_B };";
        let inventory = scan_source(source).unwrap();

        let value = inventory.find("Value").unwrap();
        let members: Vec<_> = inventory.children(value).map(|d| d.name.as_str()).collect();
        assert_eq!(members, vec!["tag", "i", "f"]);
        assert!(inventory.find("FLAG_A").unwrap().is_top_level());
    }

    #[test]
    fn test_enum_and_union() {
        let source = "enum class Color : int { Red, Green = 2, Blue = (1 << 2), };\nunion U { int i; float f; };";
        let inventory = scan_source(source).unwrap();

        let color = inventory.find("Color").unwrap();
        let enumerators: Vec<_> = inventory.children(color).map(|d| d.name.as_str()).collect();
        assert_eq!(enumerators, vec!["Red", "Green", "Blue"]);

        let union = inventory.find("U").unwrap();
        assert_eq!(union.kind, DeclKind::Union);
        assert_eq!(inventory.children(union).count(), 2);
    }

    #[test]
    fn test_out_of_class_definitions_and_operators() {
        let source = r#"
Widget::Widget() {}
int Widget::size() const { return 3; }
bool operator==(const Widget& a, const Widget& b) { return true; }
std::vector<int> make_list(std::map<int, int> m, ...);
"#;
        let inventory = scan_source(source).unwrap();

        let ctor = inventory.of_kind(DeclKind::Constructor).next().unwrap();
        assert_eq!(ctor.qualified_name(), "Widget::Widget");
        let size = inventory.find("size").unwrap();
        assert_eq!(size.kind, DeclKind::Method);
        assert_eq!(size.signature.as_ref().unwrap().returns, vec![3]);

        let op = inventory.find("operator==").unwrap();
        assert_eq!(op.kind, DeclKind::Function);
        assert_eq!(op.signature.as_ref().unwrap().params.len(), 2);

        let list = inventory.find("make_list").unwrap();
        let params = &list.signature.as_ref().unwrap().params;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name.as_deref(), Some("m"));
        assert_eq!(params[1].name, None);
    }

    #[test]
    fn test_variables_are_not_functions() {
        let source = "int counter = 0;\nWidget w(42);\nvoid (*handler)(int);\nint table[4] = {1, 2, 3, 4};";
        let inventory = scan_source(source).unwrap();
        assert!(inventory.declarations.is_empty(), "{:?}", inventory.declarations);
    }

    #[test]
    fn test_unnamed_prototype_params() {
        let inventory = scan_source("int f(int, char *);\nint g(void);").unwrap();

        let f = inventory.find("f").unwrap();
        let params = &f.signature.as_ref().unwrap().params;
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|p| p.name.is_none()));
        assert!(inventory.find("g").unwrap().signature.as_ref().unwrap().params.is_empty());
    }

    #[test]
    fn test_negative_and_nested_returns() {
        let source = "int f(int x) {\n  if (x) { return -1; }\n  return 0;\n}";
        let inventory = scan_source(source).unwrap();
        let f = inventory.find("f").unwrap();
        assert_eq!(f.signature.as_ref().unwrap().returns, vec![-1, 0]);
        assert_eq!(f.end_line, 4);
    }

    #[test]
    fn test_out_of_range_returns_are_dropped() {
        let source = "int lowest(void) { return -0x8000000000000000; }\n\
                      int wrapped(void) { return 0xFFFFFFFFFFFFFFFF; }\n\
                      int below(void) { return -0x8000000000000001; }";
        let inventory = scan_source(source).unwrap();

        let returns = |name: &str| inventory.find(name).unwrap().signature.as_ref().unwrap().returns.clone();
        assert_eq!(returns("lowest"), vec![i64::MIN]);
        assert!(returns("wrapped").is_empty());
        assert!(returns("below").is_empty());
    }

    #[test]
    fn test_access_specifiers_and_modifiers() {
        let source = r#"
class Shape {
    int id;
public:
    explicit Shape(int id);
    virtual ~Shape() = default;
    virtual double area() const = 0;
    static inline int count() noexcept { return 0; }
protected:
    struct Cache { int hits; } cache;
};
struct Square final : Shape {
    double area() const override;
private:
    union { int raw; float f; };
};
static int helper(void);
extern int shared(void);
"#;
        let inventory = scan_source(source).unwrap();

        let access = |name: &str| qualified(&inventory, name).access;
        let modifiers = |name: &str| qualified(&inventory, name).modifiers.clone();

        assert_eq!(access("Shape"), None);
        assert_eq!(access("Shape::id"), Some(Access::Private));
        assert_eq!(access("Shape::Shape"), Some(Access::Public));
        assert_eq!(modifiers("Shape::Shape"), vec![Modifier::Explicit]);
        assert_eq!(modifiers("Shape::~Shape"), vec![Modifier::Virtual]);
        assert_eq!(modifiers("Shape::area"), vec![Modifier::Virtual]);
        assert_eq!(
            modifiers("Shape::count"),
            vec![Modifier::Static, Modifier::Inline, Modifier::Noexcept]
        );

        assert_eq!(access("Shape::Cache"), Some(Access::Protected));
        assert_eq!(access("Shape::Cache::hits"), Some(Access::Public));
        assert_eq!(access("Shape::cache"), Some(Access::Protected));

        assert_eq!(access("Square::area"), Some(Access::Public));
        assert_eq!(modifiers("Square::area"), vec![Modifier::Override]);
        assert_eq!(access("Square::raw"), Some(Access::Private));
        assert_eq!(access("Square::f"), Some(Access::Private));

        assert_eq!(modifiers("helper"), vec![Modifier::Static]);
        assert_eq!(access("helper"), None);
        assert!(qualified(&inventory, "shared").has_modifier(Modifier::Extern));
    }

    #[test]
    fn test_template_function_and_class() {
        let source = "template <typename T>\nclass Box { T item; };\ntemplate <typename T> T id(T v) { return v; }";
        let inventory = scan_source(source).unwrap();
        assert_eq!(inventory.find("Box").unwrap().kind, DeclKind::Class);
        assert_eq!(inventory.find("id").unwrap().kind, DeclKind::Function);
    }
}
