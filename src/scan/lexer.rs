//! Lexer (tokenizer) for C and C++ source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the
//! declaration scanner. Unlike a compiler front end, the lexer keeps two kinds
//! of trivia the inventory needs: documentation comments (`/** */`, `///`)
//! become [`Token::DocComment`], and preprocessor lines become
//! [`Token::Directive`]. Plain comments and whitespace are dropped.
//!
//! Keywords of both dialects are recognized; deciding whether a C++ keyword is
//! legal in a given file is left to the contract checks.

use super::ast::SourceLocation;
use std::fmt;

/// Reserved words of C and C++ that the scanner cares about.
///
/// Words that never influence declaration structure (`goto`, `sizeof`, ...)
/// are lexed as plain identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Type-introducing
    Struct,
    Union,
    Enum,
    Class,
    Typedef,
    Namespace,
    Template,
    Typename,
    Using,

    // Access specifiers
    Public,
    Private,
    Protected,

    // Qualifiers and specifiers
    Const,
    Volatile,
    Static,
    Extern,
    Inline,
    Virtual,
    Explicit,
    Friend,
    Constexpr,
    Noexcept,
    Override,
    Final,
    Operator,

    // Builtin types
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Auto,

    // Statements the scanner looks into
    Return,
    Default,
    Delete,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        let kw = match word {
            "struct" => Keyword::Struct,
            "union" => Keyword::Union,
            "enum" => Keyword::Enum,
            "class" => Keyword::Class,
            "typedef" => Keyword::Typedef,
            "namespace" => Keyword::Namespace,
            "template" => Keyword::Template,
            "typename" => Keyword::Typename,
            "using" => Keyword::Using,
            "public" => Keyword::Public,
            "private" => Keyword::Private,
            "protected" => Keyword::Protected,
            "const" => Keyword::Const,
            "volatile" => Keyword::Volatile,
            "static" => Keyword::Static,
            "extern" => Keyword::Extern,
            "inline" => Keyword::Inline,
            "virtual" => Keyword::Virtual,
            "explicit" => Keyword::Explicit,
            "friend" => Keyword::Friend,
            "constexpr" => Keyword::Constexpr,
            "noexcept" => Keyword::Noexcept,
            "override" => Keyword::Override,
            "final" => Keyword::Final,
            "operator" => Keyword::Operator,
            "void" => Keyword::Void,
            "bool" | "_Bool" => Keyword::Bool,
            "char" => Keyword::Char,
            "short" => Keyword::Short,
            "int" => Keyword::Int,
            "long" => Keyword::Long,
            "float" => Keyword::Float,
            "double" => Keyword::Double,
            "signed" => Keyword::Signed,
            "unsigned" => Keyword::Unsigned,
            "auto" => Keyword::Auto,
            "return" => Keyword::Return,
            "default" => Keyword::Default,
            "delete" => Keyword::Delete,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Struct => "struct",
            Keyword::Union => "union",
            Keyword::Enum => "enum",
            Keyword::Class => "class",
            Keyword::Typedef => "typedef",
            Keyword::Namespace => "namespace",
            Keyword::Template => "template",
            Keyword::Typename => "typename",
            Keyword::Using => "using",
            Keyword::Public => "public",
            Keyword::Private => "private",
            Keyword::Protected => "protected",
            Keyword::Const => "const",
            Keyword::Volatile => "volatile",
            Keyword::Static => "static",
            Keyword::Extern => "extern",
            Keyword::Inline => "inline",
            Keyword::Virtual => "virtual",
            Keyword::Explicit => "explicit",
            Keyword::Friend => "friend",
            Keyword::Constexpr => "constexpr",
            Keyword::Noexcept => "noexcept",
            Keyword::Override => "override",
            Keyword::Final => "final",
            Keyword::Operator => "operator",
            Keyword::Void => "void",
            Keyword::Bool => "bool",
            Keyword::Char => "char",
            Keyword::Short => "short",
            Keyword::Int => "int",
            Keyword::Long => "long",
            Keyword::Float => "float",
            Keyword::Double => "double",
            Keyword::Signed => "signed",
            Keyword::Unsigned => "unsigned",
            Keyword::Auto => "auto",
            Keyword::Return => "return",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
        }
    }

    /// Keywords that only exist in C++ and are a dialect error in C sources.
    pub fn is_cpp_only(self) -> bool {
        matches!(
            self,
            Keyword::Class
                | Keyword::Namespace
                | Keyword::Template
                | Keyword::Typename
                | Keyword::Using
                | Keyword::Public
                | Keyword::Private
                | Keyword::Protected
                | Keyword::Virtual
                | Keyword::Explicit
                | Keyword::Friend
                | Keyword::Constexpr
                | Keyword::Noexcept
                | Keyword::Operator
        )
    }

    /// Builtin type names
    pub fn is_builtin_type(self) -> bool {
        matches!(
            self,
            Keyword::Void
                | Keyword::Bool
                | Keyword::Char
                | Keyword::Short
                | Keyword::Int
                | Keyword::Long
                | Keyword::Float
                | Keyword::Double
                | Keyword::Signed
                | Keyword::Unsigned
                | Keyword::Auto
        )
    }
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that scan errors and
/// declarations can report an accurate line without a separate
/// token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Value of the literal; a leading `-` is a separate token
    IntLiteral(u64, SourceLocation),
    FloatLiteral(String, SourceLocation),
    CharLiteral(String, SourceLocation),
    StringLiteral(String, SourceLocation),

    Ident(String, SourceLocation),
    Keyword(Keyword, SourceLocation),

    // Trivia the inventory keeps
    DocComment(String, SourceLocation),
    Directive(String, SourceLocation),

    // Operators
    Plus(SourceLocation),    // +
    Minus(SourceLocation),   // -
    Star(SourceLocation),    // *
    Slash(SourceLocation),   // /
    Percent(SourceLocation), // %

    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=
    Lt(SourceLocation),    // <
    Le(SourceLocation),    // <=
    Gt(SourceLocation),    // >
    Ge(SourceLocation),    // >=

    AndAnd(SourceLocation), // &&
    OrOr(SourceLocation),   // ||
    Bang(SourceLocation),   // !

    Amp(SourceLocation),   // &
    Pipe(SourceLocation),  // |
    Caret(SourceLocation), // ^
    Tilde(SourceLocation), // ~
    LtLt(SourceLocation),  // <<
    GtGt(SourceLocation),  // >>

    Eq(SourceLocation),                           // =
    CompoundAssign(&'static str, SourceLocation), // += -= <<= ...

    PlusPlus(SourceLocation),   // ++
    MinusMinus(SourceLocation), // --

    Dot(SourceLocation),        // .
    Arrow(SourceLocation),      // ->
    Ellipsis(SourceLocation),   // ...
    ColonColon(SourceLocation), // ::

    Question(SourceLocation), // ?
    Colon(SourceLocation),    // :

    // Punctuation
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Semicolon(SourceLocation), // ;
    Comma(SourceLocation),     // ,

    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::FloatLiteral(_, loc)
            | Token::CharLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Keyword(_, loc)
            | Token::DocComment(_, loc)
            | Token::Directive(_, loc)
            | Token::CompoundAssign(_, loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::Bang(loc)
            | Token::Amp(loc)
            | Token::Pipe(loc)
            | Token::Caret(loc)
            | Token::Tilde(loc)
            | Token::LtLt(loc)
            | Token::GtGt(loc)
            | Token::Eq(loc)
            | Token::PlusPlus(loc)
            | Token::MinusMinus(loc)
            | Token::Dot(loc)
            | Token::Arrow(loc)
            | Token::Ellipsis(loc)
            | Token::ColonColon(loc)
            | Token::Question(loc)
            | Token::Colon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Eof(loc) => *loc,
        }
    }

    pub fn line(&self) -> usize {
        self.location().line
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, Token::Keyword(k, _) if *k == kw)
    }

    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(s, _) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::FloatLiteral(s, _) => write!(f, "float literal {}", s),
            Token::CharLiteral(s, _) => write!(f, "char literal '{}'", s),
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Keyword(kw, _) => write!(f, "'{}'", kw.as_str()),
            Token::DocComment(_, _) => write!(f, "doc comment"),
            Token::Directive(s, _) => write!(f, "directive '#{}'", s),
            Token::CompoundAssign(op, _) => write!(f, "'{}'", op),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::Bang(_) => write!(f, "'!'"),
            Token::Amp(_) => write!(f, "'&'"),
            Token::Pipe(_) => write!(f, "'|'"),
            Token::Caret(_) => write!(f, "'^'"),
            Token::Tilde(_) => write!(f, "'~'"),
            Token::LtLt(_) => write!(f, "'<<'"),
            Token::GtGt(_) => write!(f, "'>>'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::PlusPlus(_) => write!(f, "'++'"),
            Token::MinusMinus(_) => write!(f, "'--'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Arrow(_) => write!(f, "'->'"),
            Token::Ellipsis(_) => write!(f, "'...'"),
            Token::ColonColon(_) => write!(f, "'::'"),
            Token::Question(_) => write!(f, "'?'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// String/char literal prefixes (`L"..."`, `u8"..."`, `R"(...)"`)
const LITERAL_PREFIXES: &[&str] = &["L", "u", "U", "u8", "R", "LR", "uR", "UR", "u8R"];

/// Lexer for C and C++ source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Only whitespace seen since the last newline; directives must start a line
    at_line_start: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            at_line_start: true,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            if let Some(doc) = self.skip_whitespace_and_comments()? {
                tokens.push(doc);
                continue;
            }

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            if self.peek() == Some('#') && self.at_line_start {
                tokens.push(self.preprocessor_directive()?);
                continue;
            }

            self.at_line_start = false;
            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            '"' => self.string_literal(loc),
            '\'' => self.char_literal(loc),
            '0'..='9' => Ok(self.number_literal(ch, loc)),
            'a'..='z' | 'A'..='Z' | '_' | '$' => self.identifier_or_keyword(ch, loc),

            '+' => Ok(if self.matches_next('+') {
                Token::PlusPlus(loc)
            } else if self.matches_next('=') {
                Token::CompoundAssign("+=", loc)
            } else {
                Token::Plus(loc)
            }),
            '-' => Ok(if self.matches_next('-') {
                Token::MinusMinus(loc)
            } else if self.matches_next('=') {
                Token::CompoundAssign("-=", loc)
            } else if self.matches_next('>') {
                Token::Arrow(loc)
            } else {
                Token::Minus(loc)
            }),
            '*' => Ok(if self.matches_next('=') {
                Token::CompoundAssign("*=", loc)
            } else {
                Token::Star(loc)
            }),
            '/' => Ok(if self.matches_next('=') {
                Token::CompoundAssign("/=", loc)
            } else {
                Token::Slash(loc)
            }),
            '%' => Ok(if self.matches_next('=') {
                Token::CompoundAssign("%=", loc)
            } else {
                Token::Percent(loc)
            }),
            '=' => Ok(if self.matches_next('=') {
                Token::EqEq(loc)
            } else {
                Token::Eq(loc)
            }),
            '!' => Ok(if self.matches_next('=') {
                Token::NotEq(loc)
            } else {
                Token::Bang(loc)
            }),
            '<' => Ok(if self.matches_next('<') {
                if self.matches_next('=') {
                    Token::CompoundAssign("<<=", loc)
                } else {
                    Token::LtLt(loc)
                }
            } else if self.matches_next('=') {
                Token::Le(loc)
            } else {
                Token::Lt(loc)
            }),
            '>' => Ok(if self.matches_next('>') {
                if self.matches_next('=') {
                    Token::CompoundAssign(">>=", loc)
                } else {
                    Token::GtGt(loc)
                }
            } else if self.matches_next('=') {
                Token::Ge(loc)
            } else {
                Token::Gt(loc)
            }),
            '&' => Ok(if self.matches_next('&') {
                Token::AndAnd(loc)
            } else if self.matches_next('=') {
                Token::CompoundAssign("&=", loc)
            } else {
                Token::Amp(loc)
            }),
            '|' => Ok(if self.matches_next('|') {
                Token::OrOr(loc)
            } else if self.matches_next('=') {
                Token::CompoundAssign("|=", loc)
            } else {
                Token::Pipe(loc)
            }),
            '^' => Ok(if self.matches_next('=') {
                Token::CompoundAssign("^=", loc)
            } else {
                Token::Caret(loc)
            }),
            ':' => Ok(if self.matches_next(':') {
                Token::ColonColon(loc)
            } else {
                Token::Colon(loc)
            }),
            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    Ok(self.number_literal('.', loc))
                } else if self.lookahead_is("..") {
                    self.advance();
                    self.advance();
                    Ok(Token::Ellipsis(loc))
                } else {
                    Ok(Token::Dot(loc))
                }
            }
            '~' => Ok(Token::Tilde(loc)),
            '?' => Ok(Token::Question(loc)),
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '{' => Ok(Token::LBrace(loc)),
            '}' => Ok(Token::RBrace(loc)),
            '[' => Ok(Token::LBracket(loc)),
            ']' => Ok(Token::RBracket(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            ',' => Ok(Token::Comma(loc)),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Consume the next character if it is `expected`
    fn matches_next(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn lookahead_is(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_ahead(i) == Some(c))
    }

    /// Parse string literal; the opening quote is already consumed.
    ///
    /// Escapes are kept verbatim: the inventory never needs the decoded value.
    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(Token::StringLiteral(string, loc));
                }
                '\\' => {
                    string.push(ch);
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        string.push(escaped);
                    }
                }
                '\n' => break,
                _ => {
                    string.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Parse a C++11 raw string `R"delim( ... )delim"`; the `"` is already consumed.
    fn raw_string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut delimiter = String::new();
        loop {
            match self.advance() {
                Some('(') => break,
                Some(c) if c != '\n' && delimiter.len() < 16 => delimiter.push(c),
                _ => {
                    return Err(LexError {
                        message: "Malformed raw string delimiter".to_string(),
                        location: loc,
                    });
                }
            }
        }

        let terminator = format!("){}\"", delimiter);
        let mut string = String::new();
        while !self.is_at_end() {
            if self.lookahead_is(&terminator) {
                for _ in 0..terminator.chars().count() {
                    self.advance();
                }
                return Ok(Token::StringLiteral(string, loc));
            }
            if let Some(c) = self.advance() {
                string.push(c);
            }
        }

        Err(LexError {
            message: "Unterminated raw string literal".to_string(),
            location: loc,
        })
    }

    /// Parse character literal; the opening quote is already consumed.
    fn char_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut value = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '\'' => {
                    self.advance();
                    if value.is_empty() {
                        return Err(LexError {
                            message: "Empty character literal".to_string(),
                            location: loc,
                        });
                    }
                    return Ok(Token::CharLiteral(value, loc));
                }
                '\\' => {
                    value.push(ch);
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        value.push(escaped);
                    }
                }
                '\n' => break,
                _ => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError {
            message: "Expected closing quote in character literal".to_string(),
            location: loc,
        })
    }

    /// Parse numeric literal: decimal, hex, octal, binary, floats, suffixes
    /// and C++14 digit separators.
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Token {
        let mut text = String::new();
        text.push(first);

        while let Some(ch) = self.peek() {
            let is_hex = text.starts_with("0x") || text.starts_with("0X");
            let exponent_sign = (ch == '+' || ch == '-')
                && match text.chars().last() {
                    Some('e' | 'E') => !is_hex,
                    Some('p' | 'P') => true,
                    _ => false,
                };

            if ch.is_ascii_alphanumeric() || ch == '.' || exponent_sign {
                text.push(ch);
                self.advance();
            } else if ch == '\'' && self.peek_ahead(1).is_some_and(|c| c.is_ascii_alphanumeric()) {
                // digit separator
                self.advance();
            } else {
                break;
            }
        }

        match parse_integer(&text) {
            Some(value) => Token::IntLiteral(value, loc),
            None => Token::FloatLiteral(text, loc),
        }
    }

    /// Parse identifier or keyword, including literal prefixes like `L"..."`
    fn identifier_or_keyword(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut ident = String::new();
        ident.push(first);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if LITERAL_PREFIXES.contains(&ident.as_str()) {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return if ident.ends_with('R') {
                        self.raw_string_literal(loc)
                    } else {
                        self.string_literal(loc)
                    };
                }
                Some('\'') if !ident.ends_with('R') => {
                    self.advance();
                    return self.char_literal(loc);
                }
                _ => {}
            }
        }

        Ok(match Keyword::from_word(&ident) {
            Some(kw) => Token::Keyword(kw, loc),
            None => Token::Ident(ident, loc),
        })
    }

    /// Skip whitespace and plain comments. Returns a doc comment token when one
    /// is encountered.
    fn skip_whitespace_and_comments(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            match self.peek() {
                Some('\n') => {
                    self.advance();
                    self.at_line_start = true;
                }
                Some(' ') | Some('\t') | Some('\r') | Some('\x0c') => {
                    self.advance();
                }
                Some('\\') if self.peek_ahead(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        if let Some(doc) = self.line_comment() {
                            return Ok(Some(doc));
                        }
                    } else if self.peek_ahead(1) == Some('*') {
                        if let Some(doc) = self.block_comment()? {
                            return Ok(Some(doc));
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(None)
    }

    /// Consume a `// ...` comment; `///` and `//!` comments are returned as docs.
    fn line_comment(&mut self) -> Option<Token> {
        let loc = self.current_location();
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }

        let is_doc = (text.starts_with("///") && !text.starts_with("////")) || text.starts_with("//!");
        is_doc.then(|| Token::DocComment(clean_line_doc(&text), loc))
    }

    /// Consume a `/* ... */` comment; `/** */` and `/*! */` are returned as docs.
    fn block_comment(&mut self) -> Result<Option<Token>, LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        let mut text = String::from("/*");
        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                text.push_str("*/");

                let is_doc = (text.starts_with("/**") && text != "/**/" && !text.starts_with("/***"))
                    || text.starts_with("/*!");
                return Ok(is_doc.then(|| Token::DocComment(clean_block_doc(&text), start_loc)));
            }
            if let Some(c) = self.advance() {
                text.push(c);
            }
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Capture a preprocessor directive line, honoring `\` continuations and
    /// dropping trailing comments.
    fn preprocessor_directive(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        self.advance(); // skip '#'

        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' && self.peek_ahead(1) == Some('\n') {
                self.advance();
                self.advance();
                text.push(' ');
                continue;
            }
            if ch == '\n' {
                break;
            }
            if ch == '/' && self.peek_ahead(1) == Some('/') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                break;
            }
            if ch == '/' && self.peek_ahead(1) == Some('*') {
                // Inline block comment; a multi-line one ends the directive text.
                let comment_loc = self.current_location();
                self.advance();
                self.advance();
                while !self.lookahead_is("*/") {
                    if self.advance().is_none() {
                        return Err(LexError {
                            message: "Unterminated block comment".to_string(),
                            location: comment_loc,
                        });
                    }
                }
                self.advance();
                self.advance();
                text.push(' ');
                continue;
            }
            text.push(ch);
            self.advance();
        }

        Ok(Token::Directive(text.trim().to_string(), loc))
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Integer value of a literal, or `None` for floating point literals.
fn parse_integer(text: &str) -> Option<u64> {
    let lower = text.to_ascii_lowercase();
    let (digits, radix) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (bin, 2)
    } else if lower.len() > 1 && lower.starts_with('0') && lower.chars().all(|c| c.is_ascii_digit()) {
        (&lower[1..], 8)
    } else {
        (lower.as_str(), 10)
    };

    let digits = digits.trim_end_matches(['u', 'l', 'z']);
    if digits.is_empty() {
        return (radix == 8).then_some(0);
    }
    if radix == 10 && digits.contains(['.', 'e']) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// Strip `///` or `//!` and one following space.
fn clean_line_doc(text: &str) -> String {
    let body = text.get(3..).unwrap_or("");
    body.strip_prefix(' ').unwrap_or(body).trim_end().to_string()
}

/// Strip `/**`, `*/` and leading `*` gutters; drop blank edge lines.
fn clean_block_doc(text: &str) -> String {
    let inner = text
        .strip_prefix("/**")
        .or_else(|| text.strip_prefix("/*!"))
        .unwrap_or(text);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);

    let lines: Vec<&str> = inner
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            let trimmed = trimmed.strip_prefix('*').unwrap_or(trimmed);
            trimmed.strip_prefix(' ').unwrap_or(trimmed).trim_end()
        })
        .collect();

    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = lex("int main() { return 0; }");

        assert!(tokens[0].is_keyword(Keyword::Int));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "main"));
        assert!(matches!(tokens[2], Token::LParen(_)));
        assert!(matches!(tokens[3], Token::RParen(_)));
        assert!(matches!(tokens[4], Token::LBrace(_)));
        assert!(tokens[5].is_keyword(Keyword::Return));
        assert!(matches!(tokens[6], Token::IntLiteral(0, _)));
        assert!(matches!(tokens[7], Token::Semicolon(_)));
        assert!(matches!(tokens[8], Token::RBrace(_)));
        assert!(matches!(tokens[9], Token::Eof(_)));
    }

    #[test]
    fn test_cpp_punctuators() {
        let tokens = lex("std::cout << x; a->b; f(...); x <<= 2; y >>= 1;");

        assert!(matches!(tokens[1], Token::ColonColon(_)));
        assert!(matches!(tokens[3], Token::LtLt(_)));
        assert!(matches!(tokens[7], Token::Arrow(_)));
        assert!(matches!(tokens[12], Token::Ellipsis(_)));
        assert!(matches!(tokens[16], Token::CompoundAssign("<<=", _)));
        assert!(matches!(tokens[20], Token::CompoundAssign(">>=", _)));
    }

    #[test]
    fn test_plain_comments_dropped_doc_comments_kept() {
        let tokens = lex("int x; // comment\n/* block\ncomment */ int y;\n/**\n * Docs here\n */\nint z;");

        assert!(tokens[0].is_keyword(Keyword::Int));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "x"));
        assert!(tokens[3].is_keyword(Keyword::Int));
        assert!(matches!(tokens[4], Token::Ident(ref s, _) if s == "y"));
        match &tokens[6] {
            Token::DocComment(text, loc) => {
                assert_eq!(text, "Docs here");
                assert_eq!(loc.line, 4);
            }
            other => panic!("Expected doc comment, got {}", other),
        }
        assert!(tokens[7].is_keyword(Keyword::Int));
    }

    #[test]
    fn test_triple_slash_doc() {
        let tokens = lex("/// Adds numbers\nint add(int a, int b);");
        assert!(matches!(tokens[0], Token::DocComment(ref s, _) if s == "Adds numbers"));
    }

    #[test]
    fn test_string_and_char_literals() {
        let tokens = lex(r#"printf("%s: %d\n", s); c = '\0'; w = L"wide"; r = R"x(a)"b)x";"#);

        assert!(matches!(tokens[2], Token::StringLiteral(ref s, _) if s == "%s: %d\\n"));
        assert!(matches!(tokens[9], Token::CharLiteral(ref s, _) if s == "\\0"));
        assert!(matches!(tokens[13], Token::StringLiteral(ref s, _) if s == "wide"));
        assert!(matches!(tokens[17], Token::StringLiteral(ref s, _) if s == "a)\"b"));
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("0x1F 017 42u 1'000 3.14 1e-3 .5f 0");

        assert!(matches!(tokens[0], Token::IntLiteral(31, _)));
        assert!(matches!(tokens[1], Token::IntLiteral(15, _)));
        assert!(matches!(tokens[2], Token::IntLiteral(42, _)));
        assert!(matches!(tokens[3], Token::IntLiteral(1000, _)));
        assert!(matches!(tokens[4], Token::FloatLiteral(ref s, _) if s == "3.14"));
        assert!(matches!(tokens[5], Token::FloatLiteral(ref s, _) if s == "1e-3"));
        assert!(matches!(tokens[6], Token::FloatLiteral(ref s, _) if s == ".5f"));
        assert!(matches!(tokens[7], Token::IntLiteral(0, _)));
    }

    #[test]
    fn test_integer_literals_keep_full_unsigned_range() {
        let tokens = lex("0xFFFFFFFFFFFFFFFF 0x8000000000000000ull");

        assert!(matches!(tokens[0], Token::IntLiteral(u64::MAX, _)));
        assert!(matches!(tokens[1], Token::IntLiteral(0x8000_0000_0000_0000, _)));
    }

    #[test]
    fn test_preprocessor_captured() {
        let tokens = lex("#include <stdio.h> // io\n#define MAX(a, b) \\\n  ((a) > (b))\nint x;");

        assert!(matches!(tokens[0], Token::Directive(ref s, _) if s == "include <stdio.h>"));
        match &tokens[1] {
            Token::Directive(text, loc) => {
                assert!(text.starts_with("define MAX(a, b)"));
                assert!(text.ends_with("((a) > (b))"));
                assert_eq!(loc.line, 2);
            }
            other => panic!("Expected directive, got {}", other),
        }
        assert!(tokens[2].is_keyword(Keyword::Int));
        assert_eq!(tokens[2].line(), 4);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = Lexer::new("int x; /* never closed").tokenize().unwrap_err();
        assert_eq!(err.location.line, 1);
        assert!(err.to_string().contains("Unterminated block comment"));
    }

    #[test]
    fn test_unterminated_comment_in_directive() {
        let err = Lexer::new("int a;\n#define X 1 /* never closed\nint f(void) { return 0; }\n")
            .tokenize()
            .unwrap_err();
        assert_eq!((err.location.line, err.location.column), (2, 13));
        assert!(err.message.contains("Unterminated block comment"));

        let tokens = lex("#define Y 2 /* closed */\nint y;");
        assert!(matches!(tokens[0], Token::Directive(ref s, _) if s == "define Y 2"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("char *s = \"open\nint y;").tokenize().unwrap_err();
        assert!(err.message.contains("Unterminated string"));
    }
}
