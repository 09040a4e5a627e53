// Inventory types produced by the declaration scanner

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Kinds of declarations the scanner recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
    Typedef,
    Function,
    Method,
    Constructor,
    Destructor,
    Field,
    Enumerator,
}

impl DeclKind {
    /// Type-defining kinds (the ones that introduce a new type name)
    pub fn is_type(self) -> bool {
        matches!(
            self,
            DeclKind::Class | DeclKind::Struct | DeclKind::Union | DeclKind::Enum | DeclKind::Typedef
        )
    }

    /// Kinds that own a parameter list
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            DeclKind::Function | DeclKind::Method | DeclKind::Constructor | DeclKind::Destructor
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Namespace => "namespace",
            DeclKind::Class => "class",
            DeclKind::Struct => "struct",
            DeclKind::Union => "union",
            DeclKind::Enum => "enum",
            DeclKind::Typedef => "typedef",
            DeclKind::Function => "function",
            DeclKind::Method => "method",
            DeclKind::Constructor => "constructor",
            DeclKind::Destructor => "destructor",
            DeclKind::Field => "field",
            DeclKind::Enumerator => "enumerator",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member access of a class, struct or union member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    /// Access in effect at the start of a body: `class` members are private,
    /// `struct` and `union` members public.
    pub fn default_for(kind: DeclKind) -> Option<Self> {
        match kind {
            DeclKind::Class => Some(Access::Private),
            DeclKind::Struct | DeclKind::Union => Some(Access::Public),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration specifiers and trailing function specifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Static,
    Extern,
    Inline,
    Virtual,
    Explicit,
    Constexpr,
    Override,
    Final,
    Noexcept,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Static => "static",
            Modifier::Extern => "extern",
            Modifier::Inline => "inline",
            Modifier::Virtual => "virtual",
            Modifier::Explicit => "explicit",
            Modifier::Constexpr => "constexpr",
            Modifier::Override => "override",
            Modifier::Final => "final",
            Modifier::Noexcept => "noexcept",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Parameter name; `None` for unnamed prototype parameters
    pub name: Option<String>,
    /// Whether the parameter carries a default argument (`int value = 0`)
    pub defaulted: bool,
}

/// Extra information recorded for callables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub params: Vec<Param>,
    /// Trailing `const` qualifier on a member function
    pub is_const: bool,
    /// `false` for prototypes ending in `;`
    pub has_body: bool,
    /// Integer literals appearing directly after `return` in the body
    pub returns: Vec<i64>,
}

/// One entry of a fixture's inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub kind: DeclKind,
    pub name: String,
    /// Enclosing namespaces and types, outermost first
    pub scope: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
    /// Access of a type member; `None` outside class, struct and union bodies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    /// Cleaned text of the doc comment immediately preceding the declaration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl Declaration {
    pub fn new(kind: DeclKind, name: impl Into<String>, scope: Vec<String>, line: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            scope,
            start_line: line,
            end_line: line,
            access: None,
            modifiers: Vec::new(),
            doc: None,
            signature: None,
        }
    }

    /// Scope-qualified name, e.g. `MyNamespace::MyClass`
    pub fn qualified_name(&self) -> String {
        if self.scope.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.scope.join("::"), self.name)
        }
    }

    /// True when declared outside any namespace or type
    pub fn is_top_level(&self) -> bool {
        self.scope.is_empty()
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Whether `parent` directly encloses this declaration
    pub fn is_child_of(&self, parent: &Declaration) -> bool {
        self.scope.len() == parent.scope.len() + 1
            && self.scope[..parent.scope.len()] == parent.scope[..]
            && self.scope.last() == Some(&parent.name)
    }
}

/// An `#include` directive
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Include {
    pub path: String,
    /// `<...>` includes are system headers, `"..."` are local
    pub system: bool,
    pub line: usize,
}

/// Everything the scanner extracts from one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub declarations: Vec<Declaration>,
    pub includes: Vec<Include>,
}

impl Inventory {
    /// Declarations of one kind, in source order
    pub fn of_kind(&self, kind: DeclKind) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: DeclKind) -> usize {
        self.of_kind(kind).count()
    }

    /// First declaration with the given unqualified name
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Declarations directly enclosed by `parent`
    pub fn children<'a>(&'a self, parent: &'a Declaration) -> impl Iterator<Item = &'a Declaration> {
        self.declarations.iter().filter(move |d| d.is_child_of(parent))
    }

    /// The namespace or type that directly encloses `decl`, if it was
    /// recorded. A function sharing the enclosing type's name never matches.
    pub fn parent_of(&self, decl: &Declaration) -> Option<&Declaration> {
        self.declarations
            .iter()
            .filter(|p| p.kind == DeclKind::Namespace || p.kind.is_type())
            .find(|p| decl.is_child_of(p))
    }

    /// Number of declarations per kind
    pub fn kind_counts(&self) -> FxHashMap<DeclKind, usize> {
        let mut counts = FxHashMap::default();
        for decl in &self.declarations {
            *counts.entry(decl.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Local (`"..."`) include paths
    pub fn local_includes(&self) -> impl Iterator<Item = &Include> {
        self.includes.iter().filter(|i| !i.system)
    }

    /// Source lines on which a declaration starts, for display markers
    pub fn declaration_lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self.declarations.iter().map(|d| d.start_line).collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_and_children() {
        let ns = Declaration::new(DeclKind::Namespace, "Outer", vec![], 1);
        let class = Declaration::new(DeclKind::Class, "Inner", vec!["Outer".into()], 2);
        let method = Declaration::new(
            DeclKind::Method,
            "run",
            vec!["Outer".into(), "Inner".into()],
            3,
        );

        assert_eq!(class.qualified_name(), "Outer::Inner");
        assert_eq!(method.qualified_name(), "Outer::Inner::run");
        assert!(class.is_child_of(&ns));
        assert!(method.is_child_of(&class));
        assert!(!method.is_child_of(&ns));
        assert!(ns.is_top_level());
    }

    #[test]
    fn test_declaration_lines_dedup() {
        let inventory = Inventory {
            declarations: vec![
                Declaration::new(DeclKind::Struct, "A", vec![], 4),
                Declaration::new(DeclKind::Field, "x", vec!["A".into()], 5),
                Declaration::new(DeclKind::Field, "y", vec!["A".into()], 5),
            ],
            includes: vec![],
        };
        assert_eq!(inventory.declaration_lines(), vec![4, 5]);
        assert_eq!(inventory.count(DeclKind::Field), 2);
    }

    #[test]
    fn test_parent_and_kind_counts() {
        let inventory = Inventory {
            declarations: vec![
                Declaration::new(DeclKind::Namespace, "N", vec![], 1),
                Declaration::new(DeclKind::Enum, "E", vec!["N".into()], 2),
                Declaration::new(DeclKind::Enumerator, "A", vec!["N".into(), "E".into()], 2),
                Declaration::new(DeclKind::Enumerator, "B", vec!["N".into(), "E".into()], 2),
            ],
            includes: vec![],
        };

        let a = inventory.find("A").unwrap();
        assert_eq!(inventory.parent_of(a).unwrap().name, "E");
        assert_eq!(inventory.parent_of(inventory.find("E").unwrap()).unwrap().kind, DeclKind::Namespace);
        assert!(inventory.parent_of(inventory.find("N").unwrap()).is_none());

        let counts = inventory.kind_counts();
        assert_eq!(counts[&DeclKind::Enumerator], 2);
        assert_eq!(counts.get(&DeclKind::Class), None);
    }

    #[test]
    fn test_parent_skips_function_with_type_name() {
        let inventory = Inventory {
            declarations: vec![
                Declaration::new(DeclKind::Function, "stat", vec![], 1),
                Declaration::new(DeclKind::Struct, "stat", vec![], 2),
                Declaration::new(DeclKind::Field, "st_size", vec!["stat".into()], 3),
            ],
            includes: vec![],
        };

        let field = inventory.find("st_size").unwrap();
        assert_eq!(inventory.parent_of(field).unwrap().kind, DeclKind::Struct);
    }
}
