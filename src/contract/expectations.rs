//! Built-in per-fixture expectations
//!
//! Each known fixture claims to exercise a specific set of constructs. The
//! table below states those claims in terms of the scanned inventory.

use std::collections::BTreeSet;
use std::fmt;

use crate::scan::{DeclKind, Declaration, Inventory};

/// Where a counted declaration must sit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Within {
    /// Outside any namespace or type
    TopLevel,
    Anywhere,
    /// Directly enclosed by a declaration of this kind
    Inside(DeclKind),
}

impl Within {
    fn admits(self, inventory: &Inventory, decl: &Declaration) -> bool {
        match self {
            Within::TopLevel => decl.is_top_level(),
            Within::Anywhere => true,
            Within::Inside(kind) => inventory.parent_of(decl).is_some_and(|p| p.kind == kind),
        }
    }
}

impl fmt::Display for Within {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Within::TopLevel => write!(f, "at file scope"),
            Within::Anywhere => write!(f, "anywhere"),
            Within::Inside(kind) => write!(f, "inside a {kind}"),
        }
    }
}

/// One claim a fixture makes about its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Exactly `count` distinct declarations of `kind`, ignoring the names in `except`
    Count {
        kind: DeclKind,
        within: Within,
        count: usize,
        except: &'static [&'static str],
    },
    /// The type-introducing declarations are exactly these names
    TypeDefinitions(&'static [&'static str]),
    /// Every `parent` declaration has exactly `count` direct `member` children
    Members {
        parent: DeclKind,
        member: DeclKind,
        count: usize,
    },
    /// `main` is defined and returns this value on some path
    MainReturns(i64),
    /// Constructors with at least one defaulted parameter
    ConstructorsWithDefault(usize),
    /// Methods taking no parameters that read state (`get*` or `const`)
    Getters(usize),
    /// Methods named `set*` taking exactly one parameter
    Setters(usize),
}

impl Requirement {
    /// Human-readable name, used as the check name in reports
    pub fn describe(&self) -> String {
        match self {
            Requirement::Count {
                kind,
                within,
                count,
                except,
            } => {
                let plural = if *count == 1 { "" } else { "s" };
                let mut text = format!("exactly {count} {kind} declaration{plural} {within}");
                if !except.is_empty() {
                    text.push_str(" besides ");
                    text.push_str(&except.join(", "));
                }
                text
            }
            Requirement::TypeDefinitions(names) => {
                format!("type definitions are exactly {}", names.join(", "))
            }
            Requirement::Members {
                parent,
                member,
                count,
            } => format!("each {parent} has exactly {count} {member} members"),
            Requirement::MainReturns(value) => format!("main returns {value}"),
            Requirement::ConstructorsWithDefault(count) => {
                format!("exactly {count} constructor with a defaulted parameter")
            }
            Requirement::Getters(count) => format!("exactly {count} getter"),
            Requirement::Setters(count) => format!("exactly {count} setter"),
        }
    }

    /// Evaluate against an inventory. `Err` carries what was found instead.
    pub fn evaluate(&self, inventory: &Inventory) -> Result<(), String> {
        match *self {
            Requirement::Count {
                kind,
                within,
                count,
                except,
            } => {
                let found: BTreeSet<String> = inventory
                    .of_kind(kind)
                    .filter(|d| within.admits(inventory, d))
                    .filter(|d| !except.contains(&d.name.as_str()))
                    .map(Declaration::qualified_name)
                    .collect();
                expect_count(count, &found)
            }
            Requirement::TypeDefinitions(names) => {
                let found: BTreeSet<&str> = inventory
                    .declarations
                    .iter()
                    .filter(|d| d.kind.is_type())
                    .map(|d| d.name.as_str())
                    .collect();
                let expected: BTreeSet<&str> = names.iter().copied().collect();
                if found == expected {
                    Ok(())
                } else {
                    Err(format!("found {}", list_or_none(found)))
                }
            }
            Requirement::Members {
                parent,
                member,
                count,
            } => {
                let parents: Vec<&Declaration> = inventory.of_kind(parent).collect();
                if parents.is_empty() {
                    return Err(format!("no {parent} declared"));
                }
                for owner in parents {
                    let members = inventory
                        .children(owner)
                        .filter(|d| d.kind == member)
                        .count();
                    if members != count {
                        return Err(format!("{} has {members}", owner.qualified_name()));
                    }
                }
                Ok(())
            }
            Requirement::MainReturns(value) => {
                let Some(main) = inventory
                    .of_kind(DeclKind::Function)
                    .find(|d| d.name == "main" && d.is_top_level())
                else {
                    return Err("no main function".to_string());
                };
                let signature = main.signature.as_ref();
                match signature {
                    Some(sig) if !sig.has_body => Err("main is only declared".to_string()),
                    Some(sig) if sig.returns.contains(&value) => Ok(()),
                    Some(sig) if sig.returns.is_empty() => {
                        Err("main has no integer return".to_string())
                    }
                    Some(sig) => Err(format!("main returns {:?}", sig.returns)),
                    None => Err("main has no signature".to_string()),
                }
            }
            Requirement::ConstructorsWithDefault(count) => {
                let found: BTreeSet<String> = inventory
                    .of_kind(DeclKind::Constructor)
                    .filter(|d| {
                        d.signature
                            .as_ref()
                            .is_some_and(|sig| sig.params.iter().any(|p| p.defaulted))
                    })
                    .map(Declaration::qualified_name)
                    .collect();
                expect_count(count, &found)
            }
            Requirement::Getters(count) => {
                let found: BTreeSet<String> = inventory
                    .of_kind(DeclKind::Method)
                    .filter(|d| is_getter(d))
                    .map(Declaration::qualified_name)
                    .collect();
                expect_count(count, &found)
            }
            Requirement::Setters(count) => {
                let found: BTreeSet<String> = inventory
                    .of_kind(DeclKind::Method)
                    .filter(|d| is_setter(d))
                    .map(Declaration::qualified_name)
                    .collect();
                expect_count(count, &found)
            }
        }
    }
}

fn is_getter(decl: &Declaration) -> bool {
    decl.signature.as_ref().is_some_and(|sig| {
        sig.params.is_empty() && (sig.is_const || decl.name.starts_with("get"))
    })
}

fn is_setter(decl: &Declaration) -> bool {
    decl.signature
        .as_ref()
        .is_some_and(|sig| sig.params.len() == 1 && decl.name.starts_with("set"))
}

fn expect_count(count: usize, found: &BTreeSet<String>) -> Result<(), String> {
    if found.len() == count {
        Ok(())
    } else {
        Err(format!("found {}: {}", found.len(), list_or_none(found)))
    }
}

fn list_or_none<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = names.into_iter().map(|s| s.as_ref().to_string()).collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// What one known fixture promises to contain
#[derive(Debug, Clone, Copy)]
pub struct Expectation {
    /// Corpus-relative path
    pub path: &'static str,
    pub summary: &'static str,
    pub requirements: &'static [Requirement],
}

const MAIN: &[&str] = &["main"];

pub static EXPECTATIONS: &[Expectation] = &[
    Expectation {
        path: "c/basic.c",
        summary: "one struct type and two functions besides main",
        requirements: &[
            Requirement::TypeDefinitions(&["TestStruct"]),
            Requirement::Count {
                kind: DeclKind::Function,
                within: Within::TopLevel,
                count: 2,
                except: MAIN,
            },
            Requirement::MainReturns(0),
        ],
    },
    Expectation {
        path: "cpp/basic.cpp",
        summary: "one class with defaulted constructor, getter, setter and a free function",
        requirements: &[
            Requirement::Count {
                kind: DeclKind::Class,
                within: Within::Anywhere,
                count: 1,
                except: &[],
            },
            Requirement::ConstructorsWithDefault(1),
            Requirement::Getters(1),
            Requirement::Setters(1),
            Requirement::Count {
                kind: DeclKind::Function,
                within: Within::TopLevel,
                count: 1,
                except: MAIN,
            },
        ],
    },
    Expectation {
        path: "test_cpp_sample.cpp",
        summary: "one namespace enclosing a class, struct, enum, union and function",
        requirements: &[
            Requirement::Count {
                kind: DeclKind::Namespace,
                within: Within::Anywhere,
                count: 1,
                except: &[],
            },
            Requirement::Count {
                kind: DeclKind::Class,
                within: Within::Inside(DeclKind::Namespace),
                count: 1,
                except: &[],
            },
            Requirement::Count {
                kind: DeclKind::Struct,
                within: Within::Inside(DeclKind::Namespace),
                count: 1,
                except: &[],
            },
            Requirement::Count {
                kind: DeclKind::Enum,
                within: Within::Inside(DeclKind::Namespace),
                count: 1,
                except: &[],
            },
            Requirement::Members {
                parent: DeclKind::Enum,
                member: DeclKind::Enumerator,
                count: 2,
            },
            Requirement::Count {
                kind: DeclKind::Union,
                within: Within::Inside(DeclKind::Namespace),
                count: 1,
                except: &[],
            },
            Requirement::Members {
                parent: DeclKind::Union,
                member: DeclKind::Field,
                count: 2,
            },
            Requirement::Count {
                kind: DeclKind::Function,
                within: Within::Inside(DeclKind::Namespace),
                count: 1,
                except: &[],
            },
        ],
    },
];

/// Look up the expectation for a corpus-relative path
pub fn expectation_for(path: &str) -> Option<&'static Expectation> {
    EXPECTATIONS.iter().find(|e| e.path == path)
}
