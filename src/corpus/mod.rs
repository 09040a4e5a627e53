//! Fixture corpus loading
//!
//! A corpus is a directory tree of C and C++ sample files. Each file whose
//! dialect can be determined becomes a [`Fixture`]; everything else is
//! skipped. The corpus is read-only: nothing here writes to disk.

mod error;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

pub use error::CorpusError;
use error::CorpusErrorKind;

/// Source language of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    C,
    Cpp,
}

impl Dialect {
    /// Classify a corpus-relative path.
    ///
    /// Only C-family source extensions qualify. Among those, a `c` or `cpp`
    /// directory component wins over the extension, so a header under
    /// `cpp/` is C++.
    pub fn from_path(path: &Path) -> Option<Self> {
        let by_extension = match path.extension()?.to_str()? {
            "c" | "h" => Dialect::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Dialect::Cpp,
            _ => return None,
        };

        let by_directory = path.parent().and_then(|parent| {
            parent
                .components()
                .rev()
                .find_map(|component| match component.as_os_str().to_str() {
                    Some("c") => Some(Dialect::C),
                    Some("cpp") => Some(Dialect::Cpp),
                    _ => None,
                })
        });

        Some(by_directory.unwrap_or(by_extension))
    }

    /// Parse a dialect name as given on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "c" => Some(Dialect::C),
            "cpp" | "c++" | "cxx" => Some(Dialect::Cpp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::C => "c",
            Dialect::Cpp => "cpp",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Dialect::C => "C",
            Dialect::Cpp => "C++",
        })
    }
}

/// One sample source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    path: String,
    abs_path: PathBuf,
    dialect: Dialect,
    content: String,
}

impl Fixture {
    /// Path relative to the corpus root, `/`-separated.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Location on disk.
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// File name without directories.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Directory part of the relative path, empty at the corpus root.
    pub fn dir(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.content.lines()
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    /// Read the file from disk again, returning its raw bytes.
    pub fn reread(&self) -> Result<Vec<u8>, CorpusError> {
        fs::read(&self.abs_path).map_err(|e| CorpusError::io(e, &self.abs_path))
    }
}

/// The full set of fixtures under one root, sorted by relative path
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    fixtures: Vec<Fixture>,
}

impl Corpus {
    /// Walk `root` recursively and load every file with a known dialect.
    ///
    /// Hidden entries (names starting with `.`) are ignored.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let root = root.as_ref();
        let meta = match fs::metadata(root) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CorpusError::new(CorpusErrorKind::MissingRoot, root));
            }
            Err(e) => return Err(CorpusError::io(e, root)),
        };
        if !meta.is_dir() {
            return Err(CorpusError::new(CorpusErrorKind::NotADirectory, root));
        }

        let mut fixtures = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(e, root))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let abs_path = entry.into_path();

            let Some(rel) = relative_path(root, &abs_path) else {
                warn!(path = %abs_path.display(), "corpus.skip_non_utf8_name");
                continue;
            };
            let Some(dialect) = Dialect::from_path(Path::new(&rel)) else {
                debug!(path = %rel, "corpus.skip_unknown_dialect");
                continue;
            };

            let bytes = fs::read(&abs_path).map_err(|e| CorpusError::io(e, &abs_path))?;
            let content = String::from_utf8(bytes)
                .map_err(|e| CorpusError::new(CorpusErrorKind::Encoding(e), &abs_path))?;
            debug!(path = %rel, dialect = %dialect, bytes = content.len(), "corpus.fixture");

            fixtures.push(Fixture {
                path: rel,
                abs_path,
                dialect,
                content,
            });
        }

        // Walk order is per directory; lookups need full relative path order.
        fixtures.sort_by(|a, b| a.path.cmp(&b.path));
        info!(root = %root.display(), fixtures = fixtures.len(), "corpus.loaded");

        Ok(Corpus {
            root: root.to_path_buf(),
            fixtures,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Look up a fixture by its corpus-relative path.
    pub fn get(&self, path: &str) -> Option<&Fixture> {
        let path = path.trim_start_matches("./");
        self.fixtures
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.fixtures[idx])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fixture> {
        self.fixtures.iter()
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn by_dialect(&self, dialect: Dialect) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(move |f| f.dialect == dialect)
    }

    /// Whether a local include written in `fixture` names a file that exists,
    /// either next to the fixture or anywhere in the corpus by relative path.
    pub fn resolves_include(&self, fixture: &Fixture, include: &str) -> bool {
        let sibling = match fixture.dir() {
            "" => include.to_string(),
            dir => format!("{dir}/{include}"),
        };
        if self.root.join(&sibling).is_file() || self.root.join(include).is_file() {
            return true;
        }
        fixture
            .abs_path
            .parent()
            .is_some_and(|dir| dir.join(include).is_file())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Fixture;
    type IntoIter = std::slice::Iter<'a, Fixture>;

    fn into_iter(self) -> Self::IntoIter {
        self.fixtures.iter()
    }
}

/// Dot-prefixed entries below the root are pruned, directories included.
fn is_hidden(entry: &DirEntry) -> bool {
    let hidden = entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
    if hidden {
        debug!(path = %entry.path().display(), "corpus.skip_hidden");
    }
    hidden
}

fn walk_error(err: walkdir::Error, root: &Path) -> CorpusError {
    let path = err.path().unwrap_or(root).to_path_buf();
    CorpusError::io(err.into(), path)
}

/// `path` relative to `root` with `/` separators, if it is valid UTF-8.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &[u8]) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path(Path::new("c/basic.c")), Some(Dialect::C));
        assert_eq!(Dialect::from_path(Path::new("cpp/basic.cpp")), Some(Dialect::Cpp));
        assert_eq!(Dialect::from_path(Path::new("sample.cpp")), Some(Dialect::Cpp));
        assert_eq!(Dialect::from_path(Path::new("util.h")), Some(Dialect::C));
        assert_eq!(Dialect::from_path(Path::new("cpp/util.h")), Some(Dialect::Cpp));
        assert_eq!(Dialect::from_path(Path::new("c/notes.txt")), None);
        assert_eq!(Dialect::from_path(Path::new("README.md")), None);
        assert_eq!(Dialect::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!(Dialect::from_name("C"), Some(Dialect::C));
        assert_eq!(Dialect::from_name("c++"), Some(Dialect::Cpp));
        assert_eq!(Dialect::from_name("rust"), None);
        assert_eq!(Dialect::Cpp.to_string(), "C++");
        assert_eq!(format!("{:<3}|", Dialect::C), "C  |");
        assert_eq!(Dialect::Cpp.as_str(), "cpp");
    }

    #[test]
    fn test_load_sorted_and_classified() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sample.cpp", b"int f();\n");
        write(&dir, "cpp/b.cpp", b"class B {};\n");
        write(&dir, "c/a.c", b"int a;\n");
        write(&dir, "README.md", b"# corpus\n");
        write(&dir, ".hidden/x.c", b"int x;\n");

        let corpus = Corpus::load(dir.path()).unwrap();
        let paths: Vec<_> = corpus.iter().map(Fixture::path).collect();
        assert_eq!(paths, vec!["c/a.c", "cpp/b.cpp", "sample.cpp"]);

        assert_eq!(corpus.get("c/a.c").unwrap().dialect(), Dialect::C);
        assert_eq!(corpus.get("./sample.cpp").unwrap().dialect(), Dialect::Cpp);
        assert!(!corpus.contains("README.md"));
        assert_eq!(corpus.by_dialect(Dialect::Cpp).count(), 2);
        assert_eq!(corpus.by_dialect(Dialect::C).count(), 1);
    }

    #[test]
    fn test_load_prunes_hidden_directories() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".git/objects/a.c", b"int a;\n");
        write(&dir, "c/.scratch.c", b"int s;\n");
        write(&dir, "c-extra/z.c", b"int z(void);\n");
        write(&dir, "c/deep/nested/y.c", b"int y(void);\n");

        let corpus = Corpus::load(dir.path()).unwrap();
        let paths: Vec<_> = corpus.iter().map(Fixture::path).collect();
        assert_eq!(paths, vec!["c-extra/z.c", "c/deep/nested/y.c"]);
        assert!(corpus.get("c/deep/nested/y.c").is_some());
    }

    #[test]
    fn test_fixture_accessors() {
        let dir = TempDir::new().unwrap();
        write(&dir, "cpp/nested/a.cpp", b"int a;\nint b;\n");

        let corpus = Corpus::load(dir.path()).unwrap();
        let fixture = corpus.get("cpp/nested/a.cpp").unwrap();
        assert_eq!(fixture.file_name(), "a.cpp");
        assert_eq!(fixture.dir(), "cpp/nested");
        assert_eq!(fixture.line_count(), 2);
        assert_eq!(fixture.reread().unwrap(), fixture.content().as_bytes());
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = Corpus::load(dir.path().join("absent")).unwrap_err();
        assert!(err.is_missing_root());
    }

    #[test]
    fn test_root_is_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "basic.c", b"int x;\n");
        let err = Corpus::load(dir.path().join("basic.c")).unwrap_err();
        assert!(err.is_not_a_directory());
    }

    #[test]
    fn test_non_utf8_fixture() {
        let dir = TempDir::new().unwrap();
        write(&dir, "c/bad.c", &[0x69, 0x6e, 0x74, 0xff]);
        let err = Corpus::load(dir.path()).unwrap_err();
        assert!(err.is_encoding());
        assert!(err.path().ends_with("bad.c"));
    }

    #[test]
    fn test_resolves_include() {
        let dir = TempDir::new().unwrap();
        write(&dir, "cpp/a.cpp", b"#include \"a.h\"\n");
        write(&dir, "cpp/a.h", b"int a;\n");
        write(&dir, "top.cpp", b"#include \"cpp/a.h\"\n#include \"gone.h\"\n");

        let corpus = Corpus::load(dir.path()).unwrap();
        let a = corpus.get("cpp/a.cpp").unwrap();
        let top = corpus.get("top.cpp").unwrap();
        assert!(corpus.resolves_include(a, "a.h"));
        assert!(corpus.resolves_include(top, "cpp/a.h"));
        assert!(!corpus.resolves_include(top, "gone.h"));
    }

    #[test]
    fn test_empty_corpus() {
        let dir = TempDir::new().unwrap();
        let corpus = Corpus::load(dir.path()).unwrap();
        assert!(corpus.is_empty());
        assert_eq!(corpus.len(), 0);
    }
}
