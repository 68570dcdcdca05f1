//! Walks the markdown source tree, classifies files, and derives a category
//! for each file from its path. Discovery is keyed by each file's full path
//! relative to the source root, so two files sharing a base name in
//! different category directories stay distinct.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// The file extensions that qualify a file as a post source. Everything
/// else in the tree is ignored.
const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// The result of walking the source tree: the inputs for both pipeline
/// phases.
pub struct Discovery {
    /// Qualifying source files, keyed by path relative to the source root,
    /// mapped to the categories each belongs to.
    pub files: BTreeMap<PathBuf, Vec<String>>,

    /// Discovered categories mapped to the relative paths of their files.
    pub categories: BTreeMap<String, Vec<PathBuf>>,
}

/// Walks `root` and classifies every qualifying markdown file. Fails before
/// any walking happens if `root` isn't a directory.
pub fn discover(root: &Path) -> Result<Discovery> {
    if !root.is_dir() {
        return Err(Error::MissingSourceDirectory(root.to_owned()));
    }

    let mut files: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for result in WalkDir::new(root) {
        let entry = result?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        // strip_prefix can't fail: the walk always yields paths under `root`.
        let relative = entry.path().strip_prefix(root).unwrap().to_owned();
        match category_of(&relative) {
            Some(category) => {
                categories
                    .entry(category.clone())
                    .or_default()
                    .push(relative.clone());
                files.insert(relative, vec![category]);
            }
            None => {
                files.insert(relative, Vec::new());
            }
        }
    }

    Ok(Discovery { files, categories })
}

/// Whether `path` has one of the recognized markdown extensions.
fn is_markdown(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => MARKDOWN_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Derives the category for a file from its path relative to the source
/// root: the first path segment below the root. Files directly at the root
/// have no category.
fn category_of(relative: &Path) -> Option<String> {
    let mut components = relative.components();
    let first = components.next()?;
    components.next()?;
    match first {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}

/// The result of a fallible discovery operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error while discovering source files.
#[derive(Debug)]
pub enum Error {
    /// Returned when the markdown source directory doesn't exist. This is a
    /// pre-flight check; no worker starts and no output is written.
    MissingSourceDirectory(PathBuf),

    /// Returned for I/O errors during the walk itself.
    Walk(walkdir::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingSourceDirectory(path) => {
                write!(f, "Markdown directory is not found: {}", path.display())
            }
            Error::Walk(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingSourceDirectory(_) => None,
            Error::Walk(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator inside the walk loop.
    fn from(err: walkdir::Error) -> Error {
        Error::Walk(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn tree(paths: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for path in paths {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "# post").unwrap();
        }
        dir
    }

    #[test]
    fn test_classifies_by_extension() {
        let dir = tree(&["one.md", "two.markdown", "notes.txt", "image.png"]);
        let discovery = discover(dir.path()).unwrap();
        assert_eq!(
            discovery.files.keys().collect::<Vec<_>>(),
            vec![Path::new("one.md"), Path::new("two.markdown")]
        );
    }

    #[test]
    fn test_derives_category_from_first_segment() {
        let dir = tree(&["rust/one.md", "rust/deep/two.md", "plain.md"]);
        let discovery = discover(dir.path()).unwrap();
        assert_eq!(
            discovery.files[Path::new("rust/one.md")],
            vec!["rust".to_owned()]
        );
        assert_eq!(
            discovery.files[Path::new("rust/deep/two.md")],
            vec!["rust".to_owned()]
        );
        assert_eq!(discovery.files[Path::new("plain.md")], Vec::<String>::new());
        assert_eq!(discovery.categories.len(), 1);
        assert_eq!(discovery.categories["rust"].len(), 2);
    }

    #[test]
    fn test_shared_basename_stays_distinct() {
        let dir = tree(&["a/note.md", "b/note.md"]);
        let discovery = discover(dir.path()).unwrap();
        assert_eq!(discovery.files.len(), 2);
        assert_eq!(discovery.files[Path::new("a/note.md")], vec!["a".to_owned()]);
        assert_eq!(discovery.files[Path::new("b/note.md")], vec!["b".to_owned()]);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("markdown");
        match discover(&missing) {
            Err(Error::MissingSourceDirectory(path)) => assert_eq!(path, missing),
            other => panic!("expected MissingSourceDirectory, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_tree() {
        let dir = tree(&[]);
        let discovery = discover(dir.path()).unwrap();
        assert!(discovery.files.is_empty());
        assert!(discovery.categories.is_empty());
    }
}
