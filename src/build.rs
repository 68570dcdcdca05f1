//! Exports the [`build_site`] function which runs the whole pipeline:
//! discovering source files ([`crate::discover`]), fanning parse work out to
//! the worker pool ([`crate::pool`]) which merges posts into the shared
//! store ([`crate::store`]), waiting on the phase barrier, and then
//! rendering the category pages and the root index ([`crate::write`]). This
//! function also copies the stylesheet asset into the output directory.

use crate::config::Config;
use crate::discover;
use crate::pool::{self, ParseJob, Pool};
use crate::store::Store;
use crate::write::{self, Renderer};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds the site from a [`Config`] object and a pool-sizing policy
/// mapping the parse-job count to a worker count (clamped to at least one
/// worker). Any error aborts the run: the first one observed wins, and
/// output already written stays on disk.
pub fn build_site(config: &Config, workers: impl Fn(usize) -> usize) -> Result<()> {
    let source = config.markdown_directory();
    let discovery = discover::discover(&source)?;

    let store = Arc::new(Store::new());
    let renderer = Arc::new(Renderer::new(
        config.template_path(),
        config.public_directory(),
    ));

    let count = workers(discovery.files.len()).max(1);
    debug!(
        "{} files in {} categories, {} workers",
        discovery.files.len(),
        discovery.categories.len(),
        count
    );
    let pool = Pool::spawn(count, store.clone(), renderer.clone());

    // Phase 1: one parse job per discovered file.
    let total = discovery.files.len();
    for (relative, categories) in discovery.files {
        pool.send_parse(ParseJob {
            path: source.join(&relative),
            name: post_name(&relative),
            categories,
        })?;
    }
    // The phase barrier: nothing below may read the store until every parse
    // job has completed.
    pool.wait(total)?;

    // Phase 2: category pages on the workers, the root index here.
    let categories: Vec<String> = discovery.categories.into_keys().collect();
    let total = categories.len();
    for category in categories {
        pool.send_render(category)?;
    }
    renderer.render_index(&store.posts())?;
    pool.wait(total)?;
    drop(pool);

    copy_css(config)?;
    Ok(())
}

/// The post name for a source file: its stem.
fn post_name(relative: &Path) -> String {
    relative
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Copies the fixed stylesheet asset into the output tree. A project
/// without the asset gets no stylesheet and the copy is skipped.
fn copy_css(config: &Config) -> Result<()> {
    let source = config.css_source();
    if !source.is_file() {
        debug!("No stylesheet at '{}'; skipping copy", source.display());
        return Ok(());
    }

    let target_dir = config.public_directory().join("css");
    std::fs::create_dir_all(&target_dir).map_err(|err| Error::CopyCss {
        path: target_dir.clone(),
        err,
    })?;
    let target = target_dir.join("styles.css");
    std::fs::copy(&source, &target).map_err(|err| Error::CopyCss { path: target, err })?;
    Ok(())
}

/// The result of building a site.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can come from discovery, from
/// jobs executed on the pool, from rendering the root index, or from
/// copying the stylesheet.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors discovering source files.
    Discover(discover::Error),

    /// Returned for errors surfaced by a worker: failed parses or failed
    /// category renders.
    Pool(pool::Error),

    /// Returned for errors rendering the root index.
    Write(write::Error),

    /// Returned for I/O problems while copying the stylesheet.
    CopyCss { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Discover(err) => err.fmt(f),
            Error::Pool(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::CopyCss { path, err } => {
                write!(f, "Copying stylesheet to '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Discover(err) => Some(err),
            Error::Pool(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::CopyCss { path: _, err } => Some(err),
        }
    }
}

impl From<discover::Error> for Error {
    /// Converts a [`discover::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator.
    fn from(err: discover::Error) -> Error {
        Error::Discover(err)
    }
}

impl From<pool::Error> for Error {
    /// Converts a [`pool::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: pool::Error) -> Error {
        Error::Pool(err)
    }
}

impl From<write::Error> for Error {
    /// Converts a [`write::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    const TEMPLATE: &str = "<ul>{{range .}}<li>{{.name}}</li>{{end}}</ul>";

    /// Lays out a project directory: the template at the root, sources
    /// under `markdown/`.
    fn project(posts: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), TEMPLATE).unwrap();
        fs::create_dir_all(dir.path().join("markdown")).unwrap();
        for (relative, contents) in posts {
            let path = dir.path().join("markdown").join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        dir
    }

    fn config(path: &std::path::Path) -> Config {
        Config::new(path.to_owned())
    }

    #[test]
    fn test_example_tree_across_pool_sizes() {
        for workers in 1..=4 {
            let dir = project(&[
                ("a/p1.md", "# One"),
                ("b/p2.md", "# Two"),
                ("p3.md", "# Three"),
            ]);
            build_site(&config(dir.path()), |_| workers).unwrap();

            let index = fs::read_to_string(dir.path().join("public/index.html")).unwrap();
            for name in ["p1", "p2", "p3"] {
                assert!(index.contains(name), "index missing {} ({} workers)", name, workers);
            }

            let a = fs::read_to_string(dir.path().join("public/cats/a/index.html")).unwrap();
            assert_eq!(a, "<ul><li>p1</li></ul>");
            let b = fs::read_to_string(dir.path().join("public/cats/b/index.html")).unwrap();
            assert_eq!(b, "<ul><li>p2</li></ul>");

            // p3 has no category, so only `a` and `b` get a page.
            let mut cats: Vec<_> = fs::read_dir(dir.path().join("public/cats"))
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect();
            cats.sort();
            assert_eq!(cats, vec!["a".to_owned(), "b".to_owned()]);
        }
    }

    #[test]
    fn test_empty_tree_still_produces_index() {
        let dir = project(&[]);
        build_site(&config(dir.path()), pool::default_workers).unwrap();

        let index = fs::read_to_string(dir.path().join("public/index.html")).unwrap();
        assert_eq!(index, "<ul></ul>");
        assert!(!dir.path().join("public/cats").exists());
    }

    #[test]
    fn test_missing_source_directory_aborts_before_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), TEMPLATE).unwrap();

        match build_site(&config(dir.path()), pool::default_workers) {
            Err(Error::Discover(discover::Error::MissingSourceDirectory(path))) => {
                assert_eq!(path, dir.path().join("markdown"))
            }
            other => panic!("expected MissingSourceDirectory, got {:?}", other.map(|_| ())),
        }
        assert!(!dir.path().join("public").exists());
    }

    #[test]
    fn test_repeat_runs_are_byte_identical() {
        // Discovery is ordered, so a single worker dispatches and completes
        // jobs in a stable order; with more workers, completion order (and
        // thus list order within a page) is unspecified.
        let dir = project(&[("a/p1.md", "# One"), ("a/p2.md", "# Two"), ("p3.md", "# Three")]);
        build_site(&config(dir.path()), |_| 1).unwrap();
        let index_first = fs::read(dir.path().join("public/index.html")).unwrap();
        let cat_first = fs::read(dir.path().join("public/cats/a/index.html")).unwrap();

        build_site(&config(dir.path()), |_| 1).unwrap();
        assert_eq!(fs::read(dir.path().join("public/index.html")).unwrap(), index_first);
        assert_eq!(fs::read(dir.path().join("public/cats/a/index.html")).unwrap(), cat_first);
    }

    #[test]
    fn test_post_count_matches_discovered_files() {
        // Same basename in two categories: full-path keying keeps both.
        let dir = project(&[("a/note.md", "# A"), ("b/note.md", "# B"), ("c/other.md", "# C")]);
        for workers in 1..=3 {
            build_site(&config(dir.path()), |_| workers).unwrap();
            let a = fs::read_to_string(dir.path().join("public/cats/a/index.html")).unwrap();
            assert_eq!(a, "<ul><li>note</li></ul>");
            let b = fs::read_to_string(dir.path().join("public/cats/b/index.html")).unwrap();
            assert_eq!(b, "<ul><li>note</li></ul>");
        }
    }

    #[test]
    fn test_broken_template_aborts_run() {
        let dir = project(&[("a/p1.md", "# One")]);
        fs::write(dir.path().join("index.html"), "{{range .}}unterminated").unwrap();
        assert!(build_site(&config(dir.path()), |_| 2).is_err());
    }

    #[test]
    fn test_copies_stylesheet_when_present() {
        let dir = project(&[("p.md", "# P")]);
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/styles.css"), "body {}").unwrap();
        build_site(&config(dir.path()), |_| 1).unwrap();

        let css = fs::read_to_string(dir.path().join("public/css/styles.css")).unwrap();
        assert_eq!(css, "body {}");
    }
}
