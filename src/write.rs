//! Responsible for templating and writing HTML pages to disk from [`Post`]
//! collections: the root index page and one page per category.

use crate::post::Post;
use gtmpl::{Context, Template, Value};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Applies the site template to post collections and writes the resulting
/// HTML files. Each render call is an independent unit of work.
pub struct Renderer {
    /// The template file applied to both the root index and the category
    /// pages. It is loaded and parsed once per render call.
    template_path: PathBuf,

    /// The root output directory. The index lands at
    /// `{output_directory}/index.html`; category pages land at
    /// `{output_directory}/cats/{category}/index.html`.
    output_directory: PathBuf,
}

impl Renderer {
    /// Constructs a new renderer. See fields on [`Renderer`] for argument
    /// descriptions.
    pub fn new(template_path: PathBuf, output_directory: PathBuf) -> Renderer {
        Renderer {
            template_path,
            output_directory,
        }
    }

    /// Renders the root index page from the full post collection.
    pub fn render_index(&self, posts: &[Post]) -> Result<()> {
        self.render_to(&self.output_directory.join("index.html"), posts)
    }

    /// Renders one category's page from that category's posts.
    pub fn render_category(&self, name: &str, posts: &[Post]) -> Result<()> {
        self.render_to(
            &self
                .output_directory
                .join("cats")
                .join(name)
                .join("index.html"),
            posts,
        )
    }

    /// Templates `posts` and writes the result to `path`, creating parent
    /// directories as needed (creating an already-existing directory is not
    /// an error).
    fn render_to(&self, path: &Path, posts: &[Post]) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| Error::Write {
                path: dir.to_owned(),
                err,
            })?;
        }

        let template = self.load_template()?;
        let value = Value::Array(posts.iter().map(Post::to_value).collect());
        let context = Context::from(value).map_err(|err| Error::ExecuteTemplate {
            path: path.to_owned(),
            err,
        })?;

        let mut file = File::create(path).map_err(|err| Error::Write {
            path: path.to_owned(),
            err,
        })?;
        template
            .execute(&mut file, &context)
            .map_err(|err| Error::ExecuteTemplate {
                path: path.to_owned(),
                err,
            })?;
        Ok(())
    }

    /// Loads the template file contents and parses them into a template.
    fn load_template(&self) -> Result<Template> {
        let contents =
            std::fs::read_to_string(&self.template_path).map_err(|err| Error::OpenTemplate {
                path: self.template_path.clone(),
                err,
            })?;
        let mut template = Template::default();
        template.parse(&contents).map_err(Error::ParseTemplate)?;
        Ok(template)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation. All of these are fatal
/// to the run.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening the template file.
    OpenTemplate { path: PathBuf, err: io::Error },

    /// Returned for errors parsing the template file.
    ParseTemplate(String),

    /// Returned for errors executing the template against a post collection.
    ExecuteTemplate { path: PathBuf, err: String },

    /// Returned for errors creating output directories or writing output
    /// files.
    Write { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplate { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::ExecuteTemplate { path, err } => {
                write!(f, "Rendering '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "Writing '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplate { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::ExecuteTemplate { path: _, err: _ } => None,
            Error::Write { path: _, err } => Some(err),
        }
    }
}
