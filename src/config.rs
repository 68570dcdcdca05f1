use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Overrides read from an optional `byline.yaml` at the project root.
#[derive(Deserialize, Default)]
struct Project {
    #[serde(default)]
    template: Option<PathBuf>,

    #[serde(default)]
    workers: Option<usize>,
}

/// The resolved project configuration. The source, output, and asset
/// locations are all laid out beneath `root`.
pub struct Config {
    /// The project root directory.
    pub root: PathBuf,

    /// The template file applied to the root index and every category page.
    pub template: PathBuf,

    /// A fixed worker-count override; `None` defers to the pool-sizing
    /// policy.
    pub workers: Option<usize>,
}

impl Config {
    /// A configuration with the stock layout under `root` and no overrides:
    /// template at `{root}/index.html`, sources under `{root}/markdown/`,
    /// output under `{root}/public/`.
    pub fn new(root: PathBuf) -> Config {
        let template = root.join("index.html");
        Config {
            root,
            template,
            workers: None,
        }
    }

    /// Loads `byline.yaml` from `root` if it exists; a project without one
    /// gets the [`Config::new`] defaults.
    pub fn from_directory(root: &Path) -> Result<Config> {
        let mut config = Config::new(root.to_owned());
        let path = root.join("byline.yaml");
        if path.exists() {
            let file = std::fs::File::open(&path)
                .map_err(|e| anyhow!("Opening project file `{}`: {}", path.display(), e))?;
            let project: Project = serde_yaml::from_reader(file)
                .map_err(|e| anyhow!("Parsing project file `{}`: {}", path.display(), e))?;
            if let Some(template) = project.template {
                config.template = root.join(template);
            }
            config.workers = project.workers;
        }
        Ok(config)
    }

    /// The markdown source tree.
    pub fn markdown_directory(&self) -> PathBuf {
        self.root.join("markdown")
    }

    /// The output tree.
    pub fn public_directory(&self) -> PathBuf {
        self.root.join("public")
    }

    /// The template file.
    pub fn template_path(&self) -> PathBuf {
        self.template.clone()
    }

    /// The stylesheet asset copied verbatim into the output tree.
    pub fn css_source(&self) -> PathBuf {
        self.root.join("css").join("styles.css")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_directory(dir.path()).unwrap();
        assert_eq!(config.template, dir.path().join("index.html"));
        assert_eq!(config.workers, None);
        assert_eq!(config.markdown_directory(), dir.path().join("markdown"));
        assert_eq!(config.public_directory(), dir.path().join("public"));
    }

    #[test]
    fn test_project_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("byline.yaml"),
            "template: theme/page.html\nworkers: 3\n",
        )
        .unwrap();
        let config = Config::from_directory(dir.path()).unwrap();
        assert_eq!(config.template, dir.path().join("theme/page.html"));
        assert_eq!(config.workers, Some(3));
    }

    #[test]
    fn test_invalid_project_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("byline.yaml"), "workers: [not an int]\n").unwrap();
        assert!(Config::from_directory(dir.path()).is_err());
    }
}
