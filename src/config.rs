//! Site configuration, loaded from a YAML or TOML file and overridden by command line options.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    builder::{BuildRoutine, Kwargs, Routines},
    error::Error,
    generator::options::Options,
};

// -------------------------------------------------------------------------------------------------

/// Config file that is used when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "nodebook.yml";

/// Site metadata. Unset values are inferred from the package manifest.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub repository_url: Option<String>,
}

/// Settings of the `nodebook` plugin: where the sources come from and how the tree is built.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
    /// Local path or remote URL of the repository to document.
    pub repo_path: String,
    /// Name of the routine which builds the node tree.
    pub build_fn: String,
    /// Keyword arguments passed to the build routine.
    pub kwargs: Kwargs,
    /// Clone depth for remote repositories, also the max number of commits in the context.
    pub clone_depth: u32,
    /// Append a page info block to all pages.
    pub show_page_info: bool,
    /// Render all pages through the template environment, not only template nodes.
    pub render_all_pages: bool,
    /// Fail on undefined template variables.
    pub strict: bool,
    /// Explicit package manifest path, relative to the repository root.
    pub manifest: Option<PathBuf>,
    pub hosting: HostingSettings,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            repo_path: ".".to_string(),
            build_fn: Routines::DEFAULT.to_string(),
            kwargs: Kwargs::new(),
            clone_depth: 100,
            show_page_info: false,
            render_all_pages: true,
            strict: false,
            manifest: None,
            hosting: HostingSettings::default(),
        }
    }
}

/// Remote hosting (GitHub) API access.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostingSettings {
    pub enabled: bool,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for HostingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://api.github.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Settings of the plain Markdown backend.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownSettings {
    pub directory: PathBuf,
    pub extension: String,
}

impl Default for MarkdownSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("markdown"),
            extension: ".md".to_string(),
        }
    }
}

/// Settings of the mdBook backend.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MdBookSettings {
    pub directory: PathBuf,
    /// Append "edit" links, pointing to the code which created a page.
    pub edit_links: bool,
}

impl Default for MdBookSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("book"),
            edit_links: false,
        }
    }
}

/// A configured output backend.
#[derive(Clone, Debug)]
pub enum BackendConfig {
    Markdown(MarkdownSettings),
    MdBook(MdBookSettings),
}

// -------------------------------------------------------------------------------------------------

/// The raw config file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    site: SiteConfig,
    site_dir: Option<PathBuf>,
    plugins: Vec<BTreeMap<String, serde_json::Value>>,
}

/// Fully resolved configuration of a build.
#[derive(Debug)]
pub struct Config {
    pub site: SiteConfig,
    pub build: BuildSettings,
    /// Backends, in the order they were listed in the plugins list.
    pub backends: Vec<BackendConfig>,
    /// Root directory for relative backend directories.
    pub site_dir: PathBuf,
    /// The build routine named by `build_fn`, resolved at load time.
    pub routine: BuildRoutine,
    /// Path of the loaded config file, if any.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load the config file named in the options (or the default one, when present), apply
    /// command line overrides and resolve the build routine.
    pub fn load(options: &Options, routines: &Routines) -> Result<Self, Error> {
        let path = options
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let (file, path) = if path.exists() {
            tracing::info!("Loading config from '{}'", path.display());
            (Self::parse_file(&path)?, Some(path))
        } else if options.config_path.is_some() {
            return Err(Error::config(format!(
                "config file does not exist: `{}`",
                path.display()
            )));
        } else {
            tracing::info!("No config file found, using defaults");
            (ConfigFile::default(), None)
        };
        Self::from_file(file, path, options, routines)
    }

    /// Parse a config from a string in the given format ("yml", "yaml" or "toml").
    pub fn parse(
        content: &str,
        format: &str,
        options: &Options,
        routines: &Routines,
    ) -> Result<Self, Error> {
        let file = Self::parse_str(content, format)?;
        Self::from_file(file, None, options, routines)
    }

    fn parse_file(path: &Path) -> Result<ConfigFile, Error> {
        let format = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content, &format)
    }

    fn parse_str(content: &str, format: &str) -> Result<ConfigFile, Error> {
        match format {
            "yml" | "yaml" => serde_yaml::from_str(content)
                .map_err(|err| Error::config(format!("invalid YAML config: {err}"))),
            "toml" => toml::from_str(content)
                .map_err(|err| Error::config(format!("invalid TOML config: {err}"))),
            _ => Err(Error::config(format!(
                "unsupported config format `{format}`, expected YAML or TOML"
            ))),
        }
    }

    fn from_file(
        file: ConfigFile,
        path: Option<PathBuf>,
        options: &Options,
        routines: &Routines,
    ) -> Result<Self, Error> {
        let mut build = None;
        let mut backends = vec![];
        for plugin in file.plugins {
            if plugin.len() != 1 {
                return Err(Error::config(
                    "each plugins entry must be a map with exactly one plugin name",
                ));
            }
            for (name, value) in plugin {
                match name.as_str() {
                    "nodebook" => {
                        if build.is_some() {
                            return Err(Error::config("plugin `nodebook` is listed twice"));
                        }
                        build = Some(plugin_settings::<BuildSettings>(&name, value)?);
                    }
                    "markdown" => backends.push(BackendConfig::Markdown(plugin_settings(
                        &name, value,
                    )?)),
                    "mdbook" => {
                        backends.push(BackendConfig::MdBook(plugin_settings(&name, value)?))
                    }
                    _ => return Err(Error::config(format!("unknown plugin `{name}`"))),
                }
            }
        }
        if backends.is_empty() {
            backends.push(BackendConfig::Markdown(MarkdownSettings::default()));
        }

        // command line options win over config file values
        let mut build = build.unwrap_or_default();
        if let Some(repo_path) = &options.repo_path {
            build.repo_path.clone_from(repo_path);
        }
        if let Some(build_fn) = &options.build_fn {
            build.build_fn.clone_from(build_fn);
        }
        if let Some(clone_depth) = options.clone_depth {
            build.clone_depth = clone_depth;
        }
        if options.strict {
            build.strict = true;
        }
        if options.offline {
            build.hosting.enabled = false;
        }
        if build.clone_depth == 0 {
            return Err(Error::config("clone_depth must be at least 1"));
        }
        let site_dir = options
            .site_dir
            .clone()
            .or(file.site_dir)
            .unwrap_or_else(|| PathBuf::from("site"));

        let routine = routines.resolve(&build.build_fn, build.kwargs.clone())?;
        Ok(Self {
            site: file.site,
            build,
            backends,
            site_dir,
            routine,
            path,
        })
    }
}

fn plugin_settings<T>(name: &str, value: serde_json::Value) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value)
        .map_err(|err| Error::config(format!("invalid settings for plugin `{name}`: {err}")))
}

// -------------------------------------------------------------------------------------------------
