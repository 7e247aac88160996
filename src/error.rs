use std::fmt;

// -------------------------------------------------------------------------------------------------

/// The errors that may happen when generating a site.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to fetch repository metadata: {0}")]
    MetadataFetch(String),

    #[error("{stage} failed at {location}: {message}")]
    Build {
        stage: String,
        location: Location,
        message: String,
    },

    #[error("backend `{backend}` failed to write output")]
    Write {
        backend: String,
        #[source]
        source: Box<Error>,
    },

    #[error("unexpected content in existing output: {0}")]
    Output(String),

    #[error("output file '{}' is written more than once", .0.display())]
    DuplicateFile(std::path::PathBuf),

    #[error("{} of the configured backends failed", .0.len())]
    Backends(Vec<Error>),

    #[error("failed to execute git: {0}")]
    Exec(String),

    #[error("file IO error")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error")]
    Http(#[from] reqwest::Error),

    #[error("template error")]
    Template(#[from] minijinja::Error),

    #[error("YAML error")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unable to parse TOML")]
    TomlParse(#[from] toml::de::Error),

    #[error("unable to write TOML")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

// -------------------------------------------------------------------------------------------------

/// A source location, as recorded when a node was created or a build routine failed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    /// Location of the caller of the `#[track_caller]` function this is invoked from.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(std::panic::Location::caller())
    }
}

impl From<&std::panic::Location<'_>> for Location {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self {
            file: location.file().replace('\\', "/"),
            line: location.line(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
