pub(crate) mod pages;
pub(crate) mod website;

// -------------------------------------------------------------------------------------------------

use std::{collections::BTreeMap, fmt};

use crate::{
    context::Context,
    error::{Error, Location},
    template::TemplateEnv,
    tree::Nav,
};

// -------------------------------------------------------------------------------------------------

/// Keyword arguments passed from the config to a build routine.
pub type Kwargs = serde_json::Map<String, serde_json::Value>;

/// Signature of a routine which builds the node tree of a site.
pub type BuildFn = fn(&Context, &TemplateEnv, &Kwargs) -> Result<Nav, BuildError>;

/// An error raised by a build routine, with the location it got raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    pub message: String,
    pub location: Location,
}

impl BuildError {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.message, self.location)
    }
}

impl std::error::Error for BuildError {}

impl From<minijinja::Error> for BuildError {
    #[track_caller]
    fn from(err: minijinja::Error) -> Self {
        Self::new(format!("template error: {err}"))
    }
}

impl From<serde_json::Error> for BuildError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("invalid routine arguments: {err}"))
    }
}

// -------------------------------------------------------------------------------------------------

/// Registry of named build routines, which can be referenced by name in the config.
#[derive(Clone)]
pub struct Routines {
    routines: BTreeMap<String, BuildFn>,
}

impl Routines {
    /// The routine used when the config doesn't name one: builds the declared pages only.
    pub const DEFAULT: &'static str = "default";
    /// A complete project website with home page, development section and license.
    pub const WEBSITE: &'static str = "website";

    /// An empty registry without the built-in routines.
    pub fn empty() -> Self {
        Self {
            routines: BTreeMap::new(),
        }
    }

    /// Register a routine, replacing a routine with the same name.
    pub fn register(&mut self, name: impl Into<String>, routine: BuildFn) -> &mut Self {
        self.routines.insert(name.into(), routine);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routines.keys().map(String::as_str)
    }

    /// Look up the routine with the given name and bind it to its keyword arguments.
    pub fn resolve(&self, name: &str, kwargs: Kwargs) -> Result<BuildRoutine, Error> {
        let func = self.routines.get(name).copied().ok_or_else(|| {
            Error::config(format!(
                "unknown build routine `{name}`, expected one of: {}",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })?;
        Ok(BuildRoutine {
            name: name.to_string(),
            func,
            kwargs,
        })
    }
}

impl Default for Routines {
    fn default() -> Self {
        let mut routines = Self::empty();
        routines
            .register(Self::DEFAULT, pages::declared_pages)
            .register(Self::WEBSITE, website::website);
        routines
    }
}

/// A resolved build routine with its arguments.
#[derive(Clone)]
pub struct BuildRoutine {
    pub name: String,
    func: BuildFn,
    pub kwargs: Kwargs,
}

impl BuildRoutine {
    /// Run the routine and return the root of the built tree.
    pub fn build(&self, context: &Context, env: &TemplateEnv) -> Result<Nav, Error> {
        tracing::info!("Building node tree with routine `{}`...", self.name);
        let root = (self.func)(context, env, &self.kwargs).map_err(|err| Error::Build {
            stage: format!("build routine `{}`", self.name),
            location: err.location,
            message: err.message,
        })?;
        tracing::debug!(
            "Routine `{}` built {} top level nodes",
            self.name,
            root.children().len()
        );
        Ok(root)
    }
}

impl fmt::Debug for BuildRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildRoutine")
            .field("name", &self.name)
            .field("kwargs", &self.kwargs)
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{config::SiteConfig, context::test_context};

    fn failing(_: &Context, _: &TemplateEnv, _: &Kwargs) -> Result<Nav, BuildError> {
        Err(BuildError::new("boom"))
    }

    fn templated_title(_: &Context, env: &TemplateEnv, _: &Kwargs) -> Result<Nav, BuildError> {
        let title = env.render_str("{{ metadata.name | upper }}")?;
        Ok(Nav::root(title))
    }

    #[test]
    fn resolve_unknown_routine() {
        let routines = Routines::default();
        assert!(matches!(
            routines.resolve("missing", Kwargs::new()),
            Err(Error::Config(msg)) if msg.contains("default, website")
        ));
    }

    #[test]
    fn failing_routine_reports_location() {
        let mut routines = Routines::empty();
        routines.register("failing", failing);
        let routine = routines.resolve("failing", Kwargs::new()).unwrap();

        let context = test_context();
        let env = TemplateEnv::new(&context, &SiteConfig::default(), false);
        match routine.build(&context, &env) {
            Err(Error::Build {
                stage,
                location,
                message,
            }) => {
                assert_eq!(stage, "build routine `failing`");
                assert_eq!(message, "boom");
                assert!(location.file.ends_with("builder.rs"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn routines_use_the_environment() {
        let mut routines = Routines::empty();
        routines.register("title", templated_title);
        let context = test_context();
        let env = TemplateEnv::new(&context, &SiteConfig::default(), false);
        let root = routines
            .resolve("title", Kwargs::new())
            .unwrap()
            .build(&context, &env)
            .unwrap();
        assert_eq!(root.title, "DEMO");
        assert!(root.is_empty());
    }
}
