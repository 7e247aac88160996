#![doc = include_str!("../README.md")]

// -------------------------------------------------------------------------------------------------

mod backend;
mod builder;
mod cleanup;
mod collector;
mod config;
mod context;
mod error;
mod generator;
mod template;
mod tree;

// -------------------------------------------------------------------------------------------------

// re-export the pipeline stages and their types as public interface
pub use backend::{book_config, Backend, BookInfo, MarkdownBackend, MdBookBackend, Staging};
pub use builder::{pages::PageSpec, BuildError, BuildFn, BuildRoutine, Kwargs, Routines};
pub use cleanup::Cleanup;
pub use collector::{BuildBundle, Collector, NavItem, RenderedPage};
pub use config::{
    BackendConfig, BuildSettings, Config, HostingSettings, MarkdownSettings, MdBookSettings,
    SiteConfig, DEFAULT_CONFIG_FILE,
};
pub use context::{
    is_remote, resolve_source, Commit, Contributor, Context, GitSummary, GithubApi, HostingApi,
    HostingInfo, ManifestKind, PackageMetadata, RepoSlug,
};
pub use error::{Error, Location};
pub use generator::{
    create_config, generate_site, inspect,
    options::{Cli, Command, Options},
    BuildInfo, BuildReport,
};
pub use template::TemplateEnv;
pub use tree::{
    slugify, Nav, Node, Page, PageMeta, Resources, Script, ScriptSource, Stylesheet,
};
