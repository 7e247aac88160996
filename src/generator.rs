pub(crate) mod options;

// -------------------------------------------------------------------------------------------------

use std::{collections::BTreeMap, path::PathBuf};

use serde::Serialize;

use crate::{
    backend::{book_config, Backend, BookInfo, MarkdownBackend, MdBookBackend},
    builder::Routines,
    cleanup::Cleanup,
    collector::{BuildBundle, Collector},
    config::{BackendConfig, Config, SiteConfig},
    context::{self, Context, GithubApi, HostingApi},
    error::Error,
    generator::options::Options,
    template::TemplateEnv,
};

// -------------------------------------------------------------------------------------------------

/// Summary of a successful [`generate_site`] run.
#[derive(Clone, Debug, Serialize)]
pub struct BuildReport {
    pub site_dir: PathBuf,
    /// Names of the backends which wrote the site, in run order.
    pub backends: Vec<String>,
    pub pages: usize,
    pub node_counts: BTreeMap<String, usize>,
}

/// Everything a build would write, as returned by [`inspect`].
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub context: Context,
    pub bundle: BuildBundle,
}

/// Generate a documentation site with the given [`Options`](options::Options).
///
/// Loads the config, resolves (and if necessary clones) the documented repository, assembles
/// its context, runs the configured build routine and writes the collected pages with every
/// configured backend, in plugin list order. A failing backend doesn't stop the others, but
/// fails the run. Temporary files are removed in any case.
pub fn generate_site(options: &Options, routines: &Routines) -> Result<BuildReport, Error> {
    let mut cleanup = Cleanup::default();
    let result = build_site(options, routines, &mut cleanup);
    cleanup.run();
    result
}

/// Run the pipeline up to the collected build artifacts, without writing anything.
pub fn inspect(options: &Options, routines: &Routines) -> Result<BuildInfo, Error> {
    let mut cleanup = Cleanup::default();
    let result = prepare(options, routines, &mut cleanup).map(|prepared| BuildInfo {
        context: prepared.context,
        bundle: prepared.bundle,
    });
    cleanup.run();
    result
}

/// Create a `book.toml` for the project, as the mdBook backend would write it.
pub fn create_config(options: &Options, routines: &Routines) -> Result<String, Error> {
    let mut cleanup = Cleanup::default();
    let result = prepare(options, routines, &mut cleanup).and_then(|prepared| {
        let book = book_info(&prepared.config.site, &prepared.context);
        book_config(&book, &prepared.bundle.resources, None)
    });
    cleanup.run();
    result
}

// -------------------------------------------------------------------------------------------------

struct Prepared {
    config: Config,
    context: Context,
    bundle: BuildBundle,
}

fn prepare(options: &Options, routines: &Routines, cleanup: &mut Cleanup) -> Result<Prepared, Error> {
    let config = Config::load(options, routines)?;
    let settings = &config.build;
    let root = context::resolve_source(&settings.repo_path, settings.clone_depth, cleanup)?;

    let api = if settings.hosting.enabled {
        GithubApi::new(&settings.hosting)
            .inspect_err(|err| tracing::warn!("Hosting API is not available: {err}"))
            .ok()
    } else {
        None
    };
    let context = Context::assemble(&root, settings, api.as_ref().map(|api| api as &dyn HostingApi))?;

    let env = TemplateEnv::new(&context, &config.site, settings.strict);
    let nav = config.routine.build(&context, &env)?;
    let bundle = Collector::from(settings).collect(&nav, &env)?;
    Ok(Prepared {
        config,
        context,
        bundle,
    })
}

fn build_site(
    options: &Options,
    routines: &Routines,
    cleanup: &mut Cleanup,
) -> Result<BuildReport, Error> {
    let Prepared {
        config,
        context,
        bundle,
    } = prepare(options, routines, cleanup)?;

    let mut written = vec![];
    let mut errors = vec![];
    for backend in create_backends(&config, &context) {
        let name = backend.name().to_string();
        match backend.write(&bundle, &config.site_dir) {
            Ok(()) => written.push(name),
            Err(err) => {
                tracing::error!("Backend `{name}` failed: {err}");
                errors.push(Error::Write {
                    backend: name,
                    source: Box::new(err),
                });
            }
        }
    }
    if !errors.is_empty() {
        return Err(Error::Backends(errors));
    }

    tracing::info!(
        "Wrote {} pages to '{}'",
        bundle.pages.len(),
        config.site_dir.display()
    );
    Ok(BuildReport {
        site_dir: config.site_dir,
        backends: written,
        pages: bundle.pages.len(),
        node_counts: bundle.node_counts,
    })
}

fn create_backends(config: &Config, context: &Context) -> Vec<Box<dyn Backend>> {
    config
        .backends
        .iter()
        .map(|backend| -> Box<dyn Backend> {
            match backend {
                BackendConfig::Markdown(settings) => Box::new(MarkdownBackend::new(settings)),
                BackendConfig::MdBook(settings) => Box::new(MdBookBackend::new(
                    settings,
                    book_info(&config.site, context),
                    &context.root,
                )),
            }
        })
        .collect()
}

fn book_info(site: &SiteConfig, context: &Context) -> BookInfo {
    let metadata = &context.metadata;
    BookInfo {
        title: site.name.clone().unwrap_or_else(|| metadata.name.clone()),
        authors: site
            .author
            .clone()
            .map(|author| vec![author])
            .unwrap_or_else(|| metadata.authors.clone()),
        description: site
            .description
            .clone()
            .unwrap_or_else(|| metadata.description.clone()),
        repository_url: site
            .repository_url
            .clone()
            .or_else(|| context.repository_url()),
        branch: context.branch().to_string(),
    }
}

// -------------------------------------------------------------------------------------------------
