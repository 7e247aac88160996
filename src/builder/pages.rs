use serde::Deserialize;

use crate::{
    builder::{BuildError, Kwargs},
    context::Context,
    template::TemplateEnv,
    tree::{Nav, Page, Script, Stylesheet},
};

// -------------------------------------------------------------------------------------------------

/// A page or section, as declared in the `pages` keyword argument of a build routine.
///
/// Entries with children become sections. The `content` of a page is template source, rendered
/// while collecting. `include` copies a project file (e.g. "README.md") verbatim.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSpec {
    /// Page title. May contain template expressions.
    pub title: String,
    pub content: Option<String>,
    pub include: Option<String>,
    pub children: Vec<PageSpec>,
    pub draft: bool,
    pub render: Option<bool>,
    pub hide: Vec<String>,
    pub css: Vec<String>,
    pub js: Vec<String>,
    pub extensions: Vec<String>,
}

/// Parse the declared pages from the routine's keyword arguments.
pub(crate) fn page_specs(kwargs: &Kwargs) -> Result<Vec<PageSpec>, BuildError> {
    match kwargs.get("pages") {
        Some(pages) => serde_json::from_value(pages.clone())
            .map_err(|err| BuildError::new(format!("invalid `pages` argument: {err}"))),
        None => Ok(vec![]),
    }
}

/// The default build routine: a root section with the declared pages only.
pub(crate) fn declared_pages(
    context: &Context,
    env: &TemplateEnv,
    kwargs: &Kwargs,
) -> Result<Nav, BuildError> {
    let specs = page_specs(kwargs)?;
    let title = match kwargs.get("title").and_then(|title| title.as_str()) {
        Some(title) => env.render_str(title)?,
        None => context.metadata.name.clone(),
    };
    let mut root = Nav::root(title);
    add_pages(&mut root, &specs, context, env)?;
    Ok(root)
}

/// Add the declared pages and sections to `nav`, in declaration order.
pub(crate) fn add_pages(
    nav: &mut Nav,
    specs: &[PageSpec],
    context: &Context,
    env: &TemplateEnv,
) -> Result<(), BuildError> {
    for spec in specs {
        if spec.title.trim().is_empty() {
            return Err(BuildError::new("declared pages need a non empty `title`"));
        }
        let title = env.render_str(&spec.title)?;
        if spec.children.is_empty() {
            let page = add_page(nav, &title, spec, context)?;
            apply_spec(page, spec);
        } else {
            let section = nav.add_nav(title.clone());
            let index = match (&spec.content, &spec.include) {
                (Some(_), Some(_)) => return Err(both_sources(&title)),
                (Some(content), None) => Some(section.add_index_template(title, content)),
                (None, Some(include)) => {
                    let text = included(context, include)?;
                    let page = section.add_index_page(title);
                    page.push(text);
                    Some(page)
                }
                (None, None) => None,
            };
            if let Some(page) = index {
                apply_spec(page, spec);
            }
            add_pages(section, &spec.children, context, env)?;
        }
    }
    Ok(())
}

fn add_page<'a>(
    nav: &'a mut Nav,
    title: &str,
    spec: &PageSpec,
    context: &Context,
) -> Result<&'a mut Page, BuildError> {
    match (&spec.content, &spec.include) {
        (Some(_), Some(_)) => Err(both_sources(title)),
        (Some(content), None) => Ok(nav.add_template(title, content)),
        (None, Some(include)) => {
            let text = included(context, include)?;
            let page = nav.add_page(title);
            page.push(text);
            Ok(page)
        }
        (None, None) => {
            let page = nav.add_page(title);
            page.push_heading(1, title);
            Ok(page)
        }
    }
}

#[track_caller]
fn both_sources(title: &str) -> BuildError {
    BuildError::new(format!(
        "page `{title}`: `content` and `include` can't be used together"
    ))
}

fn included<'a>(context: &'a Context, name: &str) -> Result<&'a str, BuildError> {
    context
        .project_files
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| BuildError::new(format!("included project file `{name}` does not exist")))
}

fn apply_spec(page: &mut Page, spec: &PageSpec) {
    page.meta.draft = spec.draft;
    // included project files are never templates
    page.meta.render_macros = if spec.include.is_some() {
        Some(false)
    } else {
        spec.render
    };
    page.meta.hide.clone_from(&spec.hide);
    for url in &spec.css {
        page.resources.add_css(Stylesheet::link(url));
    }
    for url in &spec.js {
        page.resources.add_js(Script::link(url));
    }
    for extension in &spec.extensions {
        page.resources.add_extension(extension);
    }
}

// -------------------------------------------------------------------------------------------------
