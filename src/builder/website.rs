use crate::{
    builder::{
        pages::{add_pages, page_specs},
        BuildError, Kwargs,
    },
    context::Context,
    template::TemplateEnv,
    tree::{Nav, Page},
};

// -------------------------------------------------------------------------------------------------

const LICENSE_FILES: [&str; 4] = ["LICENSE", "LICENSE.md", "LICENSE-MIT", "LICENSE-APACHE"];

const BADGES: &str = r#"
{%- if hosting.available -%}
**{{ hosting.stars }}** stars · **{{ hosting.forks }}** forks · **{{ hosting.open_issues }}** open issues · **{{ hosting.open_pull_requests }}** open pull requests
{%- endif -%}"#;

const COMMIT_LOG: &str = r#"# Changelog

Latest changes on `{{ git.branch or "main" }}`:

{% for commit in git.commits -%}
- `{{ commit.hash[:7] }}` {{ commit.summary }} ({{ commit.author }}, {{ commit.date }})
{% endfor %}"#;

const CONTRIBUTORS: &str = r#"# Contributors

| Name | Commits |
| ---- | ------: |
{% for contributor in git.contributors -%}
| {{ contributor.name }} | {{ contributor.commits }} |
{% endfor %}"#;

/// Build routine for a complete project website: a home page, the declared pages, a development
/// section with changelog, contributors and dependencies, and the license.
///
/// Keyword arguments: `pages` (see [`PageSpec`](super::pages::PageSpec)) and `development`
/// (default true) to toggle the development section.
pub(crate) fn website(
    context: &Context,
    env: &TemplateEnv,
    kwargs: &Kwargs,
) -> Result<Nav, BuildError> {
    let specs = page_specs(kwargs)?;
    let development = kwargs
        .get("development")
        .map(|value| {
            value
                .as_bool()
                .ok_or_else(|| BuildError::new("`development` must be a boolean"))
        })
        .transpose()?
        .unwrap_or(true);

    let mut root = Nav::root(context.metadata.name.clone());
    add_home_page(&mut root, context, env)?;
    add_pages(&mut root, &specs, context, env)?;
    if development {
        add_development(&mut root, context);
    }
    if let Some(text) = LICENSE_FILES
        .iter()
        .find_map(|name| context.project_files.get(*name))
    {
        verbatim(root.add_page("License"), text);
    }
    Ok(root)
}

fn add_home_page(root: &mut Nav, context: &Context, env: &TemplateEnv) -> Result<(), BuildError> {
    let metadata = &context.metadata;
    let badges = env.render_str(BADGES)?;
    let page = root.add_index_page(metadata.name.clone());
    page.meta.hide.push("toc".to_string());
    match context.project_files.get("README.md") {
        Some(readme) => {
            page.push(badges);
            verbatim(page, readme);
        }
        None => {
            page.push_heading(1, &metadata.name);
            page.push(&metadata.description).push(badges);
        }
    }
    if !metadata.version.is_empty() {
        page.push(format!("Version: `{}`", metadata.version));
    }
    Ok(())
}

fn add_development(root: &mut Nav, context: &Context) {
    let files = &context.project_files;
    let git = &context.git;
    let has_content = files.contains_key("CHANGELOG.md")
        || !git.commits.is_empty()
        || !git.contributors.is_empty()
        || !context.metadata.dependencies.is_empty()
        || files.contains_key("CONTRIBUTING.md")
        || files.contains_key("CODE_OF_CONDUCT.md");
    if !has_content {
        tracing::debug!("Nothing to show in the development section");
        return;
    }

    let dev = root.add_nav("Development");
    if let Some(changelog) = files.get("CHANGELOG.md") {
        verbatim(dev.add_page("Changelog"), changelog);
    } else if !git.commits.is_empty() {
        dev.add_template("Changelog", COMMIT_LOG);
    }
    if !git.contributors.is_empty() {
        dev.add_template("Contributors", CONTRIBUTORS);
    }
    if !context.metadata.dependencies.is_empty() {
        let page = dev.add_page("Dependencies");
        page.push_heading(1, "Dependencies");
        page.push(
            context
                .metadata
                .dependencies
                .iter()
                .map(|name| format!("- `{name}`"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    if let Some(text) = files.get("CONTRIBUTING.md") {
        verbatim(dev.add_page("Contributing"), text);
    }
    if let Some(text) = files.get("CODE_OF_CONDUCT.md") {
        verbatim(dev.add_page("Code of conduct"), text);
    }
}

/// Append project file content which must not be interpreted as a template.
fn verbatim(page: &mut Page, text: &str) {
    page.meta.render_macros = Some(false);
    page.push(text);
}

// -------------------------------------------------------------------------------------------------
