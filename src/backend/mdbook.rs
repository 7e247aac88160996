use std::path::{Component, Path, PathBuf};

use itertools::Itertools;
use toml::{Table, Value};

use crate::{
    backend::{
        toc::{replace_toc, toc_entries, TocEntry, TOC_END, TOC_START},
        Backend, Staging,
    },
    collector::{BuildBundle, NavItem, RenderedPage},
    config::MdBookSettings,
    error::Error,
    tree::{Resources, ScriptSource, Stylesheet},
};

// -------------------------------------------------------------------------------------------------

/// Book level information written to `book.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub description: String,
    /// Web URL of the repository, used for the repository button and edit links.
    pub repository_url: Option<String>,
    pub branch: String,
}

/// Writes the site as an mdBook book: pages below `src/`, a `src/SUMMARY.md` and `book.toml`.
#[derive(Clone, Debug)]
pub struct MdBookBackend {
    directory: PathBuf,
    book: BookInfo,
    edit_links: bool,
    /// Root of the documented repository. Edit links are only created for pages which were
    /// created in a file below it.
    source_root: PathBuf,
}

impl MdBookBackend {
    pub const NAME: &'static str = "mdbook";

    pub fn new(settings: &MdBookSettings, book: BookInfo, source_root: &Path) -> Self {
        Self {
            directory: settings.directory.clone(),
            book,
            edit_links: settings.edit_links,
            source_root: source_root.to_path_buf(),
        }
    }

    fn page_text(&self, page: &RenderedPage) -> String {
        let mut text = page.text.clone();
        if !self.edit_links {
            return text;
        }
        if let Some(repository_url) = &self.book.repository_url {
            let origin = &page.origin;
            if self.is_source_file(&origin.file) {
                text.push_str(&format!(
                    "\n\n---\n\n[Edit this page]({}/blob/{}/{}#L{})\n",
                    repository_url.trim_end_matches('/'),
                    self.book.branch,
                    origin.file,
                    origin.line
                ));
            } else {
                tracing::debug!(
                    "No edit link for '{}': '{}' is not part of the repository",
                    page.path,
                    origin.file
                );
            }
        }
        text
    }

    /// Pages created by nodebook's own build routines have origins outside of the repository.
    fn is_source_file(&self, file: &str) -> bool {
        let path = Path::new(file);
        path.components().all(|c| matches!(c, Component::Normal(_)))
            && self.source_root.join(path).is_file()
    }
}

impl Backend for MdBookBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn write(&self, bundle: &BuildBundle, root: &Path) -> Result<(), Error> {
        let target = root.join(&self.directory);
        tracing::info!("Writing mdBook to '{}'", target.display());
        let mut staging = Staging::new(&target)?;

        for page in &bundle.pages {
            staging.write(Path::new("src").join(&page.path), self.page_text(page))?;
        }
        let assets = Assets::from(&bundle.resources);
        for (path, content) in &assets.files {
            staging.write(path, content)?;
        }

        let toc_lines = summary_lines(&bundle.nav);
        let summary = match staging.read_existing("src/SUMMARY.md")? {
            Some(existing) => {
                tracing::info!("Updating TOC in existing SUMMARY.md");
                replace_toc(&existing, &toc_lines)?
            }
            None => new_summary(&toc_lines),
        };
        staging.write("src/SUMMARY.md", summary)?;

        let existing = staging.read_existing("book.toml")?;
        let config = book_config(&self.book, &bundle.resources, existing.as_deref())?;
        staging.write("book.toml", config)?;

        staging.commit(false)
    }
}

// -------------------------------------------------------------------------------------------------

/// Lines of the generated table of contents: the root index as prefix chapter, followed by
/// the numbered chapters.
fn summary_lines(nav: &NavItem) -> Vec<String> {
    let mut lines = vec![];
    if let NavItem::Section {
        title,
        index: Some(index),
        ..
    } = nav
    {
        let prefix = TocEntry {
            level: 0,
            title: title.clone(),
            link: index.clone(),
        };
        lines.push(prefix.line().trim_start_matches("- ").to_string());
        lines.push(String::new());
    }
    lines.extend(toc_entries(nav, ".md").iter().map(TocEntry::line));
    lines
}

fn new_summary(toc_lines: &[String]) -> String {
    let mut content = format!("# Summary\n\n{TOC_START}\n");
    for line in toc_lines {
        content.push_str(line);
        content.push('\n');
    }
    content.push_str(TOC_END);
    content.push('\n');
    content
}

// -------------------------------------------------------------------------------------------------

/// Asset files of the book, with the stylesheet and script paths to register in `book.toml`.
#[derive(Debug, Default)]
struct Assets {
    files: Vec<(String, String)>,
    css: Vec<String>,
    js: Vec<String>,
}

impl From<&Resources> for Assets {
    fn from(resources: &Resources) -> Self {
        let mut assets = Assets::default();

        let mut imports = String::new();
        for css in &resources.css {
            match css {
                Stylesheet::Link { url } => imports.push_str(&format!("@import url(\"{url}\");\n")),
                Stylesheet::Inline { filename, content } => {
                    assets.add_file(filename, content.clone(), true);
                }
            }
        }
        if !imports.is_empty() {
            assets.add_file("remote.css", imports, true);
        }

        let mut loader = String::new();
        for js in &resources.js {
            match &js.source {
                ScriptSource::Link { url } => loader.push_str(&format!(
                    "(function () {{\n  const script = document.createElement(\"script\");\n  \
                     script.src = \"{url}\";\n  script.defer = {};\n  script.async = {};\n  \
                     document.head.appendChild(script);\n}})();\n",
                    js.defer, js.is_async
                )),
                ScriptSource::File { filename, content } => {
                    assets.add_file(filename, content.clone(), false);
                }
            }
        }
        if !loader.is_empty() {
            assets.add_file("remote.js", loader, false);
        }
        assets
    }
}

impl Assets {
    fn add_file(&mut self, filename: &str, content: String, is_css: bool) {
        let path = format!("assets/{filename}");
        if is_css {
            self.css.push(path.clone());
        } else {
            self.js.push(path.clone());
        }
        self.files.push((path, content));
    }
}

/// Create or update a `book.toml`, keeping all unrelated settings of an existing config.
pub fn book_config(
    book: &BookInfo,
    resources: &Resources,
    existing: Option<&str>,
) -> Result<String, Error> {
    let mut config = match existing {
        Some(content) => content.parse::<Table>()?,
        None => Table::new(),
    };
    let assets = Assets::from(resources);

    let book_table = table_mut(&mut config, "book")?;
    book_table.insert("title".into(), Value::String(book.title.clone()));
    if !book.authors.is_empty() {
        book_table.insert("authors".into(), string_array(book.authors.iter()));
    }
    if !book.description.is_empty() {
        book_table.insert("description".into(), Value::String(book.description.clone()));
    }
    book_table.insert("src".into(), Value::String("src".into()));

    let html = table_mut(table_mut(&mut config, "output")?, "html")?;
    for (key, paths) in [("additional-css", &assets.css), ("additional-js", &assets.js)] {
        if paths.is_empty() {
            continue;
        }
        let existing = html
            .get(key)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let merged = existing.iter().chain(paths.iter()).unique();
        html.insert(key.into(), string_array(merged));
    }
    if let Some(url) = &book.repository_url {
        html.insert("git-repository-url".into(), Value::String(url.clone()));
    }

    if !resources.extensions.is_empty() {
        let preprocessors = table_mut(&mut config, "preprocessor")?;
        for extension in &resources.extensions {
            table_mut(preprocessors, extension)?;
        }
    }

    Ok(toml::to_string_pretty(&config)?)
}

fn table_mut<'a>(table: &'a mut Table, key: &str) -> Result<&'a mut Table, Error> {
    table
        .entry(key)
        .or_insert_with(|| Value::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| Error::Output(format!("`{key}` in book.toml is not a table")))
}

fn string_array<'a>(values: impl Iterator<Item = &'a String>) -> Value {
    Value::Array(values.map(|value| Value::String(value.clone())).collect())
}

// -------------------------------------------------------------------------------------------------
