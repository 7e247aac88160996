pub(crate) mod resources;

// -------------------------------------------------------------------------------------------------

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::Location;

pub use resources::{Resources, Script, ScriptSource, Stylesheet};

// -------------------------------------------------------------------------------------------------

/// A node in the documentation tree.
#[derive(Clone, Debug)]
pub enum Node {
    /// A page with final Markdown content.
    Page(Page),
    /// A page whose body still contains template directives.
    Template(Page),
    /// A navigation section with ordered children.
    Nav(Nav),
}

impl Node {
    pub fn title(&self) -> &str {
        match self {
            Node::Page(page) | Node::Template(page) => &page.title,
            Node::Nav(nav) => &nav.title,
        }
    }

    pub fn origin(&self) -> &Location {
        match self {
            Node::Page(page) | Node::Template(page) => &page.origin,
            Node::Nav(nav) => &nav.origin,
        }
    }

    /// Short name of the node kind, as used in build statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Page(_) => "page",
            Node::Template(_) => "template",
            Node::Nav(_) => "nav",
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Per page settings which affect how the page gets collected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// Render the page through the template environment. `None` uses the site default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_macros: Option<bool>,
    /// Append a page info block. `None` uses the site default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_page_info: Option<bool>,
    /// Drafts are not included in the build.
    pub draft: bool,
    /// Theme elements to hide on this page, e.g. "toc" or "nav".
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hide: Vec<String>,
}

/// A single page of the site.
#[derive(Clone, Debug)]
pub struct Page {
    pub title: String,
    /// Path of the page's Markdown file, relative to the site root.
    pub path: String,
    pub body: String,
    pub resources: Resources,
    pub meta: PageMeta,
    /// Where in the build routine this page was created.
    pub origin: Location,
}

impl Page {
    #[track_caller]
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            body: String::new(),
            resources: Resources::default(),
            meta: PageMeta::default(),
            origin: Location::caller(),
        }
    }

    /// Append a block of Markdown, separated from previous content by an empty line.
    pub fn push(&mut self, markdown: impl AsRef<str>) -> &mut Self {
        let markdown = markdown.as_ref().trim_end();
        if markdown.is_empty() {
            return self;
        }
        if !self.body.is_empty() {
            self.body.push_str("\n\n");
        }
        self.body.push_str(markdown);
        self
    }

    pub fn push_heading(&mut self, level: usize, text: &str) -> &mut Self {
        self.push(format!("{} {}", "#".repeat(level.clamp(1, 6)), text))
    }
}

// -------------------------------------------------------------------------------------------------

/// A navigation section: an optional index page plus ordered child nodes.
#[derive(Clone, Debug)]
pub struct Nav {
    pub title: String,
    /// Directory of the section, relative to the site root. Empty for the root.
    pub dir: String,
    index: Option<Box<Node>>,
    children: Vec<Node>,
    pub origin: Location,
}

impl Nav {
    /// Create a new, empty root section.
    #[track_caller]
    pub fn root(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dir: String::new(),
            index: None,
            children: vec![],
            origin: Location::caller(),
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn index(&self) -> Option<&Node> {
        self.index.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.children.is_empty()
    }

    /// Add a sub section. Its directory is derived from the title.
    #[track_caller]
    pub fn add_nav(&mut self, title: impl Into<String>) -> &mut Nav {
        let title = title.into();
        let nav = Nav {
            dir: join_path(&self.dir, &slugify(&title)),
            title,
            index: None,
            children: vec![],
            origin: Location::caller(),
        };
        self.children.push(Node::Nav(nav));
        match self.children.last_mut() {
            Some(Node::Nav(nav)) => nav,
            _ => unreachable!("a nav was just pushed"),
        }
    }

    /// Add a page with Markdown content.
    #[track_caller]
    pub fn add_page(&mut self, title: impl Into<String>) -> &mut Page {
        let page = self.new_page(title.into());
        self.push_page(Node::Page(page))
    }

    /// Add a page whose body is template source, rendered during collection.
    #[track_caller]
    pub fn add_template(&mut self, title: impl Into<String>, source: &str) -> &mut Page {
        let mut page = self.new_page(title.into());
        page.push(source);
        self.push_page(Node::Template(page))
    }

    /// Set the index page of this section, replacing any previous one.
    #[track_caller]
    pub fn add_index_page(&mut self, title: impl Into<String>) -> &mut Page {
        let page = Page::new(title, join_path(&self.dir, "index.md"));
        self.set_index(Node::Page(page))
    }

    /// Set a templated index page of this section, replacing any previous one.
    #[track_caller]
    pub fn add_index_template(&mut self, title: impl Into<String>, source: &str) -> &mut Page {
        let mut page = Page::new(title, join_path(&self.dir, "index.md"));
        page.push(source);
        self.set_index(Node::Template(page))
    }

    #[track_caller]
    fn new_page(&self, title: String) -> Page {
        let path = join_path(&self.dir, &(slugify(&title) + ".md"));
        Page::new(title, path)
    }

    fn push_page(&mut self, node: Node) -> &mut Page {
        self.children.push(node);
        match self.children.last_mut() {
            Some(Node::Page(page) | Node::Template(page)) => page,
            _ => unreachable!("a page was just pushed"),
        }
    }

    fn set_index(&mut self, node: Node) -> &mut Page {
        match self.index.insert(Box::new(node)).as_mut() {
            Node::Page(page) | Node::Template(page) => page,
            Node::Nav(_) => unreachable!("index nodes are always pages"),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Convert a title into a lower case, dash separated file or directory name.
pub fn slugify(title: &str) -> String {
    static NON_ALNUM: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("invalid slug regex"));
    let lower = title.to_lowercase();
    let slug = NON_ALNUM.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug.to_string()
    }
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("  C++ & Rust!  "), "c-rust");
        assert_eq!(slugify("???"), "page");
    }

    #[test]
    fn paths_follow_sections() {
        let mut root = Nav::root("Site");
        root.add_page("Intro");
        let dev = root.add_nav("Development Notes");
        dev.add_index_page("Overview");
        dev.add_template("Change Log", "{{ metadata.name }}");

        let paths = collect_paths(&root);
        assert_eq!(
            paths,
            vec![
                "intro.md",
                "development-notes/index.md",
                "development-notes/change-log.md"
            ]
        );
    }

    #[test]
    fn origin_points_at_caller() {
        let mut root = Nav::root("Site");
        let line = line!() + 1;
        let page = root.add_page("Intro");
        assert_eq!(page.origin.line, line);
        assert!(page.origin.file.ends_with("tree.rs"));
    }

    #[test]
    fn push_separates_blocks() {
        let mut page = Page::new("A", "a.md");
        page.push_heading(1, "A").push("").push("text\n");
        assert_eq!(page.body, "# A\n\ntext");
    }

    fn collect_paths(nav: &Nav) -> Vec<String> {
        let mut paths = vec![];
        if let Some(Node::Page(page) | Node::Template(page)) = nav.index() {
            paths.push(page.path.clone());
        }
        for child in nav.children() {
            match child {
                Node::Page(page) | Node::Template(page) => paths.push(page.path.clone()),
                Node::Nav(nav) => paths.extend(collect_paths(nav)),
            }
        }
        paths
    }
}
