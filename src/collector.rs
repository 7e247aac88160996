use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::{
    config::BuildSettings,
    error::{Error, Location},
    template::TemplateEnv,
    tree::{Nav, Node, Page, PageMeta, Resources},
};

// -------------------------------------------------------------------------------------------------

/// An entry of the collected navigation, mirroring the node tree without page contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavItem {
    Page {
        title: String,
        path: String,
    },
    Section {
        title: String,
        dir: String,
        /// Path of the section's index page, if any.
        index: Option<String>,
        children: Vec<NavItem>,
    },
}

impl NavItem {
    pub fn title(&self) -> &str {
        match self {
            NavItem::Page { title, .. } | NavItem::Section { title, .. } => title,
        }
    }
}

/// A page with its final Markdown text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub title: String,
    pub path: String,
    pub text: String,
    pub origin: Location,
    pub resources: Resources,
    pub meta: PageMeta,
}

/// Everything the backends need to write a site. Backends only read it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildBundle {
    /// The root section.
    pub nav: NavItem,
    /// All pages in navigation order.
    pub pages: Vec<RenderedPage>,
    /// Resources of all pages, in first-encounter order.
    pub resources: Resources,
    /// Paths of the pages which got rendered through the template environment.
    pub templated: Vec<String>,
    /// Number of collected nodes per node kind.
    pub node_counts: BTreeMap<String, usize>,
}

impl BuildBundle {
    pub fn page(&self, path: &str) -> Option<&RenderedPage> {
        self.pages.iter().find(|page| page.path == path)
    }
}

// -------------------------------------------------------------------------------------------------

/// Walks a node tree once and converts it into a [`BuildBundle`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Collector {
    /// Append a page info block to all pages which don't override it.
    pub show_page_info: bool,
    /// Render plain pages through the template environment too, unless they opt out.
    pub render_by_default: bool,
}

impl From<&BuildSettings> for Collector {
    fn from(settings: &BuildSettings) -> Self {
        Self {
            show_page_info: settings.show_page_info,
            render_by_default: settings.render_all_pages,
        }
    }
}

impl Collector {
    pub fn collect(&self, root: &Nav, env: &TemplateEnv) -> Result<BuildBundle, Error> {
        tracing::info!("Collecting build artifacts...");
        let mut walk = Walk::new(self);
        let nav = walk.visit_nav(root)?;
        let Walk {
            mut pages,
            pending,
            resources,
            node_counts,
            ..
        } = walk;

        let mut templated = Vec::with_capacity(pending.len());
        for index in pending {
            let page = &mut pages[index];
            tracing::debug!("Rendering page '{}'", page.path);
            page.text = env
                .render_page(&page.text, &page.title, &page.path)
                .map_err(|err| Error::Build {
                    stage: format!("rendering `{}`", page.path),
                    location: page.origin.clone(),
                    message: err.to_string(),
                })?;
            templated.push(page.path.clone());
        }

        for page in &mut pages {
            if page.meta.show_page_info.unwrap_or(self.show_page_info) {
                let info = page_info(page)?;
                page.text.push_str(&info);
            }
        }

        tracing::info!(
            "Collected {} pages, {} style sheets, {} scripts and {} extensions",
            pages.len(),
            resources.css.len(),
            resources.js.len(),
            resources.extensions.len()
        );
        Ok(BuildBundle {
            nav,
            pages,
            resources,
            templated,
            node_counts,
        })
    }
}

/// State of a single traversal.
struct Walk<'a> {
    collector: &'a Collector,
    pages: Vec<RenderedPage>,
    /// Indices into `pages` which still need rendering.
    pending: Vec<usize>,
    resources: Resources,
    node_counts: BTreeMap<String, usize>,
    /// Paths of all collected pages. Each path must be unique.
    paths: HashSet<String>,
}

impl<'a> Walk<'a> {
    fn new(collector: &'a Collector) -> Self {
        Self {
            collector,
            pages: vec![],
            pending: vec![],
            resources: Resources::default(),
            node_counts: BTreeMap::new(),
            paths: HashSet::new(),
        }
    }

    fn count(&mut self, node_kind: &str) {
        *self.node_counts.entry(node_kind.to_string()).or_default() += 1;
    }

    fn visit_nav(&mut self, nav: &Nav) -> Result<NavItem, Error> {
        self.count("nav");
        let index = match nav.index() {
            Some(node) => self.visit_page(node)?,
            None => None,
        };
        let mut children = Vec::with_capacity(nav.children().len());
        for child in nav.children() {
            match child {
                Node::Nav(nav) => children.push(self.visit_nav(nav)?),
                page => {
                    if let Some(path) = self.visit_page(page)? {
                        children.push(NavItem::Page {
                            title: page.title().to_string(),
                            path,
                        });
                    }
                }
            }
        }
        Ok(NavItem::Section {
            title: nav.title.clone(),
            dir: nav.dir.clone(),
            index,
            children,
        })
    }

    /// Record a page node and return its path, or `None` if it's not part of the build.
    fn visit_page(&mut self, node: &Node) -> Result<Option<String>, Error> {
        let (page, needs_rendering) = match node {
            Node::Template(page) => (page, true),
            Node::Page(page) => (
                page,
                page.meta
                    .render_macros
                    .unwrap_or(self.collector.render_by_default),
            ),
            Node::Nav(nav) => {
                tracing::warn!("Ignoring section '{}' used as a page", nav.title);
                return Ok(None);
            }
        };
        if page.meta.draft {
            tracing::debug!("Skipping draft '{}'", page.path);
            return Ok(None);
        }
        if !self.paths.insert(page.path.clone()) {
            return Err(Error::Build {
                stage: format!("collecting `{}`", page.path),
                location: page.origin.clone(),
                message: format!(
                    "page `{}` uses the path `{}` of another page",
                    page.title, page.path
                ),
            });
        }
        self.count(node.kind());
        self.resources.merge(&page.resources);
        if needs_rendering {
            self.pending.push(self.pages.len());
        }
        self.pages.push(rendered(page));
        Ok(Some(page.path.clone()))
    }
}

fn rendered(page: &Page) -> RenderedPage {
    RenderedPage {
        title: page.title.clone(),
        path: page.path.clone(),
        text: page.body.clone(),
        origin: page.origin.clone(),
        resources: page.resources.clone(),
        meta: page.meta.clone(),
    }
}

/// A collapsible block describing where a page came from and what it requires.
fn page_info(page: &RenderedPage) -> Result<String, Error> {
    let resources = serde_json::to_string_pretty(&page.resources)?;
    let meta = serde_yaml::to_string(&page.meta)?;
    Ok(format!(
        "\n\n<details>\n<summary>Page info</summary>\n\n\
         Created at `{}`\n\n\
         Resources:\n\n```json\n{}\n```\n\n\
         Metadata:\n\n```yaml\n{}```\n\n</details>\n",
        page.origin, resources, meta
    ))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        config::SiteConfig,
        context::test_context,
        tree::{Script, Stylesheet},
    };

    fn env() -> TemplateEnv {
        TemplateEnv::new(&test_context(), &SiteConfig::default(), false)
    }

    fn sample_tree() -> Nav {
        let mut root = Nav::root("Site");
        root.add_index_page("Home").push("Welcome");
        root.add_template("About", "About {{ metadata.name }}")
            .resources
            .add_css(Stylesheet::link("b.css"))
            .add_js(Script::link("x.js"));
        let guide = root.add_nav("Guide");
        guide
            .add_page("Install")
            .resources
            .add_css(Stylesheet::link("a.css"))
            .add_css(Stylesheet::link("b.css"))
            .add_extension("admonish");
        guide.add_page("Secret").meta.draft = true;
        root.add_page("Raw {{ x }}").meta.render_macros = Some(false);
        root
    }

    #[test]
    fn nav_mirrors_tree_order() {
        let bundle = Collector::default().collect(&sample_tree(), &env()).unwrap();
        let NavItem::Section {
            index, children, ..
        } = &bundle.nav
        else {
            panic!("root must be a section");
        };
        assert_eq!(index.as_deref(), Some("index.md"));
        let titles = children.iter().map(NavItem::title).collect::<Vec<_>>();
        assert_eq!(titles, vec!["About", "Guide", "Raw {{ x }}"]);
        assert_eq!(
            children[1],
            NavItem::Section {
                title: "Guide".to_string(),
                dir: "guide".to_string(),
                index: None,
                children: vec![NavItem::Page {
                    title: "Install".to_string(),
                    path: "guide/install.md".to_string()
                }],
            }
        );
        let paths = bundle.pages.iter().map(|p| p.path.as_str()).collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec!["index.md", "about.md", "guide/install.md", "raw-x.md"]
        );
    }

    #[test]
    fn resources_are_unique_in_first_encounter_order() {
        let bundle = Collector::default().collect(&sample_tree(), &env()).unwrap();
        assert_eq!(
            bundle.resources.css,
            vec![Stylesheet::link("b.css"), Stylesheet::link("a.css")]
        );
        assert_eq!(bundle.resources.js, vec![Script::link("x.js")]);
        assert_eq!(bundle.resources.extensions, vec!["admonish"]);
    }

    #[test]
    fn templates_are_rendered() {
        let bundle = Collector::default().collect(&sample_tree(), &env()).unwrap();
        assert_eq!(bundle.templated, vec!["about.md"]);
        assert_eq!(bundle.page("about.md").unwrap().text, "About demo");
        assert_eq!(bundle.node_counts["nav"], 2);
        assert_eq!(bundle.node_counts["page"], 3);
        assert_eq!(bundle.node_counts["template"], 1);

        let collector = Collector {
            render_by_default: true,
            ..Collector::default()
        };
        let bundle = collector.collect(&sample_tree(), &env()).unwrap();
        assert_eq!(bundle.templated, vec!["index.md", "about.md", "guide/install.md"]);
        assert!(bundle.page("raw-x.md").is_some());
    }

    #[test]
    fn collecting_twice_is_deterministic() {
        let tree = sample_tree();
        let env = env();
        let collector = Collector {
            show_page_info: true,
            render_by_default: true,
        };
        let first = collector.collect(&tree, &env).unwrap();
        let second = collector.collect(&tree, &env).unwrap();
        assert_eq!(first, second);
        let about = first.page("about.md").unwrap();
        assert!(about.text.starts_with("About demo\n\n<details>"));
        assert!(about.text.contains("collector.rs"));
        assert!(about.text.contains("b.css"));
    }

    #[test]
    fn render_errors_point_at_the_page_origin() {
        let mut root = Nav::root("Site");
        let line = line!() + 1;
        root.add_template("Broken", "{{ unclosed");
        match Collector::default().collect(&root, &env()) {
            Err(Error::Build {
                stage, location, ..
            }) => {
                assert_eq!(stage, "rendering `broken.md`");
                assert_eq!(location.line, line);
                assert!(location.file.ends_with("collector.rs"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn duplicate_paths_are_rejected_at_the_second_page() {
        let mut root = Nav::root("Site");
        root.add_page("Intro");
        let line = line!() + 1;
        root.add_page("intro");
        match Collector::default().collect(&root, &env()) {
            Err(Error::Build {
                stage,
                location,
                message,
            }) => {
                assert_eq!(stage, "collecting `intro.md`");
                assert_eq!(location.line, line);
                assert!(message.contains("`intro.md`"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let mut root = Nav::root("Site");
        let guide = root.add_nav("Guide");
        guide.add_index_page("Guide");
        guide.add_page("Index");
        assert!(matches!(
            Collector::default().collect(&root, &env()),
            Err(Error::Build { stage, .. }) if stage == "collecting `guide/index.md`"
        ));

        // drafts don't take up a path
        let mut root = Nav::root("Site");
        root.add_page("Intro").meta.draft = true;
        root.add_page("intro");
        assert_eq!(Collector::default().collect(&root, &env()).unwrap().pages.len(), 1);
    }
}
