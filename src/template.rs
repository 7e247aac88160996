use minijinja::{context, Environment, UndefinedBehavior, Value};

use crate::{config::SiteConfig, context::Context, tree::slugify};

// -------------------------------------------------------------------------------------------------

/// The template environment used to render dynamic text in pages.
///
/// Templates can access the context as `metadata`, `git`, `hosting`, `files` and `site`.
/// Pages rendered during collection additionally see `page.title` and `page.path`.
pub struct TemplateEnv {
    env: Environment<'static>,
}

impl TemplateEnv {
    pub fn new(context: &Context, site: &SiteConfig, strict: bool) -> Self {
        let mut env = Environment::new();
        if strict {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }
        env.add_global("metadata", Value::from_serialize(&context.metadata));
        env.add_global("git", Value::from_serialize(&context.git));
        env.add_global("hosting", Value::from_serialize(&context.hosting));
        env.add_global("files", Value::from_serialize(&context.project_files));
        env.add_global("site", Value::from_serialize(site));
        env.add_global(
            "repository_url",
            Value::from_serialize(context.repository_url()),
        );
        env.add_filter("slugify", |text: String| slugify(&text));
        Self { env }
    }

    /// Render a template string with the context globals only.
    pub fn render_str(&self, source: &str) -> Result<String, minijinja::Error> {
        self.env.render_str(source, context! {})
    }

    /// Render the body of a page.
    pub fn render_page(
        &self,
        source: &str,
        title: &str,
        path: &str,
    ) -> Result<String, minijinja::Error> {
        self.env.render_str(
            source,
            context! { page => context! { title => title, path => path } },
        )
    }
}

// -------------------------------------------------------------------------------------------------
