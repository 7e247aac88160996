use std::path::{Path, PathBuf};

use crate::{
    backend::{
        toc::{relative_link, with_extension, TocEntry},
        Backend, Staging,
    },
    collector::{BuildBundle, NavItem},
    config::MarkdownSettings,
    error::Error,
    tree::{ScriptSource, Stylesheet},
};

// -------------------------------------------------------------------------------------------------

/// Writes the site as plain Markdown files: one file per page plus a `SUMMARY` index for
/// every directory level.
#[derive(Clone, Debug)]
pub struct MarkdownBackend {
    directory: PathBuf,
    extension: String,
}

impl MarkdownBackend {
    pub const NAME: &'static str = "markdown";

    pub fn new(settings: &MarkdownSettings) -> Self {
        let extension = if settings.extension.starts_with('.') || settings.extension.is_empty() {
            settings.extension.clone()
        } else {
            format!(".{}", settings.extension)
        };
        Self {
            directory: settings.directory.clone(),
            extension,
        }
    }

    fn summary_path(&self, dir: &str) -> PathBuf {
        Path::new(dir).join(format!("SUMMARY{}", self.extension))
    }

    fn write_summaries(&self, staging: &mut Staging, section: &NavItem) -> Result<(), Error> {
        let NavItem::Section {
            title,
            dir,
            index,
            children,
        } = section
        else {
            return Ok(());
        };
        let mut entries = vec![];
        if let Some(index) = index {
            entries.push(TocEntry {
                level: 0,
                title: title.clone(),
                link: relative_link(index, dir, &self.extension),
            });
        }
        for child in children {
            let link = match child {
                NavItem::Page { path, .. } => relative_link(path, dir, &self.extension),
                NavItem::Section { dir: sub_dir, .. } => {
                    relative_link(&format!("{sub_dir}/SUMMARY.md"), dir, &self.extension)
                }
            };
            entries.push(TocEntry {
                level: 0,
                title: child.title().to_string(),
                link,
            });
        }

        let mut content = format!("# {title}\n");
        if !entries.is_empty() {
            content.push('\n');
            for entry in &entries {
                content.push_str(&entry.line());
                content.push('\n');
            }
        }
        staging.write(self.summary_path(dir), content)?;

        for child in children {
            self.write_summaries(staging, child)?;
        }
        Ok(())
    }
}

impl Backend for MarkdownBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn write(&self, bundle: &BuildBundle, root: &Path) -> Result<(), Error> {
        let target = root.join(&self.directory);
        tracing::info!("Writing markdown files to '{}'", target.display());
        let mut staging = Staging::new(&target)?;

        for page in &bundle.pages {
            staging.write(with_extension(&page.path, &self.extension), &page.text)?;
        }
        for css in &bundle.resources.css {
            if let Stylesheet::Inline { filename, content } = css {
                staging.write(Path::new("assets").join(filename), content)?;
            }
        }
        for js in &bundle.resources.js {
            if let ScriptSource::File { filename, content } = &js.source {
                staging.write(Path::new("assets").join(filename), content)?;
            }
        }
        self.write_summaries(&mut staging, &bundle.nav)?;

        // never wipe the site root itself
        staging.commit(self.directory.file_name().is_some())
    }
}

// -------------------------------------------------------------------------------------------------
