use crate::{collector::NavItem, error::Error};

// -------------------------------------------------------------------------------------------------

pub(crate) const TOC_START: &str = "<!-- NODEBOOK TOC START -->";
pub(crate) const TOC_END: &str = "<!-- NODEBOOK TOC END -->";

/// A single link of a table of contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TocEntry {
    pub level: usize,
    pub title: String,
    /// Link target. Empty for sections without an index page.
    pub link: String,
}

impl TocEntry {
    pub fn line(&self) -> String {
        format!(
            "{}- [{}]({})",
            "  ".repeat(self.level),
            escape_title(&self.title),
            self.link
        )
    }
}

/// Flatten a navigation section into TOC entries, in navigation order. Links are relative to
/// the section's directory and use the given page file extension.
pub(crate) fn toc_entries(section: &NavItem, extension: &str) -> Vec<TocEntry> {
    let mut entries = vec![];
    if let NavItem::Section { dir, children, .. } = section {
        for child in children {
            push_entries(&mut entries, child, dir, extension, 0);
        }
    }
    entries
}

fn push_entries(
    entries: &mut Vec<TocEntry>,
    item: &NavItem,
    base_dir: &str,
    extension: &str,
    level: usize,
) {
    match item {
        NavItem::Page { title, path } => entries.push(TocEntry {
            level,
            title: title.clone(),
            link: relative_link(path, base_dir, extension),
        }),
        NavItem::Section {
            title,
            index,
            children,
            ..
        } => {
            entries.push(TocEntry {
                level,
                title: title.clone(),
                link: index
                    .as_deref()
                    .map(|path| relative_link(path, base_dir, extension))
                    .unwrap_or_default(),
            });
            for child in children {
                push_entries(entries, child, base_dir, extension, level + 1);
            }
        }
    }
}

/// Link to a page `path` (relative to the site root) from within `base_dir`.
pub(crate) fn relative_link(path: &str, base_dir: &str, extension: &str) -> String {
    let path = with_extension(path, extension);
    if base_dir.is_empty() {
        path
    } else {
        match path.strip_prefix(&format!("{base_dir}/")) {
            Some(relative) => relative.to_string(),
            None => path,
        }
    }
}

/// Replace the `.md` extension of a page path.
pub(crate) fn with_extension(path: &str, extension: &str) -> String {
    let stem = path.strip_suffix(".md").unwrap_or(path);
    format!("{stem}{extension}")
}

fn escape_title(title: &str) -> String {
    title.replace('[', "\\[").replace(']', "\\]")
}

// -------------------------------------------------------------------------------------------------

/// Replace the lines between the TOC markers in `content` with `toc_lines`.
pub(crate) fn replace_toc(content: &str, toc_lines: &[String]) -> Result<String, Error> {
    let mut lines = content.lines().collect::<Vec<&str>>();
    let toc_start_line = lines
        .iter()
        .position(|line| line.contains(TOC_START))
        .ok_or_else(|| Error::Output(format!("failed to locate `{TOC_START}` line")))?;
    let toc_end_line = lines
        .iter()
        .position(|line| line.contains(TOC_END))
        .filter(|end| *end > toc_start_line)
        .ok_or_else(|| Error::Output(format!("failed to locate `{TOC_END}` line")))?;
    lines.splice(
        (toc_start_line + 1)..toc_end_line,
        toc_lines.iter().map(String::as_str),
    );
    let mut content = lines.join("\n");
    content.push('\n');
    Ok(content)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, path: &str) -> NavItem {
        NavItem::Page {
            title: title.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn entries_follow_nav_order() {
        let root = NavItem::Section {
            title: "Site".to_string(),
            dir: String::new(),
            index: Some("index.md".to_string()),
            children: vec![
                page("About [me]", "about.md"),
                NavItem::Section {
                    title: "Guide".to_string(),
                    dir: "guide".to_string(),
                    index: None,
                    children: vec![page("Install", "guide/install.md")],
                },
            ],
        };
        let lines = toc_entries(&root, ".md")
            .iter()
            .map(TocEntry::line)
            .collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "- [About \\[me\\]](about.md)",
                "- [Guide]()",
                "  - [Install](guide/install.md)",
            ]
        );
    }

    #[test]
    fn links_are_relative_to_the_section() {
        assert_eq!(relative_link("guide/install.md", "guide", ".txt"), "install.txt");
        assert_eq!(relative_link("guide/a/b.md", "guide", ".md"), "a/b.md");
        assert_eq!(relative_link("other.md", "guide", ".md"), "other.md");
    }

    #[test]
    fn replace_between_markers() {
        let content = format!("# Summary\n\n- [Intro](intro.md)\n{TOC_START}\n- old\n{TOC_END}\n");
        let replaced = replace_toc(&content, &["- new".to_string(), "- newer".to_string()]).unwrap();
        assert_eq!(
            replaced,
            format!("# Summary\n\n- [Intro](intro.md)\n{TOC_START}\n- new\n- newer\n{TOC_END}\n")
        );
        assert!(matches!(
            replace_toc("# Summary\n", &[]),
            Err(Error::Output(_))
        ));
    }
}
