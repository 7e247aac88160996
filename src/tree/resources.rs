use std::hash::Hash;

use itertools::Itertools;
use serde::Serialize;

// -------------------------------------------------------------------------------------------------

/// A style sheet required by a page: either a remote link or inline CSS which gets written
/// to the output as a separate file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stylesheet {
    Link { url: String },
    Inline { filename: String, content: String },
}

impl Stylesheet {
    pub fn link(url: impl Into<String>) -> Self {
        Self::Link { url: url.into() }
    }

    pub fn inline(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Inline {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Where the code of a [`Script`] comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptSource {
    Link { url: String },
    File { filename: String, content: String },
}

/// A script required by a page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Script {
    pub source: ScriptSource,
    pub defer: bool,
    pub is_async: bool,
}

impl Script {
    pub fn link(url: impl Into<String>) -> Self {
        Self {
            source: ScriptSource::Link { url: url.into() },
            defer: false,
            is_async: false,
        }
    }

    pub fn file(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: ScriptSource::File {
                filename: filename.into(),
                content: content.into(),
            },
            defer: false,
            is_async: false,
        }
    }

    pub fn deferred(mut self) -> Self {
        self.defer = true;
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// Static resources (style sheets, scripts and markup extensions) needed by a page or a
/// whole site. Entries are unique and keep the order in which they were first added.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Resources {
    pub css: Vec<Stylesheet>,
    pub js: Vec<Script>,
    pub extensions: Vec<String>,
}

impl Resources {
    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.js.is_empty() && self.extensions.is_empty()
    }

    pub fn add_css(&mut self, css: Stylesheet) -> &mut Self {
        merge_unique(&mut self.css, [css]);
        self
    }

    pub fn add_js(&mut self, js: Script) -> &mut Self {
        merge_unique(&mut self.js, [js]);
        self
    }

    pub fn add_extension(&mut self, name: impl Into<String>) -> &mut Self {
        merge_unique(&mut self.extensions, [name.into()]);
        self
    }

    /// Append all resources of `other` which are not yet present.
    pub fn merge(&mut self, other: &Resources) {
        merge_unique(&mut self.css, other.css.iter().cloned());
        merge_unique(&mut self.js, other.js.iter().cloned());
        merge_unique(&mut self.extensions, other.extensions.iter().cloned());
    }
}

fn merge_unique<T, I>(target: &mut Vec<T>, items: I)
where
    T: Clone + Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let merged = std::mem::take(target)
        .into_iter()
        .chain(items)
        .unique()
        .collect();
    *target = merged;
}

// -------------------------------------------------------------------------------------------------
