use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use toml::{Table, Value};

use crate::error::Error;

// -------------------------------------------------------------------------------------------------

/// The kind of package manifest a project got described with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    #[default]
    Cargo,
    Python,
    Node,
}

impl ManifestKind {
    /// Manifest file names, in discovery order.
    const FILE_NAMES: [(&'static str, ManifestKind); 3] = [
        ("Cargo.toml", ManifestKind::Cargo),
        ("pyproject.toml", ManifestKind::Python),
        ("package.json", ManifestKind::Node),
    ];

    fn from_file_name(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy();
        Self::FILE_NAMES
            .iter()
            .find(|(name, _)| file_name.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
    }
}

/// Distribution metadata of the documented package.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    pub kind: ManifestKind,
    pub name: String,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    pub license: String,
    pub repository_url: Option<String>,
    pub homepage: Option<String>,
    pub keywords: Vec<String>,
    pub dependencies: Vec<String>,
    /// True when the package provides a command line executable.
    pub has_cli: bool,
}

// -------------------------------------------------------------------------------------------------

/// Locate and parse the package manifest of the project at `root`.
///
/// When no explicit manifest path is given, `Cargo.toml`, `pyproject.toml` and `package.json`
/// are tried in this order.
pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<PackageMetadata, Error> {
    let (path, kind) = match explicit {
        Some(path) => {
            let path = root.join(path);
            let kind = ManifestKind::from_file_name(&path).ok_or_else(|| {
                Error::config(format!(
                    "unsupported package manifest: `{}`",
                    path.display()
                ))
            })?;
            if !path.is_file() {
                return Err(Error::config(format!(
                    "package manifest does not exist: `{}`",
                    path.display()
                )));
            }
            (path, kind)
        }
        None => ManifestKind::FILE_NAMES
            .iter()
            .map(|(name, kind)| (root.join(name), *kind))
            .find(|(path, _)| path.is_file())
            .ok_or_else(|| {
                Error::config(format!(
                    "no package manifest (Cargo.toml, pyproject.toml or package.json) found in `{}`",
                    root.display()
                ))
            })?,
    };
    tracing::debug!("Reading package manifest '{}'", path.display());
    let content = fs::read_to_string(&path)?;
    let mut metadata = match kind {
        ManifestKind::Cargo => parse_cargo(&content),
        ManifestKind::Python => parse_pyproject(&content),
        ManifestKind::Node => parse_package_json(&content),
    }
    .map_err(|err| Error::config(format!("invalid manifest `{}`: {err}", path.display())))?;
    if kind == ManifestKind::Cargo && !metadata.has_cli {
        metadata.has_cli = root.join(PathBuf::from("src").join("main.rs")).is_file();
    }
    if metadata.name.is_empty() {
        return Err(Error::config(format!(
            "package manifest `{}` does not specify a package name",
            path.display()
        )));
    }
    Ok(metadata)
}

// -------------------------------------------------------------------------------------------------

pub(crate) fn parse_cargo(content: &str) -> Result<PackageMetadata, Error> {
    let manifest: Table = toml::from_str(content)?;
    let package = manifest.get("package").and_then(Value::as_table);
    let field = |key: &str| package.and_then(|p| toml_str(p, key));
    Ok(PackageMetadata {
        kind: ManifestKind::Cargo,
        name: field("name").unwrap_or_default(),
        version: field("version").unwrap_or_default(),
        description: field("description").unwrap_or_default(),
        authors: package
            .map(|p| toml_str_list(p, "authors"))
            .unwrap_or_default(),
        license: field("license").unwrap_or_default(),
        repository_url: field("repository"),
        homepage: field("homepage"),
        keywords: package
            .map(|p| toml_str_list(p, "keywords"))
            .unwrap_or_default(),
        dependencies: manifest
            .get("dependencies")
            .and_then(Value::as_table)
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default(),
        has_cli: manifest.contains_key("bin"),
    })
}

pub(crate) fn parse_pyproject(content: &str) -> Result<PackageMetadata, Error> {
    let manifest: Table = toml::from_str(content)?;
    let project = manifest.get("project").and_then(Value::as_table);
    let field = |key: &str| project.and_then(|p| toml_str(p, key));
    let urls = project
        .and_then(|p| p.get("urls"))
        .and_then(Value::as_table);
    let url = |keys: &[&str]| {
        urls.and_then(|urls| keys.iter().find_map(|key| toml_str(urls, key)))
    };
    let license = project
        .and_then(|p| p.get("license"))
        .and_then(|license| match license {
            Value::String(text) => Some(text.clone()),
            Value::Table(table) => toml_str(table, "text"),
            _ => None,
        });
    Ok(PackageMetadata {
        kind: ManifestKind::Python,
        name: field("name").unwrap_or_default(),
        version: field("version").unwrap_or_default(),
        description: field("description").unwrap_or_default(),
        authors: project
            .and_then(|p| p.get("authors"))
            .and_then(Value::as_array)
            .map(|authors| {
                authors
                    .iter()
                    .filter_map(Value::as_table)
                    .filter_map(|author| toml_str(author, "name"))
                    .collect()
            })
            .unwrap_or_default(),
        license: license.unwrap_or_default(),
        repository_url: url(&["Repository", "repository", "Source", "source"]),
        homepage: url(&["Homepage", "homepage", "Documentation", "documentation"]),
        keywords: project
            .map(|p| toml_str_list(p, "keywords"))
            .unwrap_or_default(),
        dependencies: project
            .map(|p| toml_str_list(p, "dependencies"))
            .unwrap_or_default()
            .iter()
            .map(|requirement| requirement_name(requirement))
            .collect(),
        has_cli: project.is_some_and(|p| p.contains_key("scripts")),
    })
}

pub(crate) fn parse_package_json(content: &str) -> Result<PackageMetadata, Error> {
    use serde_json::Value;

    let manifest: Value = serde_json::from_str(content)?;
    let field = |key: &str| manifest.get(key).and_then(Value::as_str).map(String::from);
    // some fields are either plain strings or objects with a name/url key
    let nested = |key: &str, sub_key: &str| match manifest.get(key) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Object(object)) => object
            .get(sub_key)
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    };
    let keys = |key: &str| {
        manifest
            .get(key)
            .and_then(Value::as_object)
            .map(|object| object.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default()
    };
    Ok(PackageMetadata {
        kind: ManifestKind::Node,
        name: field("name").unwrap_or_default(),
        version: field("version").unwrap_or_default(),
        description: field("description").unwrap_or_default(),
        authors: nested("author", "name").into_iter().collect(),
        license: field("license").unwrap_or_default(),
        repository_url: nested("repository", "url")
            .map(|url| url.trim_start_matches("git+").to_string()),
        homepage: field("homepage"),
        keywords: manifest
            .get("keywords")
            .and_then(Value::as_array)
            .map(|keywords| {
                keywords
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        dependencies: keys("dependencies"),
        has_cli: manifest.get("bin").is_some(),
    })
}

// -------------------------------------------------------------------------------------------------

// string value of a key. workspace inherited values (`version.workspace = true`) are skipped
fn toml_str(table: &Table, key: &str) -> Option<String> {
    table.get(key).and_then(Value::as_str).map(String::from)
}

fn toml_str_list(table: &Table, key: &str) -> Vec<String> {
    table
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

// "requests[socks]>=2.0; python_version > '3'" -> "requests"
fn requirement_name(requirement: &str) -> String {
    requirement
        .split(|c: char| "<>=!~;[ (".contains(c))
        .next()
        .unwrap_or(requirement)
        .trim()
        .to_string()
}

// -------------------------------------------------------------------------------------------------
