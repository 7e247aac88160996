use std::{
    fs,
    path::{Path, PathBuf},
};

use nodebook::{
    create_config, generate_site, inspect, BuildError, Context, Error, Kwargs, Nav, NavItem,
    Options, Routines, TemplateEnv,
};

// -------------------------------------------------------------------------------------------------

/// A scratch project with a manifest, a readme and a config file.
struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new(plugins: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir_all(&repo).unwrap();
        fs::write(
            repo.join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"1.2.3\"\ndescription = \"A demo crate\"\n",
        )
        .unwrap();
        fs::write(repo.join("README.md"), "# Demo\n\nHello {{ world }}\n").unwrap();
        fs::write(
            dir.path().join("nodebook.yml"),
            format!(
                "site_dir: '{}'\nplugins:\n  - nodebook:\n      repo_path: '{}'\n{plugins}",
                dir.path().join("site").display(),
                repo.display()
            ),
        )
        .unwrap();
        Self { dir }
    }

    fn options(&self) -> Options {
        Options {
            config_path: Some(self.dir.path().join("nodebook.yml")),
            offline: true,
            ..Options::default()
        }
    }

    fn site(&self) -> PathBuf {
        self.dir.path().join("site")
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    names
}

fn failing(_: &Context, _: &TemplateEnv, _: &Kwargs) -> Result<Nav, BuildError> {
    Err(BuildError::new("no pages for you"))
}

// -------------------------------------------------------------------------------------------------

#[test]
fn default_routine_without_pages_writes_a_single_index() {
    let project = Project::new("      build_fn: default\n  - markdown:\n");
    let report = generate_site(&project.options(), &Routines::default()).unwrap();
    assert_eq!(report.pages, 0);
    assert_eq!(report.backends, vec!["markdown"]);
    let markdown = project.site().join("markdown");
    assert_eq!(file_names(&markdown), vec!["SUMMARY.md"]);
    assert_eq!(
        fs::read_to_string(markdown.join("SUMMARY.md")).unwrap(),
        "# demo\n"
    );
}

#[test]
fn failing_routine_writes_nothing() {
    let project = Project::new("      build_fn: failing\n  - markdown:\n  - mdbook:\n");
    let mut routines = Routines::default();
    routines.register("failing", failing);
    match generate_site(&project.options(), &routines) {
        Err(Error::Build {
            location, message, ..
        }) => {
            assert_eq!(message, "no pages for you");
            assert!(location.file.ends_with("pipeline.rs"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!project.site().exists());
}

#[test]
fn website_as_mdbook() {
    let project = Project::new(
        "      build_fn: website\n      kwargs:\n        pages:\n          - title: Usage\n            content: 'Use {{ metadata.name }} {{ metadata.version }}'\n  - mdbook:\n",
    );
    let report = generate_site(&project.options(), &Routines::default()).unwrap();
    assert_eq!(report.backends, vec!["mdbook"]);

    let book = project.site().join("book");
    assert_eq!(file_names(&book), vec!["book.toml", "src"]);
    let index = fs::read_to_string(book.join("src/index.md")).unwrap();
    assert!(index.contains("Hello {{ world }}"));
    assert_eq!(
        fs::read_to_string(book.join("src/usage.md")).unwrap(),
        "Use demo 1.2.3"
    );
    let summary = fs::read_to_string(book.join("src/SUMMARY.md")).unwrap();
    assert!(summary.contains("[demo](index.md)"));
    assert!(summary.contains("- [Usage](usage.md)"));
    let config = fs::read_to_string(book.join("book.toml")).unwrap();
    assert!(config.contains("title = \"demo\""));
    assert!(config.contains("description = \"A demo crate\""));
}

#[test]
fn failing_backend_does_not_stop_the_others() {
    let project = Project::new("  - mdbook:\n  - markdown:\n");
    let src = project.site().join("book/src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("SUMMARY.md"), "# Summary\n\n- [Manual](manual.md)\n").unwrap();

    match generate_site(&project.options(), &Routines::default()) {
        Err(Error::Backends(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(&errors[0], Error::Write { backend, .. } if backend == "mdbook"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(file_names(&src), vec!["SUMMARY.md"]);
    assert!(project.site().join("markdown/SUMMARY.md").exists());
}

#[test]
fn inspect_and_create_config_write_nothing() {
    let project = Project::new("      build_fn: website\n  - mdbook:\n");
    let info = inspect(&project.options(), &Routines::default()).unwrap();
    assert_eq!(info.context.metadata.name, "demo");
    assert!(matches!(&info.bundle.nav, NavItem::Section { index: Some(index), .. }
        if index == "index.md"));
    assert!(serde_json::to_string(&info).is_ok());

    let config = create_config(&project.options(), &Routines::default()).unwrap();
    assert!(config.contains("[book]"));
    assert!(config.contains("title = \"demo\""));
    assert!(!project.site().exists());
}

#[test]
fn invalid_config_is_reported_before_any_write() {
    let project = Project::new("  - search:\n");
    let result = generate_site(&project.options(), &Routines::default());
    assert!(matches!(result, Err(Error::Config(_))));
    assert!(!project.site().exists());
}

#[test]
fn included_files_are_not_rendered() {
    let project = Project::new(
        "      kwargs:\n        pages:\n          - title: Readme\n            include: README.md\n  - markdown:\n",
    );
    generate_site(&project.options(), &Routines::default()).unwrap();
    assert_eq!(
        fs::read_to_string(project.site().join("markdown/readme.md")).unwrap(),
        "# Demo\n\nHello {{ world }}"
    );
}

#[test]
fn failed_rebuild_keeps_the_previous_site() {
    let project = Project::new("      kwargs:\n        pages:\n          - title: Intro\n  - markdown:\n");
    generate_site(&project.options(), &Routines::default()).unwrap();
    let markdown = project.site().join("markdown");
    assert_eq!(file_names(&markdown), vec!["SUMMARY.md", "intro.md"]);

    let config = project.dir.path().join("nodebook.yml");
    let duplicated = fs::read_to_string(&config)
        .unwrap()
        .replace("- title: Intro\n", "- title: Intro\n          - title: intro\n");
    fs::write(&config, duplicated).unwrap();
    match generate_site(&project.options(), &Routines::default()) {
        Err(Error::Build { stage, .. }) => assert_eq!(stage, "collecting `intro.md`"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(file_names(&markdown), vec!["SUMMARY.md", "intro.md"]);
    assert_eq!(file_names(&project.site()), vec!["markdown"]);
}

#[test]
fn website_pages_link_to_repository_files_only() {
    let project = Project::new(
        "      build_fn: website\n  - mdbook:\n      edit_links: true\nsite:\n  repository_url: 'https://github.com/example/demo'\n",
    );
    generate_site(&project.options(), &Routines::default()).unwrap();
    let index = fs::read_to_string(project.site().join("book/src/index.md")).unwrap();
    assert!(index.contains("Hello {{ world }}"));
    assert!(!index.contains("Edit this page"));
}
