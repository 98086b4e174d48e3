use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use notesite_config::{Config, ConfigError, ConfigSourceKind, LoadOptions, Pattern};
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create config");
    file.write_all(contents.as_bytes()).expect("write config");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

fn pattern_strings<'a, I>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Pattern>,
{
    patterns
        .into_iter()
        .map(|p| p.original().to_string())
        .collect()
}

#[test]
fn loads_defaults_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let config = Config::load(LoadOptions::default().with_working_dir(working_dir.clone()))
        .expect("load defaults");

    assert_eq!(config.site.title, "Notes");
    assert_eq!(config.site.root, working_dir);
    assert_eq!(config.site.output, working_dir.join("public"));
    assert!(!config.site.include_drafts);
    assert_eq!(
        pattern_strings(config.content.include.iter()),
        vec!["**/*.md".to_string()]
    );
    assert_eq!(
        pattern_strings(config.content.exclude.iter()),
        vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()]
    );
    assert_eq!(config.content.assets, PathBuf::from("assets"));

    assert_eq!(config.sources.layers.len(), 1);
    assert_eq!(config.sources.layers[0].kind, ConfigSourceKind::Default);
}

#[test]
fn applies_precedence_and_merges_fields() {
    let temp = TempDir::new().expect("tempdir");
    let git_root = canonical(temp.path());
    fs::create_dir(git_root.join(".git")).expect("create .git");

    write_file(
        git_root.join(".notesite.toml"),
        r#"
        [site]
        title = "Garden"
        output = "dist"

        [content]
        exclude = ["**/drafts/**"]
        "#,
    );

    let working_dir = git_root.join("notes");
    fs::create_dir(&working_dir).expect("create working dir");
    write_file(
        working_dir.join(".notesite.toml"),
        r#"
        [site]
        output = "out"
        include_drafts = true
        "#,
    );

    let config = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect("load layered config");

    // Git-root values survive unless the local layer overrides them.
    assert_eq!(config.site.title, "Garden");
    assert_eq!(config.site.output, config.site.root.join("out"));
    assert!(config.site.include_drafts);
    assert_eq!(
        pattern_strings(config.content.exclude.iter()),
        vec!["**/drafts/**".to_string()]
    );

    let kinds: Vec<ConfigSourceKind> = config
        .sources
        .layers
        .iter()
        .map(|layer| layer.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ConfigSourceKind::Default,
            ConfigSourceKind::GitRoot,
            ConfigSourceKind::Local
        ]
    );
}

#[test]
fn override_path_takes_highest_precedence() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    write_file(
        working_dir.join(".notesite.toml"),
        r#"
        [site]
        title = "Local"
        "#,
    );
    write_file(
        working_dir.join("special.toml"),
        r#"
        [site]
        title = "Override"
        "#,
    );

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(&working_dir)
            .with_override_path(working_dir.join("special.toml")),
    )
    .expect("load with override");

    assert_eq!(config.site.title, "Override");
    assert_eq!(
        config.sources.layers.last().map(|layer| layer.kind),
        Some(ConfigSourceKind::Override)
    );
}

#[test]
fn missing_override_is_an_error() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let result = Config::load(
        LoadOptions::default()
            .with_working_dir(&working_dir)
            .with_override_path(working_dir.join("absent.toml")),
    );

    assert!(matches!(result, Err(ConfigError::OverrideNotFound { .. })));
}

#[test]
fn invalid_globs_are_collected_into_validation_errors() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    write_file(
        working_dir.join(".notesite.toml"),
        r#"
        [content]
        include = ["[unclosed"]
        exclude = ["[also-unclosed"]
        "#,
    );

    let result = Config::load(LoadOptions::default().with_working_dir(&working_dir));

    match result {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.0.len(), 2);
            assert!(errors.0[0].message.contains("invalid glob pattern"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn output_must_differ_from_root() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    write_file(
        working_dir.join(".notesite.toml"),
        r#"
        [site]
        output = "."
        "#,
    );

    let result = Config::load(LoadOptions::default().with_working_dir(&working_dir));
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}
