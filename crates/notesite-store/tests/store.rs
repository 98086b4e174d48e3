use std::path::Path;

use notesite_config::{Config, LoadOptions};
use notesite_store::{Store, StoreIssue};
use tempfile::TempDir;

fn write_file(base: &TempDir, path: &str, contents: &str) {
    let absolute = base.path().join(path);
    if let Some(parent) = absolute.parent() {
        std::fs::create_dir_all(parent).expect("create parent directories");
    }
    std::fs::write(absolute, contents).expect("write fixture");
}

fn load_config(base: &TempDir) -> Config {
    Config::load(LoadOptions::default().with_working_dir(base.path())).expect("load config")
}

#[test]
fn scan_collects_documents_in_sorted_order() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "b-note.md", "---\ntitle: Second\n---\nTwo.\n");
    write_file(&temp, "a-note.md", "---\ntitle: First\n---\nOne.\n");
    write_file(&temp, "nested/c-note.md", "Three.\n");

    let outcome = Store::scan(&load_config(&temp)).expect("scan");
    assert!(outcome.issues.is_empty());

    let paths: Vec<_> = outcome
        .store
        .documents()
        .iter()
        .map(|doc| doc.relative_path.clone())
        .collect();
    assert_eq!(
        paths,
        vec![
            Path::new("a-note.md").to_path_buf(),
            Path::new("b-note.md").to_path_buf(),
            Path::new("nested/c-note.md").to_path_buf()
        ]
    );
}

#[test]
fn malformed_front_matter_skips_only_that_document() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "good.md", "---\ntitle: Good\n---\nFine.\n");
    write_file(&temp, "bad.md", "---\ntitle: [unterminated\n---\nBody.\n");

    let outcome = Store::scan(&load_config(&temp)).expect("scan");

    assert_eq!(outcome.store.len(), 1);
    assert!(outcome.store.get("good").is_some());
    assert_eq!(outcome.issues.len(), 1);
    assert!(matches!(
        &outcome.issues[0],
        StoreIssue::FrontMatter { path, .. } if path == Path::new("bad.md")
    ));
}

#[test]
fn unreadable_files_skip_only_that_document() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "good.md", "---\ntitle: Good\n---\nFine.\n");
    std::fs::write(temp.path().join("binary.md"), b"\xff\xfe not utf-8").expect("write fixture");

    let outcome = Store::scan(&load_config(&temp)).expect("scan");

    assert_eq!(outcome.store.len(), 1);
    assert!(outcome.store.get("good").is_some());
    assert!(matches!(
        &outcome.issues[0],
        StoreIssue::Read { path, .. } if path == Path::new("binary.md")
    ));
}

#[test]
fn duplicate_slugs_keep_first_in_path_order() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "alpha.md", "---\ntitle: Same Name\n---\nA.\n");
    write_file(&temp, "beta.md", "---\ntitle: Same Name\n---\nB.\n");

    let outcome = Store::scan(&load_config(&temp)).expect("scan");

    assert_eq!(outcome.store.len(), 1);
    let kept = outcome.store.get("same-name").expect("winner present");
    assert_eq!(kept.relative_path, Path::new("alpha.md"));

    assert!(matches!(
        &outcome.issues[0],
        StoreIssue::DuplicateSlug { slug, kept, skipped }
            if slug == "same-name"
                && kept == Path::new("alpha.md")
                && skipped == Path::new("beta.md")
    ));
}

#[test]
fn resolve_is_case_insensitive_over_titles_and_slugs() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "kf.md", "---\ntitle: Kalman Filter\n---\nMath.\n");
    write_file(&temp, "resume.md", "See [[Kalman Filter]].\n");

    let outcome = Store::scan(&load_config(&temp)).expect("scan");
    let store = &outcome.store;

    for reference in ["Kalman Filter", "kalman filter", "KALMAN-FILTER", "Kalman_Filter"] {
        let doc = store.resolve(reference).expect(reference);
        assert_eq!(doc.slug, "kalman-filter");
    }
    assert!(store.resolve("TCP").is_none());
}

#[test]
fn drafts_are_filtered_from_the_published_set() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "live.md", "---\ntitle: Live\n---\nx\n");
    write_file(&temp, "wip.md", "---\ntitle: WIP\ndraft: true\n---\nx\n");

    let outcome = Store::scan(&load_config(&temp)).expect("scan");

    let default_set: Vec<_> = outcome
        .store
        .published(false)
        .map(|doc| doc.slug.clone())
        .collect();
    assert_eq!(default_set, vec!["live"]);

    let with_drafts: Vec<_> = outcome
        .store
        .published(true)
        .map(|doc| doc.slug.clone())
        .collect();
    assert_eq!(with_drafts, vec!["live", "wip"]);
}

#[test]
fn exclude_patterns_remove_files_from_scope() {
    let temp = TempDir::new().expect("tempdir");
    write_file(
        &temp,
        ".notesite.toml",
        "[content]\nexclude = [\"private/**\"]\n",
    );
    write_file(&temp, "public-note.md", "visible\n");
    write_file(&temp, "private/secret.md", "hidden\n");

    let outcome = Store::scan(&load_config(&temp)).expect("scan");
    assert_eq!(outcome.store.len(), 1);
    assert!(outcome.store.get("public-note").is_some());
}

#[test]
fn tag_index_groups_published_documents() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "a.md", "---\ntitle: A\ntags: [math]\n---\nx\n");
    write_file(&temp, "b.md", "---\ntitle: B\ntags: [math, prose]\n---\nx\n");
    write_file(
        &temp,
        "c.md",
        "---\ntitle: C\ntags: [math]\ndraft: true\n---\nx\n",
    );

    let outcome = Store::scan(&load_config(&temp)).expect("scan");
    let index = outcome.store.tag_index(false);

    assert_eq!(
        index,
        vec![
            ("math".to_owned(), vec!["a".to_owned(), "b".to_owned()]),
            ("prose".to_owned(), vec!["b".to_owned()]),
        ]
    );
}
