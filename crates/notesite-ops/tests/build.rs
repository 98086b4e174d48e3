use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use notesite_config::{Config, LoadOptions};
use notesite_ops::{BuildOptions, Operations};
use tempfile::TempDir;

fn write_file(base: &TempDir, path: &str, contents: &str) {
    let absolute = base.path().join(path);
    if let Some(parent) = absolute.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(absolute, contents).expect("write fixture");
}

fn operations(temp: &TempDir) -> Operations {
    let config =
        Config::load(LoadOptions::default().with_working_dir(temp.path())).expect("load config");
    Operations::new(config)
}

fn snapshot_output(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current).expect("read output dir") {
            let entry = entry.expect("dir entry");
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let relative = path
                    .strip_prefix(dir)
                    .expect("relative")
                    .to_string_lossy()
                    .into_owned();
                files.insert(relative, fs::read(&path).expect("read file"));
            }
        }
    }
    files
}

#[test]
fn build_writes_pages_and_index() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "kf.md", "---\ntitle: Kalman Filter\n---\nNotes.\n");
    write_file(
        &temp,
        "resume.md",
        "---\ntitle: Resume\n---\nSee [[Kalman Filter]].\n",
    );

    let ops = operations(&temp);
    let outcome = ops.build(BuildOptions::default()).expect("build");

    assert_eq!(outcome.exit_code, 0);
    let out = temp.path().join("public");
    assert!(out.join("kalman-filter.html").is_file());
    assert!(out.join("resume.html").is_file());
    assert!(out.join("index.html").is_file());

    let resume = fs::read_to_string(out.join("resume.html")).expect("read resume");
    assert!(resume.contains("href=\"kalman-filter.html\""));
}

#[test]
fn build_is_idempotent_byte_for_byte() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "assets/pic.png", "png-bytes");
    write_file(
        &temp,
        "note.md",
        "---\ntitle: Note\ntags: [t]\n---\n![[pic.png]]\n[[Elsewhere]]\n$x$\n",
    );
    write_file(&temp, "other.md", "---\ntitle: Elsewhere\n---\n.\n");

    let ops = operations(&temp);
    ops.build(BuildOptions::default()).expect("first build");
    let first = snapshot_output(&temp.path().join("public"));

    ops.build(BuildOptions::default()).expect("second build");
    let second = snapshot_output(&temp.path().join("public"));

    assert_eq!(first, second);
}

#[test]
fn drafts_are_excluded_unless_requested() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "live.md", "---\ntitle: Live\n---\n.\n");
    write_file(&temp, "wip.md", "---\ntitle: WIP\ndraft: true\n---\n.\n");

    let ops = operations(&temp);

    ops.build(BuildOptions::default()).expect("default build");
    let out = temp.path().join("public");
    assert!(out.join("live.html").is_file());
    assert!(!out.join("wip.html").exists());

    let drafts_out = temp.path().join("with-drafts");
    ops.build(BuildOptions {
        output: Some(drafts_out.clone()),
        include_drafts: Some(true),
        ..BuildOptions::default()
    })
    .expect("draft build");
    assert!(drafts_out.join("wip.html").is_file());
}

#[test]
fn referenced_assets_are_copied_into_the_output() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "assets/chart.png", "png-bytes");
    write_file(&temp, "note.md", "---\ntitle: Note\n---\n![[chart.png]]\n");

    let ops = operations(&temp);
    let outcome = ops.build(BuildOptions::default()).expect("build");

    assert_eq!(outcome.assets_copied, 1);
    let copied = temp.path().join("public/assets/chart.png");
    assert_eq!(fs::read_to_string(copied).expect("read copy"), "png-bytes");
}

#[test]
fn strict_mode_fails_the_build_on_warnings() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "note.md", "---\ntitle: Note\n---\n[[Nowhere]]\n");

    let ops = operations(&temp);

    let relaxed = ops.build(BuildOptions::default()).expect("relaxed build");
    assert_eq!(relaxed.exit_code, 0);

    let strict = ops
        .build(BuildOptions {
            strict: true,
            ..BuildOptions::default()
        })
        .expect("strict build");
    assert_eq!(strict.exit_code, 1);
    assert!(temp.path().join("public/note.html").is_file());
}

#[test]
fn a_note_slugged_index_is_reported_as_a_conflict() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "idx.md", "---\ntitle: Index\n---\nMy own index.\n");
    write_file(&temp, "other.md", "---\ntitle: Other\n---\n.\n");

    let ops = operations(&temp);
    let outcome = ops.build(BuildOptions::default()).expect("build");

    assert_eq!(outcome.exit_code, 0);
    assert!(outcome
        .rendered
        .contains("slug 'index' collides with the generated site index page"));
}

#[test]
fn missing_assets_warn_but_do_not_fail_the_build() {
    let temp = TempDir::new().expect("tempdir");
    write_file(&temp, "note.md", "---\ntitle: Note\n---\n![[ghost.png]]\n");

    let ops = operations(&temp);
    let outcome = ops.build(BuildOptions::default()).expect("build");

    assert_eq!(outcome.exit_code, 0);
    assert!(outcome
        .rendered
        .contains("embedded asset 'ghost.png' not found"));
    assert!(temp.path().join("public/note.html").is_file());
}
