//! Content store for the notesite builder.
//!
//! The store walks the configured vault root, splits YAML front matter from
//! Markdown bodies, derives stable slugs, and exposes the resulting document
//! set behind case-insensitive title/slug lookups. Malformed documents are
//! reported as issues without aborting the scan.

mod document;
mod front_matter;
mod slug;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use notesite_config::Config;
use thiserror::Error;

pub use document::Document;
pub use front_matter::{split_front_matter, FrontMatter, FrontMatterBlock};
pub use slug::slugify;

/// Errors that abort a store scan entirely. Per-document problems are
/// reported through [`StoreIssue`] instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content root {path} is not a directory")]
    RootNotFound { path: PathBuf },
}

/// Non-fatal problem discovered while scanning the vault.
#[derive(Clone, Debug)]
pub enum StoreIssue {
    /// Front matter failed to parse; the document is skipped.
    FrontMatter { path: PathBuf, message: String },
    /// The file could not be read (permissions, invalid UTF-8); the
    /// document is skipped.
    Read { path: PathBuf, message: String },
    /// Two documents derived the same slug; the first (in sorted path
    /// order) wins and the second is skipped.
    DuplicateSlug {
        slug: String,
        kept: PathBuf,
        skipped: PathBuf,
    },
    /// The directory walker could not visit an entry.
    Walk { message: String },
}

impl StoreIssue {
    /// Path of the affected document, when one exists.
    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreIssue::FrontMatter { path, .. } => Some(path),
            StoreIssue::Read { path, .. } => Some(path),
            StoreIssue::DuplicateSlug { skipped, .. } => Some(skipped),
            StoreIssue::Walk { .. } => None,
        }
    }
}

impl std::fmt::Display for StoreIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreIssue::FrontMatter { path, message } => {
                write!(f, "{}: invalid front matter: {message}", path.display())
            }
            StoreIssue::Read { path, message } => {
                write!(f, "{}: unreadable: {message}", path.display())
            }
            StoreIssue::DuplicateSlug {
                slug,
                kept,
                skipped,
            } => write!(
                f,
                "{}: duplicate slug '{slug}' (kept {})",
                skipped.display(),
                kept.display()
            ),
            StoreIssue::Walk { message } => write!(f, "scan: {message}"),
        }
    }
}

/// Result of a vault scan: the document set plus any issues encountered.
pub struct ScanOutcome {
    pub store: Store,
    pub issues: Vec<StoreIssue>,
}

/// In-memory document set with slug and title indices.
pub struct Store {
    root: PathBuf,
    documents: Vec<Document>,
    by_slug: HashMap<String, usize>,
    by_title: HashMap<String, usize>,
}

impl Store {
    /// Walk the configured root and build the document set. Documents are
    /// visited in sorted relative-path order so slug conflicts resolve
    /// deterministically.
    pub fn scan(config: &Config) -> Result<ScanOutcome, StoreError> {
        let root = config.site.root.clone();
        if !root.is_dir() {
            return Err(StoreError::RootNotFound { path: root });
        }

        let mut issues = Vec::new();
        let mut paths = Vec::new();

        let walker = WalkBuilder::new(&root).hidden(true).build();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    issues.push(StoreIssue::Walk {
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let relative = match entry.path().strip_prefix(&root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };

            if !in_scope(config, &relative) {
                continue;
            }

            paths.push(relative);
        }

        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for relative in paths {
            let absolute = root.join(&relative);
            let contents = match std::fs::read_to_string(&absolute) {
                Ok(contents) => contents,
                Err(source) => {
                    issues.push(StoreIssue::Read {
                        path: relative,
                        message: source.to_string(),
                    });
                    continue;
                }
            };

            match Document::parse(relative.clone(), absolute, &contents) {
                Ok(document) => documents.push(document),
                Err(message) => issues.push(StoreIssue::FrontMatter {
                    path: relative,
                    message,
                }),
            }
        }

        let store = Store::assemble(root, documents, &mut issues);
        Ok(ScanOutcome { store, issues })
    }

    /// Build a store from pre-parsed documents, reporting slug conflicts.
    /// First document wins for a contested slug.
    pub fn assemble(
        root: PathBuf,
        documents: Vec<Document>,
        issues: &mut Vec<StoreIssue>,
    ) -> Store {
        let mut kept: Vec<Document> = Vec::with_capacity(documents.len());
        let mut by_slug: HashMap<String, usize> = HashMap::new();

        for document in documents {
            if let Some(&existing) = by_slug.get(&document.slug) {
                issues.push(StoreIssue::DuplicateSlug {
                    slug: document.slug.clone(),
                    kept: kept[existing].relative_path.clone(),
                    skipped: document.relative_path.clone(),
                });
                continue;
            }
            by_slug.insert(document.slug.clone(), kept.len());
            kept.push(document);
        }

        let mut by_title = HashMap::new();
        for (idx, document) in kept.iter().enumerate() {
            // First title claim wins, mirroring the slug rule.
            by_title.entry(document.title.to_lowercase()).or_insert(idx);
        }

        Store {
            root,
            documents: kept,
            by_slug,
            by_title,
        }
    }

    /// Vault root the store was scanned from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All documents in sorted relative-path order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Look up a document by its exact slug.
    pub fn get(&self, slug: &str) -> Option<&Document> {
        self.by_slug.get(slug).map(|&idx| &self.documents[idx])
    }

    /// Resolve a free-form reference case-insensitively against titles and
    /// slugs. Deterministic for fixed store contents.
    pub fn resolve(&self, reference: &str) -> Option<&Document> {
        let needle = reference.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(&idx) = self.by_title.get(&needle) {
            return Some(&self.documents[idx]);
        }
        if let Some(&idx) = self.by_slug.get(&needle) {
            return Some(&self.documents[idx]);
        }
        // Fall back to slugging the reference so `[[Kalman_Filter]]` still
        // finds the `kalman-filter` note.
        let slugged = slugify(&needle);
        self.by_slug.get(&slugged).map(|&idx| &self.documents[idx])
    }

    /// Documents eligible for publication. Drafts are excluded unless
    /// `include_drafts` is set.
    pub fn published(&self, include_drafts: bool) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .filter(move |document| include_drafts || !document.front_matter.draft)
    }

    /// All tags across the document set with the slugs carrying each tag,
    /// both in sorted order.
    pub fn tag_index(&self, include_drafts: bool) -> Vec<(String, Vec<String>)> {
        let mut tags: HashMap<String, Vec<String>> = HashMap::new();
        for document in self.published(include_drafts) {
            for tag in &document.front_matter.tags {
                tags.entry(tag.clone()).or_default().push(document.slug.clone());
            }
        }
        let mut index: Vec<_> = tags.into_iter().collect();
        index.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, slugs) in &mut index {
            slugs.sort();
        }
        index
    }
}

fn in_scope(config: &Config, relative: &Path) -> bool {
    if config.content.exclude.matches(relative) {
        return false;
    }
    if !config.content.include.is_empty() && !config.content.include.matches(relative) {
        return false;
    }
    true
}
