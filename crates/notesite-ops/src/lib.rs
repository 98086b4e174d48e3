//! High-level operations behind the notesite CLI.
//!
//! Each operation runs the scan → resolve pipeline and produces an outcome
//! bundle carrying a rendered report and the exit code the CLI should
//! return. No condition short of an I/O failure aborts a run: problems are
//! collected as issues and the build completes best-effort.

mod issues;

use std::collections::BTreeMap;
use std::path::PathBuf;

use notesite_config::Config;
use notesite_graph::{Backlink, LinkGraph};
use notesite_render::{AssetCatalog, RenderedPage, Renderer};
use notesite_store::{ScanOutcome, Store, StoreError};
use notesite_utils::{atomic_write, parallel_map};
use serde_json::json;
use thiserror::Error;

pub use issues::{Issue, IssueKind, ReportFormat, Severity};

/// Errors that abort an operation outright.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    InvalidInput(String),
}

/// Options for the build operation.
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Override the configured output directory.
    pub output: Option<PathBuf>,
    /// Override the configured draft policy.
    pub include_drafts: Option<bool>,
    /// Treat warnings as findings for the exit code.
    pub strict: bool,
    pub format: ReportFormat,
}

/// Result of a completed build.
pub struct BuildOutcome {
    pub pages_written: Vec<PathBuf>,
    pub assets_copied: usize,
    pub issues: Vec<Issue>,
    pub rendered: String,
    pub exit_code: i32,
}

/// Options for the check operation.
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    pub include_drafts: Option<bool>,
    pub format: ReportFormat,
}

/// Result of a check run.
pub struct CheckOutcome {
    pub issues: Vec<Issue>,
    pub rendered: String,
    pub exit_code: i32,
}

/// Options for the backlinks query.
#[derive(Clone, Debug, Default)]
pub struct BacklinksOptions {
    /// Slug or title of the note to inspect.
    pub reference: String,
    pub format: ReportFormat,
}

/// Result of a backlinks query.
pub struct BacklinksOutcome {
    pub slug: String,
    pub title: String,
    pub rendered: String,
    pub exit_code: i32,
}

/// Operation bundle wired from configuration.
pub struct Operations {
    config: Config,
}

impl Operations {
    pub fn new(config: Config) -> Self {
        Operations { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render the whole site into the output directory.
    pub fn build(&self, options: BuildOptions) -> Result<BuildOutcome, OperationError> {
        let include_drafts = options
            .include_drafts
            .unwrap_or(self.config.site.include_drafts);
        let output_dir = options
            .output
            .unwrap_or_else(|| self.config.site.output.clone());

        let ScanOutcome { store, issues } = Store::scan(&self.config)?;
        let graph = LinkGraph::build(&store);
        let renderer = Renderer::from_config(&self.config);
        let catalog = AssetCatalog::from_config(&self.config);

        let mut all_issues: Vec<Issue> = issues.iter().map(Issue::from_store).collect();
        collect_link_issues(&store, &graph, include_drafts, &mut all_issues);
        collect_reserved_slug_issue(&store, include_drafts, &mut all_issues);

        let mut documents: Vec<_> = store.published(include_drafts).collect();
        documents.sort_by(|a, b| a.slug.cmp(&b.slug));

        let pages: Vec<RenderedPage> = parallel_map(documents, |document| {
            renderer.render_page(document, &store, &graph, &catalog)
        });

        let mut pages_written = Vec::with_capacity(pages.len() + 1);
        let mut pending_assets: BTreeMap<String, PathBuf> = BTreeMap::new();

        for page in &pages {
            let target = output_dir.join(&page.file_name);
            atomic_write(&target, &page.html).map_err(|source| OperationError::Io {
                path: target.clone(),
                source,
            })?;
            pages_written.push(target);

            for (name, source) in &page.assets {
                pending_assets.insert(name.clone(), source.clone());
            }
            for missing in &page.missing_assets {
                all_issues.push(Issue {
                    kind: IssueKind::MissingAsset,
                    severity: Severity::Warning,
                    path: store
                        .get(&page.slug)
                        .map(|doc| doc.relative_path.clone()),
                    line: Some(missing.line),
                    message: format!("embedded asset '{}' not found", missing.target),
                });
            }
        }

        let index_path = output_dir.join("index.html");
        let index_html = renderer.render_index(&store, include_drafts);
        atomic_write(&index_path, &index_html).map_err(|source| OperationError::Io {
            path: index_path.clone(),
            source,
        })?;
        pages_written.push(index_path);

        let assets_copied = copy_assets(&output_dir, &pending_assets)?;

        issues::sort_issues(&mut all_issues);
        let rendered = render_report(&all_issues, store.len(), options.format);
        let exit_code = exit_code_for(&all_issues, options.strict);

        Ok(BuildOutcome {
            pages_written,
            assets_copied,
            issues: all_issues,
            rendered,
            exit_code,
        })
    }

    /// Report issues without writing any output.
    pub fn check(&self, options: CheckOptions) -> Result<CheckOutcome, OperationError> {
        let include_drafts = options
            .include_drafts
            .unwrap_or(self.config.site.include_drafts);

        let ScanOutcome { store, issues } = Store::scan(&self.config)?;
        let graph = LinkGraph::build(&store);
        let catalog = AssetCatalog::from_config(&self.config);

        let mut all_issues: Vec<Issue> = issues.iter().map(Issue::from_store).collect();
        collect_link_issues(&store, &graph, include_drafts, &mut all_issues);
        collect_reserved_slug_issue(&store, include_drafts, &mut all_issues);

        for (source, link) in graph.embeds() {
            let document = match store.get(source) {
                Some(document) => document,
                None => continue,
            };
            if document.is_draft() && !include_drafts {
                continue;
            }
            if catalog.locate(&link.raw_target).is_none() {
                all_issues.push(Issue {
                    kind: IssueKind::MissingAsset,
                    severity: Severity::Warning,
                    path: Some(document.relative_path.clone()),
                    line: Some(link.line),
                    message: format!("embedded asset '{}' not found", link.raw_target),
                });
            }
        }

        issues::sort_issues(&mut all_issues);
        let rendered = render_report(&all_issues, store.len(), options.format);
        let exit_code = exit_code_for(&all_issues, false);

        Ok(CheckOutcome {
            issues: all_issues,
            rendered,
            exit_code,
        })
    }

    /// List inbound references for a note identified by slug or title.
    pub fn backlinks(&self, options: BacklinksOptions) -> Result<BacklinksOutcome, OperationError> {
        let ScanOutcome { store, .. } = Store::scan(&self.config)?;
        let graph = LinkGraph::build(&store);

        let document = store.resolve(&options.reference).ok_or_else(|| {
            OperationError::InvalidInput(format!("no note matches '{}'", options.reference))
        })?;

        let backlinks = graph.backlinks_to(&document.slug);
        let rendered = match options.format {
            ReportFormat::Plain => render_backlinks_plain(&store, document.slug.as_str(), backlinks),
            ReportFormat::Json => render_backlinks_json(&store, document.slug.as_str(), backlinks),
        };

        Ok(BacklinksOutcome {
            slug: document.slug.clone(),
            title: document.title.clone(),
            rendered,
            exit_code: 0,
        })
    }
}

fn collect_link_issues(
    store: &Store,
    graph: &LinkGraph,
    include_drafts: bool,
    issues: &mut Vec<Issue>,
) {
    for (source, link) in graph.unresolved() {
        let document = match store.get(source) {
            Some(document) => document,
            None => continue,
        };
        if document.is_draft() && !include_drafts {
            continue;
        }

        let mut message = format!("unresolved link '[[{}]]'", link.raw_target);
        if let Some(suggestion) = issues::suggest_title(store, &link.raw_target) {
            message.push_str(&format!(" (closest note: '{suggestion}')"));
        }

        issues.push(Issue {
            kind: IssueKind::UnresolvedLink,
            severity: Severity::Warning,
            path: Some(document.relative_path.clone()),
            line: Some(link.line),
            message,
        });
    }
}

// The site index claims `index.html`; a note whose title slugs to `index`
// would be overwritten by it.
fn collect_reserved_slug_issue(store: &Store, include_drafts: bool, issues: &mut Vec<Issue>) {
    let document = match store.get("index") {
        Some(document) => document,
        None => return,
    };
    if document.is_draft() && !include_drafts {
        return;
    }
    issues.push(Issue {
        kind: IssueKind::DuplicateSlug,
        severity: Severity::Warning,
        path: Some(document.relative_path.clone()),
        line: None,
        message: "slug 'index' collides with the generated site index page".to_owned(),
    });
}

fn copy_assets(
    output_dir: &std::path::Path,
    assets: &BTreeMap<String, PathBuf>,
) -> Result<usize, OperationError> {
    if assets.is_empty() {
        return Ok(0);
    }

    let asset_dir = output_dir.join("assets");
    std::fs::create_dir_all(&asset_dir).map_err(|source| OperationError::Io {
        path: asset_dir.clone(),
        source,
    })?;

    let mut copied = 0usize;
    for (name, source_path) in assets {
        let target = asset_dir.join(name);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| OperationError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::copy(source_path, &target).map_err(|source| OperationError::Io {
            path: target.clone(),
            source,
        })?;
        copied += 1;
    }

    Ok(copied)
}

fn render_report(issues: &[Issue], files_scanned: usize, format: ReportFormat) -> String {
    match format {
        ReportFormat::Plain => issues::render_plain(issues, files_scanned),
        ReportFormat::Json => issues::render_json(issues, files_scanned),
    }
}

fn exit_code_for(issues: &[Issue], strict: bool) -> i32 {
    if issues
        .iter()
        .any(|issue| strict || issue.severity == Severity::Error)
    {
        1
    } else {
        0
    }
}

fn render_backlinks_plain(store: &Store, slug: &str, backlinks: &[Backlink]) -> String {
    if backlinks.is_empty() {
        return format!("No backlinks to '{slug}'.\n");
    }

    let mut out = String::new();
    for backlink in backlinks {
        let path = store
            .get(&backlink.source)
            .map(|doc| doc.relative_path.display().to_string())
            .unwrap_or_else(|| backlink.source.clone());
        out.push_str(&format!(
            "{path}:{} -> {slug} | {}\n",
            backlink.line, backlink.label
        ));
    }
    out
}

fn render_backlinks_json(store: &Store, slug: &str, backlinks: &[Backlink]) -> String {
    let payload = json!({
        "slug": slug,
        "backlinks": backlinks
            .iter()
            .map(|backlink| {
                json!({
                    "source": backlink.source,
                    "path": store
                        .get(&backlink.source)
                        .map(|doc| doc.relative_path.clone()),
                    "line": backlink.line,
                    "label": backlink.label,
                })
            })
            .collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&payload).unwrap_or_default()
}
