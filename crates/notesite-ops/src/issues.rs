//! Issue model and report rendering shared by build and check.

use std::fmt;
use std::path::PathBuf;

use notesite_store::{Store, StoreIssue};
use serde_json::json;
use strsim::normalized_levenshtein;

/// Minimum similarity before an unresolved link earns a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Non-fatal problem surfaced by an operation.
#[derive(Clone, Debug)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub path: Option<PathBuf>,
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IssueKind {
    FrontMatter,
    DuplicateSlug,
    UnresolvedLink,
    MissingAsset,
    Scan,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::FrontMatter => "front-matter",
            IssueKind::DuplicateSlug => "duplicate-slug",
            IssueKind::UnresolvedLink => "unresolved-link",
            IssueKind::MissingAsset => "missing-asset",
            IssueKind::Scan => "scan",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// Report output formats.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReportFormat {
    #[default]
    Plain,
    Json,
}

impl Issue {
    pub fn from_store(issue: &StoreIssue) -> Issue {
        match issue {
            StoreIssue::FrontMatter { path, message } => Issue {
                kind: IssueKind::FrontMatter,
                severity: Severity::Error,
                path: Some(path.clone()),
                line: None,
                message: format!("invalid front matter: {message}"),
            },
            StoreIssue::DuplicateSlug {
                slug,
                kept,
                skipped,
            } => Issue {
                kind: IssueKind::DuplicateSlug,
                severity: Severity::Warning,
                path: Some(skipped.clone()),
                line: None,
                message: format!(
                    "duplicate slug '{slug}': first-wins kept {}",
                    kept.display()
                ),
            },
            StoreIssue::Read { path, message } => Issue {
                kind: IssueKind::Scan,
                severity: Severity::Error,
                path: Some(path.clone()),
                line: None,
                message: format!("unreadable: {message}"),
            },
            StoreIssue::Walk { message } => Issue {
                kind: IssueKind::Scan,
                severity: Severity::Warning,
                path: None,
                line: None,
                message: message.clone(),
            },
        }
    }
}

/// Deterministic ordering: path, then line, then rule name.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| match a.path.cmp(&b.path) {
        std::cmp::Ordering::Equal => match a.line.cmp(&b.line) {
            std::cmp::Ordering::Equal => a.kind.as_str().cmp(b.kind.as_str()),
            other => other,
        },
        other => other,
    });
}

/// Offer the closest existing title for an unresolved target, when one is
/// close enough to look like a typo.
pub fn suggest_title(store: &Store, target: &str) -> Option<String> {
    let needle = target.to_lowercase();
    let mut best: Option<(f64, &str)> = None;

    for document in store.documents() {
        let score = normalized_levenshtein(&needle, &document.title.to_lowercase());
        if score >= SUGGESTION_THRESHOLD
            && best.map(|(existing, _)| score > existing).unwrap_or(true)
        {
            best = Some((score, &document.title));
        }
    }

    best.map(|(_, title)| title.to_owned())
}

/// Render issues as a human-readable summary.
pub fn render_plain(issues: &[Issue], files_scanned: usize) -> String {
    let mut out = String::new();

    for issue in issues {
        let location = match (&issue.path, issue.line) {
            (Some(path), Some(line)) => format!("{}:{line}", path.display()),
            (Some(path), None) => path.display().to_string(),
            _ => "(scan)".to_owned(),
        };
        out.push_str(&format!(
            "{location}: {}: {} [{}]\n",
            issue.severity,
            issue.message,
            issue.kind.as_str()
        ));
    }

    let errors = issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .count();
    let warnings = issues.len() - errors;
    out.push_str(&format!(
        "{files_scanned} file(s) scanned, {errors} error(s), {warnings} warning(s)\n"
    ));
    out
}

/// Render issues as a machine-readable JSON document.
pub fn render_json(issues: &[Issue], files_scanned: usize) -> String {
    let errors = issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .count();
    let payload = json!({
        "files_scanned": files_scanned,
        "errors": errors,
        "warnings": issues.len() - errors,
        "issues": issues
            .iter()
            .map(|issue| {
                json!({
                    "kind": issue.kind.as_str(),
                    "severity": issue.severity.to_string(),
                    "path": issue.path,
                    "line": issue.line,
                    "message": issue.message,
                })
            })
            .collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&payload).unwrap_or_default()
}
