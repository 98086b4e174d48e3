//! Link graph construction for the notesite builder.
//!
//! The resolver scans every document body for wiki-link tokens, matches each
//! target case-insensitively against the store's titles and slugs, and
//! produces a graph of outbound links plus a backlink index. Unmatched
//! targets are a distinct [`LinkTarget::Unresolved`] variant rather than an
//! error: the corpus intentionally references concepts with no
//! corresponding note. Cycles and self-references are permitted.

mod scan;

use std::collections::HashMap;

use notesite_store::Store;

pub use scan::{scan_wiki_links, RawWikiLink};

/// Resolution result for a single wiki-link target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkTarget {
    /// Target matched a document in the store.
    Resolved { slug: String },
    /// Target names an external concept with no note behind it.
    Unresolved { label: String },
}

impl LinkTarget {
    pub fn is_resolved(&self) -> bool {
        matches!(self, LinkTarget::Resolved { .. })
    }
}

/// A resolved wiki-link occurrence within a document body.
#[derive(Clone, Debug)]
pub struct WikiLink {
    /// Raw target text between the brackets (alias and fragment removed).
    pub raw_target: String,
    /// Display text: the alias when present, otherwise the target.
    pub label: String,
    /// Optional `#section` fragment carried on the target.
    pub fragment: Option<String>,
    pub target: LinkTarget,
    /// True for `![[...]]` embeds.
    pub embed: bool,
    /// 1-based line in the source file (body offset applied).
    pub line: usize,
    /// Byte span of the whole token within the body.
    pub span: std::ops::Range<usize>,
}

/// Inbound reference recorded in the backlink index.
#[derive(Clone, Debug)]
pub struct Backlink {
    /// Slug of the document containing the link.
    pub source: String,
    pub line: usize,
    pub label: String,
}

/// Graph of wiki-links across the whole document set.
pub struct LinkGraph {
    outbound: HashMap<String, Vec<WikiLink>>,
    backlinks: HashMap<String, Vec<Backlink>>,
}

impl LinkGraph {
    /// Build the graph by scanning and resolving every document body.
    /// Deterministic for fixed store contents: documents are visited in
    /// store order and links in body order.
    pub fn build(store: &Store) -> LinkGraph {
        let mut outbound: HashMap<String, Vec<WikiLink>> = HashMap::new();
        let mut backlinks: HashMap<String, Vec<Backlink>> = HashMap::new();

        for document in store.documents() {
            let mut links = Vec::new();

            for raw in scan_wiki_links(&document.body) {
                let target = match store.resolve(&raw.target) {
                    Some(found) => LinkTarget::Resolved {
                        slug: found.slug.clone(),
                    },
                    None => LinkTarget::Unresolved {
                        label: raw.label().to_owned(),
                    },
                };

                let line = document.body_line.saturating_sub(1) + raw.line;
                let link = WikiLink {
                    raw_target: raw.target.clone(),
                    label: raw.label().to_owned(),
                    fragment: raw.fragment.clone(),
                    target: target.clone(),
                    embed: raw.embed,
                    line,
                    span: raw.span.clone(),
                };

                if let LinkTarget::Resolved { slug } = &target {
                    backlinks.entry(slug.clone()).or_default().push(Backlink {
                        source: document.slug.clone(),
                        line,
                        label: link.label.clone(),
                    });
                }

                links.push(link);
            }

            outbound.insert(document.slug.clone(), links);
        }

        LinkGraph {
            outbound,
            backlinks,
        }
    }

    /// Outbound links from the document with `slug`, in body order.
    pub fn links_from(&self, slug: &str) -> &[WikiLink] {
        self.outbound.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Inbound references pointing at `slug`.
    pub fn backlinks_to(&self, slug: &str) -> &[Backlink] {
        self.backlinks.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every unresolved link in the graph, paired with its source slug,
    /// in store order.
    pub fn unresolved(&self) -> Vec<(&str, &WikiLink)> {
        let mut sources: Vec<&String> = self.outbound.keys().collect();
        sources.sort();

        let mut result = Vec::new();
        for source in sources {
            for link in &self.outbound[source] {
                if !link.target.is_resolved() && !link.embed {
                    result.push((source.as_str(), link));
                }
            }
        }
        result
    }

    /// Embeds (`![[asset]]`) across the graph, paired with source slug.
    pub fn embeds(&self) -> Vec<(&str, &WikiLink)> {
        let mut sources: Vec<&String> = self.outbound.keys().collect();
        sources.sort();

        let mut result = Vec::new();
        for source in sources {
            for link in &self.outbound[source] {
                if link.embed {
                    result.push((source.as_str(), link));
                }
            }
        }
        result
    }
}
