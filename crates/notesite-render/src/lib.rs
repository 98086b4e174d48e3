//! HTML rendering for the notesite builder.
//!
//! The renderer turns a document plus the resolved link graph into a full
//! HTML page: wiki-link tokens are substituted first (hyperlinks for
//! resolved targets, emphasis for unresolved ones, `<img>` for embeds),
//! math spans are lifted out, the remaining body goes through
//! `pulldown-cmark`, and the math is restored verbatim for downstream
//! typesetting. Output is deterministic: the same store renders to the
//! same bytes.

mod assets;
mod math;

use std::path::PathBuf;

use notesite_config::Config;
use notesite_graph::{LinkGraph, LinkTarget, WikiLink};
use notesite_store::{slugify, Document, Store};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use pulldown_cmark::{html, Options, Parser};

pub use assets::{is_image, AssetCatalog};
pub use math::{protect_math, restore_math, MathSegment};

/// Characters beyond controls that need escaping inside an href.
const HREF_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?');

pub(crate) fn encode_href(input: &str) -> String {
    utf8_percent_encode(input, HREF_SET).to_string()
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Asset referenced by an embed that could not be found on disk.
#[derive(Clone, Debug)]
pub struct MissingAsset {
    pub target: String,
    pub line: usize,
}

/// A fully rendered page plus the side effects the build must apply.
pub struct RenderedPage {
    pub slug: String,
    pub file_name: String,
    pub html: String,
    /// Assets to copy into the output directory: (embed target, source path).
    pub assets: Vec<(String, PathBuf)>,
    pub missing_assets: Vec<MissingAsset>,
}

/// Stateless page renderer configured with site identity.
pub struct Renderer {
    site_title: String,
}

impl Renderer {
    pub fn from_config(config: &Config) -> Self {
        Renderer {
            site_title: config.site.title.clone(),
        }
    }

    /// Render one document to a complete HTML page.
    pub fn render_page(
        &self,
        document: &Document,
        store: &Store,
        graph: &LinkGraph,
        catalog: &AssetCatalog,
    ) -> RenderedPage {
        let mut assets = Vec::new();
        let mut missing_assets = Vec::new();

        let links = graph.links_from(&document.slug);
        let substituted = substitute_links(
            &document.body,
            links,
            catalog,
            &mut assets,
            &mut missing_assets,
        );

        let (prepared, segments) = protect_math(&substituted);
        let body_html = markdown_to_html(&prepared);
        let body_html = restore_math(&body_html, &segments);

        let html = self.page_shell(document, store, graph, &body_html);

        RenderedPage {
            slug: document.slug.clone(),
            file_name: document.output_name(),
            html,
            assets,
            missing_assets,
        }
    }

    /// Render the site index: a note listing plus a tag index.
    pub fn render_index(&self, store: &Store, include_drafts: bool) -> String {
        let mut notes: Vec<&Document> = store.published(include_drafts).collect();
        notes.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));

        let mut page = String::new();
        page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str(&format!("<title>{}</title>\n", escape_html(&self.site_title)));
        page.push_str("</head>\n<body>\n");
        page.push_str(&format!("<h1>{}</h1>\n", escape_html(&self.site_title)));

        page.push_str("<ul class=\"notes\">\n");
        for note in &notes {
            page.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                encode_href(&note.output_name()),
                escape_html(&note.title)
            ));
        }
        page.push_str("</ul>\n");

        let tag_index = store.tag_index(include_drafts);
        if !tag_index.is_empty() {
            page.push_str("<section class=\"tags\">\n<h2>Tags</h2>\n");
            for (tag, slugs) in tag_index {
                page.push_str(&format!("<h3>{}</h3>\n<ul>\n", escape_html(&tag)));
                for slug in slugs {
                    let title = store
                        .get(&slug)
                        .map(|doc| doc.title.clone())
                        .unwrap_or_else(|| slug.clone());
                    page.push_str(&format!(
                        "<li><a href=\"{}.html\">{}</a></li>\n",
                        encode_href(&slug),
                        escape_html(&title)
                    ));
                }
                page.push_str("</ul>\n");
            }
            page.push_str("</section>\n");
        }

        page.push_str("</body>\n</html>\n");
        page
    }

    fn page_shell(
        &self,
        document: &Document,
        store: &Store,
        graph: &LinkGraph,
        body_html: &str,
    ) -> String {
        let mut page = String::new();
        page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str(&format!(
            "<title>{} — {}</title>\n",
            escape_html(&document.title),
            escape_html(&self.site_title)
        ));

        if !document.front_matter.tags.is_empty() {
            let keywords: Vec<String> = document
                .front_matter
                .tags
                .iter()
                .map(|tag| escape_html(tag))
                .collect();
            page.push_str(&format!(
                "<meta name=\"keywords\" content=\"{}\">\n",
                keywords.join(", ")
            ));
        }

        page.push_str("</head>\n<body>\n<article>\n");
        page.push_str(&format!("<h1>{}</h1>\n", escape_html(&document.title)));

        if !document.front_matter.tags.is_empty() {
            page.push_str("<ul class=\"tags\">\n");
            for tag in &document.front_matter.tags {
                page.push_str(&format!("<li>{}</li>\n", escape_html(tag)));
            }
            page.push_str("</ul>\n");
        }

        page.push_str(body_html);
        page.push_str("</article>\n");

        let backlinks = graph.backlinks_to(&document.slug);
        if !backlinks.is_empty() {
            page.push_str("<nav class=\"backlinks\">\n<h2>Backlinks</h2>\n<ul>\n");
            let mut seen = Vec::new();
            for backlink in backlinks {
                if seen.contains(&backlink.source) {
                    continue;
                }
                seen.push(backlink.source.clone());
                let title = store
                    .get(&backlink.source)
                    .map(|doc| doc.title.clone())
                    .unwrap_or_else(|| backlink.source.clone());
                page.push_str(&format!(
                    "<li><a href=\"{}.html\">{}</a></li>\n",
                    encode_href(&backlink.source),
                    escape_html(&title)
                ));
            }
            page.push_str("</ul>\n</nav>\n");
        }

        page.push_str("</body>\n</html>\n");
        page
    }
}

/// Replace wiki-link token spans with HTML before the Markdown transform.
fn substitute_links(
    body: &str,
    links: &[WikiLink],
    catalog: &AssetCatalog,
    assets: &mut Vec<(String, PathBuf)>,
    missing: &mut Vec<MissingAsset>,
) -> String {
    let mut output = String::with_capacity(body.len());
    let mut cursor = 0usize;

    for link in links {
        if link.span.start < cursor || link.span.end > body.len() {
            continue;
        }
        output.push_str(&body[cursor..link.span.start]);
        output.push_str(&link_html(link, catalog, assets, missing));
        cursor = link.span.end;
    }

    output.push_str(&body[cursor..]);
    output
}

fn link_html(
    link: &WikiLink,
    catalog: &AssetCatalog,
    assets: &mut Vec<(String, PathBuf)>,
    missing: &mut Vec<MissingAsset>,
) -> String {
    if link.embed {
        return match catalog.locate(&link.raw_target) {
            Some(source) => {
                let href = AssetCatalog::href(&link.raw_target);
                assets.push((link.raw_target.clone(), source));
                if is_image(&link.raw_target) {
                    format!(
                        "<img src=\"{href}\" alt=\"{}\">",
                        escape_html(&link.raw_target)
                    )
                } else {
                    format!(
                        "<a class=\"embed\" href=\"{href}\">{}</a>",
                        escape_html(&link.raw_target)
                    )
                }
            }
            None => {
                missing.push(MissingAsset {
                    target: link.raw_target.clone(),
                    line: link.line,
                });
                format!(
                    "<span class=\"missing-embed\">{}</span>",
                    escape_html(&link.raw_target)
                )
            }
        };
    }

    match &link.target {
        LinkTarget::Resolved { slug } => {
            let mut href = format!("{}.html", encode_href(slug));
            if let Some(fragment) = &link.fragment {
                href.push('#');
                href.push_str(&slugify(fragment));
            }
            format!(
                "<a class=\"wikilink\" href=\"{href}\">{}</a>",
                escape_html(&link.label)
            )
        }
        LinkTarget::Unresolved { label } => {
            format!("<em class=\"unresolved\">{}</em>", escape_html(label))
        }
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut html_out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut html_out, parser);
    html_out
}
