//! Document model owned by the content store.

use std::path::PathBuf;

use crate::front_matter::{split_front_matter, FrontMatter};
use crate::slug::slugify;

/// A single note: parsed front matter plus raw Markdown body.
#[derive(Clone, Debug)]
pub struct Document {
    /// Stable identifier derived from the title (falling back to the file
    /// stem when no title is declared).
    pub slug: String,
    /// Display title used for link resolution and page headers.
    pub title: String,
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    pub front_matter: FrontMatter,
    /// Raw Markdown body with front matter removed.
    pub body: String,
    /// 1-based line number of the first body line in the source file.
    pub body_line: usize,
}

impl Document {
    /// Parse a document from raw file contents. Returns a human-readable
    /// message when the front matter block is present but malformed.
    pub fn parse(
        relative_path: PathBuf,
        absolute_path: PathBuf,
        contents: &str,
    ) -> Result<Document, String> {
        let block = split_front_matter(contents);
        let front_matter = match block.yaml {
            Some(yaml) => FrontMatter::parse(yaml)?,
            None => FrontMatter::default(),
        };

        let title = front_matter
            .title
            .clone()
            .unwrap_or_else(|| file_stem_title(&relative_path));
        let mut slug = slugify(&title);
        if slug.is_empty() {
            slug = slugify(&file_stem_title(&relative_path));
        }
        if slug.is_empty() {
            return Err("document yields an empty slug".to_owned());
        }

        Ok(Document {
            slug,
            title,
            relative_path,
            absolute_path,
            front_matter,
            body: block.body.to_owned(),
            body_line: block.body_line,
        })
    }

    /// True when the document is flagged as a draft.
    pub fn is_draft(&self) -> bool {
        self.front_matter.draft
    }

    /// Output file name for the rendered page.
    pub fn output_name(&self) -> String {
        format!("{}.html", self.slug)
    }
}

fn file_stem_title(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
