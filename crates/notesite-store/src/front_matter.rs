//! Front matter splitting and typed parsing.
//!
//! Front matter is a `---` fenced YAML block at the very top of a document.
//! Only three fields carry meaning for the build contract (`title`, `tags`,
//! `draft`); unknown keys are tolerated and ignored so the render contract
//! stays stable.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Typed front matter fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub draft: bool,
}

impl FrontMatter {
    /// Parse a raw YAML block. Scalar `tags: value` shorthand is accepted
    /// alongside the list form.
    pub fn parse(yaml: &str) -> Result<Self, String> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            title: Option<String>,
            #[serde(default)]
            tags: Option<RawTags>,
            #[serde(default)]
            draft: bool,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTags {
            One(String),
            Many(Vec<String>),
        }

        let raw: Raw = serde_yaml::from_str(yaml).map_err(|err| err.to_string())?;
        let tags = match raw.tags {
            None => BTreeSet::new(),
            Some(RawTags::One(tag)) => BTreeSet::from([tag]),
            Some(RawTags::Many(tags)) => tags.into_iter().collect(),
        };

        Ok(FrontMatter {
            title: raw.title,
            tags,
            draft: raw.draft,
        })
    }

    /// Serialize back to YAML. Parsing the result yields an equal value.
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_default()
    }
}

/// Raw front matter block split out of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontMatterBlock<'a> {
    /// YAML text between the fences, without the fences themselves.
    pub yaml: Option<&'a str>,
    /// Body text following the block (or the whole input when no block).
    pub body: &'a str,
    /// 1-based line number on which the body starts.
    pub body_line: usize,
}

/// Split a document into its front matter block and body. A block opens
/// with `---` on the first line and closes with `---` or `...`; anything
/// else means the whole input is body.
pub fn split_front_matter(contents: &str) -> FrontMatterBlock<'_> {
    let mut lines = contents.split_inclusive('\n');

    let first = match lines.next() {
        Some(line) if line.trim_end() == "---" => line,
        _ => {
            return FrontMatterBlock {
                yaml: None,
                body: contents,
                body_line: 1,
            }
        }
    };

    let yaml_start = first.len();
    let mut offset = yaml_start;
    let mut line_no = 1;

    for line in lines {
        line_no += 1;
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &contents[yaml_start..offset];
            let body = &contents[offset + line.len()..];
            return FrontMatterBlock {
                yaml: Some(yaml),
                body,
                body_line: line_no + 1,
            };
        }
        offset += line.len();
    }

    // Unterminated fence: treat everything as body, matching the
    // best-effort contract.
    FrontMatterBlock {
        yaml: None,
        body: contents,
        body_line: 1,
    }
}
