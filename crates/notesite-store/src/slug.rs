//! Slug derivation shared by documents and section fragments.

/// Convert arbitrary text into a stable, lowercase slug. Alphanumerics are
/// kept, runs of whitespace, `-`, and `_` collapse to a single dash, and
/// everything else is dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::new();
    let mut last_was_dash = false;

    for ch in input.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !slug.is_empty() && !last_was_dash
        {
            slug.push('-');
            last_was_dash = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    slug
}
