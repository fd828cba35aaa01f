//! GitHub-flavored markdown anchors for the navigation index.

use std::collections::HashMap;

/// GitHub heading anchor slug: lowercase, keep alphanumerics, spaces,
/// hyphens; spaces become hyphens.
pub fn github_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}

/// Hands out heading anchors in document order. Repeated slugs get a
/// `-1`, `-2`, ... suffix, matching GitHub.
#[derive(Debug, Default)]
pub struct Anchors {
    seen: HashMap<String, usize>,
}

impl Anchors {
    pub fn next(&mut self, heading: &str) -> String {
        let slug = github_slug(heading);
        let count = self.seen.entry(slug.clone()).or_insert(0);
        let anchor = if *count == 0 {
            slug
        } else {
            format!("{}-{}", slug, count)
        };
        *count += 1;
        anchor
    }

    /// Anchor of a type section heading such as `Widget `class``.
    pub fn type_section(&mut self, name: &str) -> String {
        self.next(&format!("{} class", name))
    }
}

pub fn link(text: &str, anchor: &str) -> String {
    format!("[{}](#{})", text, anchor)
}
