//! Heading-id assignment.
//!
//! Ids are derived from heading text with the `slug` crate (transliterated to
//! lowercase ASCII, words joined by `-`) and made unique within one document
//! by appending `-1`, `-2`, … on collision. A [`Slugger`] is created per
//! document, so the same input always yields the same ids.

use std::collections::HashSet;

/// Id used when a heading's text has no sluggable characters.
const FALLBACK_SLUG: &str = "section";

/// Hands out unique anchor ids for one document.
#[derive(Debug, Default, Clone)]
pub struct Slugger {
    taken: HashSet<String>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slugger that will never hand out any of `reserved`.
    pub fn with_reserved<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: reserved.into_iter().map(Into::into).collect(),
        }
    }

    /// Unique id for a heading with the given text.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        self.claim(base)
    }

    /// Unique id for an explicit `{#id}` attribute, kept verbatim unless taken.
    pub fn explicit(&mut self, id: &str) -> String {
        let base = id.trim();
        let base = if base.is_empty() {
            FALLBACK_SLUG.to_string()
        } else {
            base.to_string()
        };
        self.claim(base)
    }

    fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Slug for `text` without de-duplication.
pub fn slugify(text: &str) -> String {
    let s = slug::slugify(text);
    if s.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        s
    }
}
