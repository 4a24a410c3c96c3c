use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The attribute key whose values accumulate down the element tree instead of
/// being overwritten.
pub const FONT_STYLE: &str = "font-style";

/// A case-insensitive attribute map with deterministic iteration order.
///
/// Keys are stored lowercased. Values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    entries: BTreeMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries.insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key.bytes().any(|b| b.is_ascii_uppercase()) {
            self.entries.get(&key.to_ascii_lowercase()).map(String::as_str)
        } else {
            self.entries.get(key).map(String::as_str)
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&key.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The individual `font-style` tokens, in the order they were added.
    pub fn font_style_tokens(&self) -> impl Iterator<Item = &str> {
        self.get(FONT_STYLE)
            .into_iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Appends style tokens to `font-style`, skipping ones already present.
    pub fn add_font_style(&mut self, styles: &str) {
        let merged = union_styles(self.get(FONT_STYLE).unwrap_or(""), styles);
        if !merged.is_empty() {
            self.insert(FONT_STYLE, merged);
        }
    }

    /// Produces the attributes a child element sees: a copy of `self` where the
    /// child's own attributes win, except `font-style`, which is unioned.
    pub fn inherit(&self, own: &Attributes) -> Attributes {
        let mut merged = self.clone();
        for (key, value) in own.iter() {
            if key == FONT_STYLE {
                merged.add_font_style(value);
            } else {
                merged.insert(key, value);
            }
        }
        merged
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

fn union_styles(parent: &str, child: &str) -> String {
    parent
        .split(',')
        .chain(child.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unique()
        .join(",")
}
