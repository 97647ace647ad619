//! Tag matching: turn a version string and the active platform into tag
//! weights, and score config file names against them.
//!
//! A config file name is a `.`-delimited tag list (`base.debug.android.xml`).
//! A file only takes part in resolution when **every** one of its tags is
//! known; its score is the sum of the tag weights, and lower scores are merged
//! first so that more specific files win.
//!
//! | Source                      | Weight |
//! |-----------------------------|--------|
//! | neutral base tag (`base`)   | 0      |
//! | active platform             | 1      |
//! | each version token          | 10     |

use std::collections::HashMap;

/// Weight of the neutral base tag.
pub const BASE_WEIGHT: u32 = 0;
/// Weight of the active platform tag.
pub const PLATFORM_WEIGHT: u32 = 1;
/// Weight of each version token.
pub const VERSION_WEIGHT: u32 = 10;

/// Lower-cased tag → weight mapping for one resolution run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagWeights {
    weights: HashMap<String, u32>,
}

impl TagWeights {
    /// Build the weights for a version string and platform.
    ///
    /// Insertion order is base tag, then version tokens, then platform; a tag
    /// produced by more than one source keeps the weight written last.
    pub fn new(base_tag: Option<&str>, version: &str, platform: &str) -> Self {
        let mut weights = HashMap::new();
        if let Some(base) = base_tag.map(normalize).filter(|t| !t.is_empty()) {
            weights.insert(base, BASE_WEIGHT);
        }
        for token in version_tokens(version) {
            weights.insert(token, VERSION_WEIGHT);
        }
        let platform = normalize(platform);
        if !platform.is_empty() {
            weights.insert(platform, PLATFORM_WEIGHT);
        }
        Self { weights }
    }

    /// Weight of a single tag, if it is recognized.
    pub fn weight(&self, tag: &str) -> Option<u32> {
        self.weights.get(&normalize(tag)).copied()
    }

    /// Sum of weights for `tags`, or `None` as soon as one tag is unknown.
    pub fn score<'a, I>(&self, tags: I) -> Option<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tags.into_iter()
            .try_fold(0u32, |total, tag| Some(total + self.weight(tag)?))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Split a version argument on commas and line breaks into normalized tokens.
pub fn version_tokens(version: &str) -> Vec<String> {
    version
        .split([',', '\r', '\n'])
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Derive the tag set of a config file from its name.
///
/// The extension (everything after the last `.`) is dropped, the rest is split
/// on `.`, and empty or repeated segments are removed. Order of first
/// appearance is kept.
pub fn file_tags(file_name: &str) -> Vec<String> {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => file_name,
    };
    let mut tags: Vec<String> = Vec::new();
    for segment in stem.split('.').map(normalize) {
        if !segment.is_empty() && !tags.contains(&segment) {
            tags.push(segment);
        }
    }
    tags
}

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}
