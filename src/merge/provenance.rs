//! Provenance tracking for merged stacks.
//!
//! For every key path in a merged stack, [`ProvenanceIndex`] keeps the ordered list
//! of manifests that set it, in merge order. The first entry is the manifest that
//! introduced the key (the direct dependency), the last is the one whose value won.
//! Mapping nodes are recorded too, so `vars` lists every manifest that contributed
//! any variable.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A path of keys from the root of a stack, e.g. `components.terraform.vpc.vars`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// This path extended by one key.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` equals this path or is an ancestor of it.
    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The final key, if any.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Contributing manifests per key path of one stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProvenanceIndex {
    entries: BTreeMap<KeyPath, Vec<String>>,
}

impl ProvenanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `source` set `path`.
    ///
    /// The first entry never moves. A source merged again moves to the end, so the
    /// last entry is always the current winner; the first entry may reappear there.
    pub fn record(&mut self, path: KeyPath, source: &str) {
        let sources = self.entries.entry(path).or_default();
        if let Some(index) = sources.iter().skip(1).position(|s| s == source) {
            sources.remove(index + 1);
        }
        if sources.last().map(String::as_str) != Some(source) {
            sources.push(source.to_string());
        }
    }

    /// Drop every entry strictly below `path`.
    ///
    /// Used when a mapping is replaced by a scalar or sequence and its keys no
    /// longer exist in the merged result.
    pub fn remove_descendants(&mut self, path: &KeyPath) {
        self.entries.retain(|key, _| key.len() <= path.len() || !key.starts_with(path));
    }

    /// Contributors of `path`, in merge order.
    pub fn sources(&self, path: &KeyPath) -> Option<&[String]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// All entries in key path order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyPath, &[String])> {
        self.entries.iter().map(|(path, sources)| (path, sources.as_slice()))
    }

    /// Entries at or below any of `prefixes`.
    pub fn filtered(&self, prefixes: &[KeyPath]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(path, _)| prefixes.iter().any(|prefix| path.starts_with(prefix)))
                .map(|(path, sources)| (path.clone(), sources.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
