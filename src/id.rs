use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// Tag set for an [`Id`]. Keys are unique and entries are kept sorted by key,
/// so equality and hashing are content based regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tags {
    entries: SmallVec<[(String, String); 4]>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, replacing any existing value under the same key.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key.as_str()))
        {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| self.entries[idx].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (key, value) in iter {
            tags.add(key, value);
        }
        tags
    }
}

/// Immutable identity of a signal: a name plus a tag set. Two ids with equal
/// content are interchangeable as registry keys, so they are shared as
/// `Arc<Id>` and compared by value, never by address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Id {
    name: String,
    tags: Tags,
}

impl Id {
    pub fn new(name: impl Into<String>, tags: Tags) -> Self {
        Self {
            name: name.into(),
            tags,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Derive the id for one statistic of this signal: same name, same tags,
    /// with `statistic=<stat>` added or overridden.
    pub fn with_stat(&self, stat: &str) -> Arc<Id> {
        let mut tags = self.tags.clone();
        tags.add("statistic", stat);
        Arc::new(Id {
            name: self.name.clone(),
            tags,
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.name)?;
        for (idx, (key, value)) in self.tags.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, "]")
    }
}

/// Conversion seam for the registry's get-or-create entry points, so callers
/// can pass a bare name or a fully tagged id.
pub trait IntoId {
    fn into_id(self) -> Arc<Id>;
}

impl IntoId for Arc<Id> {
    fn into_id(self) -> Arc<Id> {
        self
    }
}

impl IntoId for Id {
    fn into_id(self) -> Arc<Id> {
        Arc::new(self)
    }
}

impl IntoId for &str {
    fn into_id(self) -> Arc<Id> {
        Arc::new(Id::new(self, Tags::new()))
    }
}

impl IntoId for String {
    fn into_id(self) -> Arc<Id> {
        Arc::new(Id::new(self, Tags::new()))
    }
}
