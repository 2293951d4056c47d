use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Stable key for a location in a dataset.
///
/// Keeps the original id text but avoids repeated owned Strings: the same id
/// appears in the location index, both adjacency maps, and every footprint
/// and ledger keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(Arc<str>);

impl LocationId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        Self(Arc::from(id))
    }
}

impl From<String> for LocationId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets id-keyed maps be probed with a plain &str.
impl Borrow<str> for LocationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
