//! Origin-based admission control.
//!
//! The blacklist is a fixed list of address prefixes loaded at startup. Matching
//! is a literal string prefix test: `"10.0."` rejects `"10.0.3.7"`, and
//! `"127.0.0.2"` also rejects `"127.0.0.20"`. There is no CIDR parsing.

use std::sync::Arc;

/// Immutable set of rejected origin prefixes.
#[derive(Debug, Clone)]
pub struct Blacklist {
    prefixes: Arc<[String]>,
}

impl Default for Blacklist {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl Blacklist {
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        Self { prefixes: prefixes.into() }
    }

    /// Returns true iff `origin` starts with any configured prefix.
    #[must_use]
    pub fn is_blacklisted(&self, origin: &str) -> bool {
        self.prefixes.iter().any(|prefix| origin.starts_with(prefix.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}
