use std::ops::Bound;

/// A set of keys visited by a cursor, in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRange {
    /// Exactly one key
    Only(String),
    /// Half-open `[lower, upper)`
    HalfOpen { lower: String, upper: String },
}

impl KeyRange {
    pub fn only<S: Into<String>>(key: S) -> Self {
        KeyRange::Only(key.into())
    }

    pub fn half_open<L: Into<String>, U: Into<String>>(lower: L, upper: U) -> Self {
        KeyRange::HalfOpen {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        match self {
            KeyRange::Only(k) => k == key,
            KeyRange::HalfOpen { lower, upper } => lower.as_str() <= key && key < upper.as_str(),
        }
    }

    /// Bounds of the keys left to visit once `after` has been seen.
    ///
    /// Returns `None` when nothing remains, so the result is always safe
    /// to hand to `BTreeMap::range`.
    #[must_use]
    pub fn remaining(&self, after: Option<&str>) -> Option<(Bound<String>, Bound<String>)> {
        let (lower, upper) = match self {
            KeyRange::Only(k) => (k.as_str(), Bound::Included(k.clone())),
            KeyRange::HalfOpen { lower, upper } => (lower.as_str(), Bound::Excluded(upper.clone())),
        };
        let start = match after {
            Some(a) if a >= lower => Bound::Excluded(a.to_string()),
            _ => Bound::Included(lower.to_string()),
        };

        let (s, s_incl) = match &start {
            Bound::Included(s) => (s.as_str(), true),
            Bound::Excluded(s) => (s.as_str(), false),
            Bound::Unbounded => return Some((start, upper)),
        };
        let (e, e_incl) = match &upper {
            Bound::Included(e) => (e.as_str(), true),
            Bound::Excluded(e) => (e.as_str(), false),
            Bound::Unbounded => return Some((start, upper)),
        };
        if s > e || (s == e && !(s_incl && e_incl)) {
            return None;
        }
        Some((start, upper))
    }
}
