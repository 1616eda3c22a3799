//! Lookup results, the session cache and tier classification.
//!
//! - [`ResultEntry`] - An indexed count or the quota marker
//! - [`ResultCache`] - Insertion-ordered domain → entry map
//! - [`Tier`] - Color bucket derived from the count
//! - [`TierBuckets`] - Domains grouped by tier for copy actions

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::Domain;

// ============================================================================
// Result Entry
// ============================================================================

/// Outcome stored for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultEntry {
    /// Number of pages Google reports as indexed.
    Count(u64),
    /// The count could not be determined because every key was over quota.
    QuotaExceeded,
}

impl ResultEntry {
    /// Returns the count, if this is not the quota marker.
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::QuotaExceeded => None,
        }
    }

    /// Returns true for the quota marker.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded)
    }

    /// Returns the tier for this entry.
    pub fn tier(&self) -> Tier {
        match self {
            Self::Count(n) => Tier::for_count(*n),
            Self::QuotaExceeded => Tier::Orange,
        }
    }
}

// ============================================================================
// Tier
// ============================================================================

/// Indexing-volume bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// More than 10 indexed pages.
    Green,
    /// 6 to 10 indexed pages.
    Yellow,
    /// 1 to 5 indexed pages, or quota exceeded.
    Orange,
    /// Nothing indexed. Not copyable.
    None,
}

impl Tier {
    /// Classifies an indexed count.
    pub fn for_count(count: u64) -> Self {
        match count {
            0 => Self::None,
            1..=5 => Self::Orange,
            6..=10 => Self::Yellow,
            _ => Self::Green,
        }
    }

    /// Returns a lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::None => "none",
        }
    }

    /// Tiers that participate in copy actions, in copy-all order.
    pub fn copyable() -> &'static [Tier] {
        &[Self::Green, Self::Yellow, Self::Orange]
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "orange" => Ok(Self::Orange),
            "none" | "red" => Ok(Self::None),
            _ => Err(format!("Unknown tier: {s}. Use: green, yellow, orange, none")),
        }
    }
}

// ============================================================================
// Result Cache
// ============================================================================

/// One cached row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResult {
    /// The domain as typed.
    pub domain: Domain,
    /// Its result.
    pub entry: ResultEntry,
}

/// Domain → result map that remembers insertion order.
///
/// Entries are never overwritten; the only way to drop them is [`clear`].
///
/// [`clear`]: ResultCache::clear
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CachedResult>", into = "Vec<CachedResult>")]
pub struct ResultCache {
    rows: Vec<CachedResult>,
    index: HashMap<Domain, usize>,
}

impl ResultCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `domain` already has an entry.
    pub fn contains(&self, domain: &str) -> bool {
        self.index.contains_key(domain)
    }

    /// Returns the entry for `domain`.
    pub fn get(&self, domain: &str) -> Option<ResultEntry> {
        self.index.get(domain).map(|&i| self.rows[i].entry)
    }

    /// Inserts an entry unless the domain is already present.
    ///
    /// Returns true if the entry was added.
    pub fn insert(&mut self, domain: impl Into<Domain>, entry: ResultEntry) -> bool {
        let domain = domain.into();
        if self.index.contains_key(&domain) {
            return false;
        }
        self.index.insert(domain.clone(), self.rows.len());
        self.rows.push(CachedResult { domain, entry });
        true
    }

    /// Appends every entry of `other` that is not already present.
    ///
    /// Returns the number of entries added.
    pub fn merge(&mut self, other: ResultCache) -> usize {
        other
            .rows
            .into_iter()
            .filter(|row| self.insert(row.domain.clone(), row.entry))
            .count()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ResultEntry)> {
        self.rows.iter().map(|r| (r.domain.as_str(), r.entry))
    }

    /// Returns a copy with `pending` domains added as quota markers.
    ///
    /// Used to present domains the last run could not resolve next to the
    /// resolved ones without committing the markers to the cache.
    pub fn with_pending(&self, pending: &[Domain]) -> ResultCache {
        let mut view = self.clone();
        for domain in pending {
            view.insert(domain.clone(), ResultEntry::QuotaExceeded);
        }
        view
    }

    /// Returns entries in display order.
    ///
    /// Counts first, highest first; quota markers last. Ties keep
    /// insertion order.
    pub fn sorted(&self) -> Vec<(&str, ResultEntry)> {
        let mut rows: Vec<_> = self.iter().collect();
        rows.sort_by_key(|(_, entry)| match entry {
            ResultEntry::Count(n) => (0u8, std::cmp::Reverse(*n)),
            ResultEntry::QuotaExceeded => (1u8, std::cmp::Reverse(0)),
        });
        rows
    }

    /// Groups domains by tier, following display order.
    pub fn buckets(&self) -> TierBuckets {
        let mut buckets = TierBuckets::default();
        for (domain, entry) in self.sorted() {
            buckets.push(entry.tier(), domain);
        }
        buckets
    }
}

impl From<Vec<CachedResult>> for ResultCache {
    fn from(rows: Vec<CachedResult>) -> Self {
        let mut cache = Self::new();
        for row in rows {
            cache.insert(row.domain, row.entry);
        }
        cache
    }
}

impl From<ResultCache> for Vec<CachedResult> {
    fn from(cache: ResultCache) -> Self {
        cache.rows
    }
}

// ============================================================================
// Tier Buckets
// ============================================================================

/// Domains grouped by tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierBuckets {
    /// More than 10 pages.
    pub green: Vec<Domain>,
    /// 6 to 10 pages.
    pub yellow: Vec<Domain>,
    /// 1 to 5 pages or quota exceeded.
    pub orange: Vec<Domain>,
    /// Nothing indexed.
    pub none: Vec<Domain>,
}

impl TierBuckets {
    fn push(&mut self, tier: Tier, domain: &str) {
        self.get_mut(tier).push(domain.to_string());
    }

    fn get_mut(&mut self, tier: Tier) -> &mut Vec<Domain> {
        match tier {
            Tier::Green => &mut self.green,
            Tier::Yellow => &mut self.yellow,
            Tier::Orange => &mut self.orange,
            Tier::None => &mut self.none,
        }
    }

    /// Returns the domains of one tier.
    pub fn get(&self, tier: Tier) -> &[Domain] {
        match tier {
            Tier::Green => &self.green,
            Tier::Yellow => &self.yellow,
            Tier::Orange => &self.orange,
            Tier::None => &self.none,
        }
    }

    /// Green, yellow and orange domains, in that order.
    pub fn copy_all(&self) -> Vec<Domain> {
        Tier::copyable()
            .iter()
            .flat_map(|t| self.get(*t).iter().cloned())
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
