//! Set difference of two host collections.

use alloc::collections::BTreeSet;

/// Result of partitioning two host collections against each other.
///
/// Every host seen in either input lands in exactly one of the three sets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Hosts only present in the left collection.
    pub left_only: BTreeSet<String>,
    /// Hosts only present in the right collection.
    pub right_only: BTreeSet<String>,
    /// Hosts present in both collections.
    pub both: BTreeSet<String>,
}

impl Partition {
    /// Total number of distinct hosts across both inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.left_only.len() + self.right_only.len() + self.both.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions `left` and `right` into hosts only in `left`, only in `right`, and in both.
///
/// Duplicates within one input collapse. Callers must not rely on iteration order.
///
/// # Examples
///
/// ```
/// # use reaper_common::partition;
/// let p = partition(["a", "b", "c"], ["b", "c", "d"]);
/// assert!(p.left_only.contains("a"));
/// assert!(p.right_only.contains("d"));
/// assert_eq!(p.both.len(), 2);
/// ```
pub fn partition<L, R, S>(left: L, right: R) -> Partition
where
    L: IntoIterator<Item = S>,
    R: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut left_only: BTreeSet<String> = left.into_iter().map(Into::into).collect();
    let mut right_only = BTreeSet::new();
    let mut both = BTreeSet::new();

    for host in right {
        let host = host.into();
        if left_only.remove(&host) {
            both.insert(host);
        } else if !both.contains(&host) {
            right_only.insert(host);
        }
    }

    Partition {
        left_only,
        right_only,
        both,
    }
}
