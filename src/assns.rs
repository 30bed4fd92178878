use std::cmp::Ord;

use derive_more::{AsRef, Deref, Into, IntoIterator};

/// Many-to-many association table
///
/// Maps the ID of a source object (e.g. a slice) to the IDs of all
/// associated target objects (e.g. PFParticles). Entries are kept
/// sorted by source ID. Entries sharing a source ID keep the order in
/// which they were inserted, which is the association order seen by
/// the analysis.
#[derive(Clone, Eq, PartialEq, Hash, Debug, IntoIterator, Into, AsRef, Deref)]
pub struct Assns<K = usize, V = usize> {
    e: Vec<(K, V)>,
}

impl<K: Ord, V> std::default::Default for Assns<K, V> {
    fn default() -> Self {
        Self{ e: Vec::new() }
    }
}

impl<K: Ord, V> Assns<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `value` with `key`, after all existing entries for `key`
    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.e.partition_point(|(k, _)| k <= &key);
        self.e.insert(idx, (key, value))
    }

    /// All entries for `key`, in association order
    pub fn get_all(&self, key: &K) -> &[(K, V)] {
        let begin = self.e.partition_point(|(k, _)| k < key);
        let end = begin + self.e[begin..].partition_point(|(k, _)| k == key);
        &self.e[begin..end]
    }

    /// First entry for `key`
    pub fn get(&self, key: &K) -> Option<&(K, V)> {
        self.get_all(key).first()
    }

    /// Iterator over all targets associated with `key`
    pub fn targets<'a>(&'a self, key: &K) -> impl Iterator<Item = &'a V> + 'a {
        self.get_all(key).iter().map(|(_, v)| v)
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Assns<K, V> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>
    {
        let mut e = Vec::from_iter(iter);
        // stable, so association order is preserved per key
        e.sort_by(|a, b| a.0.cmp(&b.0));
        Self { e }
    }
}

impl<K: Ord, V> Extend<(K, V)> for Assns<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v)
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for Assns<K, V> {
    fn from(f: [(K, V); N]) -> Self {
        f.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct() {
        let mut assns = Assns::new();
        assns.insert(2, 3);
        assns.insert(0, 1);
        assns.insert(1, 2);

        assert_eq!(
            assns,
            Assns::from([(0, 1), (1, 2), (2, 3)])
        )
    }

    #[test]
    fn keeps_association_order() {
        let mut assns = Assns::from([(4, 9), (1, 7), (4, 2)]);
        assns.insert(4, 5);
        assns.insert(4, 0);

        let targets: Vec<_> = assns.targets(&4).copied().collect();
        assert_eq!(targets, [9, 2, 5, 0]);
        assert_eq!(assns.get(&1), Some(&(1, 7)));
    }

    #[test]
    fn get() {
        let mut assns = Assns::from([(0, 1), (0, 2), (0, 3)]);

        assert_eq!(assns.get_all(&0).len(), assns.len());

        assns.insert(-1, 0);
        assns.insert(3, 0);
        assert_eq!(assns.get(&0), Some(&(0, 1)));
        assert_eq!(assns.get(&3), Some(&(3, 0)));
        assert_eq!(assns.get(&-5), None);
        assert_eq!(assns.get_all(&0).len(), assns.len() - 2);
        assert_eq!(assns.get_all(&3).len(), 1);
        assert!(assns.get_all(&-5).is_empty());
        assert!(assns.get_all(&7).is_empty());
    }
}
