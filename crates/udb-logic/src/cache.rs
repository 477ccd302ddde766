//! Content-addressed cache of query results.

use std::collections::HashMap;
use std::hash::Hash;

use crate::hash::ContentHash;
use crate::minimize::TwoLevelForm;
use crate::node::LogicNode;

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Satisfiability verdicts, minimized forms, and minimal unsatisfiable
/// subsets, keyed by the content hash of the queried tree.
///
/// Structurally identical trees built independently share an entry. Hit
/// and miss counts cover all three kinds of result.
#[derive(Debug, Clone, Default)]
pub struct SatCache {
    entries: HashMap<ContentHash, bool>,
    minimized: HashMap<(ContentHash, TwoLevelForm), LogicNode>,
    muses: HashMap<ContentHash, Vec<LogicNode>>,
    hits: usize,
    misses: usize,
}

fn counted<K: Eq + Hash, V: Clone>(
    map: &HashMap<K, V>,
    key: &K,
    hits: &mut usize,
    misses: &mut usize,
) -> Option<V> {
    match map.get(key) {
        Some(value) => {
            *hits += 1;
            Some(value.clone())
        }
        None => {
            *misses += 1;
            None
        }
    }
}

impl SatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached verdict for `node`.
    pub fn lookup(&mut self, node: &LogicNode) -> Option<bool> {
        counted(&self.entries, &node.content_hash(), &mut self.hits, &mut self.misses)
    }

    pub fn store(&mut self, node: &LogicNode, satisfiable: bool) {
        self.entries.insert(node.content_hash(), satisfiable);
    }

    pub fn lookup_minimized(&mut self, node: &LogicNode, form: TwoLevelForm) -> Option<LogicNode> {
        let key = (node.content_hash(), form);
        counted(&self.minimized, &key, &mut self.hits, &mut self.misses)
    }

    pub fn store_minimized(&mut self, node: &LogicNode, form: TwoLevelForm, minimized: LogicNode) {
        self.minimized.insert((node.content_hash(), form), minimized);
    }

    pub fn lookup_muses(&mut self, node: &LogicNode) -> Option<Vec<LogicNode>> {
        counted(&self.muses, &node.content_hash(), &mut self.hits, &mut self.misses)
    }

    pub fn store_muses(&mut self, node: &LogicNode, muses: Vec<LogicNode>) {
        self.muses.insert(node.content_hash(), muses);
    }

    /// Drop every entry and zero the counters.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.minimized.clear();
        self.muses.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn statistics(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len() + self.minimized.len() + self.muses.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::ext;

    #[test]
    fn hits_on_structurally_equal_trees() {
        let mut cache = SatCache::new();
        let first = LogicNode::and(vec![ext("A"), ext("B")]);
        assert!(cache.lookup(&first).is_none());
        cache.store(&first, true);

        let rebuilt = LogicNode::and(vec![ext("A"), ext("B")]);
        assert_eq!(cache.lookup(&rebuilt), Some(true));
        let stats = cache.statistics();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn minimized_forms_are_keyed_by_form() {
        let mut cache = SatCache::new();
        let node = LogicNode::or(vec![ext("A"), ext("B")]);
        cache.store_minimized(&node, TwoLevelForm::SumOfProducts, node.clone());
        assert!(cache
            .lookup_minimized(&node, TwoLevelForm::ProductOfSums)
            .is_none());
        let rebuilt = LogicNode::or(vec![ext("A"), ext("B")]);
        assert_eq!(
            cache.lookup_minimized(&rebuilt, TwoLevelForm::SumOfProducts),
            Some(node)
        );
        let stats = cache.statistics();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn reset_clears_everything() {
        let mut cache = SatCache::new();
        let node = ext("A");
        cache.store(&node, true);
        cache.store_muses(&node, Vec::new());
        let _ = cache.lookup(&node);
        cache.reset();
        assert_eq!(cache.statistics(), CacheStats::default());
        assert!(cache.lookup(&node).is_none());
    }
}
