//! Integration tests for the word-counting contract and the public scenarios
//! each container is expected to reproduce.

use lexmap::{
    AvlTree, ChainedHashTable, Config, ContainerKind, HashTableConfig, OpenAddressingHashTable,
    RedBlackTree, WordCounter,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tempfile::tempdir;

fn random_words(count: usize, vocabulary: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let vocab: Vec<String> = (0..vocabulary)
        .map(|_| {
            let len = rng.gen_range(1..=8);
            (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
        })
        .collect();
    (0..count)
        .map(|_| vocab[rng.gen_range(0..vocab.len())].clone())
        .collect()
}

fn reference_counts(words: &[String]) -> Vec<(String, usize)> {
    let mut counts = BTreeMap::new();
    for word in words {
        *counts.entry(word.clone()).or_insert(0usize) += 1;
    }
    counts.into_iter().collect()
}

#[test]
fn test_all_containers_produce_identical_reports() {
    let words = random_words(5_000, 400, 0x5eed);
    let expected = reference_counts(&words);

    for kind in ContainerKind::ALL {
        let mut counter = kind.build::<String>();
        for word in &words {
            counter.record(word.clone()).unwrap();
        }
        assert_eq!(counter.len(), expected.len(), "{}", kind);
        assert_eq!(counter.ordered_counts(), expected, "{}", kind);
        assert!(counter.comparisons() > 0, "{}", kind);
        if !kind.is_ordered() {
            assert_eq!(counter.rotations(), 0, "{}", kind);
        }
    }
}

#[test]
fn test_counters_from_persisted_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lexmap.json");
    let config = HashTableConfig::with_initial_size(5).load_factor(0.5);
    config.save_to_file(&path).unwrap();

    let loaded = HashTableConfig::load_from_file(&path).unwrap();
    let words = random_words(1_000, 150, 7);
    let expected = reference_counts(&words);
    for kind in [ContainerKind::Chained, ContainerKind::OpenAddressing] {
        let mut counter = kind.build_with_config::<String>(&loaded).unwrap();
        for word in &words {
            counter.record(word.clone()).unwrap();
        }
        assert_eq!(counter.ordered_counts(), expected, "{}", kind);
    }
}

#[test]
fn test_word_counter_on_concrete_types() {
    let mut avl: AvlTree<&str, usize> = AvlTree::new();
    let mut rb: RedBlackTree<&str, usize> = RedBlackTree::new();
    let mut chained: ChainedHashTable<&str, usize> = ChainedHashTable::new();
    let mut open: OpenAddressingHashTable<&str, usize> = OpenAddressingHashTable::new();

    for word in "a rose is a rose is a rose".split(' ') {
        WordCounter::record(&mut avl, word).unwrap();
        WordCounter::record(&mut rb, word).unwrap();
        WordCounter::record(&mut chained, word).unwrap();
        WordCounter::record(&mut open, word).unwrap();
    }
    let expected = vec![("a", 3), ("is", 2), ("rose", 3)];
    assert_eq!(WordCounter::ordered_counts(&avl), expected);
    assert_eq!(WordCounter::ordered_counts(&rb), expected);
    assert_eq!(WordCounter::ordered_counts(&chained), expected);
    assert_eq!(WordCounter::ordered_counts(&open), expected);
    assert_eq!(avl.get(&"rose").unwrap(), &3);
}

#[test]
fn test_avl_rotation_scenario() {
    let mut tree = AvlTree::new();
    for key in [10, 20, 30, 40, 50, 25] {
        tree.insert(key, 0);
    }
    assert_eq!(tree.height(), 3);
    assert_eq!(
        tree.to_string(),
        "    ┌───[50, 0]\n\
         ┌───[40, 0]\n\
         │   └───#\n\
         [30, 0]\n\
         │   ┌───[25, 0]\n\
         └───[20, 0]\n\
         \x20   └───[10, 0]\n"
    );
}

#[test]
fn test_red_black_three_key_scenario() {
    let mut tree = RedBlackTree::new();
    tree.insert("a", 1).unwrap();
    tree.insert("b", 2).unwrap();
    tree.insert("c", 3).unwrap();
    let pairs: Vec<(&str, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(pairs, vec![("a", 1), ("b", 2), ("c", 3)]);
    assert_eq!(tree.verify_invariants().unwrap(), 1);
}

#[test]
fn test_chained_rehash_scenario() {
    let config = HashTableConfig::with_initial_size(19).load_factor(0.75);
    let mut table = ChainedHashTable::with_config(config).unwrap();
    for i in 0..15u32 {
        table.add(format!("word{}", i), i).unwrap();
    }
    assert_eq!(table.rehash_count(), 1);
    assert_eq!(table.table_size(), 41);
    assert_eq!(table.stats().rehashes, 1);
}

#[test]
fn test_insert_remove_round_trip() {
    let keys: Vec<u32> = (0..500).map(|i| (i * 7919) % 1_000).collect();

    let mut avl = AvlTree::new();
    let mut rb = RedBlackTree::new();
    let mut chained = ChainedHashTable::new();
    let mut open = OpenAddressingHashTable::new();
    for &k in &keys {
        avl.insert(k, ());
        rb.insert(k, ()).unwrap();
        chained.add(k, ()).unwrap();
        assert!(open.add(k, ()).is_inserted());
    }
    for &k in &keys {
        assert!(avl.remove(&k).is_some());
        assert!(rb.remove(&k).is_some());
        assert!(chained.take(&k).is_ok());
        assert!(open.remove(&k));
    }
    assert!(avl.is_empty() && rb.is_empty() && chained.is_empty() && open.is_empty());
    for &k in &keys {
        assert!(!avl.contains(&k));
        assert!(!rb.contains(&k));
        assert!(!chained.contains(&k));
        assert!(!open.contains(&k));
    }
}
