// ChainedHashMap unit test suite (public API only).
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Presence: contains_key(k) iff k was put and not since erased/cleared.
// - Update vs insert: put returns the previous value or V::default().
// - Growth: bins double past the load threshold; entries stay reachable.
// - Copy/equality: copies are equal and independent; equality ignores
//   layout and insertion order.
// - Hash resolution: neither/conflicting hash functions fail construction.
use chained_hashmap::{hash_fn, ChainedHashMap, Error, HashFn, MapConfig, StdHash, TypeHash};
use std::collections::BTreeMap;

fn poly_hash(s: &String) -> i64 {
    s.bytes()
        .fold(7i64, |h, b| h.wrapping_mul(131).wrapping_add(b as i64))
}

fn first_byte(s: &String) -> i64 {
    s.bytes().next().map_or(0, |b| b as i64)
}

// Same body as `first_byte`, but a different function.
fn leading_byte(s: &String) -> i64 {
    s.bytes().next().map_or(0, |b| b as i64)
}

const POLY: HashFn<String> = hash_fn!(poly_hash);
const FIRST_BYTE: HashFn<String> = hash_fn!(first_byte);

/// Pins `poly_hash` at the type level.
struct PolyHash;
impl TypeHash<String> for PolyHash {
    const HASH: Option<HashFn<String>> = Some(POLY);
}

type Map = ChainedHashMap<String, i32>;

fn s(k: &str) -> String {
    k.to_string()
}

fn contents<H>(m: &ChainedHashMap<String, i32, H>) -> BTreeMap<String, i32> {
    m.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

// Test: the x/y walkthrough.
// Verifies: size, erase return value and presence after erase.
#[test]
fn put_two_erase_one() {
    let mut m = Map::new(1.0, Some(POLY)).unwrap();
    m.put(s("x"), 1);
    m.put(s("y"), 2);
    assert_eq!(m.len(), 2);
    assert_eq!(m.erase(&s("x")).unwrap(), 1);
    assert_eq!(m.len(), 1);
    assert!(!m.contains_key(&s("x")));
    assert!(m.contains_key(&s("y")));
}

// Test: put on new vs existing keys.
// Verifies: default returned for new keys and size +1; prior value for
// existing keys and size unchanged.
#[test]
fn put_reports_previous_value() {
    let mut m = Map::new(1.0, Some(POLY)).unwrap();
    assert_eq!(m.put(s("k"), 10), 0);
    assert_eq!(m.len(), 1);
    assert_eq!(m.put(s("k"), 20), 10);
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&s("k")), Some(&20));
}

// Test: erase on an absent key.
// Verifies: KeyNotFound, and contents are untouched.
#[test]
fn erase_absent_key_leaves_map_unchanged() {
    let mut m = Map::from_pairs(&[(s("a"), 1), (s("b"), 2)], 1.0, Some(POLY)).unwrap();
    let before = contents(&m);
    let err = m.erase(&s("c")).unwrap_err();
    assert!(matches!(err, Error::KeyNotFound { .. }));
    assert_eq!(err.to_string(), "ChainedHashMap::erase: key(\"c\") not in map");
    assert_eq!(contents(&m), before);
}

// Test: clear.
// Verifies: every key is gone, the map is reusable, bins are kept.
#[test]
fn clear_then_reuse() {
    let mut m = Map::with_bins(8, 1.0, Some(POLY)).unwrap();
    m.put_all((0..5).map(|i| (format!("k{i}"), i)));
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.bins(), 8);
    for i in 0..5 {
        assert!(!m.contains_key(&format!("k{i}")));
    }
    m.put(s("again"), 1);
    assert_eq!(m.len(), 1);
}

// Test: load-triggered growth.
// Verifies: bins double, size is unchanged by the resize and all keys
// keep their values.
#[test]
fn growth_keeps_every_entry() {
    let mut m = Map::new(2.0, Some(POLY)).unwrap();
    m.put(s("a"), 1);
    m.put(s("b"), 2);
    assert_eq!(m.bins(), 1);
    m.put(s("c"), 3);
    assert_eq!(m.bins(), 2);
    assert_eq!(m.len(), 3);
    for i in 0..500 {
        m.put(format!("n{i}"), i);
    }
    assert_eq!(m.len(), 503);
    assert!(m.bins().is_power_of_two());
    for i in 0..500 {
        assert_eq!(m.get(&format!("n{i}")), Some(&i));
    }
    for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
        assert_eq!(m.get(&s(k)), Some(&v));
    }
}

// Test: updates never grow the table.
#[test]
fn update_never_resizes() {
    let mut m = Map::new(1.0, Some(POLY)).unwrap();
    m.put(s("a"), 1);
    let bins = m.bins();
    for v in 0..100 {
        m.put(s("a"), v);
    }
    assert_eq!(m.bins(), bins);
}

// Test: iteration over a literal list.
// Verifies: exactly the literal entries, count 2, repeatable.
#[test]
fn iterate_literal_pairs() {
    let m = Map::from_pairs(&[(s("a"), 1), (s("b"), 2)], 1.0, Some(POLY)).unwrap();
    let first = contents(&m);
    let expected = BTreeMap::from([(s("a"), 1), (s("b"), 2)]);
    assert_eq!(first, expected);
    assert_eq!(m.iter().count(), 2);
    assert_eq!(contents(&m), first);
}

// Test: copy independence.
// Verifies: clone and from_map are equal to the source and later
// mutation of either side does not leak into the other.
#[test]
fn copies_are_independent() {
    let mut src = Map::from_pairs(&[(s("a"), 1), (s("b"), 2)], 1.0, Some(POLY)).unwrap();
    let cloned = src.clone();
    let copied = Map::from_map(&src, 1.0, None).unwrap();
    assert_eq!(cloned, src);
    assert_eq!(copied, src);

    src.put(s("c"), 3);
    src.erase(&s("a")).unwrap();
    assert_eq!(contents(&cloned), BTreeMap::from([(s("a"), 1), (s("b"), 2)]));
    assert_eq!(contents(&copied), BTreeMap::from([(s("a"), 1), (s("b"), 2)]));
}

// Test: copying under a different hash function re-places every entry.
#[test]
fn copy_with_new_hash_function() {
    let entries = (0..40).map(|i| (format!("e{i}"), i));
    let src = Map::from_entries(entries, 1.0, Some(POLY)).unwrap();
    let copy = Map::from_map(&src, 1.0, Some(FIRST_BYTE)).unwrap();
    assert_eq!(copy, src);
    assert_eq!(copy.hash_fn().hash(&s("e1")), b'e' as i64);
    for i in 0..40 {
        assert_eq!(copy.get(&format!("e{i}")), Some(&i));
    }
}

// Test: equality is independent of layout.
// Verifies: different insertion order and bin counts compare equal; a
// differing value or extra key compares unequal.
#[test]
fn equality_ignores_order_and_bins() {
    let a = Map::from_entries((0..30).map(|i| (format!("q{i}"), i)), 1.0, Some(POLY)).unwrap();
    let b = Map::from_entries(
        (0..30).rev().map(|i| (format!("q{i}"), i)),
        3.0,
        Some(FIRST_BYTE),
    )
    .unwrap();
    assert_ne!(a.bins(), b.bins());
    assert_eq!(a, b);

    let mut c = b.clone();
    c.put(s("q0"), 99);
    assert_ne!(a, c);
    let mut d = a.clone();
    d.put(s("extra"), 0);
    assert_ne!(a, d);
}

// Test: hash function resolution through the type parameter.
// Verifies: type-level only works, matching ctor is accepted, different
// ctor conflicts, neither is unresolved.
#[test]
fn hash_function_resolution() {
    let typed = ChainedHashMap::<String, i32, PolyHash>::new(1.0, None).unwrap();
    assert_eq!(typed.hash_fn().hash(&s("z")), poly_hash(&s("z")));
    assert!(ChainedHashMap::<String, i32, PolyHash>::new(1.0, Some(POLY)).is_ok());
    assert!(matches!(
        ChainedHashMap::<String, i32, PolyHash>::new(1.0, Some(FIRST_BYTE)),
        Err(Error::HashFunctionConflict { .. })
    ));
    assert!(ChainedHashMap::<String, i32, PolyHash>::new(1.0, Some(hash_fn!(poly_hash))).is_ok());
    assert!(matches!(
        Map::from_entries(Vec::new(), 1.0, None),
        Err(Error::HashFunctionUnresolved { op: "ChainedHashMap::from_entries" })
    ));
}

// Test: hash function identity does not depend on the function body.
// Verifies: two distinct functions that compute the same thing still
// conflict when one is pinned by the type and the other is passed in, and a
// copy under the look-alike re-places entries instead of sharing chains.
#[test]
fn look_alike_hash_functions_are_distinct() {
    struct FirstByte;
    impl TypeHash<String> for FirstByte {
        const HASH: Option<HashFn<String>> = Some(FIRST_BYTE);
    }

    let look_alike: HashFn<String> = hash_fn!(leading_byte);
    assert_ne!(look_alike, FIRST_BYTE);
    assert!(matches!(
        ChainedHashMap::<String, i32, FirstByte>::new(1.0, Some(look_alike)),
        Err(Error::HashFunctionConflict { op: "ChainedHashMap::new" })
    ));
    assert!(ChainedHashMap::<String, i32, FirstByte>::new(1.0, Some(FIRST_BYTE)).is_ok());

    let src = Map::from_pairs(&[(s("a"), 1), (s("b"), 2)], 1.0, Some(FIRST_BYTE)).unwrap();
    let copy = Map::from_map(&src, 1.0, Some(look_alike)).unwrap();
    assert_eq!(copy.hash_fn(), look_alike);
    assert_eq!(copy, src);
}

// Test: configuration validation.
#[test]
fn invalid_config_is_rejected() {
    assert!(matches!(
        Map::new(0.0, Some(POLY)),
        Err(Error::InvalidConfig { key: "load_threshold", .. })
    ));
    let cfg = MapConfig::new().with_initial_bins(16).with_load_threshold(0.75);
    let m = Map::with_config(cfg, Some(POLY)).unwrap();
    assert_eq!(m.bins(), 16);
    assert_eq!(m.load_threshold(), 0.75);
}

// Test: keys that other designs would treat as sentinels are ordinary.
#[test]
fn empty_string_key_is_a_normal_key() {
    let mut m = Map::new(1.0, Some(POLY)).unwrap();
    m.put(s(""), 1);
    m.put(s("a"), 2);
    assert!(m.contains_key(&s("")));
    assert_eq!(m.iter().count(), 2);
    let mut c = m.begin();
    let mut seen = 0;
    while !c.is_end() {
        seen += 1;
        c.advance(&m).unwrap();
    }
    assert_eq!(seen, 2);
    assert_eq!(m.erase(&s("")).unwrap(), 1);
}

// Test: indexing.
// Verifies: mutable indexing creates a default, read-only indexing fails
// for absent keys.
#[test]
fn indexing() {
    let mut m = Map::new(1.0, Some(POLY)).unwrap();
    *m.get_or_insert_default(s("count")) += 1;
    *m.get_or_insert_default(s("count")) += 1;
    assert_eq!(m[&s("count")], 2);
    assert_eq!(m.at(&s("count")), Ok(&2));
    assert!(matches!(m.at(&s("nope")), Err(Error::KeyNotFound { .. })));
    assert!(m.contains_value(&2));
}

// Test: the StdHash convenience path.
#[test]
fn std_hash_map_collects() {
    let m: ChainedHashMap<u32, &str, StdHash> = [(1, "one"), (2, "two"), (3, "three")]
        .into_iter()
        .collect();
    assert_eq!(m.len(), 3);
    assert_eq!(m.get(&2), Some(&"two"));
    let text = format!("{}", m);
    assert!(text.starts_with("map[") && text.ends_with(']'));
    assert_eq!(text.matches("->").count(), 3);
}
