//! Property tests (§8): P1 conservation, P4 leaf cap, P5 range correctness,
//! P6 insert-order independence, run against randomized workloads over a
//! [`LocalOracle`] comparing plain integers.

use std::cmp::Ordering;
use std::collections::HashMap;

use futures::executor::block_on;
use pope::{oracle::LocalOracle, tree::Node, Ciphertext, PopeTree};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

fn int_oracle() -> LocalOracle<impl Fn(&Ciphertext, &Ciphertext) -> Ordering + Send + Sync> {
    LocalOracle::new(|a: &Ciphertext, b: &Ciphertext| {
        let a: i64 = std::str::from_utf8(a.as_bytes()).unwrap().parse().unwrap();
        let b: i64 = std::str::from_utf8(b.as_bytes()).unwrap().parse().unwrap();
        a.cmp(&b)
    })
}

fn ct(n: i64) -> Ciphertext {
    Ciphertext::new(n.to_string().into_bytes())
}

fn to_int(c: &Ciphertext) -> i64 {
    std::str::from_utf8(c.as_bytes()).unwrap().parse().unwrap()
}

#[derive(Clone, Debug)]
struct Workload {
    fanout: usize,
    inserts: Vec<i64>,
    queries: Vec<(i64, i64)>,
}

impl Arbitrary for Workload {
    fn arbitrary(g: &mut Gen) -> Self {
        let fanout = 1 + (usize::arbitrary(g) % 8);
        let n_inserts = usize::arbitrary(g) % 40;
        let inserts: Vec<i64> = (0..n_inserts).map(|_| i64::arbitrary(g) % 50).collect();
        let n_queries = usize::arbitrary(g) % 6;
        let queries: Vec<(i64, i64)> = (0..n_queries)
            .map(|_| {
                let a = i64::arbitrary(g) % 50;
                let b = i64::arbitrary(g) % 50;
                (a.min(b), a.max(b))
            })
            .collect();
        Workload { fanout, inserts, queries }
    }
}

/// Recursively gathers every buffer in the tree, keyed by a stable path so
/// callers can sum multiplicities across the whole structure (P1).
fn all_buffered(node: &Node, out: &mut Vec<i64>) {
    out.extend(node.buffer().iter().map(to_int));
    out.extend(node.pivots().iter().map(to_int));
    for child in node.children() {
        all_buffered(child, out);
    }
}

fn multiset(values: &[i64]) -> HashMap<i64, usize> {
    let mut m = HashMap::new();
    for v in values {
        *m.entry(*v).or_insert(0) += 1;
    }
    m
}

fn assert_leaf_cap(node: &Node, fanout: usize) {
    if node.children().is_empty() {
        assert!(
            node.buffer().len() <= fanout || {
                // the only allowed violation: every element is one
                // oracle-equal run (see §3/§9 degenerate case).
                let values: Vec<i64> = node.buffer().iter().map(to_int).collect();
                values.first().map_or(true, |first| values.iter().all(|v| v == first))
            },
            "leaf exceeds fanout without being an all-duplicates run"
        );
    } else {
        assert!(
            node.pivots().len() >= 1 && node.pivots().len() <= fanout,
            "internal node pivot count out of [1, L] range"
        );
        for w in node.pivots().windows(2) {
            assert!(to_int(&w[0]) < to_int(&w[1]), "pivots must be strictly increasing");
        }
        for child in node.children() {
            assert_leaf_cap(child, fanout);
        }
    }
}

#[quickcheck]
fn p1_conservation(workload: Workload) -> bool {
    let mut tree = PopeTree::new(workload.fanout, int_oracle()).unwrap();
    for n in &workload.inserts {
        tree.insert(ct(*n)).unwrap();
    }
    for (lo, hi) in &workload.queries {
        let _ = block_on(tree.range(ct(*lo), ct(*hi)));
    }

    let mut stored = Vec::new();
    all_buffered(tree.root(), &mut stored);
    multiset(&stored) == multiset(&workload.inserts)
}

#[quickcheck]
fn p4_leaf_cap_holds_after_range(workload: Workload) -> bool {
    if workload.queries.is_empty() {
        return true;
    }
    let mut tree = PopeTree::new(workload.fanout, int_oracle()).unwrap();
    for n in &workload.inserts {
        tree.insert(ct(*n)).unwrap();
    }
    for (lo, hi) in &workload.queries {
        let _ = block_on(tree.range(ct(*lo), ct(*hi)));
    }
    assert_leaf_cap(tree.root(), workload.fanout);
    true
}

#[quickcheck]
fn p5_range_correctness(workload: Workload) -> bool {
    let mut tree = PopeTree::new(workload.fanout, int_oracle()).unwrap();
    for n in &workload.inserts {
        tree.insert(ct(*n)).unwrap();
    }
    for (lo, hi) in &workload.queries {
        let expected = multiset(
            &workload
                .inserts
                .iter()
                .copied()
                .filter(|v| *v >= *lo && *v <= *hi)
                .collect::<Vec<_>>(),
        );
        let got = multiset(
            &block_on(tree.range(ct(*lo), ct(*hi)))
                .unwrap()
                .iter()
                .map(to_int)
                .collect::<Vec<_>>(),
        );
        if expected != got {
            return false;
        }
    }
    true
}

#[quickcheck]
fn p6_insert_order_independence(mut workload: Workload, seed: u8) -> bool {
    if workload.queries.is_empty() || workload.inserts.is_empty() {
        return true;
    }
    let original = workload.inserts.clone();
    let mut permuted = original.clone();
    // deterministic pseudo-shuffle driven by `seed`, avoiding a rand dependency here
    let n = permuted.len();
    for i in 0..n {
        let j = (i * 2654435761usize.wrapping_add(seed as usize)) % n;
        permuted.swap(i, j);
    }
    workload.inserts = permuted;

    let mut tree_a = PopeTree::new(workload.fanout, int_oracle()).unwrap();
    for n in &original {
        tree_a.insert(ct(*n)).unwrap();
    }
    let mut tree_b = PopeTree::new(workload.fanout, int_oracle()).unwrap();
    for n in &workload.inserts {
        tree_b.insert(ct(*n)).unwrap();
    }

    for (lo, hi) in &workload.queries {
        let a = multiset(
            &block_on(tree_a.range(ct(*lo), ct(*hi)))
                .unwrap()
                .iter()
                .map(to_int)
                .collect::<Vec<_>>(),
        );
        let b = multiset(
            &block_on(tree_b.range(ct(*lo), ct(*hi)))
                .unwrap()
                .iter()
                .map(to_int)
                .collect::<Vec<_>>(),
        );
        if a != b {
            return false;
        }
    }
    true
}
