//! Performance characterization for the core (§10): how query latency and
//! oracle-call volume behave as a query workload repeatedly touches the same
//! region of the key space versus a fresh one each time. Not a stand-in for
//! the full client/server/network benchmark harness described in §1, which
//! is out of scope here.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures::executor::block_on;
use pope::{oracle::OracleError, Ciphertext, Oracle, PopeTree};

/// Wraps an integer-comparing oracle and counts every `cmp` call, so the
/// benchmark can report amortization directly rather than only wall time.
struct CountingOracle {
    calls: AtomicUsize,
}

impl CountingOracle {
    fn new() -> Self {
        CountingOracle { calls: AtomicUsize::new(0) }
    }

    fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::Relaxed)
    }
}

#[async_trait]
impl Oracle for CountingOracle {
    async fn cmp(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ordering, OracleError> {
        self.calls.fetch_add(1, AtomicOrdering::Relaxed);
        let a: i64 = std::str::from_utf8(a.as_bytes()).unwrap().parse().unwrap();
        let b: i64 = std::str::from_utf8(b.as_bytes()).unwrap().parse().unwrap();
        Ok(a.cmp(&b))
    }
}

fn ct(n: i64) -> Ciphertext {
    Ciphertext::new(n.to_string().into_bytes())
}

fn populated_tree(fanout: usize, n: i64) -> PopeTree<CountingOracle> {
    let mut tree = PopeTree::new(fanout, CountingOracle::new()).unwrap();
    for i in 0..n {
        tree.insert(ct(i)).unwrap();
    }
    tree
}

fn bench_cold_range(c: &mut Criterion) {
    c.bench_function("range_cold_1000", |b| {
        b.iter(|| {
            let mut tree = populated_tree(32, 1000);
            let result = block_on(tree.range(ct(black_box(100)), ct(black_box(200))));
            black_box(result.unwrap());
        })
    });
}

fn bench_amortized_range(c: &mut Criterion) {
    c.bench_function("range_amortized_repeat", |b| {
        b.iter(|| {
            let mut tree = populated_tree(32, 1000);
            let _ = block_on(tree.range(ct(100), ct(200))).unwrap();
            // Second query over the same, now partially sorted, region.
            let result = block_on(tree.range(ct(black_box(110)), ct(black_box(190))));
            black_box(result.unwrap());
        })
    });
}

fn report_oracle_call_counts(_c: &mut Criterion) {
    let mut tree = populated_tree(32, 1000);
    let before = tree.oracle().calls();
    let _ = block_on(tree.range(ct(100), ct(200))).unwrap();
    let after_first = tree.oracle().calls();
    let _ = block_on(tree.range(ct(110), ct(190))).unwrap();
    let after_second = tree.oracle().calls();
    eprintln!(
        "oracle calls: first range {} / second (amortized) range {}",
        after_first - before,
        after_second - after_first
    );
}

criterion_group!(benches, bench_cold_range, bench_amortized_range, report_oracle_call_counts);
criterion_main!(benches);
