//! Deterministic workloads for benchmarking the Haft handle primitives.
//!
//! - [`distinct_keys`]: unique, well-spread map keys
//! - [`churn_script`]: a replayable alloc/free sequence that hovers around a
//!   target occupancy

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashSet;

/// One step of a churn workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Allocate a handle.
    Alloc,
    /// Free the live handle at this position (modulo the live count).
    Free(usize),
}

/// 64-bit LCG step (Knuth MMIX constants).
#[inline]
fn lcg(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

/// Generate `n` distinct keys from `seed`.
pub fn distinct_keys(n: usize, seed: u64) -> Vec<u64> {
    let mut state = seed;
    let mut seen = HashSet::with_capacity(n);
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let k = lcg(&mut state) >> 1;
        if seen.insert(k) {
            keys.push(k);
        }
    }
    keys
}

/// Generate `len` churn steps that keep roughly `target` of `capacity`
/// handles live.
///
/// Allocation is favoured below the target and freeing above it, so the
/// script never stalls at empty or full for long.
pub fn churn_script(len: usize, capacity: usize, target: usize, seed: u64) -> Vec<ChurnOp> {
    let mut state = seed;
    let mut live = 0usize;
    let mut ops = Vec::with_capacity(len);
    for _ in 0..len {
        let roll = (lcg(&mut state) >> 33) % 4;
        let alloc = match live {
            0 => true,
            n if n == capacity => false,
            n if n < target => roll != 0,
            _ => roll == 0,
        };
        if alloc {
            live += 1;
            ops.push(ChurnOp::Alloc);
        } else {
            live -= 1;
            ops.push(ChurnOp::Free((lcg(&mut state) >> 33) as usize));
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct_and_deterministic() {
        let a = distinct_keys(500, 7);
        let b = distinct_keys(500, 7);
        assert_eq!(a, b);
        let unique: HashSet<u64> = a.iter().copied().collect();
        assert_eq!(unique.len(), 500);
    }

    #[test]
    fn churn_never_exceeds_capacity() {
        let ops = churn_script(10_000, 64, 48, 3);
        let mut live = 0usize;
        for op in ops {
            match op {
                ChurnOp::Alloc => live += 1,
                ChurnOp::Free(_) => {
                    assert!(live > 0, "free on empty");
                    live -= 1;
                }
            }
            assert!(live <= 64);
        }
    }
}
