//! Expansion of polycube seed lists into the next size up.

use hashbrown::HashSet;
use rayon::prelude::*;

use crate::coord::Coord;
use crate::polycube::PolyCube;

/// Seeds per serial task; amortizes scheduling against the few hundred
/// canonicalizations each seed costs.
pub(crate) fn serial_chunk_len(cube_count: usize) -> usize {
    3200 / cube_count
}

pub(crate) fn parallel_task_count() -> usize {
    num_cpus::get()
}

fn try_adding_block<const M: usize, const N: usize>(
    seed: &PolyCube<M>,
    coord: Coord,
    output: &mut HashSet<PolyCube<N>>,
) {
    if seed.cubes().contains(&coord) {
        return;
    }

    let mut cubes = [Coord::default(); N];
    cubes[..M].copy_from_slice(seed.cubes());
    cubes[M] = coord;

    output.insert(PolyCube::new(cubes).canonical());
}

/// Insert into `output` the canonical form of every shape obtained by
/// attaching one cube to a face of `seed`.
///
/// Expansions generated from different faces of different seeds collapse in
/// the set; across all canonical `M`-cube seeds the union is exactly the
/// set of canonical `N`-cubes.
pub fn find_larger<const M: usize, const N: usize>(
    seed: &PolyCube<M>,
    output: &mut HashSet<PolyCube<N>>,
) {
    debug_assert_eq!(N, M + 1);

    for block in seed.cubes() {
        for step in Coord::FACE_STEPS {
            try_adding_block(seed, *block + step, output);
        }
    }
}

fn union_into_larger<T: core::hash::Hash + Eq>(
    mut a: HashSet<T>,
    mut b: HashSet<T>,
) -> HashSet<T> {
    if a.len() < b.len() {
        core::mem::swap(&mut a, &mut b);
    }
    a.extend(b);
    a
}

fn expand_into<const M: usize, const N: usize>(
    seeds: &[PolyCube<M>],
    serial_chunk: usize,
    parallel_batch: usize,
    result: &mut HashSet<PolyCube<N>>,
) {
    if seeds.len() <= serial_chunk {
        // Small enough to do one after the other.
        for seed in seeds {
            find_larger(seed, result);
        }
    } else if seeds.len() <= parallel_batch {
        // One sub-range per serial chunk, expanded in parallel. The caller
        // materialized `seeds` into an owned buffer already, so tasks never
        // touch a file cursor.
        let merged = seeds
            .par_chunks(serial_chunk)
            .map(|chunk| {
                let mut sub_result = HashSet::new();
                for seed in chunk {
                    find_larger(seed, &mut sub_result);
                }
                sub_result
            })
            .reduce(HashSet::new, union_into_larger);

        if result.is_empty() {
            *result = merged;
        } else {
            result.extend(merged);
        }
    } else {
        // Super-chunks in series, so at most one batch of per-task sets is
        // alive at a time.
        for super_chunk in seeds.chunks(parallel_batch) {
            expand_into(super_chunk, serial_chunk, parallel_batch, result);
        }
    }
}

/// Expand a seed range into the deduplicated set of its successors.
///
/// The result is independent of task scheduling: sub-results are combined
/// set-wise and carry no order.
pub fn expand_range<const M: usize, const N: usize>(
    seeds: &[PolyCube<M>],
) -> HashSet<PolyCube<N>> {
    let serial_chunk = serial_chunk_len(N);
    let parallel_batch = serial_chunk * parallel_task_count();

    let mut result = HashSet::new();
    expand_into(seeds, serial_chunk, parallel_batch, &mut result);
    result
}
