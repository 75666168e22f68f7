// topology/aggregate.rs — merge of the two producers' NUMA cell lists.

use std::collections::BTreeSet;

use super::model::{AggregatedCell, CellMeasurement};

/// Merge the optional nova and zun cell lists into one combined view.
///
/// Modes:
/// - both present: iterate nova's cells in order; a cell is emitted only when
///   zun reports the same id (first zun match wins). The emitted cell sums
///   `cpu_usage`/`memory_usage`, unions `pinned_cpus`, and takes `cpuset` and
///   `memory` from the nova entry. Nova cells with no zun match are dropped,
///   and zun-only cells are never emitted.
/// - one present: that producer's list passes through unchanged.
/// - neither present: empty.
///
/// Pure and synchronous; output order follows the surviving input list.
pub fn merge(
    nova: Option<&[CellMeasurement]>,
    zun: Option<&[CellMeasurement]>,
) -> Vec<AggregatedCell> {
    match (nova, zun) {
        (Some(nova), Some(zun)) => nova
            .iter()
            .filter_map(|cell| {
                zun.iter()
                    .find(|node| node.id == cell.id)
                    .map(|node| merge_pair(cell, node))
            })
            .collect(),
        (Some(only), None) | (None, Some(only)) => {
            only.iter().map(AggregatedCell::from).collect()
        }
        (None, None) => Vec::new(),
    }
}

/// Combine two measurements of the same cell id.
fn merge_pair(cell: &CellMeasurement, node: &CellMeasurement) -> AggregatedCell {
    AggregatedCell {
        id: cell.id,
        cpuset: cell.cpuset.clone(),
        memory: cell.memory,
        cpu_usage: cell.cpu_usage + node.cpu_usage,
        pinned_cpus: union_pinned(&cell.pinned_cpus, &node.pinned_cpus),
        memory_usage: cell.memory_usage + node.memory_usage,
    }
}

/// Deduplicated union of both pinned-CPU lists. The contract is set
/// semantics; ascending order keeps responses reproducible.
fn union_pinned(a: &[i64], b: &[i64]) -> Vec<i64> {
    let set: BTreeSet<i64> = a.iter().chain(b.iter()).copied().collect();
    set.into_iter().collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(
        id: i64,
        cpuset: &[i64],
        memory: i64,
        cpu_usage: i64,
        memory_usage: i64,
        pinned: &[i64],
    ) -> CellMeasurement {
        CellMeasurement {
            id,
            cpuset: cpuset.to_vec(),
            memory,
            cpu_usage,
            memory_usage,
            pinned_cpus: pinned.to_vec(),
        }
    }

    #[test]
    fn both_present_sums_usage_and_unions_pinned() {
        let nova = [cell(0, &[0, 1], 4096, 1, 512, &[0])];
        let zun = [cell(0, &[0, 1], 4096, 2, 1024, &[1])];
        let merged = merge(Some(&nova), Some(&zun));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, 0);
        assert_eq!(merged[0].cpuset, vec![0, 1]);
        assert_eq!(merged[0].memory, 4096);
        assert_eq!(merged[0].cpu_usage, 3);
        assert_eq!(merged[0].memory_usage, 1536);
        assert_eq!(merged[0].pinned_cpus, vec![0, 1]);
    }

    #[test]
    fn disjoint_ids_merge_to_empty() {
        let nova = [cell(0, &[0], 1024, 1, 64, &[])];
        let zun = [cell(1, &[1], 1024, 1, 64, &[])];
        assert!(merge(Some(&nova), Some(&zun)).is_empty());
    }

    #[test]
    fn nova_cells_without_zun_match_are_dropped() {
        let nova = [
            cell(0, &[0], 1024, 1, 64, &[]),
            cell(1, &[1], 1024, 2, 128, &[1]),
        ];
        let zun = [cell(1, &[1], 1024, 3, 256, &[2])];
        let merged = merge(Some(&nova), Some(&zun));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, 1);
        assert_eq!(merged[0].cpu_usage, 5);
        assert_eq!(merged[0].memory_usage, 384);
        assert_eq!(merged[0].pinned_cpus, vec![1, 2]);
    }

    #[test]
    fn zun_only_cells_are_never_emitted() {
        let nova = [cell(0, &[0], 1024, 1, 64, &[])];
        let zun = [
            cell(0, &[0], 1024, 1, 64, &[]),
            cell(7, &[7], 1024, 1, 64, &[7]),
        ];
        let merged = merge(Some(&nova), Some(&zun));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, 0);
    }

    #[test]
    fn matched_cpuset_and_memory_come_from_nova() {
        let nova = [cell(2, &[4, 5], 8192, 0, 0, &[])];
        let zun = [cell(2, &[6, 7], 2048, 0, 0, &[])];
        let merged = merge(Some(&nova), Some(&zun));
        assert_eq!(merged[0].cpuset, vec![4, 5]);
        assert_eq!(merged[0].memory, 8192);
    }

    #[test]
    fn nova_only_passes_through_unchanged() {
        let nova = [
            cell(3, &[3], 2048, 1, 100, &[3]),
            cell(1, &[1], 1024, 0, 0, &[]),
        ];
        let merged = merge(Some(&nova), None);
        assert_eq!(merged.len(), 2);
        // Input order preserved, no summing, no dedup.
        assert_eq!(merged[0].id, 3);
        assert_eq!(merged[0].cpu_usage, 1);
        assert_eq!(merged[1].id, 1);
    }

    #[test]
    fn zun_only_passes_through_unchanged() {
        let zun = [cell(0, &[0, 1], 4096, 2, 1024, &[1])];
        let merged = merge(None, Some(&zun));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].cpu_usage, 2);
        assert_eq!(merged[0].pinned_cpus, vec![1]);
    }

    #[test]
    fn neither_present_is_empty() {
        assert!(merge(None, None).is_empty());
    }

    #[test]
    fn empty_lists_are_not_absent() {
        let empty: [CellMeasurement; 0] = [];
        let nova = [cell(0, &[0], 1024, 1, 64, &[])];
        // Empty zun list: no ids can match, so everything is dropped.
        assert!(merge(Some(&nova), Some(&empty)).is_empty());
        // Empty nova list passes through as empty, not as zun's list.
        assert!(merge(Some(&empty), Some(&nova)).is_empty());
    }

    #[test]
    fn duplicate_zun_ids_pair_first_match() {
        let nova = [cell(0, &[0], 1024, 1, 10, &[0])];
        let zun = [
            cell(0, &[0], 1024, 2, 20, &[1]),
            cell(0, &[0], 1024, 100, 1000, &[9]),
        ];
        let merged = merge(Some(&nova), Some(&zun));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].cpu_usage, 3);
        assert_eq!(merged[0].memory_usage, 30);
        assert_eq!(merged[0].pinned_cpus, vec![0, 1]);
    }

    #[test]
    fn duplicate_nova_ids_each_emit() {
        let nova = [
            cell(0, &[0], 1024, 1, 10, &[]),
            cell(0, &[0], 1024, 2, 20, &[]),
        ];
        let zun = [cell(0, &[0], 1024, 5, 50, &[])];
        let merged = merge(Some(&nova), Some(&zun));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].cpu_usage, 6);
        assert_eq!(merged[1].cpu_usage, 7);
    }

    #[test]
    fn pinned_union_dedups_overlap() {
        let nova = [cell(0, &[0], 1024, 0, 0, &[0, 1, 2])];
        let zun = [cell(0, &[0], 1024, 0, 0, &[2, 3, 0])];
        let merged = merge(Some(&nova), Some(&zun));
        assert_eq!(merged[0].pinned_cpus, vec![0, 1, 2, 3]);
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{BTreeSet, HashMap};

    /// A cell list whose ids are unique and drawn from `lo..hi`.
    fn unique_cells(lo: i64, hi: i64, max: usize) -> impl Strategy<Value = Vec<CellMeasurement>> {
        proptest::collection::hash_set(lo..hi, 0..max).prop_flat_map(|ids| {
            ids.into_iter()
                .map(|id| {
                    (
                        proptest::collection::vec(0i64..256, 0..4),
                        0i64..1_000_000,
                        0i64..64,
                        0i64..1_000_000,
                        proptest::collection::vec(0i64..64, 0..4),
                    )
                        .prop_map(move |(cpuset, memory, cpu_usage, memory_usage, pinned_cpus)| {
                            CellMeasurement {
                                id,
                                cpuset,
                                memory,
                                cpu_usage,
                                memory_usage,
                                pinned_cpus,
                            }
                        })
                })
                .collect::<Vec<_>>()
        })
    }

    proptest! {
        #[test]
        fn non_overlapping_id_sets_always_merge_empty(
            nova in unique_cells(0, 100, 8),
            zun in unique_cells(100, 200, 8),
        ) {
            prop_assert!(merge(Some(&nova), Some(&zun)).is_empty());
        }

        #[test]
        fn single_producer_merge_is_identity(cells in unique_cells(0, 100, 8)) {
            let expected: Vec<AggregatedCell> = cells.iter().map(AggregatedCell::from).collect();
            prop_assert_eq!(merge(Some(&cells), None), expected.clone());
            prop_assert_eq!(merge(None, Some(&cells)), expected);
        }

        #[test]
        fn matched_cells_sum_usage_and_union_pinned(
            nova in unique_cells(0, 32, 8),
            zun in unique_cells(0, 32, 8),
        ) {
            let by_id: HashMap<i64, &CellMeasurement> =
                zun.iter().map(|c| (c.id, c)).collect();
            let merged = merge(Some(&nova), Some(&zun));

            // Emitted ids are exactly the intersection, in nova's order.
            let expected_ids: Vec<i64> = nova
                .iter()
                .map(|c| c.id)
                .filter(|id| by_id.contains_key(id))
                .collect();
            let got_ids: Vec<i64> = merged.iter().map(|c| c.id).collect();
            prop_assert_eq!(got_ids, expected_ids);

            for out in &merged {
                let a = nova.iter().find(|c| c.id == out.id).unwrap();
                let b = by_id[&out.id];
                prop_assert_eq!(out.cpu_usage, a.cpu_usage + b.cpu_usage);
                prop_assert_eq!(out.memory_usage, a.memory_usage + b.memory_usage);
                let expected_pinned: BTreeSet<i64> = a
                    .pinned_cpus
                    .iter()
                    .chain(b.pinned_cpus.iter())
                    .copied()
                    .collect();
                let got_pinned: BTreeSet<i64> = out.pinned_cpus.iter().copied().collect();
                prop_assert_eq!(out.pinned_cpus.len(), got_pinned.len());
                prop_assert_eq!(got_pinned, expected_pinned);
            }
        }
    }
}
