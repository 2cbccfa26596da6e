//! Property-based tests for pyramid.
//!
//! These tests verify invariants that should hold regardless of input:
//! - Membership lists form a disjoint cover of the dataset
//! - Centroids are the means of their members
//! - Search results are exactly `k` slots, ranked, with sentinels only at the tail
//! - With exact local indexes and full fan-out, search equals brute force

use proptest::prelude::*;
use pyramid::ann::{AnnIndex, FlatFactory, FlatIndex};
use pyramid::partitioning::KMeans;
use pyramid::{merge_results, Hit, PyramidIndex, PyramidParams};

prop_compose! {
    fn arb_dataset()(dim in 1usize..5, n in 1usize..60)
        (data in prop::collection::vec(-50.0f32..50.0, n * dim), dim in Just(dim), n in Just(n))
        -> (Vec<f32>, usize, usize) {
        (data, n, dim)
    }
}

fn assert_well_formed(hits: &[Hit], k: usize, n: usize) -> Result<(), TestCaseError> {
    prop_assert_eq!(hits.len(), k);
    let first_sentinel = hits.iter().position(Hit::is_sentinel).unwrap_or(k);
    for (i, hit) in hits.iter().enumerate() {
        if i < first_sentinel {
            prop_assert!(hit.id >= 0 && (hit.id as usize) < n, "id {} out of range", hit.id);
        } else {
            prop_assert!(hit.is_sentinel(), "valid entry after a sentinel at {}", i);
            prop_assert_eq!(hit.distance, f32::INFINITY);
        }
    }
    for w in hits[..first_sentinel].windows(2) {
        prop_assert!(
            w[0].distance < w[1].distance
                || (w[0].distance == w[1].distance && w[0].id < w[1].id),
            "not ranked: {:?} then {:?}",
            w[0],
            w[1]
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn membership_is_a_disjoint_cover(
        (data, n, dim) in arb_dataset(),
        partitions in 1usize..8,
    ) {
        let mut index = PyramidIndex::new(PyramidParams::new(dim, partitions)).unwrap();
        index.build(&data, n).unwrap();

        let membership = index.membership();
        prop_assert_eq!(membership.len(), partitions);
        prop_assert_eq!(membership.iter().map(Vec::len).sum::<usize>(), n);

        let mut seen = vec![false; n];
        for members in membership {
            prop_assert!(members.windows(2).all(|w| w[0] < w[1]), "not in dataset order");
            for &id in members {
                prop_assert!(!seen[id as usize], "id {} in two partitions", id);
                seen[id as usize] = true;
            }
        }
        prop_assert!(seen.iter().all(|&s| s));

        if n < partitions {
            prop_assert!(index.used_fallback());
        }
    }

    #[test]
    fn centroids_are_member_means(
        (data, n, dim) in arb_dataset(),
        partitions in 1usize..8,
    ) {
        let mut index = PyramidIndex::new(PyramidParams::new(dim, partitions)).unwrap();
        index.build(&data, n).unwrap();

        for (p, members) in index.membership().iter().enumerate() {
            if members.is_empty() {
                prop_assert!(index.centroid(p).is_none());
                prop_assert!(!index.has_local_index(p));
                continue;
            }
            prop_assert!(index.has_local_index(p));
            let centroid = index.centroid(p).unwrap();
            for j in 0..dim {
                let mean = members
                    .iter()
                    .map(|&id| data[id as usize * dim + j] as f64)
                    .sum::<f64>()
                    / members.len() as f64;
                prop_assert!(
                    (centroid[j] as f64 - mean).abs() < 1e-3,
                    "partition {} dim {}: {} vs {}", p, j, centroid[j], mean
                );
            }
        }
    }

    #[test]
    fn search_results_are_well_formed(
        (data, n, dim) in arb_dataset(),
        partitions in 1usize..8,
        fan_out in 1usize..4,
        k in 1usize..15,
        query_seed in 0usize..1000,
    ) {
        let params = PyramidParams::new(dim, partitions).with_fan_out(fan_out);
        let mut index = PyramidIndex::new(params).unwrap();
        index.build(&data, n).unwrap();

        let q = query_seed % n;
        let query: Vec<f32> = data[q * dim..(q + 1) * dim].iter().map(|x| x + 0.25).collect();
        let result = index.search(&query, k);
        assert_well_formed(result.hits(), k, n)?;
    }

    #[test]
    fn exact_locals_with_full_fan_out_match_brute_force(
        (data, n, dim) in arb_dataset(),
        partitions in 1usize..8,
        k in 1usize..15,
        query in prop::collection::vec(-50.0f32..50.0, 4),
    ) {
        let params = PyramidParams::new(dim, partitions).with_fan_out(partitions);
        let mut index =
            PyramidIndex::with_components(params, FlatFactory, KMeans::new().with_seed(11)).unwrap();
        index.build(&data, n).unwrap();

        let query = &query[..dim];
        let result = index.search(query, k);
        assert_well_formed(result.hits(), k, n)?;

        // Enough candidates means no sentinel.
        prop_assert_eq!(result.num_valid(), k.min(n));

        let mut exact = FlatIndex::new(dim).unwrap();
        exact.build(&data, n).unwrap();
        let want: Vec<i64> = exact
            .search(query, k)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id as i64)
            .collect();
        let got: Vec<i64> = result.valid().map(|h| h.id).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn merge_is_order_independent(
        raw in prop::collection::vec((0i64..100, 0.0f32..10.0), 0..40),
        split in 0usize..40,
        k in 0usize..50,
    ) {
        let hits: Vec<Hit> = raw.iter().map(|&(id, distance)| Hit { id, distance }).collect();
        let split = split.min(hits.len());
        let (a, b) = hits.split_at(split);

        let ab = merge_results(&[a.to_vec(), b.to_vec()], k);
        let ba = merge_results(&[b.to_vec(), vec![Hit::SENTINEL], a.to_vec()], k);
        prop_assert_eq!(&ab, &ba);
        prop_assert_eq!(ab.len(), k.min(hits.len()));
        prop_assert!(ab.iter().all(|h| !h.is_sentinel()));
    }
}
