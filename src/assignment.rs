//! Splits an ordered partition list into contiguous per-worker subsets.
//!
//! Worker `i` always receives a contiguous slice of the original ordering,
//! and the last worker absorbs whatever integer division leaves over, so no
//! partition is ever dropped at the cost of the last worker occasionally
//! carrying a larger share.

use crate::error::ContainerError;
use crate::types::TopicPartition;

/// Split `partitions` into exactly `concurrency` non-empty contiguous
/// subsets: pairwise disjoint, union equal to the input, original order
/// preserved within and across subsets.
///
/// Requires `1 <= concurrency <= partitions.len()`. The container clamps
/// concurrency (with a warning) before calling; the assigner itself refuses
/// an oversized concurrency with [`ContainerError::InvalidAssignment`].
pub fn partition_subsets(
    partitions: &[TopicPartition],
    concurrency: usize,
) -> Result<Vec<Vec<TopicPartition>>, ContainerError> {
    if concurrency == 0 || concurrency > partitions.len() {
        return Err(ContainerError::InvalidAssignment {
            concurrency,
            partitions: partitions.len(),
        });
    }

    if concurrency == 1 {
        return Ok(vec![partitions.to_vec()]);
    }

    if partitions.len() == concurrency {
        return Ok(partitions.iter().map(|tp| vec![tp.clone()]).collect());
    }

    let per_worker = partitions.len() / concurrency;
    let mut subsets = Vec::with_capacity(concurrency);
    for i in 0..concurrency {
        let start = i * per_worker;
        let end = if i == concurrency - 1 {
            // Last worker absorbs the remainder of the integer division.
            partitions.len()
        } else {
            start + per_worker
        };
        subsets.push(partitions[start..end].to_vec());
    }

    Ok(subsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn partitions(n: i32) -> Vec<TopicPartition> {
        (0..n).map(|i| TopicPartition::new("t", i)).collect()
    }

    #[test]
    fn test_single_worker_gets_everything_in_order() {
        let input = partitions(5);
        let subsets = partition_subsets(&input, 1).unwrap();
        assert_eq!(subsets, vec![input]);
    }

    #[test]
    fn test_one_partition_each_when_counts_match() {
        let input = partitions(3);
        let subsets = partition_subsets(&input, 3).unwrap();
        assert_eq!(
            subsets,
            vec![
                vec![TopicPartition::new("t", 0)],
                vec![TopicPartition::new("t", 1)],
                vec![TopicPartition::new("t", 2)],
            ]
        );
    }

    #[test]
    fn test_last_worker_absorbs_remainder() {
        let input = partitions(5);
        let subsets = partition_subsets(&input, 2).unwrap();
        assert_eq!(
            subsets,
            vec![
                vec![TopicPartition::new("t", 0), TopicPartition::new("t", 1)],
                vec![
                    TopicPartition::new("t", 2),
                    TopicPartition::new("t", 3),
                    TopicPartition::new("t", 4),
                ],
            ]
        );
    }

    #[rstest]
    #[case(1, 1)]
    #[case(5, 1)]
    #[case(5, 2)]
    #[case(5, 4)]
    #[case(6, 3)]
    #[case(7, 3)]
    #[case(12, 5)]
    #[case(12, 12)]
    fn test_subsets_partition_the_input(#[case] n: i32, #[case] concurrency: usize) {
        let input = partitions(n);
        let subsets = partition_subsets(&input, concurrency).unwrap();

        assert_eq!(subsets.len(), concurrency);
        assert!(subsets.iter().all(|s| !s.is_empty()));

        // Concatenating the subsets reproduces the input exactly, which
        // implies contiguity, disjointness and no dropped partitions.
        let flattened: Vec<TopicPartition> = subsets.into_iter().flatten().collect();
        assert_eq!(flattened, input);
    }

    #[test]
    fn test_oversized_concurrency_rejected() {
        let input = partitions(3);
        let err = partition_subsets(&input, 5).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::InvalidAssignment {
                concurrency: 5,
                partitions: 3
            }
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let input = partitions(3);
        assert!(partition_subsets(&input, 0).is_err());
    }
}
