//! Property-based tests for coldvault core

use coldvault_core::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn props_plan_respects_part_ceiling(total_size in 0u64..(1u64 << 50)) {
        let plan = ArchivePlan::for_size(total_size);

        prop_assert_eq!(plan.part_count, total_size.div_ceil(plan.part_size));
        prop_assert!(total_size / plan.part_size <= MAX_PARTS);
    }

    #[test]
    fn props_plan_part_size_is_power_of_two_at_least_one_mib(total_size in any::<u64>()) {
        let plan = ArchivePlan::for_size(total_size);

        prop_assert!(plan.part_size.is_power_of_two());
        prop_assert!(plan.part_size >= MIN_PART_SIZE);
        // the smallest such part size: halving it would break the ceiling
        if plan.part_size > MIN_PART_SIZE {
            prop_assert!(total_size / (plan.part_size / 2) > MAX_PARTS);
        }
    }

    #[test]
    fn props_plan_ranges_are_contiguous(total_size in 1u64..(64 * 1024 * 1024)) {
        let plan = ArchivePlan::for_size(total_size);

        let mut next_start = 0;
        for index in 0..plan.part_count {
            let range = plan.range_for(index).unwrap();
            prop_assert_eq!(range.start, next_start);
            prop_assert!(range.len() <= plan.part_size);
            next_start = range.end + 1;
        }
        prop_assert_eq!(next_start, total_size);
    }

    #[test]
    fn props_combine_single_leaf_is_identity(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let leaf = Sha256Hasher.hash(&data);
        prop_assert_eq!(combine(&Sha256Hasher, &[leaf]).unwrap(), leaf);
    }

    #[test]
    fn props_combine_matches_recursive_split(leaf_count in 1usize..40) {
        // The level-by-level reduction equals the recursive definition:
        // the left subtree holds the largest power of two below n leaves.
        fn reference(leaves: &[TreeHash]) -> TreeHash {
            if leaves.len() == 1 {
                return leaves[0];
            }
            let mut split = 1;
            while split * 2 < leaves.len() {
                split *= 2;
            }
            let left = reference(&leaves[..split]);
            let right = reference(&leaves[split..]);
            Sha256Hasher.hash_pair(&left, &right)
        }

        let leaves: Vec<TreeHash> = (0..leaf_count)
            .map(|i| Sha256Hasher.hash(&(i as u64).to_le_bytes()))
            .collect();

        prop_assert_eq!(combine(&Sha256Hasher, &leaves).unwrap(), reference(&leaves));
    }
}

#[cfg(test)]
mod part_hash_tests {
    use super::*;

    #[test]
    fn test_part_hashes_combine_to_whole_file_tree_hash() {
        let data: Vec<u8> = (0..(5 * LEAF_SIZE + 17)).map(|i| (i % 7) as u8).collect();

        // 2 MiB parts: every part hash is itself a subtree of the file
        let part_size = 2 * LEAF_SIZE;
        let part_hashes: Vec<TreeHash> = data
            .chunks(part_size)
            .map(|part| hash_part(&Sha256Hasher, part))
            .collect();

        let from_parts = combine(&Sha256Hasher, &part_hashes).unwrap();
        let whole = tree_hash_reader(&Sha256Hasher, &data[..]).unwrap();
        assert_eq!(from_parts, whole);
    }

    #[test]
    fn test_tree_hash_of_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &vec![0u8; 3 * LEAF_SIZE]).unwrap();

        let reopened = std::fs::File::open(file.path()).unwrap();
        let root = tree_hash_reader(&Sha256Hasher, reopened).unwrap();
        assert_eq!(
            root.to_hex(),
            "ca6cc129a4514ec765de86a4e7a49adf44842c9cac213c383ebe4071271bdf21"
        );
    }
}
