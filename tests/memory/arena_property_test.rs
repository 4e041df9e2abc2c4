/*!
 * Buffer Arena Property Tests
 */

use ai_os_pool::memory::arena::{bucket_index, class_length};
use ai_os_pool::{ArenaConfig, BucketSizing, BufferArena};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_class_length_covers_request(len in 1usize..(1 << 24)) {
        let class = class_length(bucket_index(len));
        prop_assert!(class >= len);
        prop_assert!(class < len * 2 || len == 1);
        prop_assert!(class.is_power_of_two());
    }

    #[test]
    fn prop_rent_satisfies_minimum(len in 0usize..20_000) {
        let arena = BufferArena::new(ArenaConfig::default().with_max_buffer_length(8192)).unwrap();
        let buffer = arena.rent(len);

        prop_assert!(buffer.len() >= len);
        prop_assert_eq!(buffer.is_pooled(), len > 0 && len <= 8192);
        if len > 8192 {
            prop_assert_eq!(buffer.len(), len);
        }
    }

    #[test]
    fn prop_slices_stay_in_bounds(len in 1usize..4096, start in 0usize..4096, width in 0usize..4096) {
        let arena = BufferArena::new(ArenaConfig::default().with_max_buffer_length(4096)).unwrap();
        let buffer = arena.rent(len);
        let start = start % (buffer.len() + 1);
        let width = width % (buffer.len() - start + 1);

        let slice = buffer.share_slice(start, width);
        prop_assert_eq!(slice.len(), width);
        prop_assert_eq!(slice.offset(), start);
        prop_assert_eq!(buffer.ref_count(), 2);
        drop(slice);
        prop_assert_eq!(buffer.ref_count(), 1);
    }

    #[test]
    fn prop_share_release_balances(shares in 0usize..16) {
        let arena = BufferArena::new(
            ArenaConfig::default()
                .with_max_buffer_length(1024)
                .with_sizing(BucketSizing::Flat),
        )
        .unwrap();

        let buffer = arena.rent(100);
        let handles: Vec<_> = (0..shares).map(|_| buffer.increment_and_share()).collect();
        prop_assert_eq!(buffer.ref_count(), shares as isize + 1);

        drop(handles);
        buffer.release();

        let bucket = &arena.stats().buckets[bucket_index(100)];
        prop_assert_eq!(bucket.returns, 1);
        prop_assert_eq!(bucket.pooled, 1);
    }
}
