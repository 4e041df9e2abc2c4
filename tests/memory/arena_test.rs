/*!
 * Buffer Arena Tests
 * Round trips, reference counting, slicing and bucket selection
 */

use ai_os_pool::memory::arena::bucket_index;
use ai_os_pool::{ArenaConfig, BucketSizing, BufferArena, RentedBuffer};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serial_test::serial;
use std::sync::Arc;
use std::thread;

fn test_arena() -> BufferArena {
    BufferArena::new(
        ArenaConfig::default()
            .with_max_buffer_length(64 * 1024)
            .with_pool_limit(8)
            .with_sizing(BucketSizing::Flat),
    )
    .unwrap()
}

#[test]
fn test_round_trip_reuses_storage() {
    let arena = test_arena();

    let mut buffer = arena.rent(1000);
    buffer.as_view_mut()[0] = 0xAB;
    let address = buffer.as_ptr();
    buffer.release();

    let again = arena.rent(1000);
    assert_eq!(again.as_ptr(), address);
    assert_eq!(again[0], 0xAB);
    assert_eq!(again.ref_count(), 1);
}

#[test]
fn test_shared_buffer_returns_after_last_release() {
    let arena = test_arena();
    let buffer = arena.rent(512);
    let shared = buffer.increment_and_share();
    assert_eq!(buffer.ref_count(), 2);

    buffer.release();
    let bucket = bucket_index(512);
    assert_eq!(arena.stats().buckets[bucket].pooled, 0);

    shared.release();
    assert_eq!(arena.stats().buckets[bucket].pooled, 1);
    assert_eq!(arena.stats().buckets[bucket].returns, 1);
}

#[test]
fn test_slicing_does_not_copy() {
    let arena = test_arena();
    let mut buffer = arena.rent(256);
    for (i, byte) in buffer.as_view_mut().iter_mut().enumerate() {
        *byte = i as u8;
    }

    let view = buffer.as_view_range(16, 32).slice(8);
    assert_eq!(view.offset(), 24);
    assert_eq!(view.as_ptr(), buffer[24..].as_ptr());

    let slice = buffer.share_slice(100, 10);
    assert_eq!(slice[0], 100);
    assert_eq!(slice.as_ptr(), buffer[100..].as_ptr());
    assert_eq!(buffer.ref_count(), 2);
}

#[test]
fn test_write_after_share_is_visible_through_slice() {
    let arena = test_arena();
    let buffer = arena.rent(64);
    let slice = buffer.share_slice(5, 10);

    // Single thread; no other borrow of the bytes is live during the write
    unsafe { buffer.as_mut_slice_unchecked()[5] = 0x5A };

    assert_eq!(slice[0], 0x5A);
    assert_eq!(slice.len(), 10);
}

#[test]
fn test_largest_exponential_class_retains_one() {
    let arena = BufferArena::new(
        ArenaConfig::default()
            .with_max_buffer_length(1024)
            .with_pool_limit(4)
            .with_sizing(BucketSizing::Exponential),
    )
    .unwrap();
    let largest = bucket_index(1024);

    let first = arena.rent(1024);
    let second = arena.rent(1024);
    first.release();
    second.release();

    let again = arena.rent(1024);
    assert_eq!(again.len(), 1024);
    assert_eq!(again.ref_count(), 1);

    let stats = &arena.stats().buckets[largest];
    assert_eq!(stats.pool_limit, 1);
    assert_eq!(stats.returns, 1);
    assert_eq!(stats.drops, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
#[serial]
fn test_shared_arena_largest_class_round_trip() {
    let arena = BufferArena::shared();
    let max = arena.max_buffer_length();

    arena.rent(max).release();
    arena.rent(max).release();
    let buffer = arena.rent(max);
    assert_eq!(buffer.len(), max);
}

#[test]
fn test_views_do_not_change_count() {
    let arena = test_arena();
    let mut buffer = arena.rent(64);
    {
        let view = buffer.as_view_mut_at(32);
        let read = view.into_read_only();
        assert_eq!(read.len(), 32);
    }
    let _a = buffer.as_view();
    let _b = buffer.as_view_at(10);
    assert_eq!(buffer.ref_count(), 1);
}

#[test]
fn test_bucket_boundaries() {
    let arena = test_arena();
    assert_eq!(arena.rent(1024).len(), 1024);
    assert_eq!(arena.rent(1025).len(), 2048);
    assert_eq!(arena.rent(2).len(), 2);
    assert_eq!(arena.rent(3).len(), 4);
}

#[test]
fn test_zero_length_rent() {
    let arena = test_arena();
    let buffer = arena.rent(0);
    assert!(buffer.is_empty());
    assert!(!buffer.is_pooled());
    assert_eq!(buffer.ref_count(), 1);
    buffer.release();
    assert_eq!(arena.stats().pooled_bytes(), 0);
}

#[test]
fn test_oversized_rent_is_unpooled() {
    let arena = test_arena();
    let buffer = arena.rent(100_000);
    assert_eq!(buffer.len(), 100_000);
    assert!(!buffer.is_pooled());

    buffer.release();
    let stats = arena.stats();
    assert_eq!(stats.unpooled_rents, 1);
    assert_eq!(stats.pooled_bytes(), 0);
}

#[test]
fn test_adopted_buffer_is_never_pooled() {
    let buffer = RentedBuffer::adopt(b"external".to_vec());
    assert!(!buffer.is_pooled());
    assert_eq!(&buffer[..], b"external");
}

#[test]
fn test_strategies_capacity_bytes() {
    let base = ArenaConfig::default()
        .with_max_buffer_length(1024)
        .with_pool_limit(4);

    let flat = BufferArena::new(base.clone().with_sizing(BucketSizing::Flat)).unwrap();
    // 4 * (1 + 2 + ... + 1024)
    assert_eq!(flat.configured_capacity_bytes(), 4 * 2047);

    let exponential = BufferArena::new(base.with_sizing(BucketSizing::Exponential)).unwrap();
    // 1024*1 + 512*2 + 256*4, then 4 each for classes 1..=128
    assert_eq!(
        exponential.configured_capacity_bytes(),
        1024 + 512 * 2 + 256 * 4 + 4 * 255
    );
}

#[test]
fn test_full_bucket_drops_extra_buffers() {
    let arena = test_arena();
    let rented: Vec<_> = (0..10).map(|_| arena.rent(64)).collect();
    for buffer in rented {
        buffer.release();
    }

    let stats = &arena.stats().buckets[bucket_index(64)];
    assert_eq!(stats.returns, 8);
    assert_eq!(stats.drops, 2);
}

#[test]
fn test_concurrent_share_and_release() {
    let arena = Arc::new(test_arena());
    let handles: Vec<_> = (0..8)
        .map(|seed| {
            let arena = Arc::clone(&arena);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                for _ in 0..2_000 {
                    let len = rng.gen_range(1..=4096);
                    let buffer = arena.rent(len);
                    assert!(buffer.len() >= len);

                    let shares: Vec<_> = (0..rng.gen_range(0..4))
                        .map(|_| buffer.increment_and_share())
                        .collect();
                    buffer.release();
                    for share in shares {
                        share.release();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Every pooled buffer came back exactly once with a clean count
    for bucket in arena.stats().buckets {
        assert!(bucket.pooled <= bucket.pool_limit);
    }
    let buffer = arena.rent(4096);
    assert_eq!(buffer.ref_count(), 1);
}

#[test]
fn test_share_crosses_threads() {
    let arena = test_arena();
    let mut buffer = arena.rent(128);
    buffer.as_view_mut().fill(9);

    let slice = buffer.share_slice(0, 64);
    let sum = thread::spawn(move || slice.iter().map(|&b| b as u32).sum::<u32>())
        .join()
        .unwrap();

    assert_eq!(sum, 9 * 64);
    assert_eq!(buffer.ref_count(), 1);
}

#[test]
#[serial]
fn test_shared_arena_is_process_wide() {
    let first = BufferArena::shared();
    let second = BufferArena::shared();
    assert!(std::ptr::eq(first, second));

    let buffer = first.rent(4000);
    assert_eq!(buffer.len(), 4096);
    assert!(buffer.is_pooled());
}

#[test]
#[serial]
fn test_shared_arena_trim() {
    let arena = BufferArena::shared();
    arena.rent(300).release();
    arena.trim();
    assert_eq!(arena.stats().pooled_bytes(), 0);
}

#[test]
fn test_config_from_json_builds_arena() {
    let config = ArenaConfig::from_json(
        r#"{ "max_buffer_length": 4096, "pool_limit": 2, "sizing": "flat", "prefill": true }"#,
    )
    .unwrap();
    let arena = BufferArena::new(config).unwrap();

    let stats = arena.stats();
    assert_eq!(stats.buckets.len(), 13);
    assert!(stats.buckets.iter().all(|b| b.pooled == 2));
}
