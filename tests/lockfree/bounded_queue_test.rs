/*!
 * Bounded Queue Tests
 * FIFO order, capacity rounding and multi-producer/multi-consumer delivery
 */

use ai_os_pool::core::sync::BoundedQueue;
use ai_os_pool::PoolError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_fifo_single_thread() {
    let queue = BoundedQueue::new(4);
    for i in 0..4 {
        assert!(queue.try_enqueue(i).is_ok());
    }
    for i in 0..4 {
        assert_eq!(queue.try_dequeue(), Some(i));
    }
    assert_eq!(queue.try_dequeue(), None);
}

#[test]
fn test_capacity_plus_one_is_rejected() {
    let queue = BoundedQueue::new(8);
    for i in 0..8 {
        queue.try_enqueue(i).unwrap();
    }

    assert!(queue.is_full());
    assert_eq!(queue.try_enqueue(8), Err(8));
    assert_eq!(queue.len(), 8);
}

fn assert_full_then_one_more(capacity: usize) {
    let queue = BoundedQueue::new(capacity);
    let capacity = queue.capacity();

    for i in 0..capacity {
        assert!(queue.try_enqueue(i).is_ok(), "enqueue {} of {}", i, capacity);
    }
    assert_eq!(queue.try_enqueue(capacity), Err(capacity));

    assert_eq!(queue.try_dequeue(), Some(0));
    assert!(queue.try_enqueue(capacity).is_ok());
    assert_eq!(queue.try_enqueue(capacity + 1), Err(capacity + 1));

    for expected in 1..=capacity {
        assert_eq!(queue.try_dequeue(), Some(expected));
    }
    assert_eq!(queue.try_dequeue(), None);
}

#[test]
fn test_dequeue_frees_one_slot_at_small_capacities() {
    for capacity in [1, 2, 3, 8] {
        assert_full_then_one_more(capacity);
    }
}

proptest! {
    #[test]
    fn prop_dequeue_frees_one_slot(capacity in 1usize..=64) {
        assert_full_then_one_more(capacity);
    }
}

#[test]
fn test_capacity_rounds_up() {
    assert_eq!(BoundedQueue::<u8>::new(5).capacity(), 8);
    assert_eq!(BoundedQueue::<u8>::new(1).capacity(), 1);
    assert_eq!(BoundedQueue::<u8>::new(1024).capacity(), 1024);
}

#[test]
fn test_try_new_rejects_oversized_capacity() {
    let result = BoundedQueue::<u8>::try_new(usize::MAX);
    assert!(matches!(result, Err(PoolError::InvalidCapacity { .. })));
}

#[test]
fn test_wraparound_keeps_order() {
    let queue = BoundedQueue::new(2);
    for round in 0..1000u32 {
        queue.try_enqueue(round).unwrap();
        queue.try_enqueue(round + 1).unwrap();
        assert_eq!(queue.try_dequeue(), Some(round));
        assert_eq!(queue.try_dequeue(), Some(round + 1));
    }
    assert!(queue.is_empty());
}

#[test]
fn test_concurrent_producers_deliver_every_item_once() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 10_000;

    let queue = Arc::new(BoundedQueue::new(64));
    let done = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let mut item = p * PER_PRODUCER + i;
                    loop {
                        match queue.try_enqueue(item) {
                            Ok(()) => break,
                            Err(back) => {
                                item = back;
                                thread::yield_now();
                            }
                        }
                    }
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    match queue.try_dequeue() {
                        Some(item) => seen.push(item),
                        None if done.load(Ordering::Acquire) => {
                            // Drain whatever landed after the flag flipped
                            while let Some(item) = queue.try_dequeue() {
                                seen.push(item);
                            }
                            break;
                        }
                        None => thread::yield_now(),
                    }
                }
                seen
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    done.store(true, Ordering::Release);

    let mut all = HashSet::new();
    let mut total = 0;
    for consumer in consumers {
        for item in consumer.join().unwrap() {
            assert!(all.insert(item), "item {} delivered twice", item);
            total += 1;
        }
    }

    assert_eq!(total, PRODUCERS * PER_PRODUCER);
    assert!(queue.is_empty());
}

#[test]
fn test_per_producer_order_preserved() {
    let queue = Arc::new(BoundedQueue::new(16));

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..5_000u32 {
                while queue.try_enqueue(i).is_err() {
                    thread::yield_now();
                }
            }
        })
    };

    let mut expected = 0u32;
    while expected < 5_000 {
        if let Some(item) = queue.try_dequeue() {
            assert_eq!(item, expected);
            expected += 1;
        }
    }
    producer.join().unwrap();
}
