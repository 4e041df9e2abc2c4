/*!
 * Object Pool Tests
 * Instance reuse, disposal on overflow and concurrent rent/return
 */

use ai_os_pool::{Disposable, LooseObjectPool, ObjectPool, PoolError};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

struct Connection {
    id: usize,
    disposed: Arc<AtomicUsize>,
}

impl Disposable for Connection {
    fn dispose(&mut self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

fn connection_pool(capacity: usize) -> (ObjectPool<Connection>, Arc<AtomicUsize>) {
    let disposed = Arc::new(AtomicUsize::new(0));
    let next_id = Arc::new(AtomicUsize::new(0));
    let factory_disposed = Arc::clone(&disposed);
    let pool = ObjectPool::with_disposal(capacity, move || Connection {
        id: next_id.fetch_add(1, Ordering::SeqCst),
        disposed: Arc::clone(&factory_disposed),
    })
    .unwrap();
    (pool, disposed)
}

#[test]
fn test_returned_instance_is_rented_again() {
    let pool = ObjectPool::new(4, || vec![0u8; 16]).unwrap();

    let first = pool.rent();
    let address = &*first as *const Vec<u8>;
    pool.return_to_pool(first);

    let second = pool.rent();
    assert_eq!(&*second as *const Vec<u8>, address);
    assert_eq!(pool.stats().hits, 1);
}

#[test]
fn test_rent_never_fails_when_empty() {
    let pool = ObjectPool::new(2, String::new).unwrap();
    let rented: Vec<_> = (0..10).map(|_| pool.rent()).collect();

    assert_eq!(rented.len(), 10);
    assert_eq!(pool.stats().misses, 10);
}

#[test]
fn test_disposal_on_overflow() {
    let (pool, disposed) = connection_pool(4);
    let retained = pool.retained_capacity();
    assert_eq!(retained, 5);

    let rented: Vec<_> = (0..retained + 1).map(|_| pool.rent()).collect();
    let last_id = rented.last().unwrap().id;

    for connection in rented {
        pool.return_to_pool(connection);
    }

    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.stats().discards, 1);
    assert_eq!(pool.available(), retained);

    // The overflowing instance was the one disposed
    let mut ids: Vec<_> = (0..retained).map(|_| pool.rent().id).collect();
    ids.sort_unstable();
    assert!(!ids.contains(&last_id));
}

#[test]
fn test_drop_disposes_retained_only() {
    let (pool, disposed) = connection_pool(4);
    let kept = pool.rent();
    let a = pool.rent();
    let b = pool.rent();
    pool.return_to_pool(a);
    pool.return_to_pool(b);

    drop(pool);
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
    drop(kept);
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_scoped_rental_returns_on_drop() {
    let pool = ObjectPool::new(4, || Vec::<u32>::with_capacity(8)).unwrap();
    {
        let mut scratch = pool.rent_scoped();
        scratch.push(7);
    }
    assert_eq!(pool.available(), 1);

    let detached = pool.rent_scoped().detach();
    assert_eq!(*detached, vec![7]);
    assert_eq!(pool.available(), 0);
}

#[test]
fn test_invalid_capacity() {
    let result = ObjectPool::new(0, || 0u8);
    assert!(matches!(result, Err(PoolError::InvalidCapacity { .. })));
}

#[test]
fn test_concurrent_rent_and_return() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 5_000;

    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let pool = Arc::new(
        ObjectPool::new(16, move || {
            counter.fetch_add(1, Ordering::Relaxed);
            Vec::<u8>::with_capacity(64)
        })
        .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for i in 0..ROUNDS {
                    let mut item = pool.rent();
                    item.clear();
                    item.push((t + i) as u8);
                    pool.return_to_pool(item);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.hits + stats.misses, (THREADS * ROUNDS) as u64);
    assert_eq!(stats.misses as usize, created.load(Ordering::Relaxed));
    assert!(pool.available() <= pool.retained_capacity());
}

#[test]
fn test_loose_pool_reuses_instances() {
    let pool = LooseObjectPool::new(4, || [0u8; 32]).unwrap();
    let first = pool.rent();
    let address = &*first as *const [u8; 32];
    pool.return_to_pool(first);

    let second = pool.rent();
    assert_eq!(&*second as *const [u8; 32], address);
}
