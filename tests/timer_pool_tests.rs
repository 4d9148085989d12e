//! Timer pool tests

use rust_onair_desklight::audio::{TimerPool, ToneError, MAX_TIMERS};

#[test]
fn test_pool_exhaustion() {
    let pool = TimerPool::new(MAX_TIMERS);
    let leases: Vec<_> = (0..MAX_TIMERS).map(|_| pool.allocate().unwrap()).collect();

    assert_eq!(pool.in_use(), MAX_TIMERS);
    assert!(matches!(pool.allocate(), Err(ToneError::NoTimerAvailable)));
    drop(leases);
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn test_ids_are_unique() {
    let pool = TimerPool::new(MAX_TIMERS);
    let leases: Vec<_> = (0..MAX_TIMERS).map(|_| pool.allocate().unwrap()).collect();

    let mut ids: Vec<u8> = leases.iter().map(|l| l.id().index()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), MAX_TIMERS as usize);
}

#[test]
fn test_release_and_reuse() {
    let pool = TimerPool::new(MAX_TIMERS);
    let a = pool.allocate().unwrap();
    let b = pool.allocate().unwrap();
    let c = pool.allocate().unwrap();
    let _d = pool.allocate().unwrap();

    let freed = b.id();
    drop(b);
    assert_eq!(pool.in_use(), 3);

    let e = pool.allocate().unwrap();
    assert_eq!(e.id(), freed);
    assert!(pool.allocate().is_err());

    drop(a);
    drop(c);
    assert_eq!(pool.in_use(), 2);
}

#[test]
fn test_smaller_pool() {
    let pool = TimerPool::new(1);
    assert_eq!(pool.capacity(), 1);

    let only = pool.allocate().unwrap();
    assert!(pool.allocate().is_err());
    drop(only);
    assert!(pool.allocate().is_ok());
}

#[test]
fn test_concurrent_allocation() {
    use std::sync::Arc;
    use std::thread;

    let pool = Arc::new(TimerPool::new(MAX_TIMERS));
    let mut handles = vec![];

    for _ in 0..8 {
        let pool = Arc::clone(&pool);
        handles.push(thread::spawn(move || {
            for _ in 0..1000 {
                if let Ok(lease) = pool.allocate() {
                    assert!(lease.id().index() < MAX_TIMERS);
                    assert!(pool.in_use() <= MAX_TIMERS);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(pool.in_use(), 0);
}
