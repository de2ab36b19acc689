use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[test]
fn runs_closure_and_returns_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    let result = with_file_lock(&path, || Ok(42)).unwrap();
    assert_eq!(result, 42);
}

#[test]
fn serializes_concurrent_increments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    std::fs::write(&path, "0").unwrap();
    let counter = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let path = path.clone();
        let counter = Arc::clone(&counter);
        handles.push(std::thread::spawn(move || {
            with_file_lock(&path, || {
                let current = counter.load(Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(1));
                counter.store(current + 1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 8);
}
