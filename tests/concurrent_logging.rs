use logbind::{ModuleLogger, Registry};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
mod common;
use common::CaptureBackend;

#[test]
fn test_logging_while_backends_swap() {
    let registry = Arc::new(Registry::new());
    let backends: Vec<CaptureBackend> = (0..4).map(|_| CaptureBackend::new()).collect();
    backends[0].register(&registry);

    let running = Arc::new(AtomicBool::new(true));
    let mut handles = vec![];
    for worker in 0..4 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let logger = ModuleLogger::new(&registry, format!("worker-{worker}"));
            for i in 0..500 {
                logbind::debug!(logger, worker, i);
            }
        }));
    }

    // Swap backends while the workers log
    let swapper = {
        let running = Arc::clone(&running);
        let registry = Arc::clone(&registry);
        let services: Vec<_> = backends.iter().map(|b| Arc::clone(&b.service)).collect();
        thread::spawn(move || {
            let mut next = 1;
            while running.load(Ordering::SeqCst) {
                logbind::register_backend(&registry, Arc::clone(&services[next % 4])).unwrap();
                next += 1;
                thread::yield_now();
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    running.store(false, Ordering::SeqCst);
    swapper.join().unwrap();

    // Every record landed in exactly one backend
    let total: usize = backends.iter().map(|b| b.len()).sum();
    assert_eq!(total, 4 * 500);
}

#[test]
fn test_concurrent_first_use_binds_once() {
    let registry = Arc::new(Registry::new());
    let backend = CaptureBackend::new();
    backend.register(&registry);

    let logger = Arc::new(ModuleLogger::new(&registry, "shared"));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || logbind::warn!(logger, "thread", i))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(backend.len(), 8);
    assert_eq!(logger.state(), logbind::BindState::Active);
}
