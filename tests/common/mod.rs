#![allow(dead_code)]

use logbind::{LoggerService, Metadata, Registry, Severity, Sink, register_backend};
use parking_lot::Mutex;
use std::sync::Arc;

/// One record as the sink received it
#[derive(Debug, Clone)]
pub struct Record {
    pub severity: Severity,
    pub message: String,
    pub metadata: Metadata,
}

/// Backend whose sink keeps every record in memory
pub struct CaptureBackend {
    pub service: Arc<LoggerService>,
    pub records: Arc<Mutex<Vec<Record>>>,
}

impl CaptureBackend {
    pub fn new() -> Self {
        Self::from_builder(LoggerService::new)
    }

    /// Build the service around the capturing sink with `make`
    pub fn from_builder<F>(make: F) -> Self
    where
        F: FnOnce(Arc<dyn Sink>) -> LoggerService,
    {
        let records = Arc::new(Mutex::new(Vec::new()));
        let out = Arc::clone(&records);
        let sink: Arc<dyn Sink> = Arc::new(move |severity: Severity, message: &str, metadata: &Metadata| {
            out.lock().push(Record {
                severity,
                message: message.to_string(),
                metadata: metadata.clone(),
            })
        });
        CaptureBackend {
            service: Arc::new(make(sink)),
            records,
        }
    }

    /// Register this backend as the active one
    pub fn register(&self, registry: &Registry) {
        register_backend(registry, Arc::clone(&self.service)).expect("Failed to register backend");
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}
