//! Process-wide service registry for multi-tenant test orchestration.
//!
//! Maps an opaque context key to a running [`MockService`]. The registry is
//! an explicit, injectable object rather than a global, so tests can run
//! independent registries side by side. The map is guarded by a
//! `parking_lot` mutex that is never held across an await or a service
//! call, so `start` and `stop_all` cannot deadlock against each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use sbi_core::SbiResult;

use crate::service::{MockService, ServiceConfig};

struct Entry {
    service: Arc<MockService>,
}

/// Context-keyed registry of running mock services.
#[derive(Clone, Default)]
pub struct SbiRegistry {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

impl SbiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a service for `context`, or return the port of the one
    /// already running. Idempotent: a second start with the same context
    /// does not open a second listener.
    pub async fn start(&self, context: &str, config: ServiceConfig) -> SbiResult<u16> {
        if let Some(port) = self.running_port(context) {
            return Ok(port);
        }

        let service = MockService::new(config)?;
        let listener = service.bind().await?;
        let port = service.port();
        service.init_device_helpers();

        let serving = service.clone();
        tokio::spawn(async move {
            if let Err(e) = serving.serve(listener).await {
                warn!(error = %e, "mock service exited with error");
            }
        });

        // A concurrent start may have won the race while we were binding;
        // keep the first registered service and fold back into it.
        let mut map = self.inner.lock();
        if let Some(existing) = map.get(context) {
            if !existing.service.is_stopped() {
                let existing_port = existing.service.port();
                drop(map);
                service.stop();
                return Ok(existing_port);
            }
        }
        map.insert(context.to_string(), Entry { service });
        info!(context, port, "mock SBI service registered");
        Ok(port)
    }

    fn running_port(&self, context: &str) -> Option<u16> {
        let map = self.inner.lock();
        map.get(context)
            .filter(|entry| !entry.service.is_stopped())
            .map(|entry| entry.service.port())
    }

    /// Stop and deregister the service for `context`. No-op when absent.
    pub fn stop(&self, context: &str) {
        let entry = self.inner.lock().remove(context);
        if let Some(entry) = entry {
            entry.service.stop();
            info!(context, "mock SBI service stopped");
        }
    }

    /// Stop every registered service and clear the map. Entries inserted
    /// concurrently either get stopped by this sweep or stay running
    /// untouched; the map itself is never iterated while unlocked.
    pub fn stop_all(&self) {
        let drained: Vec<(String, Entry)> = self.inner.lock().drain().collect();
        for (context, entry) in drained {
            entry.service.stop();
            info!(context, "mock SBI service stopped");
        }
    }

    /// Look up the running service for a context.
    pub fn get(&self, context: &str) -> Option<Arc<MockService>> {
        self.inner.lock().get(context).map(|e| e.service.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
