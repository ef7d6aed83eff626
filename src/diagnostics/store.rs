//! Per-document diagnostic collection owned by the host.
//!
//! The host creates one collection at start-up, hands clones of the handle
//! to every formatting request, and disposes it at shutdown. Sets are keyed
//! by document identity and are replaced wholesale, never merged.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use url::Url;

use super::position::DocumentRange;

/// A diagnostic anchored to the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDiagnostic {
    pub range: DocumentRange,
    pub message: String,
}

#[derive(Debug, Default)]
struct Inner {
    sets: Mutex<HashMap<Url, Vec<FormatDiagnostic>>>,
    disposed: AtomicBool,
}

/// Cloneable handle to the shared diagnostic sets.
#[derive(Debug, Clone)]
pub struct DiagnosticCollection {
    name: Arc<str>,
    inner: Arc<Inner>,
}

impl DiagnosticCollection {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            inner: Arc::new(Inner::default()),
        }
    }

    /// Source label shown next to each diagnostic.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the set recorded for `uri`. An empty set removes the entry.
    pub fn set(&self, uri: &Url, diagnostics: Vec<FormatDiagnostic>) {
        if self.is_disposed() {
            log::debug!("Ignoring diagnostics for {uri}: collection '{}' is disposed", self.name);
            return;
        }

        let mut sets = self.lock();
        if diagnostics.is_empty() {
            sets.remove(uri);
        } else {
            sets.insert(uri.clone(), diagnostics);
        }
    }

    /// Remove every diagnostic recorded for `uri`.
    pub fn clear(&self, uri: &Url) {
        self.set(uri, Vec::new());
    }

    /// Current set for `uri` (empty when none is recorded).
    pub fn get(&self, uri: &Url) -> Vec<FormatDiagnostic> {
        self.lock().get(uri).cloned().unwrap_or_default()
    }

    /// Drop all sets and refuse further updates.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.lock().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Url, Vec<FormatDiagnostic>>> {
        self.inner.sets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
