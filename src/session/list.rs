//! Authoritative in-memory lists
//!
//! Each view session keeps one list per resource (records, users). A list is
//! only ever replaced wholesale by the result of a fetch, and only when that
//! fetch was issued after the one currently shown. Readers subscribe to a
//! `watch` channel and are told explicitly when the list changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::remote::SearchTerm;

/// One accepted fetch result.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub items: Arc<Vec<T>>,
    /// The search term the items were fetched for
    pub term: SearchTerm,
    /// Sequence number of the fetch that produced this snapshot (0 = never loaded)
    pub seq: u64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            term: self.term.clone(),
            seq: self.seq,
        }
    }
}

impl<T> Snapshot<T> {
    fn empty() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            term: SearchTerm::all(),
            seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.seq > 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

/// Single-writer, multi-reader list with accept-newest ordering.
#[derive(Debug)]
pub struct AuthoritativeList<T> {
    tx: watch::Sender<Snapshot<T>>,
    issued: AtomicU64,
}

impl<T> Default for AuthoritativeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AuthoritativeList<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::empty());
        Self {
            tx,
            issued: AtomicU64::new(0),
        }
    }

    /// Issue the sequence number for a fetch about to be sent.
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Replace the list with a fetch result, unless a later fetch already
    /// landed. Returns whether the result was applied.
    pub fn apply(&self, seq: u64, term: SearchTerm, items: Vec<T>) -> bool {
        let applied = self.tx.send_if_modified(|current| {
            if seq <= current.seq {
                return false;
            }
            *current = Snapshot {
                items: Arc::new(items),
                term,
                seq,
            };
            true
        });
        if !applied {
            tracing::debug!("discarding stale list response (seq {seq})");
        }
        applied
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }
}
