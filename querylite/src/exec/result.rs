// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query results and result pages
//!
//! A phase returns its rows as opaque owned buffers ("pages"). Pages produced
//! by an intermediate phase are owned by the session until their contents are
//! folded back into the plan, at which point the buffers must be released
//! exactly once, on success and failure alike. Pages of the terminal phase
//! pass to the caller unreleased.

use crate::plan::expression::Attribute;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An opaque owned result buffer
#[derive(Debug)]
pub struct Page {
    data: Vec<u8>,
    releases: Arc<AtomicUsize>,
}

impl Page {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Buffer contents; empty once released
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size of the buffer in bytes
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    pub fn is_released(&self) -> bool {
        self.releases.load(Ordering::SeqCst) > 0
    }

    /// Release the buffer. Releasing twice is a bug in the caller; it is
    /// logged rather than escalated because it can only happen on an error
    /// path that is already being reported.
    pub fn release(&mut self) {
        let previous = self.releases.fetch_add(1, Ordering::SeqCst);
        if previous > 0 {
            log::warn!("result page released {} times", previous + 1);
        }
        self.data = Vec::new();
    }

    /// Handle for observing this page's release count after ownership has
    /// moved elsewhere
    pub fn release_probe(&self) -> PageReleaseProbe {
        PageReleaseProbe(Arc::clone(&self.releases))
    }
}

/// Observer for a page's release count
#[derive(Debug, Clone)]
pub struct PageReleaseProbe(Arc<AtomicUsize>);

impl PageReleaseProbe {
    pub fn release_count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// One execution profile entry reported by the runtime for a phase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    /// Operator or driver the record describes
    pub description: String,
    /// Rows the operator processed
    pub rows_processed: u64,
    /// Wall time spent, in microseconds
    pub elapsed_micros: u64,
}

/// Result of running one physical plan, and of the whole query: the terminal
/// phase's schema and pages with the profile records of every phase in order
#[derive(Debug)]
pub struct QueryResult {
    /// Output schema of the (terminal) phase
    pub schema: Vec<Attribute>,
    /// Result rows as opaque owned buffers
    pub pages: Vec<Page>,
    /// Profile records, phase order preserved
    pub profiles: Vec<ProfileRecord>,
}

impl QueryResult {
    pub fn new(schema: Vec<Attribute>, pages: Vec<Page>, profiles: Vec<ProfileRecord>) -> Self {
        Self {
            schema,
            pages,
            profiles,
        }
    }
}
