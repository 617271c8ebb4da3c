// crates/toolgate-core/src/runtime/request_ledger.rs
// ============================================================================
// Module: Toolgate Request Ledger
// Description: Bounded record of request ids already claimed by the dispatcher.
// Purpose: Keep caller-supplied request ids unique per invocation.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! An id is claimed when its request enters the dispatcher and stays claimed
//! after the result is returned. The ledger keeps the most recent
//! `capacity` ids; the oldest claim is forgotten first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;

use crate::core::RequestId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of remembered request ids.
pub const DEFAULT_LEDGER_CAPACITY: usize = 65_536;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a request id cannot be claimed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The id is in flight or was recently completed.
    #[error("duplicate request_id: {0}")]
    DuplicateRequestId(String),
    /// The ledger mutex was poisoned.
    #[error("request ledger unavailable: {0}")]
    Ledger(String),
}

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// Claimed ids in claim order.
#[derive(Debug, Default)]
struct LedgerState {
    /// Membership set.
    seen: HashSet<RequestId>,
    /// Claim order for eviction.
    order: VecDeque<RequestId>,
}

/// Bounded set of recently claimed request ids.
#[derive(Debug)]
pub struct RequestLedger {
    /// Maximum remembered ids.
    capacity: usize,
    /// Guarded state.
    state: Mutex<LedgerState>,
}

impl Default for RequestLedger {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LEDGER_CAPACITY)
    }
}

impl RequestLedger {
    /// Creates a ledger remembering at most `capacity` ids (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Claims `request_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateRequestId`] when the id is still
    /// remembered, and [`DispatchError::Ledger`] when the mutex is poisoned.
    pub fn claim(&self, request_id: &RequestId) -> Result<(), DispatchError> {
        let mut state =
            self.state.lock().map_err(|_| DispatchError::Ledger("ledger mutex poisoned".to_string()))?;
        if state.seen.contains(request_id) {
            return Err(DispatchError::DuplicateRequestId(request_id.to_string()));
        }
        state.seen.insert(request_id.clone());
        state.order.push_back(request_id.clone());
        while state.order.len() > self.capacity {
            if let Some(evicted) = state.order.pop_front() {
                state.seen.remove(&evicted);
            }
        }
        Ok(())
    }

    /// Number of remembered ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |state| state.order.len())
    }

    /// Whether no ids are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
