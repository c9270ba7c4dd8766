//! Module-level state shared by every intrinsic lowered into one module.
//!
//! The module owns the StandAloneSig row counter and the store of finished
//! method bodies. Both are safe to use from several lowering threads.

mod body;
pub mod writer;

pub use body::{
    DebugId, ExceptionHandlerRegion, LocalDefinition, LocalScope, MethodBody, MethodId,
    SequencePoint,
};

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::config::LowerConfig;
use crate::error::LowerError;
use crate::il::MetadataToken;
use crate::il::token::MAX_ROW;
use crate::intrinsic::CallingConvention;

/// A row of the StandAloneSig table. Row zero means "no row" and is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SignatureSlot(NonZeroU32);

impl SignatureSlot {
    pub fn new(row: u32) -> Option<Self> {
        NonZeroU32::new(row).map(SignatureSlot)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The inline token that references this row.
    pub fn token(self) -> MetadataToken {
        MetadataToken::standalone_signature(self.get())
    }
}

/// Call-site signature recorded for a StandAloneSig row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StandAloneSignature {
    pub slot: SignatureSlot,
    pub calling_convention: CallingConvention,
    pub parameter_count: u16,
    pub returns_void: bool,
}

/// Module writer state for one module generation.
#[derive(Debug)]
pub struct ModuleBuilder {
    generation: u32,
    first_signature_row: u32,
    next_signature_row: AtomicU32,
    signatures: Mutex<Vec<StandAloneSignature>>,
    bodies: Mutex<BTreeMap<MethodId, MethodBody>>,
}

impl ModuleBuilder {
    pub fn new(generation: u32) -> Self {
        Self::with_first_signature_row(generation, 1)
    }

    /// Start allocating StandAloneSig rows at `first_row`, leaving the rows
    /// before it to other writers.
    pub fn with_first_signature_row(generation: u32, first_row: u32) -> Self {
        assert!(first_row >= 1, "StandAloneSig rows are 1-based");
        Self {
            generation,
            first_signature_row: first_row,
            next_signature_row: AtomicU32::new(first_row),
            signatures: Mutex::new(Vec::new()),
            bodies: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_config(config: &LowerConfig) -> Self {
        Self::with_first_signature_row(config.generation, config.first_signature_slot)
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Hand out the next StandAloneSig row. Each row is returned exactly once,
    /// in increasing order, even under concurrent callers.
    pub fn allocate_signature_slot(&self) -> Result<SignatureSlot, LowerError> {
        let row = self
            .next_signature_row
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |row| {
                (row <= MAX_ROW).then(|| row + 1)
            })
            .map_err(|_| LowerError::SignatureTableExhausted { limit: MAX_ROW })?;
        // `first_signature_row >= 1` and the counter only grows
        SignatureSlot::new(row).ok_or(LowerError::SignatureTableExhausted { limit: MAX_ROW })
    }

    /// Number of rows handed out so far.
    pub fn allocated_signature_count(&self) -> u32 {
        self.next_signature_row.load(Ordering::Acquire) - self.first_signature_row
    }

    pub fn record_signature(&self, signature: StandAloneSignature) {
        lock(&self.signatures).push(signature);
    }

    /// Recorded signatures in row order.
    pub fn standalone_signatures(&self) -> Vec<StandAloneSignature> {
        let mut signatures = lock(&self.signatures).clone();
        signatures.sort_by_key(|sig| sig.slot);
        signatures
    }

    /// Store a finished body. A later body for the same method replaces the earlier one.
    pub fn set_method_body(&self, method: MethodId, body: MethodBody) {
        if lock(&self.bodies).insert(method, body).is_some() {
            log::warn!("method body for MethodDef row {} replaced", method.row());
        }
    }

    pub fn method_body(&self, method: MethodId) -> Option<MethodBody> {
        lock(&self.bodies).get(&method).cloned()
    }

    /// All stored bodies ordered by method.
    pub fn method_bodies(&self) -> Vec<MethodBody> {
        lock(&self.bodies).values().cloned().collect()
    }

    pub fn body_count(&self) -> usize {
        lock(&self.bodies).len()
    }
}

// A panicking lowering thread leaves the data consistent: every update is a
// single push or insert.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
