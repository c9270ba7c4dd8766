//! Errors raised while lowering intrinsics.

use thiserror::Error;

/// Fatal conditions of the lowering stage.
///
/// Classification misses are not errors; they are reported as
/// [`IntrinsicKind::None`](crate::intrinsic::IntrinsicKind::None).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    /// The module ran out of standalone signature rows.
    #[error("standalone signature table exhausted (limit is {limit} rows)")]
    SignatureTableExhausted { limit: u32 },

    /// Verification of freshly emitted code failed.
    #[error("emitted code for `{name}` failed verification: {source}")]
    Verify {
        name: String,
        #[source]
        source: crate::il::VerifyError,
    },
}
