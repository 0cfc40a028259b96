use crate::runtime::SlotKind;

/// Errors raised by hook calls.
///
/// Every variant is a contract violation by the caller (or a missing piece of
/// environment); the runtime never retries or recovers on its own.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// A hook ran while no `HookContext` was active.
    #[error("hooks can only be called inside a component render")]
    NoActiveContext,

    /// The slot at this call position belongs to another hook kind.
    #[error("invalid hook state at slot {index}: expected {expected}, found {found}")]
    InvalidSlotState {
        index: usize,
        expected: SlotKind,
        found: SlotKind,
    },

    /// The slot kind matches but it holds a value of another type.
    #[error("invalid hook state at slot {index}: {expected} slot holds a different value type")]
    SlotTypeMismatch { index: usize, expected: SlotKind },

    /// A composite hook needs an environment capability that was never installed.
    #[error("no {0} capability installed for this thread")]
    MissingCapability(&'static str),

    #[error("state codec: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type HookResult<T> = Result<T, HookError>;
