//! Error types for the comparison engine.
//!
//! Only genuinely fatal conditions surface as errors: contradictory
//! configuration, malformed ingestion, or a broken internal invariant.
//! Two netlists failing to match is an outcome, not an error — it is
//! reported through the event sink and in [`CompareOutcome`].
//!
//! [`CompareOutcome`]: crate::engine::CompareOutcome

use thiserror::Error;

/// Maximum number of device master definitions.
pub const MAX_DEVICE_MASTERS: usize = 100_000;

/// Fatal engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    /// `find_match` deduces values incrementally; `no_opt` forces full
    /// recomputation each pass. The two cannot be combined.
    #[error("cannot deduce matches and turn off optimization too")]
    ConflictingOptions,

    /// Graph identifiers are 0 and 1.
    #[error("graph number can only be 0 or 1, got {0}")]
    GraphOutOfRange(usize),

    /// `ignore_case` changes how net and equivalence names hash, so it
    /// must be decided before any name enters a table.
    #[error("ignore_case must be set before any nets are defined")]
    IgnoreCaseTooLate,

    /// A completed run leaves the arena intact for inspection; the engine
    /// must be reset before it accepts new work.
    #[error("need to re-initialize before running again")]
    NeedReinitialize,

    /// Master registry is full.
    #[error("too many user-defined devices (limit {MAX_DEVICE_MASTERS})")]
    TooManyMasters,

    /// Master names of a single character are reserved.
    #[error("user-defined device type '{0}' illegal, must have 2 or more characters")]
    MasterNameTooShort(String),

    /// A master must have at least one terminal.
    #[error("user-defined device type '{0}' must have at least one pin")]
    MasterWithoutPins(String),

    /// A master was re-registered with a different terminal count.
    #[error("inconsistent pin counts for user-defined type '{0}'")]
    InconsistentPinCount(String),

    /// A master was re-registered with differently-classed terminals.
    #[error("inconsistent pin names for user-defined type '{0}'")]
    InconsistentPinNames(String),

    /// A device instance referenced a master that was never defined.
    #[error("device '{0}' not defined")]
    UndefinedMaster(String),

    /// A device instance supplied the wrong number of nets.
    #[error("{got} nets declared for {expected}-pin device '{master}'")]
    PinCountMismatch {
        master: String,
        expected: usize,
        got: usize,
    },

    /// A conservation or state-machine invariant failed; indicates a bug
    /// in the engine, not in the input.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, CompareError>;

pub(crate) fn internal(message: impl Into<String>) -> CompareError {
    CompareError::Internal(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render() {
        let err = CompareError::PinCountMismatch {
            master: "nand2".to_string(),
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "2 nets declared for 3-pin device 'nand2'");
        assert!(CompareError::TooManyMasters.to_string().contains("100000"));
    }
}
