use crate::phase::SinglePhase;
use thiserror::Error;

/// Errors raised by the phase state store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhaseStateError {
    #[error(
        "Crossing phases on nominal phase {nominal}: slot already carries {existing} and cannot be overwritten with {incoming}"
    )]
    CrossingPhases {
        nominal: SinglePhase,
        existing: SinglePhase,
        incoming: SinglePhase,
    },
}

/// Errors raised while flooding or inferring phases across the network.
///
/// A crossing-phases conflict is a data-quality defect in the source model
/// (typically a missing open point) and is not retryable; the error names
/// both ends of the offending flow so the topology can be corrected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhaseFlowError {
    #[error(
        "Crossing phases while flowing {nominal} from terminal '{from_terminal}' on '{from_equipment}' to terminal '{to_terminal}' on '{to_equipment}': slot already carries {existing} and cannot be overwritten with {incoming}"
    )]
    CrossingPhases {
        from_terminal: String,
        from_equipment: String,
        to_terminal: String,
        to_equipment: String,
        nominal: SinglePhase,
        existing: SinglePhase,
        incoming: SinglePhase,
    },
}
