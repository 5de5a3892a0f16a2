//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the phasetrace crate so the
//! core workflow (build model, flood, infer) needs a single import.

// Graph model
pub use crate::network::{
    ConnectivityNode, Equipment, EquipmentId, EquipmentKind, FeederDirection, NetworkModel,
    NetworkState, NodeId, Terminal, TerminalId,
};

// Phase values and state store
pub use crate::phase::{PhaseCode, PhaseStates, PhaseStatus, SinglePhase};

// Connectivity resolution
pub use crate::connectivity::{NominalPhasePath, resolve_between};

// Algorithms
pub use crate::inferrer::{InferenceResult, PhaseInferrer};
pub use crate::set_phases::SetPhases;

// Traversal engine
pub use crate::traversal::{QueueKind, Queuer, StepContext, Traversal};

// Error types
pub use crate::error::{PhaseFlowError, PhaseStateError};
