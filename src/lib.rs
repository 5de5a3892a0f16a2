//! # Phasetrace - Network Phase Tracing Engine
//!
//! **Phasetrace** maintains a directed, mutable graph model of an electrical
//! distribution network (equipment, terminals, connectivity nodes) and
//! derives per-conductor phase assignments by propagating known phase
//! information outward from energy sources, resolving how nominal phases on
//! one piece of equipment map to nominal phases on its neighbours,
//! including through transformers that add, drop or relabel phases.
//!
//! ## Core Workflow
//!
//! 1.  **Build the model**: create a [`network::NetworkModel`], add equipment
//!     with their terminals' nominal phase sets, and connect terminals; the
//!     arena mints all identifiers and lazily manages connectivity nodes.
//! 2.  **Flood**: run [`set_phases::SetPhases`] per network state. Declared
//!     source phases are seeded and flooded outward through the generic
//!     branching [`traversal::Traversal`] engine, writing traced phases into
//!     a [`phase::PhaseStates`] store that fails loudly on conflicting
//!     writes.
//! 3.  **Infer**: run [`inferrer::PhaseInferrer`] to fill slots the flood
//!     could not reach because of upstream data gaps; each guess is applied,
//!     reported and flagged suspect when confidence is low.
//!
//! ## Quick Start
//!
//! ```rust
//! use phasetrace::prelude::*;
//!
//! fn main() -> Result<(), PhaseFlowError> {
//!     let mut model = NetworkModel::new();
//!     let source = model.add_equipment(
//!         "feeder",
//!         EquipmentKind::Source { phases: PhaseCode::ABC },
//!         &[PhaseCode::ABC],
//!     );
//!     let breaker = model.add_equipment(
//!         "cb-1",
//!         EquipmentKind::Switch { normally_open: false, currently_open: false },
//!         &[PhaseCode::ABC, PhaseCode::ABC],
//!     );
//!     let transformer = model.add_equipment(
//!         "tx-1",
//!         EquipmentKind::Transformer,
//!         &[PhaseCode::ABC, PhaseCode::ABCN],
//!     );
//!     let consumer = model.add_equipment("load-1", EquipmentKind::Consumer, &[PhaseCode::ABCN]);
//!
//!     let s = model.equipment(source).terminals().to_vec();
//!     let b = model.equipment(breaker).terminals().to_vec();
//!     let x = model.equipment(transformer).terminals().to_vec();
//!     let c = model.equipment(consumer).terminals().to_vec();
//!     model.connect(s[0], b[0]);
//!     model.connect(b[1], x[0]);
//!     model.connect(x[1], c[0]);
//!
//!     let mut states = PhaseStates::new();
//!     SetPhases::new().run(&model, &mut states, NetworkState::Normal)?;
//!
//!     // The transformer's added neutral resolved to N; everything else
//!     // flooded straight through from the source.
//!     assert_eq!(
//!         states
//!             .status(c[0], NetworkState::Normal)
//!             .as_phase_code(PhaseCode::ABCN),
//!         Some(PhaseCode::ABCN),
//!     );
//!     Ok(())
//! }
//! ```

pub mod connectivity;
pub mod error;
pub mod inferrer;
pub mod network;
pub mod phase;
pub mod prelude;
pub mod set_phases;
pub mod traversal;
