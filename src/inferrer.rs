//! Phase inference: fills nominal phase slots left unresolved by the flood
//! because of disconnected or missing upstream data.
//!
//! Inference is best effort and advisory. Every applied inference is
//! reported back to the caller (and logged for operator review); a
//! low-confidence guess is flagged suspect rather than rejected, because
//! leaving phases unresolved is worse for downstream consumers than a
//! flagged guess.

use crate::error::{PhaseFlowError, PhaseStateError};
use crate::network::{EquipmentId, FeederDirection, NetworkModel, NetworkState, TerminalId};
use crate::phase::{PhaseCode, PhaseStates, PhaseStatus, SinglePhase};
use crate::set_phases::SetPhases;
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fill order for plain slots: the first phase not already in use on the
/// terminal wins.
const PHASE_PRIORITY: [SinglePhase; 4] = [
    SinglePhase::A,
    SinglePhase::B,
    SinglePhase::C,
    SinglePhase::N,
];

/// One inferred piece of equipment. `suspect` marks a low-confidence guess
/// that needs human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub equipment: EquipmentId,
    pub suspect: bool,
}

/// The phase inference algorithm, run once per network state after flooding.
#[derive(Debug, Default)]
pub struct PhaseInferrer;

impl PhaseInferrer {
    pub fn new() -> Self {
        PhaseInferrer
    }

    /// Detects terminals with unresolved nominal phases next to resolved
    /// neighbours and fills the gaps, re-flooding downstream after each
    /// fill. Returns one result per piece of equipment that had phases
    /// guessed.
    pub fn infer(
        &self,
        model: &NetworkModel,
        states: &mut PhaseStates,
        state: NetworkState,
    ) -> Result<Vec<InferenceResult>, PhaseFlowError> {
        let mut report: AHashMap<EquipmentId, bool> = AHashMap::new();
        self.infer_fixed_point(model, states, state, usize::MAX, false, &mut report)?;
        // Ambiguous X/Y slots go in two passes with a rising ceiling, so a
        // single missing conductor is pinned down before whole-terminal
        // guesses are attempted.
        self.infer_fixed_point(model, states, state, 1, true, &mut report)?;
        self.infer_fixed_point(model, states, state, 4, true, &mut report)?;

        let results: Vec<InferenceResult> = report
            .into_iter()
            .sorted_unstable_by_key(|(equipment, _)| *equipment)
            .map(|(equipment, suspect)| InferenceResult { equipment, suspect })
            .collect();
        for result in &results {
            warn!(
                equipment = %model.equipment(result.equipment).name,
                suspect = result.suspect,
                "inferred nominal phasing from neighbouring equipment; review recommended"
            );
        }
        Ok(results)
    }

    fn infer_fixed_point(
        &self,
        model: &NetworkModel,
        states: &mut PhaseStates,
        state: NetworkState,
        ceiling: usize,
        placeholders: bool,
        report: &mut AHashMap<EquipmentId, bool>,
    ) -> Result<(), PhaseFlowError> {
        loop {
            let batch = self.candidates(model, states, state, ceiling, placeholders);
            let mut filled_any = false;
            for terminal in batch {
                filled_any |= self.fill(model, states, state, terminal, report)?;
            }
            if !filled_any {
                return Ok(());
            }
        }
    }

    /// Terminals worth inferring: more than one terminal at their node, at
    /// least one unresolved slot within the ceiling, and a neighbour that
    /// already carries resolved phase data (the gap is typically a nominal
    /// phase dropped upstream, so the neighbour may not even declare the
    /// missing slot). Candidates whose own side faces
    /// upstream and whose resolved neighbour faces downstream are preferred,
    /// so inference propagates from known-good data toward the gap; when
    /// none match, any direction is accepted.
    fn candidates(
        &self,
        model: &NetworkModel,
        states: &PhaseStates,
        state: NetworkState,
        ceiling: usize,
        placeholders: bool,
    ) -> Vec<TerminalId> {
        let mut preferred = Vec::new();
        let mut any_direction = Vec::new();
        for terminal in model.terminal_iter() {
            let nominal = terminal.phases;
            let has_placeholder = nominal
                .single_phases()
                .iter()
                .any(|p| p.is_placeholder());
            if has_placeholder != placeholders {
                continue;
            }
            let neighbours = model.connected_terminals(terminal.id);
            if neighbours.is_empty() {
                continue;
            }
            let missing = states.status(terminal.id, state).unresolved(nominal);
            if missing.is_empty() || missing.len() > ceiling {
                continue;
            }
            let resolved_neighbour = neighbours.iter().copied().find(|n| {
                model
                    .terminal(*n)
                    .phases
                    .single_phases()
                    .iter()
                    .any(|p| states.get(*n, state, *p).is_concrete())
            });
            let Some(neighbour) = resolved_neighbour else {
                continue;
            };
            let prioritised = terminal.direction(state).has(FeederDirection::Upstream)
                && model
                    .terminal(neighbour)
                    .direction(state)
                    .has(FeederDirection::Downstream);
            if prioritised {
                preferred.push(terminal.id);
            } else {
                any_direction.push(terminal.id);
            }
        }
        if preferred.is_empty() {
            any_direction
        } else {
            preferred
        }
    }

    fn fill(
        &self,
        model: &NetworkModel,
        states: &mut PhaseStates,
        state: NetworkState,
        terminal: TerminalId,
        report: &mut AHashMap<EquipmentId, bool>,
    ) -> Result<bool, PhaseFlowError> {
        let nominal = model.terminal(terminal).phases;
        let status = states.status(terminal, state);
        let missing = status.unresolved(nominal);
        if missing.is_empty() {
            return Ok(false);
        }
        // A single missing phase on the canonical three-phase set is a
        // benign, very-likely-correct inference; anything else needs review.
        let suspect = !(missing.len() == 1 && nominal == PhaseCode::ABC);

        let mut filled = false;
        for slot in missing {
            // Re-read the status so slots filled earlier in this loop count
            // as used and feed the X/Y sibling ordering check.
            let current = states.status(terminal, state);
            let used: Vec<SinglePhase> = nominal
                .single_phases()
                .iter()
                .map(|p| current.get(*p))
                .filter(|p| p.is_concrete())
                .collect();
            let Some(phase) = self.pick(slot, &used, &current) else {
                continue;
            };
            filled |= states
                .set(terminal, state, slot, phase)
                .map_err(|e| Self::flow_error(model, terminal, e))?;
        }
        if filled {
            report
                .entry(model.terminal(terminal).equipment)
                .and_modify(|s| *s |= suspect)
                .or_insert(suspect);
            SetPhases::new().run_from_terminal(model, states, state, terminal)?;
        }
        Ok(filled)
    }

    /// The first unused phase from the slot's priority list. `X` and `Y`
    /// additionally validate ordering against the sibling slot: `X` must
    /// resolve to a phase before whatever `Y` resolved to, and vice versa,
    /// so the invented ordering stays consistent with the terminal.
    fn pick(
        &self,
        slot: SinglePhase,
        used: &[SinglePhase],
        status: &PhaseStatus,
    ) -> Option<SinglePhase> {
        let priorities: &[SinglePhase] = match slot {
            SinglePhase::X => &[SinglePhase::A, SinglePhase::B, SinglePhase::C],
            SinglePhase::Y => &[SinglePhase::B, SinglePhase::C, SinglePhase::N],
            SinglePhase::N => &[SinglePhase::N],
            _ => &PHASE_PRIORITY,
        };
        let sibling = match slot {
            SinglePhase::X => status.get(SinglePhase::Y),
            SinglePhase::Y => status.get(SinglePhase::X),
            _ => SinglePhase::None,
        };
        priorities
            .iter()
            .copied()
            .filter(|p| !used.contains(p))
            .find(|p| match slot {
                SinglePhase::X if sibling.is_concrete() => *p < sibling,
                SinglePhase::Y if sibling.is_concrete() => *p > sibling,
                _ => true,
            })
    }

    fn flow_error(
        model: &NetworkModel,
        terminal: TerminalId,
        error: PhaseStateError,
    ) -> PhaseFlowError {
        let PhaseStateError::CrossingPhases {
            nominal,
            existing,
            incoming,
        } = error;
        let label = model.terminal_label(terminal);
        let equipment = model.equipment(model.terminal(terminal).equipment).name.clone();
        PhaseFlowError::CrossingPhases {
            from_terminal: label.clone(),
            from_equipment: equipment.clone(),
            to_terminal: label,
            to_equipment: equipment,
            nominal,
            existing,
            incoming,
        }
    }
}
