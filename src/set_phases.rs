//! Phase flooding: seeds traced phases at energy sources and spreads them
//! outward terminal by terminal until the network reaches a fixed point.
//!
//! Propagation is bounded by the store's change signal: a flow that leaves a
//! terminal's phase state unchanged queues nothing further, so a fully
//! resolved network floods in zero additional writes. A flow that demands a
//! *different* concrete phase than a slot already carries is fatal — it
//! means the input topology is wrong (typically a missing open point) — and
//! surfaces as [`PhaseFlowError::CrossingPhases`].

use crate::connectivity::{NominalPhasePath, resolve_between};
use crate::error::{PhaseFlowError, PhaseStateError};
use crate::network::{NetworkModel, NetworkState, TerminalId};
use crate::phase::{PhaseCode, PhaseStates, SinglePhase};
use crate::traversal::{QueueKind, Queuer, StepContext, Traversal};
use tracing::debug;

/// The phase flooding algorithm.
#[derive(Debug, Default)]
pub struct SetPhases;

/// Mutable flood state threaded through the traversal callbacks.
struct Flood<'a> {
    model: &'a NetworkModel,
    states: &'a mut PhaseStates,
    state: NetworkState,
    allow_suspect: bool,
    /// Transformer flows that left the far terminal partially resolved,
    /// recorded as (resolved side, partial side) for the retry pass.
    partial_transformers: Vec<(TerminalId, TerminalId)>,
}

impl SetPhases {
    pub fn new() -> Self {
        SetPhases
    }

    /// Seeds every source's declared phases onto its terminals and floods
    /// outward from each of them, then retries partially energised
    /// transformers with suspect derivation allowed.
    pub fn run(
        &self,
        model: &NetworkModel,
        states: &mut PhaseStates,
        state: NetworkState,
    ) -> Result<(), PhaseFlowError> {
        let mut flood = Flood {
            model,
            states,
            state,
            allow_suspect: false,
            partial_transformers: Vec::new(),
        };
        let mut seeded = Vec::new();
        for equipment in model.equipment_iter() {
            let Some(phases) = equipment.source_phases() else {
                continue;
            };
            for &terminal in equipment.terminals() {
                Self::seed_terminal(&mut flood, terminal, phases)?;
                seeded.push(terminal);
            }
        }
        debug!(count = seeded.len(), ?state, "seeded source terminals");
        for terminal in seeded {
            Self::flood_from(&mut flood, terminal)?;
        }
        Self::retry_partial(&mut flood)
    }

    /// Floods the phases already set on `terminal` outward without
    /// re-seeding anything.
    pub fn run_from_terminal(
        &self,
        model: &NetworkModel,
        states: &mut PhaseStates,
        state: NetworkState,
        terminal: TerminalId,
    ) -> Result<(), PhaseFlowError> {
        let mut flood = Flood {
            model,
            states,
            state,
            allow_suspect: false,
            partial_transformers: Vec::new(),
        };
        Self::flood_from(&mut flood, terminal)?;
        Self::retry_partial(&mut flood)
    }

    /// Spreads phases across one hop from `from` to `to` regardless of
    /// normal source propagation, then floods onward from `to`. Used when
    /// external code determines a phase assignment mid-network.
    pub fn spread(
        &self,
        model: &NetworkModel,
        states: &mut PhaseStates,
        state: NetworkState,
        from: TerminalId,
        to: TerminalId,
    ) -> Result<(), PhaseFlowError> {
        let mut flood = Flood {
            model,
            states,
            state,
            allow_suspect: false,
            partial_transformers: Vec::new(),
        };
        let candidates = model.terminal(from).phases.single_phases();
        let paths = resolve_between(model, from, to, candidates);
        if Self::apply_paths(&mut flood, from, to, &paths)? {
            Self::flood_from(&mut flood, to)?;
        }
        Self::retry_partial(&mut flood)
    }

    fn seed_terminal(
        flood: &mut Flood<'_>,
        terminal: TerminalId,
        declared: PhaseCode,
    ) -> Result<(), PhaseFlowError> {
        let nominal = flood.model.terminal(terminal).phases;
        for (slot, phase) in nominal
            .single_phases()
            .iter()
            .zip(declared.single_phases())
        {
            flood
                .states
                .set(terminal, flood.state, *slot, *phase)
                .map_err(|e| Self::flow_error(flood.model, terminal, terminal, e))?;
        }
        Ok(())
    }

    fn flood_from(flood: &mut Flood<'_>, start: TerminalId) -> Result<(), PhaseFlowError> {
        let mut traversal: Traversal<TerminalId, Flood<'_>, PhaseFlowError> =
            Traversal::new(QueueKind::BreadthFirst, Self::queue_next).add_stop_condition(
                |terminal, _, flood: &Flood<'_>| {
                    flood.model.terminal(terminal).phases == PhaseCode::None
                },
            );
        traversal.run(start, flood, true)
    }

    /// One flood step: flow through the terminal's own equipment, then
    /// across its connectivity node, queueing every terminal whose state
    /// changed. A single continuation stays on this branch; a topological
    /// fork spawns one branch per continuation so loops stay safe.
    fn queue_next(
        terminal: TerminalId,
        _context: &StepContext,
        flood: &mut Flood<'_>,
        queuer: &mut Queuer<TerminalId>,
    ) -> Result<(), PhaseFlowError> {
        let candidates = flood.model.terminal(terminal).phases.single_phases();
        let mut continuations = Vec::new();

        let equipment = flood.model.equipment(flood.model.terminal(terminal).equipment);
        if !equipment.is_open(flood.state) {
            for far in flood.model.other_terminals(terminal) {
                let paths = resolve_between(flood.model, terminal, far, candidates);
                let changed = Self::apply_paths(flood, terminal, far, &paths)?;
                if equipment.is_transformer() {
                    Self::record_partial(flood, terminal, far);
                }
                if changed {
                    continuations.push(far);
                }
            }
        }

        for connected in flood.model.connected_terminals(terminal) {
            let paths = resolve_between(flood.model, terminal, connected, candidates);
            if Self::apply_paths(flood, terminal, connected, &paths)? {
                continuations.push(connected);
            }
        }

        if continuations.len() == 1 {
            queuer.queue(continuations[0]);
        } else {
            for continuation in continuations {
                queuer.queue_branch(continuation);
            }
        }
        Ok(())
    }

    /// Applies a resolved path set from one terminal to another. Through
    /// paths copy the already-resolved source-side phase; added paths derive
    /// their value from the destination terminal itself, so they are applied
    /// after every through path has landed.
    fn apply_paths(
        flood: &mut Flood<'_>,
        from: TerminalId,
        to: TerminalId,
        paths: &[NominalPhasePath],
    ) -> Result<bool, PhaseFlowError> {
        let mut changed = false;
        for path in paths.iter().filter(|p| !p.is_added()) {
            let traced = flood.states.get(from, flood.state, path.from);
            if traced == SinglePhase::None {
                continue;
            }
            changed |= flood
                .states
                .set(to, flood.state, path.to, traced)
                .map_err(|e| Self::flow_error(flood.model, from, to, e))?;
        }
        for path in paths.iter().filter(|p| p.is_added()) {
            let traced = Self::derive_added(flood, to, path.to);
            if traced == SinglePhase::None {
                continue;
            }
            changed |= flood
                .states
                .set(to, flood.state, path.to, traced)
                .map_err(|e| Self::flow_error(flood.model, from, to, e))?;
        }
        Ok(changed)
    }

    /// Derives the traced phase of a newly introduced destination slot. An
    /// added neutral is always `N`; a synthetic second conductor derives
    /// from the sibling conductor already resolved on the same terminal.
    ///
    /// A sibling on phase `A` (or `C`) with suspect flow disallowed leaves
    /// the conductor de-energised: two parallel transformers could otherwise
    /// cross-energise it. This asymmetry is intentional.
    fn derive_added(flood: &Flood<'_>, to: TerminalId, added: SinglePhase) -> SinglePhase {
        match added {
            SinglePhase::N => SinglePhase::N,
            SinglePhase::Y => {
                let sibling = flood.states.get(to, flood.state, SinglePhase::X);
                match (sibling, flood.allow_suspect) {
                    (SinglePhase::B, _) => SinglePhase::C,
                    (SinglePhase::A, true) => SinglePhase::B,
                    (SinglePhase::C, true) => SinglePhase::A,
                    _ => SinglePhase::None,
                }
            }
            _ => SinglePhase::None,
        }
    }

    fn record_partial(flood: &mut Flood<'_>, from: TerminalId, to: TerminalId) {
        let status = flood.states.status(to, flood.state);
        let nominal = flood.model.terminal(to).phases;
        let unresolved = status.unresolved(nominal).len();
        if unresolved > 0
            && unresolved < nominal.num_phases()
            && !flood.partial_transformers.contains(&(from, to))
        {
            flood.partial_transformers.push((from, to));
        }
    }

    /// Re-attempts flow into transformer terminals the main flood left
    /// partially resolved, from their fully-resolved side and with suspect
    /// derivation allowed, then continues flooding downstream of any
    /// terminal that was repaired.
    fn retry_partial(flood: &mut Flood<'_>) -> Result<(), PhaseFlowError> {
        let pending = std::mem::take(&mut flood.partial_transformers);
        for (from, to) in pending {
            if !flood
                .states
                .status(from, flood.state)
                .is_fully_resolved(flood.model.terminal(from).phases)
            {
                continue;
            }
            if flood
                .states
                .status(to, flood.state)
                .is_fully_resolved(flood.model.terminal(to).phases)
            {
                continue;
            }
            let candidates = flood.model.terminal(from).phases.single_phases();
            let paths = resolve_between(flood.model, from, to, candidates);
            flood.allow_suspect = true;
            let changed = Self::apply_paths(flood, from, to, &paths);
            flood.allow_suspect = false;
            if changed? {
                debug!(
                    terminal = %flood.model.terminal_label(to),
                    "repaired partially energised transformer terminal"
                );
                Self::flood_from(flood, to)?;
            }
        }
        Ok(())
    }

    fn flow_error(
        model: &NetworkModel,
        from: TerminalId,
        to: TerminalId,
        error: PhaseStateError,
    ) -> PhaseFlowError {
        let PhaseStateError::CrossingPhases {
            nominal,
            existing,
            incoming,
        } = error;
        PhaseFlowError::CrossingPhases {
            from_terminal: model.terminal_label(from),
            from_equipment: model.equipment(model.terminal(from).equipment).name.clone(),
            to_terminal: model.terminal_label(to),
            to_equipment: model.equipment(model.terminal(to).equipment).name.clone(),
            nominal,
            existing,
            incoming,
        }
    }
}
