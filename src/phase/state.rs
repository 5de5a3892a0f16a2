use crate::error::PhaseStateError;
use crate::network::{NetworkState, TerminalId};
use crate::phase::code::{PhaseCode, SinglePhase};
use ahash::AHashMap;

/// The traced phases of one terminal in one network state, packed into a
/// 16-bit word with one nibble per nominal slot.
///
/// A slot may only ever transition between `None` and a concrete label.
/// Overwriting one concrete label with a different one is a crossing-phases
/// conflict and fails loudly; it means the network topology feeds two
/// different source phases into the same conductor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStatus(u16);

impl PhaseStatus {
    /// The traced phase currently held by the slot of `nominal`.
    pub fn get(&self, nominal: SinglePhase) -> SinglePhase {
        match nominal.slot() {
            Some(slot) => SinglePhase::from_bit_mask((self.0 >> (slot * 4)) & 0xF),
            None => SinglePhase::None,
        }
    }

    /// Writes `value` into the slot of `nominal`.
    ///
    /// Returns `Ok(false)` when the slot already holds `value` (the normal
    /// steady state that halts further flooding), `Ok(true)` when the slot
    /// changed, and a crossing-phases error when the slot holds a different
    /// concrete label. Clearing back to `None` is always permitted. Only
    /// concrete labels can be stored; a placeholder `value` is a no-op, not
    /// a change.
    pub fn set(&mut self, nominal: SinglePhase, value: SinglePhase) -> Result<bool, PhaseStateError> {
        let Some(slot) = nominal.slot() else {
            return Ok(false);
        };
        if value.is_placeholder() {
            return Ok(false);
        }
        let existing = self.get(nominal);
        if existing == value {
            return Ok(false);
        }
        if existing != SinglePhase::None && value != SinglePhase::None {
            return Err(PhaseStateError::CrossingPhases {
                nominal,
                existing,
                incoming: value,
            });
        }
        let shift = slot * 4;
        self.0 = (self.0 & !(0xF << shift)) | (value.bit_mask() << shift);
        Ok(true)
    }

    /// True when every slot of `nominal` holds a concrete label.
    pub fn is_fully_resolved(&self, nominal: PhaseCode) -> bool {
        nominal
            .single_phases()
            .iter()
            .all(|p| self.get(*p).is_concrete())
    }

    /// The nominal phases of `nominal` whose slots are still `None`.
    pub fn unresolved(&self, nominal: PhaseCode) -> Vec<SinglePhase> {
        nominal
            .single_phases()
            .iter()
            .copied()
            .filter(|p| self.get(*p) == SinglePhase::None)
            .collect()
    }

    /// Converts the traced slots of `nominal` back into a canonical phase
    /// code. Succeeds when all slots are concretely resolved, yields
    /// `PhaseCode::None` when all are unresolved, and `None` otherwise.
    pub fn as_phase_code(&self, nominal: PhaseCode) -> Option<PhaseCode> {
        let traced: Vec<SinglePhase> = nominal
            .single_phases()
            .iter()
            .map(|p| self.get(*p))
            .collect();
        if traced.iter().all(|p| *p == SinglePhase::None) {
            return Some(PhaseCode::None);
        }
        if traced.iter().all(|p| p.is_concrete()) {
            return PhaseCode::from_single_phases(&traced);
        }
        None
    }
}

/// The phase state store: one [`PhaseStatus`] per terminal per network state.
///
/// This is the only shared mutable resource crossing component boundaries;
/// every write funnels through [`PhaseStates::set`], which enforces the
/// single-writer-per-slot invariant.
#[derive(Debug, Default)]
pub struct PhaseStates {
    normal: AHashMap<TerminalId, PhaseStatus>,
    current: AHashMap<TerminalId, PhaseStatus>,
    writes: usize,
}

impl PhaseStates {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, state: NetworkState) -> &AHashMap<TerminalId, PhaseStatus> {
        match state {
            NetworkState::Normal => &self.normal,
            NetworkState::Current => &self.current,
        }
    }

    /// A copy of the packed status for `terminal`, all-`None` if untouched.
    pub fn status(&self, terminal: TerminalId, state: NetworkState) -> PhaseStatus {
        self.map(state).get(&terminal).copied().unwrap_or_default()
    }

    pub fn get(&self, terminal: TerminalId, state: NetworkState, nominal: SinglePhase) -> SinglePhase {
        self.status(terminal, state).get(nominal)
    }

    /// Writes through to [`PhaseStatus::set`] for the selected state.
    pub fn set(
        &mut self,
        terminal: TerminalId,
        state: NetworkState,
        nominal: SinglePhase,
        value: SinglePhase,
    ) -> Result<bool, PhaseStateError> {
        let map = match state {
            NetworkState::Normal => &mut self.normal,
            NetworkState::Current => &mut self.current,
        };
        let changed = map.entry(terminal).or_default().set(nominal, value)?;
        self.writes += usize::from(changed);
        Ok(changed)
    }

    /// Running total of writes that changed a slot, across both states. An
    /// operation that left this untouched reached a fixed point without
    /// rewriting anything.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Clears all traced phases in both states and the write count.
    pub fn reset(&mut self) {
        self.normal.clear();
        self.current.clear();
        self.writes = 0;
    }
}
