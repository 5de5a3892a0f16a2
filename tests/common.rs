//! Common test utilities for building small distribution networks.
use phasetrace::prelude::*;

/// The terminal ids of a piece of equipment, in declaration order.
#[allow(dead_code)]
pub fn terminals(model: &NetworkModel, id: EquipmentId) -> Vec<TerminalId> {
    model.equipment(id).terminals().to_vec()
}

#[allow(dead_code)]
pub fn source(model: &mut NetworkModel, name: &str, phases: PhaseCode) -> EquipmentId {
    model.add_equipment(name, EquipmentKind::Source { phases }, &[phases])
}

/// A source whose terminal declares a different nominal set than the phases
/// it injects (seeding is positional).
#[allow(dead_code)]
pub fn source_with_terminal(
    model: &mut NetworkModel,
    name: &str,
    injected: PhaseCode,
    terminal: PhaseCode,
) -> EquipmentId {
    model.add_equipment(name, EquipmentKind::Source { phases: injected }, &[terminal])
}

#[allow(dead_code)]
pub fn breaker(model: &mut NetworkModel, name: &str, phases: PhaseCode, open: bool) -> EquipmentId {
    model.add_equipment(
        name,
        EquipmentKind::Switch {
            normally_open: open,
            currently_open: open,
        },
        &[phases, phases],
    )
}

#[allow(dead_code)]
pub fn line(model: &mut NetworkModel, name: &str, phases: PhaseCode) -> EquipmentId {
    model.add_equipment(name, EquipmentKind::Conductor, &[phases, phases])
}

#[allow(dead_code)]
pub fn transformer(
    model: &mut NetworkModel,
    name: &str,
    hv: PhaseCode,
    lv: PhaseCode,
) -> EquipmentId {
    model.add_equipment(name, EquipmentKind::Transformer, &[hv, lv])
}

#[allow(dead_code)]
pub fn consumer(model: &mut NetworkModel, name: &str, phases: PhaseCode) -> EquipmentId {
    model.add_equipment(name, EquipmentKind::Consumer, &[phases])
}

/// Connects terminal `a.1` of equipment `a.0` to terminal `b.1` of `b.0`.
#[allow(dead_code)]
pub fn wire(model: &mut NetworkModel, a: (EquipmentId, usize), b: (EquipmentId, usize)) {
    let ta = model.equipment(a.0).terminals()[a.1];
    let tb = model.equipment(b.0).terminals()[b.1];
    model.connect(ta, tb);
}

/// The traced phases of every slot of a terminal in the normal state, in
/// nominal order.
#[allow(dead_code)]
pub fn traced(model: &NetworkModel, states: &PhaseStates, t: TerminalId) -> Vec<SinglePhase> {
    model
        .terminal(t)
        .phases
        .single_phases()
        .iter()
        .map(|p| states.get(t, NetworkState::Normal, *p))
        .collect()
}
