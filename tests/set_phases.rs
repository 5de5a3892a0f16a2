//! Flooding behaviour over small but representative network topologies.
mod common;

use common::*;
use phasetrace::phase::SinglePhase::{A, B, C, N};
use phasetrace::prelude::*;

#[test]
fn floods_straight_through_a_radial_feeder() {
    let mut model = NetworkModel::new();
    let s = source(&mut model, "feeder", PhaseCode::ABC);
    let l = line(&mut model, "ln", PhaseCode::ABC);
    let c = consumer(&mut model, "load", PhaseCode::ABC);
    wire(&mut model, (s, 0), (l, 0));
    wire(&mut model, (l, 1), (c, 0));

    let mut states = PhaseStates::new();
    SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();

    for t in model.terminal_iter() {
        assert_eq!(
            states.status(t.id, NetworkState::Normal).as_phase_code(t.phases),
            Some(PhaseCode::ABC),
        );
    }
}

#[test]
fn reflooding_a_resolved_network_changes_nothing() {
    let mut model = NetworkModel::new();
    let s = source(&mut model, "feeder", PhaseCode::ABC);
    let c = consumer(&mut model, "load", PhaseCode::ABC);
    wire(&mut model, (s, 0), (c, 0));

    let mut states = PhaseStates::new();
    SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();
    let writes = states.write_count();
    assert!(writes > 0);

    // The second flood must reach its fixed point without a single write.
    SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();
    assert_eq!(states.write_count(), writes);

    let load = terminals(&model, c)[0];
    assert_eq!(traced(&model, &states, load), vec![A, B, C]);
}

#[test]
fn open_switch_blocks_flow_per_network_state() {
    let mut model = NetworkModel::new();
    let s = source(&mut model, "feeder", PhaseCode::ABC);
    let sw = model.add_equipment(
        "sw",
        EquipmentKind::Switch {
            normally_open: true,
            currently_open: false,
        },
        &[PhaseCode::ABC, PhaseCode::ABC],
    );
    let c = consumer(&mut model, "load", PhaseCode::ABC);
    wire(&mut model, (s, 0), (sw, 0));
    wire(&mut model, (sw, 1), (c, 0));

    let mut states = PhaseStates::new();
    let set_phases = SetPhases::new();
    set_phases
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();
    set_phases
        .run(&model, &mut states, NetworkState::Current)
        .unwrap();

    let load = terminals(&model, c)[0];
    // Normally open: the flood reaches the switch but not past it.
    assert_eq!(
        states.status(load, NetworkState::Normal).as_phase_code(PhaseCode::ABC),
        Some(PhaseCode::None),
    );
    assert_eq!(
        states.status(load, NetworkState::Current).as_phase_code(PhaseCode::ABC),
        Some(PhaseCode::ABC),
    );
}

#[test]
fn conflicting_sources_raise_crossing_phases() {
    let mut model = NetworkModel::new();
    let s1 = source_with_terminal(&mut model, "s1", PhaseCode::A, PhaseCode::X);
    let s2 = source_with_terminal(&mut model, "s2", PhaseCode::B, PhaseCode::X);
    let j = model.add_equipment("j", EquipmentKind::Junction, &[PhaseCode::X]);
    wire(&mut model, (s1, 0), (j, 0));
    wire(&mut model, (s2, 0), (j, 0));

    let mut states = PhaseStates::new();
    let err = SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap_err();
    let PhaseFlowError::CrossingPhases {
        nominal,
        existing,
        incoming,
        ..
    } = err;
    assert_eq!(nominal, phasetrace::phase::SinglePhase::X);
    let mut pair = [existing, incoming];
    pair.sort();
    assert_eq!(pair, [A, B]);
}

#[test]
fn ring_topologies_terminate_and_resolve_fully() {
    let mut model = NetworkModel::new();
    let s = source(&mut model, "feeder", PhaseCode::ABC);
    let lines: Vec<_> = (0..3)
        .map(|i| line(&mut model, &format!("ln-{i}"), PhaseCode::ABC))
        .collect();
    wire(&mut model, (s, 0), (lines[0], 0));
    wire(&mut model, (lines[0], 1), (lines[1], 0));
    wire(&mut model, (lines[1], 1), (lines[2], 0));
    wire(&mut model, (lines[2], 1), (s, 0));

    let mut states = PhaseStates::new();
    SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();

    for t in model.terminal_iter() {
        assert_eq!(
            states.status(t.id, NetworkState::Normal).as_phase_code(t.phases),
            Some(PhaseCode::ABC),
        );
    }
}

#[test]
fn swer_spur_derives_the_synthetic_conductor() {
    // A single-phase B spur drops to SWER and back to split-phase: the
    // synthetic second conductor of the isolation transformer derives C
    // from its B sibling without any retry.
    let mut model = NetworkModel::new();
    let s = source(&mut model, "spur", PhaseCode::B);
    let tap = transformer(&mut model, "tap", PhaseCode::B, PhaseCode::X);
    let iso = transformer(&mut model, "iso", PhaseCode::X, PhaseCode::XY);
    let c = consumer(&mut model, "load", PhaseCode::XY);
    wire(&mut model, (s, 0), (tap, 0));
    wire(&mut model, (tap, 1), (iso, 0));
    wire(&mut model, (iso, 1), (c, 0));

    let mut states = PhaseStates::new();
    SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();

    assert_eq!(traced(&model, &states, terminals(&model, iso)[1]), vec![B, C]);
    assert_eq!(traced(&model, &states, terminals(&model, c)[0]), vec![B, C]);
}

#[test]
fn partially_energised_transformer_is_retried_with_suspect_flow() {
    // An A-phase spur leaves the isolation transformer's synthetic
    // conductor unresolved on the first pass; the retry with suspect
    // derivation allowed settles it to B and floods onward.
    let mut model = NetworkModel::new();
    let s = source(&mut model, "spur", PhaseCode::A);
    let tap = transformer(&mut model, "tap", PhaseCode::A, PhaseCode::X);
    let iso = transformer(&mut model, "iso", PhaseCode::X, PhaseCode::XY);
    let c = consumer(&mut model, "load", PhaseCode::XY);
    wire(&mut model, (s, 0), (tap, 0));
    wire(&mut model, (tap, 1), (iso, 0));
    wire(&mut model, (iso, 1), (c, 0));

    let mut states = PhaseStates::new();
    SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();

    assert_eq!(traced(&model, &states, terminals(&model, iso)[1]), vec![A, B]);
    assert_eq!(traced(&model, &states, terminals(&model, c)[0]), vec![A, B]);
}

#[test]
fn partially_declared_sources_seed_positionally() {
    let mut model = NetworkModel::new();
    let s = source_with_terminal(&mut model, "feeder", PhaseCode::AB, PhaseCode::ABC);
    let c = consumer(&mut model, "load", PhaseCode::ABC);
    wire(&mut model, (s, 0), (c, 0));

    let mut states = PhaseStates::new();
    SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();

    use phasetrace::phase::SinglePhase;
    let load = terminals(&model, c)[0];
    assert_eq!(
        traced(&model, &states, load),
        vec![A, B, SinglePhase::None]
    );
}

#[test]
fn run_from_terminal_floods_externally_set_phases() {
    let mut model = NetworkModel::new();
    let l = line(&mut model, "ln", PhaseCode::ABC);
    let c = consumer(&mut model, "load", PhaseCode::ABC);
    wire(&mut model, (l, 1), (c, 0));

    let mut states = PhaseStates::new();
    let head = terminals(&model, l)[0];
    for phase in [A, B, C] {
        states.set(head, NetworkState::Normal, phase, phase).unwrap();
    }
    SetPhases::new()
        .run_from_terminal(&model, &mut states, NetworkState::Normal, head)
        .unwrap();

    let load = terminals(&model, c)[0];
    assert_eq!(traced(&model, &states, load), vec![A, B, C]);
}

#[test]
fn spread_bridges_a_connectivity_gap() {
    // Two segments with no wire between them; spread carries the traced
    // phases across the gap and keeps flooding on the far side.
    let mut model = NetworkModel::new();
    let s = source(&mut model, "feeder", PhaseCode::ABC);
    let near = line(&mut model, "near", PhaseCode::ABC);
    let far = line(&mut model, "far", PhaseCode::ABC);
    let c = consumer(&mut model, "load", PhaseCode::ABC);
    wire(&mut model, (s, 0), (near, 0));
    wire(&mut model, (far, 1), (c, 0));

    let mut states = PhaseStates::new();
    let set_phases = SetPhases::new();
    set_phases
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();
    let load = terminals(&model, c)[0];
    assert_eq!(
        states.status(load, NetworkState::Normal).as_phase_code(PhaseCode::ABC),
        Some(PhaseCode::None),
    );

    set_phases
        .spread(
            &model,
            &mut states,
            NetworkState::Normal,
            terminals(&model, near)[1],
            terminals(&model, far)[0],
        )
        .unwrap();
    assert_eq!(traced(&model, &states, load), vec![A, B, C]);
}

#[test]
fn transformer_neutral_resolves_to_n() {
    let mut model = NetworkModel::new();
    let s = source(&mut model, "feeder", PhaseCode::ABC);
    let tx = transformer(&mut model, "tx", PhaseCode::ABC, PhaseCode::ABCN);
    let c = consumer(&mut model, "load", PhaseCode::ABCN);
    wire(&mut model, (s, 0), (tx, 0));
    wire(&mut model, (tx, 1), (c, 0));

    let mut states = PhaseStates::new();
    SetPhases::new()
        .run(&model, &mut states, NetworkState::Normal)
        .unwrap();

    let load = terminals(&model, c)[0];
    assert_eq!(traced(&model, &states, load), vec![A, B, C, N]);
}
