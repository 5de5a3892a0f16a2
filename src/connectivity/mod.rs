//! Terminal-to-terminal nominal-phase-path resolution.
//!
//! Given two terminals, either directly wired through a connectivity node
//! (or adjacent on one piece of multi-terminal equipment) or linked through
//! the two windings of a transformer, this resolves how each nominal phase
//! on one side maps to a nominal phase on the other. The flooding algorithm
//! floods exactly these paths, so the result order is deterministic: sorted
//! by `(from, to)`.

use crate::network::{NetworkModel, TerminalId};
use crate::phase::{PhaseCode, SinglePhase};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// How a phase label travels from one terminal's nominal slot to another's.
///
/// A path with `from == SinglePhase::None` marks a destination phase that is
/// newly introduced rather than passed through (a transformer-added neutral
/// or synthetic conductor); its traced value must be derived from context at
/// flood time instead of being copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NominalPhasePath {
    pub from: SinglePhase,
    pub to: SinglePhase,
}

impl NominalPhasePath {
    pub fn through(from: SinglePhase, to: SinglePhase) -> Self {
        NominalPhasePath { from, to }
    }

    pub fn added(to: SinglePhase) -> Self {
        NominalPhasePath {
            from: SinglePhase::None,
            to,
        }
    }

    pub fn is_added(&self) -> bool {
        self.from == SinglePhase::None
    }
}

/// Computes the nominal phase paths between two terminals for the given
/// candidate phases of the from side.
///
/// Terminals on the same transformer go through the static transformer
/// phase-path table; every other pairing is resolved directly, falling back
/// to positional X/Y matching when the nominal sets have no intersection.
pub fn resolve_between(
    model: &NetworkModel,
    from: TerminalId,
    to: TerminalId,
    candidates: &[SinglePhase],
) -> Vec<NominalPhasePath> {
    let from_terminal = model.terminal(from);
    let to_terminal = model.terminal(to);
    let paths = if from_terminal.equipment == to_terminal.equipment
        && model.equipment(from_terminal.equipment).is_transformer()
    {
        transformer_paths(from_terminal.phases, to_terminal.phases, candidates)
    } else {
        direct_paths(from_terminal.phases, to_terminal.phases, candidates)
    };
    paths.into_iter().sorted_unstable().dedup().collect()
}

fn direct_paths(
    from_code: PhaseCode,
    to_code: PhaseCode,
    candidates: &[SinglePhase],
) -> Vec<NominalPhasePath> {
    let mut paths: Vec<NominalPhasePath> = candidates
        .iter()
        .copied()
        .filter(|p| from_code.contains(*p) && to_code.contains(*p))
        .map(|p| NominalPhasePath::through(p, p))
        .collect();
    if !paths.is_empty() {
        return paths;
    }

    // No direct intersection: unresolved X/Y placeholders on either side are
    // matched by positional index against the other side's phase list. This
    // is best effort, for equipment (e.g. SWER taps) whose conductors' real
    // identity is only discoverable from what they are wired to.
    for (i, &f) in from_code.single_phases().iter().enumerate() {
        if !candidates.contains(&f) {
            continue;
        }
        let Some(&t) = to_code.single_phases().get(i) else {
            continue;
        };
        if f.is_placeholder() != t.is_placeholder() {
            paths.push(NominalPhasePath::through(f, t));
        }
    }
    paths
}

/// Pathing kinds a transformer winding pair may exhibit. Selected from the
/// static table keyed by (from-phase-count, to-phase-count); the first kind
/// that applies to the actual nominal sets wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindingPathing {
    /// Live conductors pass through unchanged (by identity, or positionally
    /// when a placeholder is involved).
    Straight,
    /// The to side gains conductors: pass the shared ones positionally and
    /// introduce the synthetic extras (e.g. the `Y` of a SWER LV winding).
    Expand,
    /// The to side loses conductors: pass positionally, drop the rest.
    Reduce,
}

fn pathing_kinds(from_count: usize, to_count: usize) -> &'static [WindingPathing] {
    use WindingPathing::*;
    match (from_count, to_count) {
        (1, 1) | (2, 2) | (3, 3) | (4, 4) => &[Straight],
        (1, 2) => &[Expand, Straight],
        (2, 1) => &[Reduce, Straight],
        (2, 3) => &[Straight, Expand],
        (3, 2) => &[Straight, Reduce],
        (3, 4) | (4, 3) => &[Straight],
        (1, 3) | (1, 4) | (2, 4) => &[Expand],
        (3, 1) | (4, 1) | (4, 2) => &[Reduce],
        _ => &[],
    }
}

fn transformer_paths(
    from_code: PhaseCode,
    to_code: PhaseCode,
    candidates: &[SinglePhase],
) -> Vec<NominalPhasePath> {
    for kind in pathing_kinds(from_code.num_phases(), to_code.num_phases()) {
        let applied = match kind {
            WindingPathing::Straight => straight_live(from_code, to_code, candidates),
            WindingPathing::Expand => expand_live(from_code, to_code, candidates),
            WindingPathing::Reduce => reduce_live(from_code, to_code, candidates),
        };
        if let Some(paths) = applied {
            return with_neutral(paths, from_code, to_code, candidates);
        }
    }
    Vec::new()
}

/// A through pair is valid when the labels are identical or one side is an
/// unresolved placeholder; a transformer never relabels one concrete phase
/// as another.
fn pair_ok(f: SinglePhase, t: SinglePhase) -> bool {
    f == t || f.is_placeholder() || t.is_placeholder()
}

fn straight_live(
    from_code: PhaseCode,
    to_code: PhaseCode,
    candidates: &[SinglePhase],
) -> Option<Vec<NominalPhasePath>> {
    let from_live: Vec<_> = from_code.live_phases().collect();
    let to_live: Vec<_> = to_code.live_phases().collect();
    let same_set = from_live.len() == to_live.len()
        && from_live.iter().all(|p| to_live.contains(p));
    if same_set {
        return Some(
            from_live
                .into_iter()
                .filter(|p| candidates.contains(p))
                .map(|p| NominalPhasePath::through(p, p))
                .collect(),
        );
    }
    // Differing sets are only passable positionally through placeholders;
    // anything else (e.g. AB -> BC) has no paths at all.
    if from_live.len() != to_live.len() {
        return None;
    }
    let pairs: Vec<_> = from_live.into_iter().zip(to_live).collect();
    if !pairs.iter().all(|(f, t)| pair_ok(*f, *t)) {
        return None;
    }
    Some(
        pairs
            .into_iter()
            .filter(|(f, _)| candidates.contains(f))
            .map(|(f, t)| NominalPhasePath::through(f, t))
            .collect(),
    )
}

fn expand_live(
    from_code: PhaseCode,
    to_code: PhaseCode,
    candidates: &[SinglePhase],
) -> Option<Vec<NominalPhasePath>> {
    let from_live: Vec<_> = from_code.live_phases().collect();
    let to_live: Vec<_> = to_code.live_phases().collect();
    if to_live.len() <= from_live.len() {
        return None;
    }
    let mut paths = Vec::new();
    for (f, t) in from_live.iter().zip(&to_live) {
        if !pair_ok(*f, *t) {
            return None;
        }
        if candidates.contains(f) {
            paths.push(NominalPhasePath::through(*f, *t));
        }
    }
    for &extra in &to_live[from_live.len()..] {
        // Only synthetic conductors can appear out of nowhere.
        if !extra.is_placeholder() {
            return None;
        }
        paths.push(NominalPhasePath::added(extra));
    }
    Some(paths)
}

fn reduce_live(
    from_code: PhaseCode,
    to_code: PhaseCode,
    candidates: &[SinglePhase],
) -> Option<Vec<NominalPhasePath>> {
    let from_live: Vec<_> = from_code.live_phases().collect();
    let to_live: Vec<_> = to_code.live_phases().collect();
    if to_live.len() >= from_live.len() {
        return None;
    }
    let mut paths = Vec::new();
    for (f, t) in from_live.iter().zip(&to_live) {
        if !pair_ok(*f, *t) {
            return None;
        }
        if candidates.contains(f) {
            paths.push(NominalPhasePath::through(*f, *t));
        }
    }
    // Remaining from-side conductors are dropped by the winding.
    Some(paths)
}

/// Neutral handling shared by every pathing kind: both sides carry N, it
/// passes through; only the to side carries N, it is newly introduced; only
/// the from side carries N, it is dropped.
fn with_neutral(
    mut paths: Vec<NominalPhasePath>,
    from_code: PhaseCode,
    to_code: PhaseCode,
    candidates: &[SinglePhase],
) -> Vec<NominalPhasePath> {
    let from_n = from_code.contains(SinglePhase::N);
    let to_n = to_code.contains(SinglePhase::N);
    if from_n && to_n && candidates.contains(&SinglePhase::N) {
        paths.push(NominalPhasePath::through(SinglePhase::N, SinglePhase::N));
    } else if !from_n && to_n {
        paths.push(NominalPhasePath::added(SinglePhase::N));
    }
    paths
}
