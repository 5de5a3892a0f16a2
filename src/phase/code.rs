use serde::{Deserialize, Serialize};
use std::fmt;

/// A single nominal or traced phase label.
///
/// `A`, `B`, `C` and `N` are concrete labels and carry bit masks so that
/// presence can be tested with a mask. `X` and `Y` are nominal-only
/// placeholders whose real identity is only discoverable from what they are
/// wired to. `None` is the absence value a slot holds before propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SinglePhase {
    None,
    A,
    B,
    C,
    N,
    X,
    Y,
}

impl SinglePhase {
    /// The bit flag used inside a packed phase-status nibble.
    pub fn bit_mask(self) -> u16 {
        match self {
            SinglePhase::A => 1,
            SinglePhase::B => 2,
            SinglePhase::C => 4,
            SinglePhase::N => 8,
            _ => 0,
        }
    }

    /// Decodes a nibble value back into a label.
    pub fn from_bit_mask(mask: u16) -> SinglePhase {
        match mask {
            1 => SinglePhase::A,
            2 => SinglePhase::B,
            4 => SinglePhase::C,
            8 => SinglePhase::N,
            _ => SinglePhase::None,
        }
    }

    /// The packed slot this nominal phase occupies: `A`/`X` share slot 0,
    /// `B`/`Y` share slot 1, `C` is slot 2 and `N` is slot 3.
    pub fn slot(self) -> Option<usize> {
        match self {
            SinglePhase::A | SinglePhase::X => Some(0),
            SinglePhase::B | SinglePhase::Y => Some(1),
            SinglePhase::C => Some(2),
            SinglePhase::N => Some(3),
            SinglePhase::None => None,
        }
    }

    /// True for `A`, `B`, `C` and `N`.
    pub fn is_concrete(self) -> bool {
        matches!(
            self,
            SinglePhase::A | SinglePhase::B | SinglePhase::C | SinglePhase::N
        )
    }

    /// True for the ambiguous `X`/`Y` placeholders.
    pub fn is_placeholder(self) -> bool {
        matches!(self, SinglePhase::X | SinglePhase::Y)
    }
}

impl fmt::Display for SinglePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SinglePhase::None => "NONE",
            SinglePhase::A => "A",
            SinglePhase::B => "B",
            SinglePhase::C => "C",
            SinglePhase::N => "N",
            SinglePhase::X => "X",
            SinglePhase::Y => "Y",
        };
        write!(f, "{}", s)
    }
}

/// A canonical, ordered set of nominal phases carried by a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseCode {
    None,
    A,
    B,
    C,
    N,
    AB,
    AC,
    AN,
    BC,
    BN,
    CN,
    ABC,
    ABN,
    ACN,
    BCN,
    ABCN,
    X,
    XN,
    XY,
    XYN,
    Y,
    YN,
}

impl PhaseCode {
    /// The ordered nominal phases of this code.
    pub fn single_phases(self) -> &'static [SinglePhase] {
        use SinglePhase::*;
        match self {
            PhaseCode::None => &[],
            PhaseCode::A => &[A],
            PhaseCode::B => &[B],
            PhaseCode::C => &[C],
            PhaseCode::N => &[N],
            PhaseCode::AB => &[A, B],
            PhaseCode::AC => &[A, C],
            PhaseCode::AN => &[A, N],
            PhaseCode::BC => &[B, C],
            PhaseCode::BN => &[B, N],
            PhaseCode::CN => &[C, N],
            PhaseCode::ABC => &[A, B, C],
            PhaseCode::ABN => &[A, B, N],
            PhaseCode::ACN => &[A, C, N],
            PhaseCode::BCN => &[B, C, N],
            PhaseCode::ABCN => &[A, B, C, N],
            PhaseCode::X => &[X],
            PhaseCode::XN => &[X, N],
            PhaseCode::XY => &[X, Y],
            PhaseCode::XYN => &[X, Y, N],
            PhaseCode::Y => &[Y],
            PhaseCode::YN => &[Y, N],
        }
    }

    pub fn num_phases(self) -> usize {
        self.single_phases().len()
    }

    pub fn contains(self, phase: SinglePhase) -> bool {
        self.single_phases().contains(&phase)
    }

    /// The non-neutral conductors of this code, in order.
    pub fn live_phases(self) -> impl Iterator<Item = SinglePhase> {
        self.single_phases()
            .iter()
            .copied()
            .filter(|p| *p != SinglePhase::N)
    }

    /// Rebuilds a canonical code from an ordered list of phases, if one
    /// exists. Duplicate or out-of-order lists have no canonical code.
    pub fn from_single_phases(phases: &[SinglePhase]) -> Option<PhaseCode> {
        const ALL: [PhaseCode; 22] = [
            PhaseCode::None,
            PhaseCode::A,
            PhaseCode::B,
            PhaseCode::C,
            PhaseCode::N,
            PhaseCode::AB,
            PhaseCode::AC,
            PhaseCode::AN,
            PhaseCode::BC,
            PhaseCode::BN,
            PhaseCode::CN,
            PhaseCode::ABC,
            PhaseCode::ABN,
            PhaseCode::ACN,
            PhaseCode::BCN,
            PhaseCode::ABCN,
            PhaseCode::X,
            PhaseCode::XN,
            PhaseCode::XY,
            PhaseCode::XYN,
            PhaseCode::Y,
            PhaseCode::YN,
        ];
        ALL.into_iter().find(|c| c.single_phases() == phases)
    }
}

impl fmt::Display for PhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == PhaseCode::None {
            return write!(f, "NONE");
        }
        for phase in self.single_phases() {
            write!(f, "{}", phase)?;
        }
        Ok(())
    }
}
