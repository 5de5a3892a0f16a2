//! The network graph arena: equipment, terminals and connectivity nodes
//! addressed by stable copyable identifiers.
//!
//! The graph is cyclic (nodes reference terminals, terminals reference nodes
//! and equipment, equipment references terminals), so all cross-references
//! are stored as identifier lookups and only the arena owns memory. Handing
//! an identifier minted by one arena to another is a programmer error and
//! panics like any out-of-bounds index.

use crate::phase::PhaseCode;
use serde::{Deserialize, Serialize};

/// Identifier of a piece of equipment within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EquipmentId(u32);

/// Identifier of a terminal within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerminalId(u32);

/// Identifier of a connectivity node within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

macro_rules! impl_index_id {
    ($($id:ident),*) => {$(
        impl $id {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }
    )*};
}

impl_index_id!(EquipmentId, TerminalId, NodeId);

/// Selects which of the two independent network states an operation applies
/// to. Every phase-state read/write, open predicate and direction query can
/// answer differently per state, so the algorithms can run once per state
/// over the same topology without interference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkState {
    Normal,
    Current,
}

/// Feeder direction of a terminal, supplied per state by the external model
/// provider. Used only to prioritise inference candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeederDirection {
    #[default]
    None,
    Upstream,
    Downstream,
    Both,
}

impl FeederDirection {
    /// True when this direction includes `other` (`Both` includes either).
    pub fn has(self, other: FeederDirection) -> bool {
        self == other || (self == FeederDirection::Both && other != FeederDirection::None)
    }
}

/// The behavioural category of a piece of equipment, as far as phase
/// propagation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentKind {
    /// Injects declared phases; seeds the flood.
    Source { phases: PhaseCode },
    /// Blocks internal flow when open in the selected state.
    Switch {
        normally_open: bool,
        currently_open: bool,
    },
    /// Internal flow goes through the transformer phase-path table.
    Transformer,
    Conductor,
    Junction,
    Consumer,
}

/// A piece of equipment and its ordered terminals.
#[derive(Debug, Clone)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    pub kind: EquipmentKind,
    terminals: Vec<TerminalId>,
}

impl Equipment {
    pub fn terminals(&self) -> &[TerminalId] {
        &self.terminals
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, EquipmentKind::Source { .. })
    }

    pub fn source_phases(&self) -> Option<PhaseCode> {
        match self.kind {
            EquipmentKind::Source { phases } => Some(phases),
            _ => None,
        }
    }

    pub fn is_transformer(&self) -> bool {
        matches!(self.kind, EquipmentKind::Transformer)
    }

    /// The per-state open predicate. Non-switch equipment is always closed.
    pub fn is_open(&self, state: NetworkState) -> bool {
        match (self.kind, state) {
            (EquipmentKind::Switch { normally_open, .. }, NetworkState::Normal) => normally_open,
            (EquipmentKind::Switch { currently_open, .. }, NetworkState::Current) => currently_open,
            _ => false,
        }
    }
}

/// A typed connection point on a piece of equipment.
#[derive(Debug, Clone)]
pub struct Terminal {
    pub id: TerminalId,
    pub equipment: EquipmentId,
    /// The ordered, fixed nominal phase set of this terminal.
    pub phases: PhaseCode,
    node: Option<NodeId>,
    normal_direction: FeederDirection,
    current_direction: FeederDirection,
}

impl Terminal {
    /// The connectivity node this terminal is wired to, if any.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn direction(&self, state: NetworkState) -> FeederDirection {
        match state {
            NetworkState::Normal => self.normal_direction,
            NetworkState::Current => self.current_direction,
        }
    }
}

/// A pure electrical junction: the set of terminals that are electrically
/// joined. Created lazily when two terminals are connected and destroyed
/// once it no longer has members.
#[derive(Debug, Clone)]
pub struct ConnectivityNode {
    pub id: NodeId,
    terminals: Vec<TerminalId>,
}

impl ConnectivityNode {
    pub fn terminals(&self) -> &[TerminalId] {
        &self.terminals
    }
}

/// The arena owning all equipment, terminal and node records.
#[derive(Debug, Default)]
pub struct NetworkModel {
    equipment: Vec<Equipment>,
    terminals: Vec<Terminal>,
    nodes: Vec<Option<ConnectivityNode>>,
    free_nodes: Vec<NodeId>,
}

impl NetworkModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a piece of equipment together with one terminal per entry of
    /// `terminal_phases`, in order.
    pub fn add_equipment(
        &mut self,
        name: impl Into<String>,
        kind: EquipmentKind,
        terminal_phases: &[PhaseCode],
    ) -> EquipmentId {
        let id = EquipmentId::from_index(self.equipment.len());
        let mut terminals = Vec::with_capacity(terminal_phases.len());
        for phases in terminal_phases {
            let tid = TerminalId::from_index(self.terminals.len());
            self.terminals.push(Terminal {
                id: tid,
                equipment: id,
                phases: *phases,
                node: None,
                normal_direction: FeederDirection::None,
                current_direction: FeederDirection::None,
            });
            terminals.push(tid);
        }
        self.equipment.push(Equipment {
            id,
            name: name.into(),
            kind,
            terminals,
        });
        id
    }

    pub fn equipment(&self, id: EquipmentId) -> &Equipment {
        &self.equipment[id.index()]
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.index()]
    }

    pub fn node(&self, id: NodeId) -> Option<&ConnectivityNode> {
        self.nodes[id.index()].as_ref()
    }

    pub fn equipment_iter(&self) -> impl Iterator<Item = &Equipment> {
        self.equipment.iter()
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = &Terminal> {
        self.terminals.iter()
    }

    /// A human-readable label for a terminal, used in error messages and
    /// operator-facing logs.
    pub fn terminal_label(&self, id: TerminalId) -> String {
        let terminal = self.terminal(id);
        let equipment = self.equipment(terminal.equipment);
        let position = equipment
            .terminals
            .iter()
            .position(|t| *t == id)
            .unwrap_or(0);
        format!("{}-t{}", equipment.name, position + 1)
    }

    /// Electrically joins two terminals, creating or merging connectivity
    /// nodes as needed.
    pub fn connect(&mut self, a: TerminalId, b: TerminalId) {
        match (self.terminals[a.index()].node, self.terminals[b.index()].node) {
            (Some(na), Some(nb)) if na == nb => {}
            (Some(na), Some(nb)) => self.merge_nodes(na, nb),
            (Some(na), None) => self.join_node(na, b),
            (None, Some(nb)) => self.join_node(nb, a),
            (None, None) => {
                let id = self.alloc_node();
                self.join_node(id, a);
                self.join_node(id, b);
            }
        }
    }

    /// Removes a terminal from its connectivity node; a node left without
    /// members is destroyed and its slot recycled.
    pub fn disconnect(&mut self, terminal: TerminalId) {
        let Some(node_id) = self.terminals[terminal.index()].node.take() else {
            return;
        };
        let Some(node) = self.nodes[node_id.index()].as_mut() else {
            return;
        };
        node.terminals.retain(|t| *t != terminal);
        if node.terminals.is_empty() {
            self.nodes[node_id.index()] = None;
            self.free_nodes.push(node_id);
        }
    }

    /// The other terminals joined to `terminal` at its connectivity node.
    pub fn connected_terminals(&self, terminal: TerminalId) -> Vec<TerminalId> {
        let Some(node_id) = self.terminals[terminal.index()].node else {
            return Vec::new();
        };
        match self.node(node_id) {
            Some(node) => node
                .terminals()
                .iter()
                .copied()
                .filter(|t| *t != terminal)
                .collect(),
            None => Vec::new(),
        }
    }

    /// The other terminals on the same piece of equipment.
    pub fn other_terminals(&self, terminal: TerminalId) -> Vec<TerminalId> {
        let equipment = self.equipment(self.terminals[terminal.index()].equipment);
        equipment
            .terminals()
            .iter()
            .copied()
            .filter(|t| *t != terminal)
            .collect()
    }

    pub fn set_direction(
        &mut self,
        terminal: TerminalId,
        state: NetworkState,
        direction: FeederDirection,
    ) {
        let terminal = &mut self.terminals[terminal.index()];
        match state {
            NetworkState::Normal => terminal.normal_direction = direction,
            NetworkState::Current => terminal.current_direction = direction,
        }
    }

    fn alloc_node(&mut self) -> NodeId {
        if let Some(id) = self.free_nodes.pop() {
            self.nodes[id.index()] = Some(ConnectivityNode {
                id,
                terminals: Vec::new(),
            });
            id
        } else {
            let id = NodeId::from_index(self.nodes.len());
            self.nodes.push(Some(ConnectivityNode {
                id,
                terminals: Vec::new(),
            }));
            id
        }
    }

    fn join_node(&mut self, node_id: NodeId, terminal: TerminalId) {
        if let Some(node) = self.nodes[node_id.index()].as_mut() {
            node.terminals.push(terminal);
            self.terminals[terminal.index()].node = Some(node_id);
        }
    }

    fn merge_nodes(&mut self, keep: NodeId, drop: NodeId) {
        let members = match self.nodes[drop.index()].take() {
            Some(node) => node.terminals,
            None => return,
        };
        self.free_nodes.push(drop);
        for terminal in members {
            self.join_node(keep, terminal);
        }
    }
}
