//! Gates: the named, directional ports through which modules exchange
//! messages.
//!
//! A module declares its gates once (see [`SimpleModule::gates`]); the
//! kernel turns the declaration into a [`GateTable`] and hands out a
//! [`GateId`] per entry. Modules resolve names to ids during
//! initialization and compare ids from then on.
//!
//! [`SimpleModule::gates`]: super::SimpleModule::gates

use serde::{Deserialize, Serialize};

/// Opaque, per-module gate identifier.
///
/// Two ids are only meaningful to compare when they belong to the same
/// module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateId(u32);

impl GateId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        GateId(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for GateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// Which way messages flow through a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDirection {
    Input,
    Output,
}

impl std::fmt::Display for GateDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDirection::Input => write!(f, "input"),
            GateDirection::Output => write!(f, "output"),
        }
    }
}

/// One entry of a module's declared interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecl {
    pub name: &'static str,
    pub direction: GateDirection,
}

impl GateDecl {
    pub const fn input(name: &'static str) -> Self {
        GateDecl {
            name,
            direction: GateDirection::Input,
        }
    }

    pub const fn output(name: &'static str) -> Self {
        GateDecl {
            name,
            direction: GateDirection::Output,
        }
    }
}

/// The resolved gate set of a single module instance.
#[derive(Debug, Clone, Default)]
pub struct GateTable {
    decls: Vec<GateDecl>,
}

impl GateTable {
    /// Build a table from a declaration list. Ids follow declaration order.
    pub fn new(decls: Vec<GateDecl>) -> Self {
        GateTable { decls }
    }

    /// Look a gate up by name.
    pub fn find(&self, name: &str) -> Option<GateId> {
        self.decls
            .iter()
            .position(|d| d.name == name)
            .map(|idx| GateId(idx as u32))
    }

    pub fn decl(&self, id: GateId) -> Option<&GateDecl> {
        self.decls.get(id.0 as usize)
    }

    pub fn name(&self, id: GateId) -> Option<&'static str> {
        self.decl(id).map(|d| d.name)
    }

    pub fn direction(&self, id: GateId) -> Option<GateDirection> {
        self.decl(id).map(|d| d.direction)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
