/// Permission model: modules, levels and the per-role default grid
///
/// A permission set maps each module to the levels granted on it. `full`
/// satisfies every level of its own module and nothing outside it. A module
/// missing from the set grants nothing.

use crate::error::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Functional area a permission is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Users,
    Credits,
    Projects,
    Mocks,
    Assessments,
    Challenges,
    Communities,
    Feedback,
    Analytics,
    AdminManagement,
    System,
}

impl Module {
    pub const ALL: [Module; 11] = [
        Module::Users,
        Module::Credits,
        Module::Projects,
        Module::Mocks,
        Module::Assessments,
        Module::Challenges,
        Module::Communities,
        Module::Feedback,
        Module::Analytics,
        Module::AdminManagement,
        Module::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Users => "users",
            Module::Credits => "credits",
            Module::Projects => "projects",
            Module::Mocks => "mocks",
            Module::Assessments => "assessments",
            Module::Challenges => "challenges",
            Module::Communities => "communities",
            Module::Feedback => "feedback",
            Module::Analytics => "analytics",
            Module::AdminManagement => "admin_management",
            Module::System => "system",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        Module::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AdminError::Validation(format!("Invalid module: {}", s)))
    }
}

/// Grade of access within a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Read,
    Write,
    Delete,
    Full,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Read, Level::Write, Level::Delete, Level::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Read => "read",
            Level::Write => "write",
            Level::Delete => "delete",
            Level::Full => "full",
        }
    }
}

/// Module → granted levels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeMap<Module, BTreeSet<Level>>);

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style grant of several levels on one module
    pub fn with(mut self, module: Module, levels: &[Level]) -> Self {
        self.grant(module, levels);
        self
    }

    pub fn grant(&mut self, module: Module, levels: &[Level]) {
        self.0.entry(module).or_default().extend(levels.iter().copied());
    }

    pub fn levels(&self, module: Module) -> Option<&BTreeSet<Level>> {
        self.0.get(&module)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|levels| levels.is_empty())
    }

    /// See [`has_permission`]
    pub fn allows(&self, module: Module, level: Level) -> bool {
        has_permission(self, module, level)
    }
}

/// Whether `permissions` grants `level` on `module`
pub fn has_permission(permissions: &Permissions, module: Module, level: Level) -> bool {
    match permissions.levels(module) {
        Some(levels) => levels.contains(&level) || levels.contains(&Level::Full),
        None => false,
    }
}

/// Default grid a role starts with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleDefaults {
    Grid(Permissions),
    /// No default; every grant comes from the invitation
    AssignedPerInvitation,
}

const RWDF: &[Level] = &[Level::Read, Level::Write, Level::Delete, Level::Full];
const RWF: &[Level] = &[Level::Read, Level::Write, Level::Full];
const RWD: &[Level] = &[Level::Read, Level::Write, Level::Delete];
const RW: &[Level] = &[Level::Read, Level::Write];
const R: &[Level] = &[Level::Read];

pub(crate) fn super_admin_grid() -> Permissions {
    Permissions::new()
        .with(Module::Users, RWDF)
        .with(Module::Credits, RWDF)
        .with(Module::Projects, RWDF)
        .with(Module::Mocks, RWDF)
        .with(Module::Assessments, RWDF)
        .with(Module::Challenges, RWDF)
        .with(Module::Communities, RWDF)
        .with(Module::Feedback, RWDF)
        .with(Module::Analytics, RWF)
        .with(Module::AdminManagement, RWDF)
        .with(Module::System, RWF)
}

pub(crate) fn content_admin_grid() -> Permissions {
    Permissions::new()
        .with(Module::Users, R)
        .with(Module::Credits, R)
        .with(Module::Projects, RWD)
        .with(Module::Mocks, RWD)
        .with(Module::Assessments, RWD)
        .with(Module::Challenges, RWD)
        .with(Module::Communities, R)
        .with(Module::Feedback, RW)
        .with(Module::Analytics, R)
}

pub(crate) fn finance_admin_grid() -> Permissions {
    Permissions::new()
        .with(Module::Users, R)
        .with(Module::Credits, RWDF)
        .with(Module::Projects, R)
        .with(Module::Mocks, R)
        .with(Module::Assessments, R)
        .with(Module::Challenges, R)
        .with(Module::Communities, R)
        .with(Module::Feedback, R)
        .with(Module::Analytics, RW)
}

pub(crate) fn community_admin_grid() -> Permissions {
    Permissions::new()
        .with(Module::Users, RW)
        .with(Module::Credits, R)
        .with(Module::Projects, R)
        .with(Module::Mocks, R)
        .with(Module::Assessments, R)
        .with(Module::Challenges, R)
        .with(Module::Communities, RWDF)
        .with(Module::Feedback, RWD)
        .with(Module::Analytics, R)
}

pub(crate) fn viewer_grid() -> Permissions {
    Permissions::new()
        .with(Module::Users, R)
        .with(Module::Credits, R)
        .with(Module::Projects, R)
        .with(Module::Mocks, R)
        .with(Module::Assessments, R)
        .with(Module::Challenges, R)
        .with(Module::Communities, R)
        .with(Module::Feedback, R)
        .with(Module::Analytics, R)
}
