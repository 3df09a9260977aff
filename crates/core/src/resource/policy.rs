//! Permission predicates for resources.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::actor::Actor;

/// The permission predicates every resource answers.
///
/// All predicates default to allowing the action; override the ones a
/// resource restricts.
pub trait ResourcePolicy: Send + Sync + Debug {
    fn can_view_list(&self, _actor: &Actor) -> bool {
        true
    }

    fn can_view(&self, _actor: &Actor) -> bool {
        true
    }

    fn can_create(&self, _actor: &Actor) -> bool {
        true
    }

    fn can_update(&self, _actor: &Actor) -> bool {
        true
    }

    fn can_delete(&self, _actor: &Actor) -> bool {
        true
    }

    fn can_import(&self, _actor: &Actor) -> bool {
        true
    }
}

/// Allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ResourcePolicy for AllowAll {}

/// A single ability: a fixed answer or a list of roles that hold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AbilityRule {
    Fixed(bool),
    Roles(Vec<String>),
}

impl Default for AbilityRule {
    fn default() -> Self {
        AbilityRule::Fixed(true)
    }
}

impl AbilityRule {
    pub fn allows(&self, actor: &Actor) -> bool {
        match self {
            AbilityRule::Fixed(allowed) => *allowed,
            AbilityRule::Roles(roles) => roles.iter().any(|r| actor.has_role(r)),
        }
    }
}

/// Table-driven policy, the shape resource manifests declare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Abilities {
    pub view_list: AbilityRule,
    pub view: AbilityRule,
    pub create: AbilityRule,
    pub update: AbilityRule,
    pub delete: AbilityRule,
    pub import: AbilityRule,
}

impl Abilities {
    /// A policy that denies every action.
    pub fn deny_all() -> Self {
        let no = AbilityRule::Fixed(false);
        Self {
            view_list: no.clone(),
            view: no.clone(),
            create: no.clone(),
            update: no.clone(),
            delete: no.clone(),
            import: no,
        }
    }

    /// A policy where only `roles` hold every ability.
    pub fn roles(roles: &[&str]) -> Self {
        let rule = AbilityRule::Roles(roles.iter().map(|r| r.to_string()).collect());
        Self {
            view_list: rule.clone(),
            view: rule.clone(),
            create: rule.clone(),
            update: rule.clone(),
            delete: rule.clone(),
            import: rule,
        }
    }
}

impl ResourcePolicy for Abilities {
    fn can_view_list(&self, actor: &Actor) -> bool {
        self.view_list.allows(actor)
    }

    fn can_view(&self, actor: &Actor) -> bool {
        self.view.allows(actor)
    }

    fn can_create(&self, actor: &Actor) -> bool {
        self.create.allows(actor)
    }

    fn can_update(&self, actor: &Actor) -> bool {
        self.update.allows(actor)
    }

    fn can_delete(&self, actor: &Actor) -> bool {
        self.delete.allows(actor)
    }

    fn can_import(&self, actor: &Actor) -> bool {
        self.import.allows(actor)
    }
}
