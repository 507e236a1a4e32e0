//! Depth-bounded activity tree.
//!
//! `ActivityTree` is a flat arena keyed by id with a child index. It
//! enforces the tree invariants on insert: roots sit at level 1 with no
//! parent, every other node sits exactly one level below an existing
//! parent, and nothing goes deeper than [`MAX_ACTIVITY_LEVEL`].
//!
//! `ActivityNode` is the resolved shape returned by lookups: one node, its
//! organizations, and optionally its materialized subtree.

use std::collections::BTreeMap;

use crate::error::{CatalogError, Result};
use crate::types::{dedup_organizations, Activity, ActivityId, Organization, MAX_ACTIVITY_LEVEL};

/// How much of the tree an activity lookup materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLoad {
    /// The node and its organizations only.
    NodeOnly,
    /// The node plus children and grandchildren, each with organizations.
    WithDescendants,
}

impl From<bool> for ActivityLoad {
    fn from(with_children: bool) -> Self {
        if with_children {
            Self::WithDescendants
        } else {
            Self::NodeOnly
        }
    }
}

// ── Arena ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ActivityTree {
    nodes: BTreeMap<ActivityId, Activity>,
    children: BTreeMap<ActivityId, Vec<ActivityId>>,
}

impl ActivityTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from activities in any order; parents are inserted
    /// before their children.
    pub fn from_activities(mut activities: Vec<Activity>) -> Result<Self> {
        activities.sort_by_key(|a| (a.level, a.id));
        let mut tree = Self::new();
        for activity in activities {
            tree.insert(activity)?;
        }
        Ok(tree)
    }

    pub fn insert(&mut self, activity: Activity) -> Result<()> {
        if self.nodes.contains_key(&activity.id) {
            return Err(CatalogError::InvalidInput(format!(
                "duplicate activity id {}",
                activity.id
            )));
        }
        if activity.level == 0 || activity.level > MAX_ACTIVITY_LEVEL {
            return Err(CatalogError::InvalidInput(format!(
                "activity {} has level {}, allowed 1..={MAX_ACTIVITY_LEVEL}",
                activity.id, activity.level
            )));
        }
        match activity.parent_id {
            None if activity.level != 1 => {
                return Err(CatalogError::InvalidInput(format!(
                    "root activity {} must be level 1, got {}",
                    activity.id, activity.level
                )));
            }
            None => {}
            Some(parent_id) => {
                let parent = self.nodes.get(&parent_id).ok_or_else(|| {
                    CatalogError::InvalidInput(format!(
                        "activity {} references missing parent {parent_id}",
                        activity.id
                    ))
                })?;
                if activity.level != parent.level + 1 {
                    return Err(CatalogError::InvalidInput(format!(
                        "activity {} has level {} under parent level {}",
                        activity.id, activity.level, parent.level
                    )));
                }
                self.children.entry(parent_id).or_default().push(activity.id);
            }
        }
        self.nodes.insert(activity.id, activity);
        Ok(())
    }

    pub fn get(&self, id: ActivityId) -> Option<&Activity> {
        self.nodes.get(&id)
    }

    /// Exact, case-sensitive match. Duplicate names resolve to the lowest id.
    pub fn find_by_name(&self, name: &str) -> Option<&Activity> {
        self.nodes.values().find(|a| a.name == name)
    }

    pub fn children_of(&self, id: ActivityId) -> &[ActivityId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All descendants of `id`, breadth first.
    pub fn descendants(&self, id: ActivityId) -> Vec<ActivityId> {
        let mut out = Vec::new();
        let mut frontier = vec![id];
        while !frontier.is_empty() {
            let next: Vec<ActivityId> = frontier
                .iter()
                .flat_map(|parent| self.children_of(*parent).iter().copied())
                .collect();
            out.extend_from_slice(&next);
            frontier = next;
        }
        out
    }

    /// Remove `id` and everything below it. Returns the removed ids.
    pub fn remove_subtree(&mut self, id: ActivityId) -> Vec<ActivityId> {
        let Some(activity) = self.nodes.remove(&id) else {
            return Vec::new();
        };
        if let Some(parent_id) = activity.parent_id {
            if let Some(siblings) = self.children.get_mut(&parent_id) {
                siblings.retain(|c| *c != id);
            }
        }
        let mut removed = vec![id];
        for child in self.children.remove(&id).unwrap_or_default() {
            removed.extend(self.remove_subtree(child));
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.nodes.values()
    }
}

// ── Resolved node ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    /// The lookup did not load children. Says nothing about whether any exist.
    NotLoaded,
    Loaded(Vec<ActivityNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityNode {
    pub activity: Activity,
    pub organizations: Vec<Organization>,
    pub children: Children,
}

impl ActivityNode {
    pub fn children(&self) -> Option<&[ActivityNode]> {
        match &self.children {
            Children::NotLoaded => None,
            Children::Loaded(nodes) => Some(nodes),
        }
    }

    /// Organizations of this node and every loaded descendant, each once,
    /// in pre-order.
    pub fn closure(&self) -> Vec<Organization> {
        let mut all = Vec::new();
        self.collect_organizations(&mut all);
        dedup_organizations(all)
    }

    fn collect_organizations(&self, out: &mut Vec<Organization>) {
        out.extend(self.organizations.iter().cloned());
        if let Children::Loaded(children) = &self.children {
            for child in children {
                child.collect_organizations(out);
            }
        }
    }

    /// Deepest activity level present in the materialized subtree.
    pub fn deepest_level(&self) -> u8 {
        self.children()
            .into_iter()
            .flatten()
            .map(ActivityNode::deepest_level)
            .fold(self.activity.level, u8::max)
    }
}
