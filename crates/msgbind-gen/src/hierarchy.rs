//! Base-type graph of the generated types.
//!
//! Nodes are created lazily the first time a type (or one of its
//! descendants) is registered and are memoized by full name. The graph is
//! only used to propagate the appearance capability down the hierarchy and
//! to reject base-type cycles.

use std::collections::{HashMap, HashSet};

use msgbind_model::TypeUniverse;

use crate::error::{BindingError, Result};

/// One type in the hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub parent: Option<String>,
    pub children: Vec<String>,
    /// The type (or an ancestor) conforms to `UIAppearance`.
    pub appearance: bool,
}

#[derive(Debug, Default)]
pub struct Hierarchy {
    nodes: HashMap<String, Node>,
}

fn lists_appearance(universe: &TypeUniverse, full: &str) -> bool {
    universe
        .protocol_names(full)
        .iter()
        .any(|p| p == "UIAppearance" || p == "IUIAppearance")
}

fn is_category(universe: &TypeUniverse, full: &str) -> bool {
    universe.api_type_by_name(full).is_some_and(|t| t.category)
}

impl Hierarchy {
    /// Register `full` and every ancestor not seen yet.
    pub fn register(&mut self, universe: &TypeUniverse, full: &str) -> Result<()> {
        let mut chain: Vec<(String, Option<String>)> = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(full.to_string());
        while let Some(name) = current {
            if !visited.insert(name.clone()) {
                return Err(BindingError::new(
                    1030,
                    format!("{full} cannot have [BaseType(typeof({name}))] as it creates a circular dependency"),
                )
                .with_culprit(full));
            }
            if self.nodes.contains_key(&name) {
                break;
            }
            let parent = universe.base_of(&name)?;
            if parent.as_deref() == Some(name.as_str()) {
                return Err(BindingError::new(
                    1030,
                    format!("{name} cannot have [BaseType(typeof({name}))] as it creates a circular dependency"),
                )
                .with_culprit(name));
            }
            chain.push((name, parent.clone()));
            current = parent;
        }

        // Ancestors first so appearance flows down.
        for (name, parent) in chain.into_iter().rev() {
            let inherited = parent
                .as_deref()
                .and_then(|p| self.nodes.get(p))
                .is_some_and(|n| n.appearance);
            let appearance =
                (inherited || lists_appearance(universe, &name)) && !is_category(universe, &name);
            if let Some(p) = &parent {
                self.nodes.entry(p.clone()).or_default().children.push(name.clone());
            }
            let node = self.nodes.entry(name).or_default();
            node.parent = parent;
            node.appearance = appearance;
        }
        Ok(())
    }

    pub fn get(&self, full: &str) -> Option<&Node> {
        self.nodes.get(full)
    }

    pub fn parent(&self, full: &str) -> Option<&str> {
        self.nodes.get(full)?.parent.as_deref()
    }

    pub fn children(&self, full: &str) -> &[String] {
        self.nodes.get(full).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    pub fn has_appearance(&self, full: &str) -> bool {
        self.nodes.get(full).is_some_and(|n| n.appearance)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
