//! Component dependency resolution.
//!
//! Components reference each other by name through `build_requires`. Names
//! that match no component are host packages and are ignored here. Cycles are
//! tolerated: resolution marks components as visited before descending, so a
//! cyclic requirement simply finds its target already counted.

use super::component::Component;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// The components of one project, indexed by name.
#[derive(Clone, Debug, Default)]
pub struct ComponentGraph {
    components: Vec<Component>,
    index: HashMap<String, usize>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component. A later component with the same name replaces the
    /// earlier one in place.
    pub fn add(&mut self, component: Component) {
        match self.index.get(&component.name) {
            Some(&slot) => {
                log::warn!("Component {} declared twice, keeping the later one", component.name);
                self.components[slot] = component;
            }
            None => {
                self.index.insert(component.name.clone(), self.components.len());
                self.components.push(component);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|&i| &self.components[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.index.get(name).map(|&i| &mut self.components[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Components in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// `root` followed by everything it transitively requires, depth first,
    /// each component once.
    ///
    /// Unknown roots resolve to nothing.
    pub fn resolve(&self, root: &str) -> Vec<&Component> {
        let Some(&start) = self.index.get(root) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut resolved = Vec::new();
        let mut stack = vec![start];

        while let Some(slot) = stack.pop() {
            if !visited.insert(slot) {
                continue;
            }
            let component = &self.components[slot];
            resolved.push(component);

            // Reversed so the first requirement is explored first.
            for name in component.build_requires.iter().rev() {
                if let Some(&child) = self.index.get(name)
                    && !visited.contains(&child)
                {
                    stack.push(child);
                }
            }
        }

        resolved
    }

    /// Requirement names that match no component, first occurrence order.
    pub fn external_requirements(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.components
            .iter()
            .flat_map(|c| c.build_requires.iter())
            .filter(|name| !self.index.contains_key(name.as_str()))
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    /// Groups of components that require each other, including self-requirements.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = self
            .components
            .iter()
            .map(|c| graph.add_node(c.name.as_str()))
            .collect();

        for (slot, component) in self.components.iter().enumerate() {
            for name in &component.build_requires {
                if let Some(&child) = self.index.get(name) {
                    graph.add_edge(nodes[slot], nodes[child], ());
                }
            }
        }

        tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| scc.into_iter().map(|n| graph[n].to_string()).collect())
            .collect()
    }

    /// Debug-logs every cycle. Cycles are legal, but usually unintended.
    pub fn log_cycles(&self) {
        for cycle in self.cycles() {
            log::debug!("Components require each other: {}", cycle.join(" -> "));
        }
    }
}

impl FromIterator<Component> for ComponentGraph {
    fn from_iter<T: IntoIterator<Item = Component>>(iter: T) -> Self {
        let mut graph = Self::new();
        for component in iter {
            graph.add(component);
        }
        graph
    }
}
