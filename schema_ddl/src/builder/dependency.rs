//! Topological ordering of dependent objects

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::schema::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    NotVisited,
    InProgress,
    Visited,
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    /// Keys of the nodes that depend on this one
    needed_by: Vec<String>,
}

/// Orders named nodes so that every node comes after the nodes it depends
/// on.
///
/// Cycles do not fail; nodes on a cycle are simply emitted in visiting
/// order.
#[derive(Debug)]
pub struct DependencyOrderCalculator<T> {
    nodes: IndexMap<String, Node<T>>,
}

impl<T> Default for DependencyOrderCalculator<T> {
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }
}

impl<T> DependencyOrderCalculator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node; registering a name again replaces its value
    pub fn add_node(&mut self, name: &str, value: T) {
        let key = name.to_lowercase();
        match self.nodes.get_mut(&key) {
            Some(node) => node.value = value,
            None => {
                self.nodes.insert(
                    key,
                    Node {
                        value,
                        needed_by: Vec::new(),
                    },
                );
            }
        }
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(&name.to_lowercase())
    }

    /// Record that `dependent` must come after `dependency`
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<(), SchemaError> {
        let dependent_key = dependent.to_lowercase();
        if !self.nodes.contains_key(&dependent_key) {
            return Err(SchemaError::UnknownDependencyNode(dependent.to_string()));
        }
        let node = self
            .nodes
            .get_mut(&dependency.to_lowercase())
            .ok_or_else(|| SchemaError::UnknownDependencyNode(dependency.to_string()))?;
        if !node.needed_by.contains(&dependent_key) {
            node.needed_by.push(dependent_key);
        }
        Ok(())
    }

    /// Values ordered dependencies first
    pub fn sort(self) -> Vec<T> {
        let mut states: HashMap<usize, VisitState> = (0..self.nodes.len())
            .map(|index| (index, VisitState::NotVisited))
            .collect();
        let mut finished = Vec::with_capacity(self.nodes.len());

        for index in 0..self.nodes.len() {
            self.visit(index, &mut states, &mut finished);
        }

        finished.reverse();
        let mut values: Vec<Option<T>> = self
            .nodes
            .into_iter()
            .map(|(_, node)| Some(node.value))
            .collect();
        finished
            .into_iter()
            .filter_map(|index| values[index].take())
            .collect()
    }

    fn visit(&self, index: usize, states: &mut HashMap<usize, VisitState>, finished: &mut Vec<usize>) {
        if states.get(&index) != Some(&VisitState::NotVisited) {
            return;
        }
        states.insert(index, VisitState::InProgress);

        if let Some((_, node)) = self.nodes.get_index(index) {
            for dependent in &node.needed_by {
                if let Some(dependent_index) = self.nodes.get_index_of(dependent) {
                    self.visit(dependent_index, states, finished);
                }
            }
        }

        states.insert(index, VisitState::Visited);
        finished.push(index);
    }
}

/// Order tables so that referenced tables come before the tables whose
/// foreign keys point at them
pub fn order_tables<'a>(tables: &[&'a Table]) -> Result<Vec<&'a Table>, SchemaError> {
    let mut calculator = DependencyOrderCalculator::new();
    for table in tables {
        calculator.add_node(&table.full_name(), *table);
    }

    for table in tables {
        let name = table.full_name();
        for foreign_key in table.foreign_keys() {
            let target = foreign_key.foreign_table().full_name();
            if calculator.has_node(&target) && !target.eq_ignore_ascii_case(&name) {
                calculator.add_dependency(&name, &target)?;
            }
        }
    }

    Ok(calculator.sort())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dependencies_come_first() {
        let mut calculator = DependencyOrderCalculator::new();
        calculator.add_node("OrderItems", "OrderItems");
        calculator.add_node("Orders", "Orders");
        calculator.add_node("Customers", "Customers");
        calculator.add_dependency("OrderItems", "Orders").unwrap();
        calculator.add_dependency("Orders", "Customers").unwrap();

        assert_eq!(calculator.sort(), vec!["Customers", "Orders", "OrderItems"]);
    }

    #[test]
    fn registration_order_is_kept_without_edges() {
        let mut calculator = DependencyOrderCalculator::new();
        for name in ["a", "b", "c"] {
            calculator.add_node(name, name);
        }
        assert_eq!(calculator.sort(), vec!["a", "b", "c"]);
    }

    #[test]
    fn cycles_are_tolerated() {
        let mut calculator = DependencyOrderCalculator::new();
        calculator.add_node("a", "a");
        calculator.add_node("b", "b");
        calculator.add_dependency("a", "b").unwrap();
        calculator.add_dependency("b", "a").unwrap();

        let mut sorted = calculator.sort();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b"]);
    }

    #[test]
    fn unknown_nodes_fail() {
        let mut calculator = DependencyOrderCalculator::new();
        calculator.add_node("a", 1);
        assert_eq!(
            calculator.add_dependency("a", "missing").unwrap_err(),
            SchemaError::UnknownDependencyNode("missing".to_string())
        );
        assert_eq!(
            calculator.add_dependency("ghost", "a").unwrap_err(),
            SchemaError::UnknownDependencyNode("ghost".to_string())
        );
    }

    #[test]
    fn names_ignore_case() {
        let mut calculator = DependencyOrderCalculator::new();
        calculator.add_node("Child", "child");
        calculator.add_node("Parent", "parent");
        calculator.add_dependency("CHILD", "parent").unwrap();
        assert!(calculator.has_node("child"));
        assert_eq!(calculator.sort(), vec!["parent", "child"]);
    }
}
