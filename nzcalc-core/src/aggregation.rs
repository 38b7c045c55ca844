//! Weighted hierarchies of series, used to roll category emissions up into totals.

use crate::errors::{NZCalcError, NZCalcResult};
use crate::timeseries::{cumulative_sum, FloatValue, TimeseriesTable, Year};
use ndarray::Array1;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateNode {
    pub name: String,
    /// Values for a leaf series; groups have none and are computed from their children
    pub values: Option<Array1<FloatValue>>,
}

/// A hierarchy of named series over a shared set of years.
///
/// Edges point from a group to one of its members and carry the weight applied to
/// that member when the group is summed, e.g. categories under a haul type, or haul
/// types under an overall total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TreeFields")]
pub struct AggregationTree {
    years: Vec<Year>,
    graph: DiGraph<AggregateNode, FloatValue>,
}

#[derive(Deserialize)]
struct TreeFields {
    years: Vec<Year>,
    graph: DiGraph<AggregateNode, FloatValue>,
}

impl TryFrom<TreeFields> for AggregationTree {
    type Error = NZCalcError;

    fn try_from(fields: TreeFields) -> Result<Self, Self::Error> {
        let invalid = |reason: String| -> Result<Self, NZCalcError> {
            Err(NZCalcError::InvalidAggregation(reason))
        };
        let graph = &fields.graph;
        let mut names = HashSet::new();
        for idx in graph.node_indices() {
            let node = &graph[idx];
            if !names.insert(node.name.as_str()) {
                return invalid(format!("node '{}' appears more than once", node.name));
            }
            if let Some(values) = &node.values {
                if values.len() != fields.years.len() {
                    return invalid(format!(
                        "series '{}' has {} values for {} years",
                        node.name,
                        values.len(),
                        fields.years.len()
                    ));
                }
                if graph.edges_directed(idx, Direction::Outgoing).next().is_some() {
                    return invalid(format!(
                        "'{}' is a series and cannot have members",
                        node.name
                    ));
                }
            }
        }
        if is_cyclic_directed(graph) {
            return invalid("the hierarchy contains a cycle".to_string());
        }
        Ok(Self {
            years: fields.years,
            graph: fields.graph,
        })
    }
}

impl AggregationTree {
    pub fn new(years: Vec<Year>) -> Self {
        Self {
            years,
            graph: DiGraph::new(),
        }
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    fn index(&self, name: &str) -> NZCalcResult<NodeIndex> {
        self.graph
            .node_indices()
            .find(|i| self.graph[*i].name == name)
            .ok_or_else(|| NZCalcError::InvalidAggregation(format!("unknown node '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index(name).is_ok()
    }

    fn add_node(&mut self, node: AggregateNode) -> NZCalcResult<()> {
        if self.contains(&node.name) {
            return Err(NZCalcError::InvalidAggregation(format!(
                "node '{}' already exists",
                node.name
            )));
        }
        self.graph.add_node(node);
        Ok(())
    }

    /// Add a leaf series
    pub fn add_series(&mut self, name: &str, values: Array1<FloatValue>) -> NZCalcResult<()> {
        if values.len() != self.years.len() {
            return Err(NZCalcError::InvalidAggregation(format!(
                "series '{}' has {} values for {} years",
                name,
                values.len(),
                self.years.len()
            )));
        }
        self.add_node(AggregateNode {
            name: name.to_string(),
            values: Some(values),
        })
    }

    /// Add an empty group whose value is the weighted sum of its members
    pub fn add_group(&mut self, name: &str) -> NZCalcResult<()> {
        self.add_node(AggregateNode {
            name: name.to_string(),
            values: None,
        })
    }

    /// Add every column of a table as a leaf under `group`, creating the group if needed.
    ///
    /// Leaves are named `group|category`. The tree is left unchanged on error.
    pub fn add_table(
        &mut self,
        group: &str,
        table: &TimeseriesTable,
        weight: FloatValue,
    ) -> NZCalcResult<()> {
        if table.years() != self.years.as_slice() {
            return Err(NZCalcError::InvalidAggregation(format!(
                "table for '{group}' does not cover the aggregation years"
            )));
        }
        let leaves: Vec<String> = table
            .categories()
            .map(|category| format!("{group}|{category}"))
            .collect();
        if let Some(leaf) = leaves.iter().find(|leaf| self.contains(leaf)) {
            return Err(NZCalcError::InvalidAggregation(format!(
                "node '{leaf}' already exists"
            )));
        }
        let group_idx = match self.index(group) {
            Ok(idx) if self.graph[idx].values.is_some() => {
                return Err(NZCalcError::InvalidAggregation(format!(
                    "'{group}' is a series and cannot have members"
                )));
            }
            Ok(idx) => idx,
            Err(_) => self.graph.add_node(AggregateNode {
                name: group.to_string(),
                values: None,
            }),
        };
        // New leaves have no members, so linking them cannot close a cycle
        for (leaf, (_, values)) in leaves.into_iter().zip(table.iter()) {
            let leaf_idx = self.graph.add_node(AggregateNode {
                name: leaf,
                values: Some(values.clone()),
            });
            self.graph.add_edge(group_idx, leaf_idx, weight);
        }
        Ok(())
    }

    /// Make `child` a member of `parent`
    pub fn link(&mut self, parent: &str, child: &str, weight: FloatValue) -> NZCalcResult<()> {
        let parent_idx = self.index(parent)?;
        let child_idx = self.index(child)?;
        if self.graph[parent_idx].values.is_some() {
            return Err(NZCalcError::InvalidAggregation(format!(
                "'{parent}' is a series and cannot have members"
            )));
        }
        let edge = self.graph.add_edge(parent_idx, child_idx, weight);
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(NZCalcError::InvalidAggregation(format!(
                "linking '{child}' under '{parent}' would create a cycle"
            )));
        }
        Ok(())
    }

    /// Names of the direct members of a group
    pub fn members(&self, name: &str) -> NZCalcResult<Vec<&str>> {
        let idx = self.index(name)?;
        let mut members: Vec<(NodeIndex, &str)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), self.graph[e.target()].name.as_str()))
            .collect();
        // Members are listed in the order they were added to the tree
        members.sort_by_key(|(i, _)| *i);
        Ok(members.into_iter().map(|(_, name)| name).collect())
    }

    /// Values of a node, summing the weighted members of groups
    pub fn value(&self, name: &str) -> NZCalcResult<Array1<FloatValue>> {
        self.value_of(self.index(name)?)
    }

    fn value_of(&self, idx: NodeIndex) -> NZCalcResult<Array1<FloatValue>> {
        if let Some(values) = &self.graph[idx].values {
            return Ok(values.clone());
        }
        let mut total: Array1<FloatValue> = Array1::zeros(self.years.len());
        for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
            total = total + self.value_of(edge.target())? * *edge.weight();
        }
        Ok(total)
    }

    pub fn cumulative(&self, name: &str) -> NZCalcResult<Array1<FloatValue>> {
        Ok(cumulative_sum(&self.value(name)?))
    }

    /// Table of the direct members of a group, one column per member
    pub fn members_table(&self, name: &str) -> NZCalcResult<TimeseriesTable> {
        let mut table = TimeseriesTable::new(self.years.clone())?;
        for member in self.members(name)? {
            table.set_column(member, self.value(member)?)?;
        }
        Ok(table)
    }
}
