use crate::project::{Project, ProjectId};
use crate::resolver::{ResolutionCache, Resolver};
use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::{graph::NodeIndex, Directed, Direction, Graph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Edges carry the dependency token that resolved them.
pub type DependencyGraph = Graph<ProjectNode, String, Directed>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectNode {
    pub name: String,
    pub lines_of_code: u64,
}

impl fmt::Display for ProjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} LoC)", self.name, self.lines_of_code)
    }
}

/// Resolved project-to-project edges of one snapshot. Node indices line up
/// with [`ProjectId`]s.
pub struct ProjectGraph {
    graph: DependencyGraph,
}

impl ProjectGraph {
    pub fn build(projects: &[Project], cache: &ResolutionCache) -> Self {
        let resolver = Resolver::new(projects, cache);
        let mut graph = DependencyGraph::with_capacity(projects.len(), projects.len());

        for project in projects {
            graph.add_node(ProjectNode {
                name: project.name.clone(),
                lines_of_code: project.lines_of_code,
            });
        }

        let mut seen = HashSet::new();
        for (index, project) in projects.iter().enumerate() {
            for token in &project.dependencies {
                let Some(ProjectId(target)) = resolver.resolve_id(token) else {
                    continue;
                };
                if target != index && seen.insert((index, target)) {
                    graph.add_edge(NodeIndex::new(index), NodeIndex::new(target), token.clone());
                }
            }
        }

        Self { graph }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn dependents(&self, id: ProjectId) -> usize {
        self.graph
            .neighbors_directed(NodeIndex::new(id.0), Direction::Incoming)
            .count()
    }

    pub fn analyze(&self, top: usize) -> GraphAnalysis {
        let total_projects = self.graph.node_count();
        let total_edges = self.graph.edge_count();

        let mut most_depended_upon: Vec<DependedUpon> = self
            .graph
            .node_indices()
            .map(|node| DependedUpon {
                project: self.graph[node].name.clone(),
                dependents: self.dependents(ProjectId(node.index())),
            })
            .filter(|entry| entry.dependents > 0)
            .collect();
        most_depended_upon.sort_by(|a, b| {
            b.dependents
                .cmp(&a.dependents)
                .then_with(|| a.project.cmp(&b.project))
        });
        most_depended_upon.truncate(top);

        let isolated_projects = self
            .graph
            .node_indices()
            .filter(|&node| self.graph.neighbors_undirected(node).next().is_none())
            .count();

        GraphAnalysis {
            total_projects,
            total_edges,
            avg_degree: if total_projects > 0 {
                total_edges as f64 / total_projects as f64
            } else {
                0.0
            },
            isolated_projects,
            most_depended_upon,
        }
    }

    /// Graphviz rendering of the project graph.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[DotConfig::EdgeNoLabel]))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphAnalysis {
    pub total_projects: usize,
    pub total_edges: usize,
    pub avg_degree: f64,
    pub isolated_projects: usize,
    pub most_depended_upon: Vec<DependedUpon>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependedUpon {
    pub project: String,
    pub dependents: usize,
}
