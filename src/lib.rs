pub mod config;
pub mod project;
pub mod file_discovery;
pub mod exclusions;
pub mod resolver;
pub mod aggregator;
pub mod dependency_graph;
pub mod analyzer;
pub mod reporter;
pub mod logging;

pub use config::Config;
pub use project::{Project, ProjectId, ProjectLoader};
pub use file_discovery::FileDiscovery;
pub use exclusions::Exclusions;
pub use resolver::{ResolutionCache, Resolver};
pub use aggregator::{aggregate, aggregate_detailed, ModuleFootprint, ModuleKey};
pub use dependency_graph::ProjectGraph;
pub use analyzer::{Analyzer, WorkspaceAnalysis};
pub use reporter::Reporter;

pub type Result<T> = anyhow::Result<T>;
