use crate::{
    aggregator::{aggregate_detailed, ModuleFootprint, ModuleKey},
    config::Config,
    dependency_graph::{GraphAnalysis, ProjectGraph},
    exclusions::Exclusions,
    file_discovery::FileDiscovery,
    project::{Project, ProjectLoader},
    resolver::ResolutionCache,
};
use anyhow::{ensure, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub struct Analyzer {
    config: Config,
    workspace_root: PathBuf,
    file_discovery: FileDiscovery,
    exclusions: Exclusions,
}

impl Analyzer {
    pub fn new(config: Config) -> Result<Self> {
        let exclusions = Exclusions::from_config(&config.exclusions)?;
        Self::with_exclusions(config, exclusions)
    }

    pub fn with_exclusions(config: Config, exclusions: Exclusions) -> Result<Self> {
        ensure!(
            config.workspace_directory.is_dir(),
            "workspace directory {} does not exist",
            config.workspace_directory.display()
        );
        let workspace_root = config
            .workspace_directory
            .canonicalize()
            .with_context(|| format!("cannot resolve {}", config.workspace_directory.display()))?;

        let mut config = config;
        config.workspace_directory = workspace_root.clone();
        let file_discovery = FileDiscovery::new(config.clone());

        Ok(Self {
            config,
            workspace_root,
            file_discovery,
            exclusions,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Discovers, loads and counts every project, minus excluded ones.
    pub fn load_projects(&self) -> Result<Vec<Project>> {
        let paths = self.file_discovery.discover_projects()?;
        tracing::info!(count = paths.len(), "loading project files");

        let loader = ProjectLoader::new()?;
        let projects: Vec<Project> = paths
            .par_iter()
            .filter_map(|path| match loader.load(path) {
                Ok(description) => {
                    let lines = self.file_discovery.count_lines(
                        description.location.parent().unwrap_or(&self.workspace_root),
                    );
                    Some(description.into_project(lines))
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping project");
                    None
                }
            })
            .collect();

        let (excluded, kept): (Vec<Project>, Vec<Project>) = projects
            .into_iter()
            .partition(|p| self.exclusions.excludes_project(p));
        for project in &excluded {
            tracing::debug!(project = %project.name, "excluded project");
        }

        Ok(kept)
    }

    pub fn analyze_workspace(&self) -> Result<WorkspaceAnalysis> {
        let projects = self.load_projects()?;
        self.analyze_projects(projects)
    }

    /// Runs the core over an already loaded project set.
    pub fn analyze_projects(&self, projects: Vec<Project>) -> Result<WorkspaceAnalysis> {
        let module_key = ModuleKey::first_segment(&self.workspace_root);
        if let Some(stray) = projects.iter().find(|p| !module_key.contains(p)) {
            anyhow::bail!(
                "project {} at {} lies outside workspace {}",
                stray.name,
                stray.location.display(),
                self.workspace_root.display()
            );
        }

        let cache = ResolutionCache::new();
        let footprints = aggregate_detailed(&projects, &cache, |p: &Project| module_key.key(p));
        let graph = ProjectGraph::build(&projects, &cache).analyze(self.config.report.top_dependencies);

        let (excluded_modules, mut modules): (Vec<ModuleFootprint>, Vec<ModuleFootprint>) = footprints
            .into_iter()
            .partition(|f| self.exclusions.excludes_module(&f.module));
        modules.sort_by(|a, b| {
            b.total_lines
                .cmp(&a.total_lines)
                .then_with(|| a.module.cmp(&b.module))
        });

        Ok(WorkspaceAnalysis {
            workspace: self.workspace_root.clone(),
            total_projects: projects.len(),
            total_lines: projects.iter().map(|p| p.lines_of_code).sum(),
            modules,
            excluded_modules: excluded_modules.into_iter().map(|f| f.module).collect(),
            unresolved_dependencies: cache.unresolved(),
            graph,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceAnalysis {
    pub workspace: PathBuf,
    pub total_projects: usize,
    pub total_lines: u64,
    /// Ordered by descending total, then module name.
    pub modules: Vec<ModuleFootprint>,
    pub excluded_modules: Vec<String>,
    pub unresolved_dependencies: Vec<String>,
    pub graph: GraphAnalysis,
}

impl WorkspaceAnalysis {
    pub fn print_summary(&self) {
        println!("📊 Workspace Footprint Summary");
        println!("==============================");
        println!("  Workspace: {}", self.workspace.display());
        println!("  Projects: {}", self.total_projects);
        println!("  Lines of code: {}", self.total_lines);
        println!("  Unresolved dependencies: {}", self.unresolved_dependencies.len());

        println!("\n📦 Modules:");
        for module in &self.modules {
            println!(
                "  {:<32} {:>10} LoC ({} own, {} projects pulled in)",
                module.module, module.total_lines, module.own_lines, module.dependency_projects
            );
        }

        if !self.excluded_modules.is_empty() {
            println!("\n🚫 Excluded modules: {}", self.excluded_modules.join(", "));
        }
    }
}
