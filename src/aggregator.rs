use crate::project::{Project, ProjectId};
use crate::resolver::{ResolutionCache, Resolver};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// Footprint of one module: its own projects plus everything they pull in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFootprint {
    pub module: String,
    pub projects: Vec<String>,
    pub own_lines: u64,
    pub dependency_projects: usize,
    pub total_lines: u64,
}

/// Sums de-duplicated lines of code per module.
pub fn aggregate<F>(projects: &[Project], cache: &ResolutionCache, module_key: F) -> BTreeMap<String, u64>
where
    F: Fn(&Project) -> String + Sync,
{
    aggregate_detailed(projects, cache, module_key)
        .into_iter()
        .map(|footprint| (footprint.module, footprint.total_lines))
        .collect()
}

/// Same computation as [`aggregate`], keeping the per-module breakdown.
/// Results are ordered by module key.
pub fn aggregate_detailed<F>(
    projects: &[Project],
    cache: &ResolutionCache,
    module_key: F,
) -> Vec<ModuleFootprint>
where
    F: Fn(&Project) -> String + Sync,
{
    let resolver = Resolver::new(projects, cache);

    let mut modules: BTreeMap<String, Vec<ProjectId>> = BTreeMap::new();
    for (index, project) in projects.iter().enumerate() {
        modules
            .entry(module_key(project))
            .or_default()
            .push(ProjectId(index));
    }

    modules
        .into_par_iter()
        .map(|(module, members)| footprint(&resolver, module, &members))
        .collect()
}

fn footprint(resolver: &Resolver<'_>, module: String, members: &[ProjectId]) -> ModuleFootprint {
    let mut counted: HashSet<ProjectId> = members.iter().copied().collect();
    for &id in members {
        counted.extend(resolver.transitive_closure_ids(id));
    }

    let own_lines: u64 = members
        .iter()
        .map(|&id| resolver.project(id).lines_of_code)
        .sum();
    let total_lines: u64 = counted
        .iter()
        .map(|&id| resolver.project(id).lines_of_code)
        .sum();

    let mut projects: Vec<String> = members
        .iter()
        .map(|&id| resolver.project(id).name.clone())
        .collect();
    projects.sort();

    ModuleFootprint {
        module,
        dependency_projects: counted.len() - members.len(),
        projects,
        own_lines,
        total_lines,
    }
}

/// Derives a project's module from its location relative to the workspace root.
#[derive(Debug, Clone)]
pub struct ModuleKey {
    root: PathBuf,
}

impl ModuleKey {
    pub fn first_segment(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn contains(&self, project: &Project) -> bool {
        self.relative(&project.location).is_some()
    }

    /// First path segment of the project file relative to the root. A project
    /// outside the root (rejected by the analyzer) keys on its own name.
    pub fn key(&self, project: &Project) -> String {
        self.relative(&project.location)
            .and_then(|rel| {
                rel.components().find_map(|c| match c {
                    Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                    _ => None,
                })
            })
            .unwrap_or_else(|| project.name.clone())
    }

    fn relative<'p>(&self, location: &'p Path) -> Option<&'p Path> {
        location.strip_prefix(&self.root).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(module: &str, name: &str, deps: &[&str], loc: u64) -> Project {
        Project::new(
            name,
            None,
            format!("/ws/{}/{}/{}.csproj", module, name, name),
            deps.iter().map(|d| d.to_string()).collect(),
            loc,
        )
    }

    fn by_module() -> impl Fn(&Project) -> String + Sync {
        let key = ModuleKey::first_segment("/ws");
        move |p: &Project| key.key(p)
    }

    #[test]
    fn test_two_module_scenario() {
        let projects = vec![
            project("A", "A1", &[], 10),
            project("A", "A2", &["A1"], 5),
            project("B", "B1", &["A1"], 20),
        ];
        let cache = ResolutionCache::new();

        let totals = aggregate(&projects, &cache, by_module());

        assert_eq!(totals.len(), 2);
        assert_eq!(totals["A"], 15);
        assert_eq!(totals["B"], 30);
    }

    #[test]
    fn test_shared_dependency_counted_once_per_module() {
        let projects = vec![
            project("App", "Web", &["Common"], 100),
            project("App", "Worker", &["common", "Data"], 50),
            project("Lib", "Data", &["Common"], 30),
            project("Lib", "Common", &[], 7),
        ];
        let cache = ResolutionCache::new();

        let footprints = aggregate_detailed(&projects, &cache, by_module());
        let app = footprints.iter().find(|f| f.module == "App").unwrap();

        assert_eq!(app.own_lines, 150);
        assert_eq!(app.dependency_projects, 2);
        assert_eq!(app.total_lines, 187);
        assert_eq!(app.projects, vec!["Web", "Worker"]);

        let lib = footprints.iter().find(|f| f.module == "Lib").unwrap();
        assert_eq!(lib.total_lines, 37);
        assert_eq!(lib.dependency_projects, 0);
    }

    #[test]
    fn test_cyclic_modules_terminate() {
        let projects = vec![project("M", "X", &["Y"], 3), project("N", "Y", &["X"], 4)];
        let cache = ResolutionCache::new();

        let totals = aggregate(&projects, &cache, by_module());

        assert_eq!(totals["M"], 7);
        assert_eq!(totals["N"], 7);
    }

    #[test]
    fn test_unresolved_dependencies_are_skipped() {
        let projects = vec![project("A", "A1", &["System.Data", "Missing"], 12)];
        let cache = ResolutionCache::new();

        let totals = aggregate(&projects, &cache, by_module());

        assert_eq!(totals["A"], 12);
        assert_eq!(cache.unresolved(), vec!["missing", "system.data"]);
    }

    #[test]
    fn test_duplicate_names_are_distinct_projects() {
        // Same derived name in two modules: identity, not name, drives dedup.
        let projects = vec![project("A", "Shared", &[], 10), project("B", "Shared", &[], 20)];
        let cache = ResolutionCache::new();

        let totals = aggregate(&projects, &cache, |_: &Project| "all".to_string());

        assert_eq!(totals["all"], 30);
    }

    #[test]
    fn test_one_entry_per_module_key() {
        let projects = vec![
            project("A", "A1", &[], 1),
            project("A", "A2", &[], 1),
            project("B", "B1", &[], 1),
            project("C", "C1", &[], 1),
        ];
        let cache = ResolutionCache::new();

        let totals = aggregate(&projects, &cache, by_module());

        assert_eq!(totals.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_workspace() {
        let cache = ResolutionCache::new();
        assert!(aggregate(&[], &cache, by_module()).is_empty());
    }

    #[test]
    fn test_module_key_first_segment() {
        let key = ModuleKey::first_segment("/ws");
        let nested = project("Orchestrator", "Core", &[], 1);
        let root_level = Project::new("Root", None, "/ws/Root.csproj", Vec::new(), 1);
        let outside = Project::new("Stray", None, "/elsewhere/Stray.csproj", Vec::new(), 1);

        assert_eq!(key.key(&nested), "Orchestrator");
        assert_eq!(key.key(&root_level), "Root.csproj");
        assert!(key.contains(&nested));
        assert!(!key.contains(&outside));
        assert_eq!(key.key(&outside), "Stray");
    }
}
