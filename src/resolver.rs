//! Dependency-name resolution and transitive closure over one project snapshot.
//!
//! A dependency token names either a project's `name` or its `assembly`,
//! compared case-insensitively. When both kinds of match exist on different
//! projects, a name match wins; within one kind the first project in input
//! order wins.

use crate::project::{Project, ProjectId};
use dashmap::DashMap;
use std::collections::HashSet;

/// Memoized token lookups for one workspace run.
///
/// Keys are lower-cased tokens; values are the resolved project (or `None`
/// for a token that names nothing in the workspace). A cache must only be
/// used with the project slice it was first used with.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, Option<ProjectId>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct tokens that resolved to nothing, sorted.
    pub fn unresolved(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_none())
            .map(|entry| entry.key().clone())
            .collect();
        tokens.sort();
        tokens
    }

    fn get(&self, key: &str) -> Option<Option<ProjectId>> {
        self.entries.get(key).map(|entry| *entry.value())
    }

    /// Concurrent writers may race on the same key; both computed the same
    /// answer, so the first stored value is kept.
    fn insert(&self, key: String, value: Option<ProjectId>) -> Option<ProjectId> {
        *self.entries.entry(key).or_insert(value)
    }
}

pub struct Resolver<'a> {
    projects: &'a [Project],
    cache: &'a ResolutionCache,
}

impl<'a> Resolver<'a> {
    pub fn new(projects: &'a [Project], cache: &'a ResolutionCache) -> Self {
        Self { projects, cache }
    }

    pub fn project(&self, id: ProjectId) -> &'a Project {
        &self.projects[id.0]
    }

    /// Identity of `project` within this snapshot: by address, or by value
    /// for a copy taken from the snapshot.
    pub fn id_of(&self, project: &Project) -> Option<ProjectId> {
        self.projects
            .iter()
            .position(|p| std::ptr::eq(p, project))
            .or_else(|| self.projects.iter().position(|p| p == project))
            .map(ProjectId)
    }

    pub fn resolve(&self, token: &str) -> Option<&'a Project> {
        self.resolve_id(token).map(|id| self.project(id))
    }

    pub fn resolve_id(&self, token: &str) -> Option<ProjectId> {
        let key = token.to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let resolved = self.scan(&key);
        if resolved.is_none() {
            tracing::warn!(dependency = token, "unable to resolve dependency");
        }
        self.cache.insert(key, resolved)
    }

    fn scan(&self, key: &str) -> Option<ProjectId> {
        let by_name = self
            .projects
            .iter()
            .position(|p| p.name.to_lowercase() == key);

        by_name
            .or_else(|| {
                self.projects
                    .iter()
                    .position(|p| p.assembly.to_lowercase() == key)
            })
            .map(ProjectId)
    }

    /// Every project reachable from `project` through its dependencies, at any
    /// depth. `project` itself is never part of the result.
    pub fn transitive_closure(&self, project: &Project) -> Vec<&'a Project> {
        let mut visited = HashSet::new();
        if let Some(id) = self.id_of(project) {
            visited.insert(id);
        }

        let mut closure = Vec::new();
        self.walk(&project.dependencies, &mut visited, &mut closure);
        closure.into_iter().map(|id| self.project(id)).collect()
    }

    pub fn transitive_closure_ids(&self, id: ProjectId) -> Vec<ProjectId> {
        let mut visited = HashSet::from([id]);
        let mut closure = Vec::new();
        self.walk(&self.project(id).dependencies, &mut visited, &mut closure);
        closure
    }

    fn walk(&self, roots: &[String], visited: &mut HashSet<ProjectId>, closure: &mut Vec<ProjectId>) {
        let mut pending: Vec<&str> = roots.iter().rev().map(String::as_str).collect();

        while let Some(token) = pending.pop() {
            let Some(id) = self.resolve_id(token) else {
                continue;
            };
            if !visited.insert(id) {
                continue;
            }

            closure.push(id);
            pending.extend(self.project(id).dependencies.iter().rev().map(String::as_str));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, deps: &[&str], loc: u64) -> Project {
        Project::new(
            name,
            None,
            format!("/ws/{0}/{0}.csproj", name),
            deps.iter().map(|d| d.to_string()).collect(),
            loc,
        )
    }

    fn names(projects: &[&Project]) -> Vec<String> {
        let mut names: Vec<String> = projects.iter().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_no_dependencies_gives_empty_closure() {
        let projects = vec![project("A", &[], 1), project("B", &[], 1)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        assert!(resolver.transitive_closure(&projects[0]).is_empty());
    }

    #[test]
    fn test_closure_includes_direct_and_indirect() {
        let projects = vec![
            project("App", &["Core"], 1),
            project("Core", &["Util", "Log"], 1),
            project("Util", &["Log"], 1),
            project("Log", &[], 1),
        ];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        let closure = resolver.transitive_closure(&projects[0]);
        assert_eq!(names(&closure), vec!["Core", "Log", "Util"]);
    }

    #[test]
    fn test_cycle_terminates_and_excludes_start() {
        let projects = vec![project("X", &["Y"], 1), project("Y", &["X"], 1)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        assert_eq!(names(&resolver.transitive_closure(&projects[0])), vec!["Y"]);
        assert_eq!(names(&resolver.transitive_closure(&projects[1])), vec!["X"]);
    }

    #[test]
    fn test_cycle_excludes_cloned_start() {
        let projects = vec![project("X", &["Y"], 1), project("Y", &["X"], 1)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        let start = projects[0].clone();
        assert_eq!(resolver.id_of(&start), Some(ProjectId(0)));
        assert_eq!(names(&resolver.transitive_closure(&start)), vec!["Y"]);
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let projects = vec![project("Solo", &["solo", "Other"], 1), project("Other", &["SOLO"], 1)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        assert_eq!(names(&resolver.transitive_closure(&projects[0])), vec!["Other"]);
    }

    #[test]
    fn test_resolution_is_case_insensitive() {
        let projects = vec![project("foo.bar", &[], 1)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        let found = resolver.resolve("Foo.Bar").unwrap();
        assert_eq!(found.name, "foo.bar");
    }

    #[test]
    fn test_resolves_by_assembly() {
        let mut lib = project("Lib", &[], 1);
        lib.assembly = "Contoso.Lib".to_string();
        let projects = vec![project("App", &["contoso.lib"], 1), lib];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        assert_eq!(names(&resolver.transitive_closure(&projects[0])), vec!["Lib"]);
    }

    #[test]
    fn test_name_match_beats_assembly_match() {
        // "Shared" is the assembly of the first project and the name of the second.
        let mut impostor = project("Impostor", &[], 1);
        impostor.assembly = "Shared".to_string();
        let projects = vec![impostor, project("Shared", &[], 1)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        assert_eq!(resolver.resolve_id("shared"), Some(ProjectId(1)));
    }

    #[test]
    fn test_first_project_wins_within_same_precedence() {
        let projects = vec![project("Dup", &[], 1), project("dup", &[], 2)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        assert_eq!(resolver.resolve_id("DUP"), Some(ProjectId(0)));
    }

    #[test]
    fn test_unresolved_token_is_dropped_and_cached() {
        let projects = vec![project("App", &["System.Xml", "Lib"], 1), project("Lib", &[], 1)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        assert_eq!(names(&resolver.transitive_closure(&projects[0])), vec!["Lib"]);
        assert_eq!(cache.unresolved(), vec!["system.xml"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cached_lookup_is_not_rescanned() {
        let projects = vec![project("Lib", &[], 1)];
        let cache = ResolutionCache::new();
        cache.insert("lib".to_string(), None);
        let resolver = Resolver::new(&projects, &cache);

        // The stored miss wins over what a scan would find.
        assert!(resolver.resolve("Lib").is_none());
    }

    #[test]
    fn test_concurrent_lookups_share_one_entry() {
        let projects = vec![project("Core", &[], 1), project("Other", &[], 1)];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        let answers: Vec<Option<ProjectId>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let resolver = &resolver;
                    let token = if i % 2 == 0 { "core" } else { "CORE" };
                    s.spawn(move || resolver.resolve_id(token))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(answers.iter().all(|a| *a == Some(ProjectId(0))));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_closure_ids_matches_closure() {
        let projects = vec![
            project("A", &["B"], 1),
            project("B", &["C", "A"], 1),
            project("C", &[], 1),
        ];
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        let mut ids = resolver.transitive_closure_ids(ProjectId(0));
        ids.sort();
        assert_eq!(ids, vec![ProjectId(1), ProjectId(2)]);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let projects: Vec<Project> = (0..2_000)
            .map(|i| {
                let deps = if i + 1 < 2_000 { vec![format!("P{}", i + 1)] } else { Vec::new() };
                Project::new(format!("P{}", i), None, format!("/ws/m/P{}.csproj", i), deps, 1)
            })
            .collect();
        let cache = ResolutionCache::new();
        let resolver = Resolver::new(&projects, &cache);

        assert_eq!(resolver.transitive_closure(&projects[0]).len(), 1_999);
    }
}
