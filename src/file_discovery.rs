use crate::config::Config;
use ignore::WalkBuilder;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct FileDiscovery {
    config: Config,
    ignore_matchers: Vec<IgnoreMatcher>,
}

enum IgnoreMatcher {
    Extension(String),
    Wildcard(Regex),
    Component(String),
}

impl FileDiscovery {
    pub fn new(config: Config) -> Self {
        let ignore_matchers = config
            .ignore_patterns
            .iter()
            .filter_map(|pattern| compile_ignore_pattern(pattern))
            .collect();

        Self {
            config,
            ignore_matchers,
        }
    }

    /// Finds every project description file under the workspace root.
    pub fn discover_projects(&self) -> crate::Result<Vec<PathBuf>> {
        let mut projects = Vec::new();

        let walker = WalkBuilder::new(&self.config.workspace_directory)
            .standard_filters(true)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();

            let relative = path.strip_prefix(&self.config.workspace_directory).unwrap_or(path);
            if !path.is_file() || self.should_ignore(relative) {
                continue;
            }

            if has_extension(path, &self.config.project_extensions) {
                projects.push(path.to_path_buf());
            }
        }

        projects.sort();
        tracing::debug!(count = projects.len(), "discovered project files");
        Ok(projects)
    }

    /// Counts non-blank lines across all source files beneath `directory`.
    pub fn count_lines(&self, directory: &Path) -> u64 {
        let walker = WalkDir::new(directory)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !self.should_ignore_name(&entry.file_name().to_string_lossy())
            });

        let mut total = 0;
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_file()
                && has_extension(entry.path(), &self.config.source_extensions)
            {
                total += count_file_lines(entry.path());
            }
        }

        total
    }

    /// `path` is relative to the workspace root; any ignored component
    /// excludes it.
    fn should_ignore(&self, path: &Path) -> bool {
        path.components()
            .any(|c| self.should_ignore_name(&c.as_os_str().to_string_lossy()))
    }

    fn should_ignore_name(&self, name: &str) -> bool {
        self.ignore_matchers.iter().any(|matcher| match matcher {
            IgnoreMatcher::Extension(ext) => name.ends_with(ext.as_str()),
            IgnoreMatcher::Wildcard(re) => re.is_match(name),
            IgnoreMatcher::Component(component) => name == component.as_str(),
        })
    }
}

fn compile_ignore_pattern(pattern: &str) -> Option<IgnoreMatcher> {
    if let Some(ext) = pattern.strip_prefix("*.") {
        return Some(IgnoreMatcher::Extension(format!(".{}", ext)));
    }

    if pattern.contains('*') {
        return match crate::exclusions::glob_regex(pattern) {
            Ok(re) => Some(IgnoreMatcher::Wildcard(re)),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "ignoring invalid ignore pattern");
                None
            }
        };
    }

    Some(IgnoreMatcher::Component(pattern.to_string()))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn count_file_lines(path: &Path) -> u64 {
    match fs::read_to_string(path) {
        Ok(content) => content.lines().filter(|l| !l.trim().is_empty()).count() as u64,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read source file");
            0
        }
    }
}
