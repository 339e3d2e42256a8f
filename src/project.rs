use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One buildable unit discovered in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub assembly: String,
    pub location: PathBuf,
    pub dependencies: Vec<String>,
    pub lines_of_code: u64,
}

/// Identity of a project inside one snapshot: its index in the project slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub usize);

impl Project {
    /// Builds a project record. `assembly` falls back to `name` and the
    /// dependency tokens are deduplicated case-insensitively, keeping the
    /// first declaration.
    pub fn new(
        name: impl Into<String>,
        assembly: Option<String>,
        location: impl Into<PathBuf>,
        dependencies: Vec<String>,
        lines_of_code: u64,
    ) -> Self {
        let name = name.into();
        let assembly = assembly
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| name.clone());

        Self {
            name,
            assembly,
            location: location.into(),
            dependencies: dedup_case_insensitive(dependencies),
            lines_of_code,
        }
    }

    /// Directory holding the project description file; its subtree is what
    /// gets counted.
    pub fn source_directory(&self) -> &Path {
        self.location.parent().unwrap_or_else(|| Path::new("."))
    }
}

fn dedup_case_insensitive(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// What the loader extracts from a project description file before lines
/// are counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescription {
    pub name: String,
    pub assembly: Option<String>,
    pub location: PathBuf,
    pub dependencies: Vec<String>,
}

impl ProjectDescription {
    pub fn into_project(self, lines_of_code: u64) -> Project {
        Project::new(
            self.name,
            self.assembly,
            self.location,
            self.dependencies,
            lines_of_code,
        )
    }
}

/// Regex-based reader for MSBuild-style project files.
pub struct ProjectLoader {
    assembly_name: Regex,
    reference_patterns: Vec<ReferencePattern>,
}

struct ReferencePattern {
    regex: Regex,
    kind: ReferenceKind,
}

#[derive(Clone, Copy)]
enum ReferenceKind {
    /// `<ProjectReference Include="..\Foo\Foo.csproj" />`
    Project,
    /// `<Reference Include="Foo.Bar, Version=1.0.0.0" />`
    Binary,
    /// `<PackageReference Include="Foo" Version="1.0" />`
    Package,
}

impl ProjectLoader {
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            assembly_name: Regex::new(r"<AssemblyName>\s*([^<]+?)\s*</AssemblyName>")?,
            reference_patterns: vec![
                ReferencePattern {
                    regex: Regex::new(r#"<ProjectReference\s+[^>]*?Include\s*=\s*"([^"]+)""#)?,
                    kind: ReferenceKind::Project,
                },
                ReferencePattern {
                    regex: Regex::new(r#"<Reference\s+[^>]*?Include\s*=\s*"([^"]+)""#)?,
                    kind: ReferenceKind::Binary,
                },
                ReferencePattern {
                    regex: Regex::new(r#"<PackageReference\s+[^>]*?Include\s*=\s*"([^"]+)""#)?,
                    kind: ReferenceKind::Package,
                },
            ],
        })
    }

    pub fn load(&self, path: &Path) -> crate::Result<ProjectDescription> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read project file {}", path.display()))?;
        self.parse(path, &content)
    }

    pub fn parse(&self, path: &Path, content: &str) -> crate::Result<ProjectDescription> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("cannot derive a project name from {}", path.display()))?
            .to_string();

        let assembly = self
            .assembly_name
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        Ok(ProjectDescription {
            name,
            assembly,
            location: path.to_path_buf(),
            dependencies: self.extract_dependencies(content),
        })
    }

    fn extract_dependencies(&self, content: &str) -> Vec<String> {
        // Collect with offsets so tokens keep document order across patterns.
        let mut found: Vec<(usize, String)> = Vec::new();

        for pattern in &self.reference_patterns {
            for captures in pattern.regex.captures_iter(content) {
                if let Some(include) = captures.get(1) {
                    if let Some(token) = reference_token(include.as_str(), pattern.kind) {
                        found.push((include.start(), token));
                    }
                }
            }
        }

        found.sort_by_key(|(offset, _)| *offset);
        dedup_case_insensitive(found.into_iter().map(|(_, token)| token).collect())
    }
}

fn reference_token(include: &str, kind: ReferenceKind) -> Option<String> {
    let token = match kind {
        ReferenceKind::Project => {
            let file_name = include.rsplit(['\\', '/']).next().unwrap_or(include);
            match file_name.rfind('.') {
                Some(dot) if dot > 0 => &file_name[..dot],
                _ => file_name,
            }
        }
        ReferenceKind::Binary => include.split(',').next().unwrap_or(include),
        ReferenceKind::Package => include,
    };

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
