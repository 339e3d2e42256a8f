use serde::{Deserialize, Serialize};
use std::{env, path::{Path, PathBuf}};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workspace_directory: PathBuf,
    pub project_extensions: Vec<String>,
    pub source_extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub exclusions: ExclusionConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    pub skip_test_projects: bool,
    pub test_project_patterns: Vec<String>,
    pub excluded_module_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub summary_file_name: String,
    pub top_dependencies: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_directory: PathBuf::from("."),
            project_extensions: vec![
                "csproj".to_string(),
                "vbproj".to_string(),
                "fsproj".to_string(),
            ],
            source_extensions: vec![
                "cs".to_string(),
                "vb".to_string(),
                "fs".to_string(),
            ],
            ignore_patterns: vec![
                ".git".to_string(),
                ".vs".to_string(),
                "bin".to_string(),
                "obj".to_string(),
                "packages".to_string(),
                "node_modules".to_string(),
                "*.Designer.cs".to_string(),
            ],
            exclusions: ExclusionConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            skip_test_projects: true,
            test_project_patterns: vec![
                "*.Tests".to_string(),
                "*.Test".to_string(),
                "*.UnitTests".to_string(),
                "*.IntegrationTests".to_string(),
            ],
            excluded_module_patterns: vec!["Sdk*".to_string()],
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            summary_file_name: "loc.json".to_string(),
            top_dependencies: 10,
        }
    }
}

impl Config {
    /// Get the default config file path (~/.loc-footprint.toml)
    pub fn default_config_path() -> crate::Result<PathBuf> {
        let home_dir = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(PathBuf::from(home_dir).join(".loc-footprint.toml"))
    }

    /// Load config from the default location, falling back to defaults if the file doesn't exist
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            tracing::info!(path = %config_path.display(), "loading configuration");
            Self::from_file(&config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "no config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load config from a specific file path
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create a config file with all available options documented
    pub fn create_documented_config() -> String {
        r#"# loc-footprint configuration file

# Workspace root; every first-level directory below it is a module
workspace_directory = "."

# Project description files that define a project
project_extensions = ["csproj", "vbproj", "fsproj"]

# Source files whose non-blank lines are counted
source_extensions = ["cs", "vb", "fs"]

# Directory names, "*.ext" suffixes or wildcard file names skipped while walking
ignore_patterns = [
    ".git",
    ".vs",
    "bin",
    "obj",
    "packages",
    "node_modules",
    "*.Designer.cs"
]

[exclusions]
# Drop test projects before aggregation
skip_test_projects = true

# Project names treated as test projects ("*" is a wildcard, case-insensitive)
test_project_patterns = ["*.Tests", "*.Test", "*.UnitTests", "*.IntegrationTests"]

# Modules left out of the report
excluded_module_patterns = ["Sdk*"]

[report]
# Module -> LoC mapping written next to the full report
summary_file_name = "loc.json"

# Number of most depended-upon projects listed in the report
top_dependencies = 10
"#
        .to_string()
    }
}
