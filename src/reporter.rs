use crate::{aggregator::ModuleFootprint, analyzer::WorkspaceAnalysis, dependency_graph::GraphAnalysis};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Json,
    Markdown,
    All,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub modules: Vec<ModuleFootprint>,
    pub excluded_modules: Vec<String>,
    pub unresolved_dependencies: Vec<String>,
    pub graph: GraphAnalysis,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub workspace: String,
    pub total_projects: usize,
    pub total_modules: usize,
    pub total_lines: u64,
    pub unresolved_dependencies: usize,
    pub analysis_duration_ms: u128,
    pub version: String,
}

pub struct Reporter {
    summary_file_name: String,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new("loc.json")
    }
}

impl Reporter {
    pub fn new(summary_file_name: impl Into<String>) -> Self {
        Self {
            summary_file_name: summary_file_name.into(),
        }
    }

    pub fn generate_report(&self, analysis: &WorkspaceAnalysis, duration_ms: u128) -> Report {
        Report {
            metadata: ReportMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                workspace: analysis.workspace.display().to_string(),
                total_projects: analysis.total_projects,
                total_modules: analysis.modules.len(),
                total_lines: analysis.total_lines,
                unresolved_dependencies: analysis.unresolved_dependencies.len(),
                analysis_duration_ms: duration_ms,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            modules: analysis.modules.clone(),
            excluded_modules: analysis.excluded_modules.clone(),
            unresolved_dependencies: analysis.unresolved_dependencies.clone(),
            graph: analysis.graph.clone(),
        }
    }

    /// Module name -> total LoC, in the order of `modules` (descending total).
    pub fn summary_json(modules: &[ModuleFootprint]) -> Result<String> {
        let summary: serde_json::Map<String, serde_json::Value> = modules
            .iter()
            .map(|m| (m.module.clone(), serde_json::Value::from(m.total_lines)))
            .collect();
        Ok(serde_json::to_string_pretty(&summary)?)
    }

    pub fn export_report(&self, report: &Report, output_dir: &Path, format: ReportFormat) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("cannot create output directory {}", output_dir.display()))?;

        let mut exported_files = Vec::new();

        let summary_path = output_dir.join(&self.summary_file_name);
        fs::write(&summary_path, Self::summary_json(&report.modules)?)?;
        exported_files.push(summary_path);

        if matches!(format, ReportFormat::Json | ReportFormat::All) {
            let json_path = output_dir.join("report.json");
            fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
            exported_files.push(json_path);
        }

        if matches!(format, ReportFormat::Markdown | ReportFormat::All) {
            let md_path = output_dir.join("report.md");
            fs::write(&md_path, self.generate_markdown_summary(report)?)?;
            exported_files.push(md_path);
        }

        Ok(exported_files)
    }

    fn generate_markdown_summary(&self, report: &Report) -> Result<String> {
        let mut md = String::new();
        let meta = &report.metadata;

        writeln!(md, "# Workspace Footprint Report")?;
        writeln!(md)?;
        writeln!(md, "**Workspace:** {}  ", meta.workspace)?;
        writeln!(md, "**Generated:** {}  ", meta.generated_at)?;
        writeln!(md, "**Projects:** {}  ", meta.total_projects)?;
        writeln!(md, "**Lines of code:** {}  ", meta.total_lines)?;
        writeln!(md, "**Unresolved dependencies:** {}  ", meta.unresolved_dependencies)?;
        writeln!(md, "**Analysis duration:** {} ms", meta.analysis_duration_ms)?;
        writeln!(md)?;

        writeln!(md, "## Modules")?;
        writeln!(md)?;
        writeln!(md, "| Module | Total LoC | Own LoC | Projects | Pulled in |")?;
        writeln!(md, "|---|---:|---:|---:|---:|")?;
        for module in &report.modules {
            writeln!(
                md,
                "| {} | {} | {} | {} | {} |",
                module.module,
                module.total_lines,
                module.own_lines,
                module.projects.len(),
                module.dependency_projects
            )?;
        }

        if !report.graph.most_depended_upon.is_empty() {
            writeln!(md)?;
            writeln!(md, "## Most Depended-Upon Projects")?;
            writeln!(md)?;
            for entry in &report.graph.most_depended_upon {
                writeln!(md, "- {} ({} dependents)", entry.project, entry.dependents)?;
            }
        }

        if !report.unresolved_dependencies.is_empty() {
            writeln!(md)?;
            writeln!(md, "## Unresolved Dependencies")?;
            writeln!(md)?;
            writeln!(md, "References naming nothing in the workspace (external binaries or packages):")?;
            writeln!(md)?;
            for token in &report.unresolved_dependencies {
                writeln!(md, "- `{}`", token)?;
            }
        }

        if !report.excluded_modules.is_empty() {
            writeln!(md)?;
            writeln!(md, "Excluded modules: {}", report.excluded_modules.join(", "))?;
        }

        Ok(md)
    }
}
