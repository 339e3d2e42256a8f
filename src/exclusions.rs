use crate::config::ExclusionConfig;
use crate::project::Project;
use regex::Regex;

type ProjectPredicate = Box<dyn Fn(&Project) -> bool + Send + Sync>;
type ModulePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Filters applied around the core: project predicates before aggregation,
/// module predicates on the aggregated result.
#[derive(Default)]
pub struct Exclusions {
    project_filters: Vec<ProjectPredicate>,
    module_filters: Vec<ModulePredicate>,
}

impl Exclusions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExclusionConfig) -> crate::Result<Self> {
        let mut exclusions = Self::none();

        if config.skip_test_projects {
            let patterns = compile_all(&config.test_project_patterns)?;
            exclusions = exclusions
                .exclude_projects(move |p: &Project| patterns.iter().any(|re| re.is_match(&p.name)));
        }

        if !config.excluded_module_patterns.is_empty() {
            let patterns = compile_all(&config.excluded_module_patterns)?;
            exclusions =
                exclusions.exclude_modules(move |m: &str| patterns.iter().any(|re| re.is_match(m)));
        }

        Ok(exclusions)
    }

    pub fn exclude_projects<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Project) -> bool + Send + Sync + 'static,
    {
        self.project_filters.push(Box::new(predicate));
        self
    }

    pub fn exclude_modules<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.module_filters.push(Box::new(predicate));
        self
    }

    pub fn excludes_project(&self, project: &Project) -> bool {
        self.project_filters.iter().any(|f| f(project))
    }

    pub fn excludes_module(&self, module: &str) -> bool {
        self.module_filters.iter().any(|f| f(module))
    }
}

fn compile_all(patterns: &[String]) -> crate::Result<Vec<Regex>> {
    patterns.iter().map(|p| glob_regex(p)).collect()
}

/// Compiles a `*` wildcard pattern into an anchored, case-insensitive regex.
pub fn glob_regex(pattern: &str) -> crate::Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Ok(Regex::new(&format!("(?i)^{}$", body))?)
}
