//! Non-fatal checks over a loaded task graph.
//!
//! Validators never fail a run; their warnings are logged before execution
//! starts. Fatal problems (unknown root task, cycles under the `error`
//! policy) are reported by the executor itself.
use std::path::Path;

use crate::tasks::graph::TaskGraph;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The task the warning is about.
    pub task: String,
    /// The specific item (link, command, subtask) that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning.
    #[must_use]
    pub fn new(
        task: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.task, self.item, self.message)
    }
}

/// Trait for task graph validators.
pub trait ConfigValidator {
    /// Validate the graph against the source root and return any warnings.
    fn validate(&self, graph: &TaskGraph, src_dir: &Path) -> Vec<ValidationWarning>;

    /// Human-readable name for this validator (e.g. "links").
    fn name(&self) -> &'static str;
}

/// Subtask references and dependency cycles.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceValidator;

impl ConfigValidator for ReferenceValidator {
    fn validate(&self, graph: &TaskGraph, _src_dir: &Path) -> Vec<ValidationWarning> {
        let mut warnings: Vec<ValidationWarning> = graph
            .missing_references()
            .into_iter()
            .map(|(task, sub)| ValidationWarning::new(task, sub, "subtask is not declared"))
            .collect();

        if graph.has_cycle() {
            warnings.push(ValidationWarning::new(
                "*",
                "tasks",
                "task dependencies contain a cycle",
            ));
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "references"
    }
}

/// Link paths: empty, absolute sources, and sources missing from the
/// source root.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkValidator;

impl LinkValidator {
    /// Paths that need variable expansion are only checkable at run time.
    fn needs_expansion(path: &str) -> bool {
        path.starts_with('~') || path.contains('$')
    }
}

impl ConfigValidator for LinkValidator {
    fn validate(&self, graph: &TaskGraph, src_dir: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (name, task) in graph.iter() {
            let variant_links = task
                .variants
                .values()
                .filter_map(|v| v.links.as_deref())
                .flatten();

            for link in task.links.iter().chain(variant_links) {
                if link.source.trim().is_empty() || link.target.trim().is_empty() {
                    warnings.push(ValidationWarning::new(
                        name,
                        format!("{} -> {}", link.source, link.target),
                        "link path is empty",
                    ));
                    continue;
                }

                if !link.literal && Self::needs_expansion(&link.source) {
                    continue;
                }

                if Path::new(&link.source).is_absolute() {
                    warnings.push(ValidationWarning::new(
                        name,
                        &link.source,
                        "source path should be relative to the source directory",
                    ));
                }

                let source_path = src_dir.join(&link.source);
                if std::fs::symlink_metadata(&source_path).is_err() {
                    warnings.push(ValidationWarning::new(
                        name,
                        &link.source,
                        format!("source does not exist: {}", source_path.display()),
                    ));
                }
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "links"
    }
}

/// Blank command and condition strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandValidator;

impl ConfigValidator for CommandValidator {
    fn validate(&self, graph: &TaskGraph, _src_dir: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (name, task) in graph.iter() {
            let variant_commands = task
                .variants
                .values()
                .filter_map(|v| v.commands.as_deref())
                .flatten();
            let all = task
                .commands
                .iter()
                .chain(variant_commands)
                .chain(&task.accepts)
                .chain(&task.rejects);

            for command in all {
                if command.trim().is_empty() {
                    warnings.push(ValidationWarning::new(name, "commands", "command is empty"));
                }
            }

            for (key, _) in &task.envs {
                if key.trim().is_empty() || key.contains('=') {
                    warnings.push(ValidationWarning::new(
                        name,
                        key,
                        "invalid environment variable name",
                    ));
                }
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "commands"
    }
}

/// Run every validator and return collected warnings.
#[must_use]
pub fn validate_all(graph: &TaskGraph, src_dir: &Path) -> Vec<ValidationWarning> {
    let validators: [&dyn ConfigValidator; 3] =
        [&ReferenceValidator, &LinkValidator, &CommandValidator];

    let mut all_warnings = Vec::new();
    for validator in validators {
        let warnings = validator.validate(graph, src_dir);
        if !warnings.is_empty() {
            tracing::debug!("{} validator: {} warning(s)", validator.name(), warnings.len());
        }
        all_warnings.extend(warnings);
    }

    all_warnings
}
