//! In-memory task graph: named tasks, variant resolution, and graph checks.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{ConfigError, TaskError};

/// How a link destination is materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Symbolic link from destination to source.
    #[default]
    Symlink,
    /// Independent copy of the source file.
    Copy,
}

/// One declared link: source relative to the source root, destination
/// relative to the destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// Source path as written in the configuration.
    pub source: String,
    /// Destination path as written in the configuration.
    pub target: String,
    /// Link or copy.
    pub mode: LinkMode,
    /// Take both paths as written, without `~` or variable expansion.
    pub literal: bool,
}

impl LinkSpec {
    /// A symbolic link from `target` to `source`.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mode: LinkMode::Symlink,
            literal: false,
        }
    }

    /// A link whose paths are file names rather than configured paths.
    #[must_use]
    pub fn literal(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            literal: true,
            ..Self::new(source, target)
        }
    }

    /// Builder-style mode override.
    #[must_use]
    pub const fn with_mode(mut self, mode: LinkMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Variant-qualified replacements. `None` keeps the base list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variant {
    /// Replacement link list.
    pub links: Option<Vec<LinkSpec>>,
    /// Replacement command list.
    pub commands: Option<Vec<String>>,
    /// Replacement environment additions.
    pub envs: Option<Vec<(String, String)>>,
}

/// A named unit of work as declared in the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    /// Tasks executed before this task's own effects, in order.
    pub subtasks: Vec<String>,
    /// Links applied in order.
    pub links: Vec<LinkSpec>,
    /// Shell commands run in order after the links.
    pub commands: Vec<String>,
    /// Extra environment for this task's commands.
    pub envs: Vec<(String, String)>,
    /// Commands that must all succeed for the task to apply.
    pub accepts: Vec<String>,
    /// Commands that must all fail for the task to apply.
    pub rejects: Vec<String>,
    /// Overrides keyed by variant name.
    pub variants: BTreeMap<String, Variant>,
}

/// A task with the active variant applied.
///
/// Subtasks and conditions always come from the base declaration; variants
/// never change the dependency structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask<'a> {
    /// Task name.
    pub name: &'a str,
    /// Variant that supplied at least one list, if any.
    pub variant: Option<&'a str>,
    /// Subtasks from the base declaration.
    pub subtasks: &'a [String],
    /// Effective links.
    pub links: &'a [LinkSpec],
    /// Effective commands.
    pub commands: &'a [String],
    /// Effective environment additions.
    pub envs: &'a [(String, String)],
    /// Conditions that must succeed.
    pub accepts: &'a [String],
    /// Conditions that must fail.
    pub rejects: &'a [String],
}

/// All named tasks of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGraph {
    tasks: BTreeMap<String, Task>,
}

impl TaskGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task.
    pub fn insert(&mut self, name: impl Into<String>, task: Task) {
        self.tasks.insert(name.into(), task);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_task(mut self, name: impl Into<String>, task: Task) -> Self {
        self.insert(name, task);
        self
    }

    /// Fallback graph used when no config document exists: a single
    /// `default` task linking every direct entry of `src_dir` to the same
    /// name in the destination.
    ///
    /// Entries are sorted by name; `.git` is skipped. Names are used
    /// literally, so `$` and `~` in them are never expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceDir`] if `src_dir` cannot be listed.
    pub fn from_source_dir(src_dir: &Path) -> Result<Self, ConfigError> {
        let to_err = |source| ConfigError::SourceDir {
            path: src_dir.to_path_buf(),
            source,
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(src_dir).map_err(to_err)? {
            let name = entry.map_err(to_err)?.file_name();
            let name = name.to_string_lossy().into_owned();
            if name != ".git" {
                names.push(name);
            }
        }
        names.sort();

        let task = Task {
            links: names.iter().map(|n| LinkSpec::literal(n, n)).collect(),
            ..Task::default()
        };
        Ok(Self::new().with_task("default", task))
    }

    /// Look up a declared task.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Whether `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Iterate over `(name, task)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Task)> {
        self.tasks.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Number of declared tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the graph has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolve `name` with `variant` applied.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::UnknownTask`] if `name` is not declared.
    pub fn resolve_task<'a>(
        &'a self,
        name: &str,
        variant: Option<&str>,
    ) -> Result<ResolvedTask<'a>, TaskError> {
        let (name, task) = self
            .tasks
            .get_key_value(name)
            .ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

        let selected = variant.and_then(|v| task.variants.get_key_value(v));
        let over = selected.map(|(_, v)| v);

        Ok(ResolvedTask {
            name,
            variant: selected.map(|(k, _)| k.as_str()),
            subtasks: &task.subtasks,
            links: over
                .and_then(|v| v.links.as_deref())
                .unwrap_or(&task.links),
            commands: over
                .and_then(|v| v.commands.as_deref())
                .unwrap_or(&task.commands),
            envs: over.and_then(|v| v.envs.as_deref()).unwrap_or(&task.envs),
            accepts: &task.accepts,
            rejects: &task.rejects,
        })
    }

    /// Every `(task, subtask)` pair whose subtask is not declared.
    #[must_use]
    pub fn missing_references(&self) -> Vec<(&str, &str)> {
        self.iter()
            .flat_map(|(name, task)| {
                task.subtasks
                    .iter()
                    .filter(|s| !self.contains(s))
                    .map(move |s| (name, s.as_str()))
            })
            .collect()
    }

    /// Detect cycles among declared tasks using Kahn's algorithm.
    ///
    /// References to undeclared tasks are ignored here; see
    /// [`missing_references`](Self::missing_references).
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        let index: HashMap<&str, usize> = self
            .tasks
            .keys()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let mut in_degree: Vec<usize> = self
            .tasks
            .values()
            .map(|t| {
                t.subtasks
                    .iter()
                    .filter(|s| index.contains_key(s.as_str()))
                    .count()
            })
            .collect();

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.tasks.len()];
        for (i, task) in self.tasks.values().enumerate() {
            for sub in &task.subtasks {
                if let Some(&dep_idx) = index.get(sub.as_str())
                    && let Some(list) = dependents.get_mut(dep_idx)
                {
                    list.push(i);
                }
            }
        }

        let mut queue: Vec<usize> = in_degree
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| (d == 0).then_some(i))
            .collect();
        let mut processed = 0usize;

        while let Some(idx) = queue.pop() {
            processed += 1;
            if let Some(list) = dependents.get(idx) {
                for &dep in list {
                    if let Some(count) = in_degree.get_mut(dep) {
                        *count -= 1;
                        if *count == 0 {
                            queue.push(dep);
                        }
                    }
                }
            }
        }

        processed != self.tasks.len()
    }
}
