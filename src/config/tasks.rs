//! Task document schema and its conversion into a [`TaskGraph`].
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::loader;
use crate::error::ConfigError;
use crate::tasks::graph::{LinkMode, LinkSpec, Task, TaskGraph, Variant};

/// Root of a task document: `[tasks.<name>]` tables.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    tasks: BTreeMap<String, TaskDef>,
}

/// One `[tasks.<name>]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskDef {
    #[serde(default, alias = "deps")]
    tasks: Vec<String>,
    #[serde(default)]
    links: Vec<LinkEntry>,
    #[serde(default, alias = "cmds")]
    commands: Vec<String>,
    #[serde(default)]
    envs: Vec<(String, String)>,
    #[serde(default)]
    accepts: Vec<String>,
    #[serde(default)]
    rejects: Vec<String>,
    #[serde(default)]
    variants: BTreeMap<String, VariantDef>,
}

/// One `[tasks.<name>.variants.<variant>]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantDef {
    links: Option<Vec<LinkEntry>>,
    #[serde(alias = "cmds")]
    commands: Option<Vec<String>>,
    envs: Option<Vec<(String, String)>>,
}

/// A single entry in a `links` list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkEntry {
    /// Plain string: `"vimrc"`, same relative path on both sides.
    Same(String),
    /// `["bashrc", ".bashrc"]` or `["vimrc"]`.
    Pair(Vec<String>),
    /// `{ source = "ssh/config", target = ".ssh/config", mode = "copy" }`.
    Table(LinkTable),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LinkTable {
    source: String,
    target: Option<String>,
    #[serde(default)]
    mode: LinkMode,
}

impl LinkEntry {
    fn into_spec(self) -> Result<LinkSpec, String> {
        match self {
            Self::Same(path) => Ok(LinkSpec::new(path.clone(), path)),
            Self::Pair(parts) => match <[String; 1]>::try_from(parts) {
                Ok([path]) => Ok(LinkSpec::new(path.clone(), path)),
                Err(parts) => match <[String; 2]>::try_from(parts) {
                    Ok([source, target]) => Ok(LinkSpec::new(source, target)),
                    Err(parts) => Err(format!(
                        "link entry must have 1 or 2 elements, found {}",
                        parts.len()
                    )),
                },
            },
            Self::Table(LinkTable {
                source,
                target,
                mode,
            }) => {
                let target = target.unwrap_or_else(|| source.clone());
                Ok(LinkSpec::new(source, target).with_mode(mode))
            }
        }
    }
}

fn convert_links(entries: Vec<LinkEntry>, task: &str) -> Result<Vec<LinkSpec>, String> {
    entries
        .into_iter()
        .map(|e| e.into_spec().map_err(|m| format!("task '{task}': {m}")))
        .collect()
}

impl TaskDef {
    fn into_task(self, name: &str) -> Result<Task, String> {
        let mut variants = BTreeMap::new();
        for (variant, def) in self.variants {
            let links = def
                .links
                .map(|l| convert_links(l, &format!("{name}.{variant}")))
                .transpose()?;
            variants.insert(
                variant,
                Variant {
                    links,
                    commands: def.commands,
                    envs: def.envs,
                },
            );
        }

        Ok(Task {
            subtasks: self.tasks,
            links: convert_links(self.links, name)?,
            commands: self.commands,
            envs: self.envs,
            accepts: self.accepts,
            rejects: self.rejects,
            variants,
        })
    }
}

impl Document {
    fn into_graph(self) -> Result<TaskGraph, String> {
        let mut graph = TaskGraph::new();
        for (name, def) in self.tasks {
            let task = def.into_task(&name)?;
            graph.insert(name, task);
        }
        Ok(graph)
    }
}

/// Load a task document (`.toml`, `.json` or `.yml`) into a [`TaskGraph`].
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, has an unsupported
/// extension, or is not a valid task document.
pub fn load(path: &Path) -> Result<TaskGraph, ConfigError> {
    let doc: Document = loader::load_config(path)?;
    doc.into_graph().map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}
