use crate::output::{print_json, print_table};
use anyhow::Context;
use stepwise_core::{history, TaskRepository};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let repo = TaskRepository::for_root(root);
    let entries = history::list(&repo).context("failed to load saved tasks")?;

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No saved tasks.");
        return Ok(());
    }

    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.task_title.clone(),
                history::summarize(e),
                e.saved_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    print_table(&["TITLE", "PROGRESS", "SAVED"], rows);
    Ok(())
}
