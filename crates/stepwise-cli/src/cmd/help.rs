use crate::app::App;
use crate::output::{checklist_json, print_checklist, print_json};
use std::path::Path;

/// Ask the assistant for help with a step. The suggested plan is only shown
/// unless `apply` is set, in which case it replaces the current steps.
pub fn run(root: &Path, title: &str, issue: &str, apply: bool, json: bool) -> anyhow::Result<()> {
    let app = App::load(root)?;
    let mut session = app.open(title)?;
    let suggestion = app
        .block_on(app.assistant().request_help(&session, issue))
        .map_err(|e| app.explain(e, "could not get help"))?;

    let applied = apply
        && suggestion
            .replacement()
            .is_some_and(|steps| session.apply_replacement(steps));
    app.finish()?;

    if json {
        return print_json(&serde_json::json!({
            "message": suggestion.message,
            "suggestedSolution": suggestion.suggested_solution,
            "applied": applied,
            "checklist": checklist_json(session.checklist()),
        }));
    }

    println!("{}", suggestion.message);
    if applied {
        println!();
        return print_checklist(session.checklist(), false);
    }
    if let Some(steps) = suggestion.replacement() {
        println!();
        println!("Suggested plan:");
        for (i, step) in steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step.text);
        }
        if !apply {
            println!();
            println!("Run again with --apply to replace the current steps.");
        }
    }
    Ok(())
}
