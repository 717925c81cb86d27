use crate::app::App;
use crate::output::print_checklist;
use std::path::Path;

pub fn show(root: &Path, title: &str, json: bool) -> anyhow::Result<()> {
    let app = App::load(root)?;
    let session = app.open(title)?;
    print_checklist(session.checklist(), json)
}

pub fn toggle(root: &Path, title: &str, id: u64, force: bool, json: bool) -> anyhow::Result<()> {
    let app = App::load(root)?;
    let mut session = app.open(title)?;

    let Some(pos) = session.checklist().position(id) else {
        anyhow::bail!("step {id} not found in '{title}'");
    };
    if !force && session.checklist().is_locked(pos) {
        let prev = session.steps()[pos - 1].id;
        anyhow::bail!("step {id} is locked until step {prev} is complete (use --force)");
    }

    session.toggle(id);
    app.finish()?;
    print_checklist(session.checklist(), json)
}

pub fn note(root: &Path, title: &str, id: u64, text: &str, json: bool) -> anyhow::Result<()> {
    let app = App::load(root)?;
    let mut session = app.open(title)?;
    if session.checklist().find(id).is_none() {
        anyhow::bail!("step {id} not found in '{title}'");
    }
    session.set_note(id, text.trim());
    app.finish()?;
    print_checklist(session.checklist(), json)
}

pub fn add(root: &Path, title: &str, text: &str, json: bool) -> anyhow::Result<()> {
    let app = App::load(root)?;
    let mut session = app.open(title)?;
    session.insert(text)?;
    app.finish()?;
    print_checklist(session.checklist(), json)
}

/// Move the step at 1-based position `from` to position `to`.
pub fn move_to(root: &Path, title: &str, from: usize, to: usize, json: bool) -> anyhow::Result<()> {
    let app = App::load(root)?;
    let mut session = app.open(title)?;
    session.move_step(from, to)?;
    app.finish()?;
    print_checklist(session.checklist(), json)
}
