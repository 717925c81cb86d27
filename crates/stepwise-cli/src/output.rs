use serde::Serialize;
use stepwise_core::Checklist;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  "));
    }
}

/// JSON view of a checklist, including the derived lock state.
pub fn checklist_json(checklist: &Checklist) -> serde_json::Value {
    serde_json::json!({
        "taskTitle": checklist.title(),
        "steps": checklist.steps(),
        "locked": checklist.locked_ids(),
        "manuallyReordered": checklist.is_manually_reordered(),
    })
}

pub fn checklist_lines(checklist: &Checklist) -> Vec<String> {
    let steps = checklist.steps();
    let done = steps.iter().filter(|s| s.completed).count();
    let mut lines = vec![format!(
        "{}  ({}/{} complete)",
        checklist.title(),
        done,
        steps.len()
    )];
    for (i, step) in steps.iter().enumerate() {
        let mut line = format!("  {step}");
        if step.is_manual {
            line.push_str("  (added)");
        }
        if checklist.is_locked(i) {
            line.push_str("  (locked)");
        }
        lines.push(line);
        if !step.note.is_empty() {
            lines.push(format!("       note: {}", step.note));
        }
    }
    lines
}

pub fn print_checklist(checklist: &Checklist, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&checklist_json(checklist));
    }
    for line in checklist_lines(checklist) {
        println!("{line}");
    }
    Ok(())
}
