//! Prompt construction. Pure string building, no I/O.

use stepwise_core::{HelpRequest, Step};

/// Output contract included in the plan prompt.
const PLAN_SCHEMA: &str = r#"{
  "taskTitle": "Task Title",
  "steps": [
    {"id": 1, "text": "Step 1", "completed": false, "note": ""},
    {"id": 2, "text": "Step 2", "completed": false, "note": ""}
  ]
}"#;

/// Output contract included in the help prompt.
const HELP_SCHEMA: &str = r#"{
  "message": "Explanation message to the user",
  "suggestedSolution": [
    {"id": 1, "text": "New Step 1", "completed": false}
  ]
}"#;

pub fn plan_prompt(description: &str, has_image: bool) -> String {
    let mut prompt = String::with_capacity(1024);
    prompt.push_str(
        "Analyze the user's desired action (and the attached image, if any) \
         and break it down into logical sequential steps.\n",
    );
    prompt.push_str(&format!("User Request: \"{description}\"\n"));
    if has_image {
        prompt.push_str("An image is attached; use what it shows to shape the steps.\n");
    }
    prompt.push_str(
        "\nReturn the response ONLY in the following JSON format, do not add any other text:\n",
    );
    prompt.push_str(PLAN_SCHEMA);
    prompt.push_str("\nEnsure the response is in the same language as the User Request.\n");
    prompt
}

pub fn help_prompt(request: &HelpRequest) -> String {
    let mut prompt = String::with_capacity(2048);
    prompt.push_str(&format!("Task: {}\n", request.task_title));
    prompt.push_str(&format!(
        "Completed Steps: {}\n",
        steps_json(&request.completed_steps)
    ));
    prompt.push_str(&format!(
        "Remaining Steps: {}\n",
        steps_json(&request.pending_steps)
    ));
    prompt.push_str(&format!("User Issue: \"{}\"\n\n", request.issue));
    prompt.push_str(
        "Generate a solution based on this situation. If a new list of steps is needed, \
         suggest it.\nReturn the response ONLY in JSON format:\n",
    );
    prompt.push_str(HELP_SCHEMA);
    prompt.push_str(
        "\nIf no new list is needed, \"suggestedSolution\" can be an empty array.\n\
         Ensure the response is in the same language as the User Issue.\n",
    );
    prompt
}

fn steps_json(steps: &[Step]) -> String {
    serde_json::to_string(steps).unwrap_or_else(|_| "[]".to_string())
}
