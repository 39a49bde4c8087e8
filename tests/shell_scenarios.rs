mod support;

use serde_json::Value;
use support::{titles, TestEnv};

fn stats(data: &Value) -> (u64, u64, u64, u64) {
    let stats = if data.get("stats").is_some() {
        &data["stats"]
    } else {
        data
    };
    (
        stats["total"].as_u64().expect("total"),
        stats["completed"].as_u64().expect("completed"),
        stats["active"].as_u64().expect("active"),
        stats["overdue"].as_u64().expect("overdue"),
    )
}

#[test]
fn buy_milk_on_empty_board() {
    let env = TestEnv::new();
    let mut shell = env.spawn_shell(&["--no-samples"]);

    let created = shell.ok("add Buy milk");
    assert_eq!(created["message"], "Task created");
    let task = &created["task"];
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["completed"], false);
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["category"], "personal");
    assert!(task.get("description").is_none());
    assert!(task.get("dueDate").is_none());
    assert_eq!(task["createdAt"], task["updatedAt"]);

    let data = shell.ok("stats");
    assert_eq!(stats(&data), (1, 0, 1, 0));
    assert_eq!(data["completionRate"], 0);
    shell.close();
}

#[test]
fn priority_and_newest_first_orderings_differ() {
    let env = TestEnv::new();
    let mut shell = env.spawn_shell(&["--no-samples"]);

    shell.ok("add Older urgent -p high");
    shell.ok("add Newer chore -p low");

    let newest = shell.ok("list");
    assert_eq!(titles_of(&newest), vec!["Newer chore", "Older urgent"]);

    let by_priority = shell.ok("sort priority");
    assert_eq!(titles_of(&by_priority), vec!["Older urgent", "Newer chore"]);
    assert_eq!(by_priority["criteria"]["sort"], "priority");
    shell.close();
}

#[test]
fn completing_an_overdue_task_clears_overdue() {
    let env = TestEnv::new();
    let mut shell = env.spawn_shell(&["--no-samples"]);

    let created = shell.ok("add Pay rent --due 2020-01-01");
    let id = created["task"]["id"].as_str().expect("id").to_string();
    assert_eq!(created["task"]["dueDate"], "2020-01-01T00:00:00Z");
    assert_eq!(stats(&shell.ok("stats")), (1, 0, 1, 1));

    let toggled = shell.ok(&format!("done {id}"));
    assert_eq!(toggled["message"], "Well done! Task marked as complete.");
    assert_eq!(toggled["task"]["completed"], true);
    assert_eq!(stats(&shell.ok("stats")), (1, 1, 0, 0));

    let reopened = shell.ok(&format!("done {id}"));
    assert_eq!(reopened["task"]["completed"], false);
    shell.close();
}

#[test]
fn search_matches_case_insensitively_on_samples() {
    let env = TestEnv::new();
    let mut shell = env.spawn_shell(&[]);

    let data = shell.ok("search MOM");
    assert_eq!(titles_of(&data), vec!["Call mom"]);
    assert_eq!(data["hasFilters"], true);
    assert_eq!(stats(&data), (4, 1, 3, 0));

    let by_description = shell.ok("search eggs");
    assert_eq!(titles_of(&by_description), vec!["Buy groceries"]);
    shell.close();
}

#[test]
fn category_and_priority_filters_combine() {
    let env = TestEnv::new();
    let mut shell = env.spawn_shell(&[]);

    shell.ok("add Write report -c work -p low");
    shell.ok("category work");
    let data = shell.ok("priority high");
    assert_eq!(titles_of(&data), vec!["Review project proposal"]);

    let any_priority = shell.ok("priority all");
    assert_eq!(
        titles_of(&any_priority),
        vec!["Write report", "Review project proposal"]
    );

    let none_match = shell.ok("status completed");
    assert!(titles_of(&none_match).is_empty());
    assert_eq!(none_match["emptyMessage"], "No tasks match your filters");

    let reset = shell.ok("reset");
    assert_eq!(reset["hasFilters"], false);
    assert_eq!(titles_of(&reset).len(), 5);
    shell.close();
}

#[test]
fn unknown_id_is_reported_and_board_unchanged() {
    let env = TestEnv::new();
    let mut shell = env.spawn_shell(&[]);

    let before = shell.ok("list");
    let envelope = shell.send("edit zzzzzz --title Nope");
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["command"], "edit");
    assert_eq!(envelope["error"]["code"], 2);
    assert_eq!(envelope["error"]["kind"], "user_error");
    assert_eq!(envelope["error"]["details"]["id"], "zzzzzz");

    let after = shell.ok("list");
    assert_eq!(before["tasks"], after["tasks"]);
    shell.close();
}

#[test]
fn edit_merges_fields_and_keeps_created_at() {
    let env = TestEnv::new();
    let mut shell = env.spawn_shell(&["--no-samples"]);

    let created = shell.ok("add Draft -d 'first pass' --due 2030-05-01");
    let id = created["task"]["id"].as_str().expect("id").to_string();

    let edited = shell.ok(&format!(
        "edit {id} --title 'Final draft' -p high --clear-description"
    ));
    let task = &edited["task"];
    assert_eq!(edited["message"], "Task updated");
    assert_eq!(task["title"], "Final draft");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["category"], "personal");
    assert_eq!(task["dueDate"], "2030-05-01T00:00:00Z");
    assert!(task.get("description").is_none());
    assert_eq!(task["createdAt"], created["task"]["createdAt"]);

    let removed = shell.ok(&format!("rm {id}"));
    assert_eq!(removed["message"], "Task deleted");
    assert_eq!(stats(&shell.ok("stats")), (0, 0, 0, 0));
    shell.close();
}

#[test]
fn due_date_sort_puts_undated_last() {
    let env = TestEnv::new();
    let data = env.shell_json(&[], "sort dueDate\n");
    assert_eq!(
        titles(&data[0]),
        vec![
            "Review project proposal",
            "Buy groceries",
            "Morning workout",
            "Call mom"
        ]
    );
}

#[test]
fn alphabetical_sort_orders_titles() {
    let env = TestEnv::new();
    let data = env.shell_json(&[], "sort alphabetical\n");
    assert_eq!(
        titles(&data[0]),
        vec![
            "Buy groceries",
            "Call mom",
            "Morning workout",
            "Review project proposal"
        ]
    );
}

#[test]
fn config_sets_initial_view() {
    let env = TestEnv::new();
    let path = env.write_config("[view]\nsort = \"priority\"\nstatus = \"active\"\n");
    let data = env.shell_json(&["--config", path.to_str().expect("utf8 path")], "list\n");
    assert_eq!(
        titles(&data[0]),
        vec!["Review project proposal", "Call mom", "Buy groceries"]
    );
    assert_eq!(data[0]["data"]["criteria"]["status"], "active");
}

#[test]
fn config_can_disable_samples() {
    let env = TestEnv::new();
    let path = env.write_config("[board]\nseed_samples = false\n");
    let data = env.shell_json(&["--config", path.to_str().expect("utf8 path")], "list\n");
    assert!(titles(&data[0]).is_empty());
    assert_eq!(data[0]["data"]["emptyMessage"], "No tasks yet");
}

#[test]
fn each_line_produces_one_envelope() {
    let env = TestEnv::new();
    let envelopes = env.shell_json(
        &["--no-samples"],
        "# setup\nadd One\n\nadd Two\nsort nowhere\nlist\n",
    );
    let commands: Vec<&str> = envelopes
        .iter()
        .map(|envelope| envelope["command"].as_str().expect("command"))
        .collect();
    assert_eq!(commands, vec!["add", "add", "sort", "list"]);
    assert_eq!(envelopes[2]["status"], "error");
    assert_eq!(envelopes[2]["error"]["details"]["kind"], "sort");
    assert!(envelopes
        .iter()
        .all(|envelope| envelope["schema_version"] == "taskflow.v1"));
}

fn titles_of(data: &Value) -> Vec<String> {
    data["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .map(|task| task["title"].as_str().expect("title").to_string())
        .collect()
}
