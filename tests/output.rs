use chrono::{Duration, Utc};
use taskflow::board::TaskBoard;
use taskflow::output::{format_human, projection_human, HumanOutput};

#[test]
fn format_human_includes_sections() {
    let mut human = HumanOutput::new("Task created");
    human.push_summary("id", "01hqxyzabc123456");
    human.push_detail("[ ] 123456  Buy milk  (Medium, Personal)");
    human.push_warning("existing file overwritten");
    human.push_next_step("done 123456");

    let rendered = format_human(&human);
    assert!(rendered.contains("Task created"));
    assert!(rendered.contains("Summary:"));
    assert!(rendered.contains("- id: 01hqxyzabc123456"));
    assert!(rendered.contains("Details:"));
    assert!(rendered.contains("- [ ] 123456  Buy milk  (Medium, Personal)"));
    assert!(rendered.contains("Warnings:"));
    assert!(rendered.contains("Next steps:"));
    assert!(rendered.contains("- done 123456"));
}

#[test]
fn format_human_omits_empty_sections() {
    let human = HumanOutput::new("taskflow history: 0 messages");
    let rendered = format_human(&human);
    assert_eq!(rendered, "taskflow history: 0 messages");
}

#[test]
fn projection_lists_visible_tasks_in_order() {
    let now = Utc::now();
    let mut board = TaskBoard::with_samples_at(now);
    board.set_search_query("o");

    let projection = board.projection_at(now + Duration::seconds(1));
    let rendered = format_human(&projection_human(&projection, true, now));
    assert!(rendered.starts_with("taskflow: 4 total, 3 active, 1 completed, 0 overdue (25% done)"));

    let review = rendered.find("Review project proposal").expect("review");
    let groceries = rendered.find("Buy groceries").expect("groceries");
    assert!(review < groceries);
}

#[test]
fn projection_shows_empty_state() {
    let now = Utc::now();
    let board = TaskBoard::new();
    let projection = board.projection_at(now);
    let rendered = format_human(&projection_human(&projection, false, now));
    assert!(rendered.contains("No tasks yet"));
    assert!(rendered.contains("add \"<title>\""));
}
