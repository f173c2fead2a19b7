// Rendering of store state
//
// Everything here is a pure function of the store: computing what to show
// lives in `TodoStore`, painting it lives here.

use crate::error::ValidationError;
use crate::filter::TaskFilter;
use crate::models::Task;
use crate::storage::Storage;
use crate::store::TodoStore;
use colored::Colorize;

pub const EMPTY_HINT: &str = "Add some tasks to get started!";

/// Shown whenever task text is rejected, for adds and edits alike
pub const EMPTY_TEXT_PROMPT: &str = "Please enter a task!";

/// User-facing text for an error returned by a store operation
pub fn error_message(err: &eyre::Report) -> String {
    match err.downcast_ref::<ValidationError>() {
        Some(ValidationError::EmptyText) => EMPTY_TEXT_PROMPT.to_string(),
        None => format!("Error: {:#}", err),
    }
}

/// `"1 task left"` / `"N tasks left"`
pub fn count_label(active: usize) -> String {
    let noun = if active == 1 { "task" } else { "tasks" };
    format!("{} {} left", active, noun)
}

/// Headline shown when no task passes `filter`
pub fn empty_message(filter: TaskFilter) -> String {
    match filter {
        TaskFilter::All => "No tasks".to_string(),
        other => format!("No tasks {}", other),
    }
}

/// Escape text for embedding in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn task_html(task: &Task) -> String {
    let (class, checked) = if task.completed {
        ("task-item completed", " checked")
    } else {
        ("task-item", "")
    };

    format!(
        concat!(
            "<div class=\"{}\" data-id=\"{}\">\n",
            "  <input type=\"checkbox\" class=\"task-checkbox\"{}>\n",
            "  <span class=\"task-text\">{}</span>\n",
            "  <button class=\"delete-btn\">Delete</button>\n",
            "</div>\n"
        ),
        class,
        task.id,
        checked,
        escape_html(&task.text)
    )
}

/// Task-list markup for the store's visible tasks
pub fn render_html<S: Storage>(store: &TodoStore<S>) -> String {
    let html: String = store.visible_tasks().map(task_html).collect();
    if !html.is_empty() {
        return html;
    }

    format!(
        "<div class=\"empty-state\">\n  <p>{}</p>\n  <small>{}</small>\n</div>\n",
        escape_html(&empty_message(store.filter())),
        EMPTY_HINT
    )
}

fn task_line(task: &Task) -> String {
    let id = format!("{:>4}", task.id).dimmed();
    if task.completed {
        format!("{} {} {}", "[x]".green(), id, task.text.dimmed().strikethrough())
    } else {
        format!("{} {} {}", "[ ]", id, task.text)
    }
}

/// Terminal lines for the visible tasks followed by the count footer
pub fn render_lines<S: Storage>(store: &TodoStore<S>) -> Vec<String> {
    let mut lines: Vec<String> = store.visible_tasks().map(task_line).collect();

    if lines.is_empty() {
        lines.push(empty_message(store.filter()).bold().to_string());
        lines.push(EMPTY_HINT.dimmed().to_string());
    }

    lines.push(String::new());
    lines.push(count_label(store.active_count()).cyan().to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn open_store() -> TodoStore<MemoryStorage> {
        TodoStore::open(MemoryStorage::new()).unwrap()
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(0), "0 tasks left");
        assert_eq!(count_label(1), "1 task left");
        assert_eq!(count_label(3), "3 tasks left");
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(empty_message(TaskFilter::All), "No tasks");
        assert_eq!(empty_message(TaskFilter::Active), "No tasks active");
        assert_eq!(empty_message(TaskFilter::Completed), "No tasks completed");
    }

    #[test]
    fn test_error_message_same_for_add_and_edit() {
        let mut store = open_store();

        let add_err = store.add("   ").unwrap_err();
        let edit_err = store.edit(1, "").unwrap_err();

        assert_eq!(error_message(&add_err), EMPTY_TEXT_PROMPT);
        assert_eq!(error_message(&edit_err), EMPTY_TEXT_PROMPT);
    }

    #[test]
    fn test_error_message_other_errors() {
        let err = eyre::eyre!("disk full").wrap_err("Failed to persist tasks");
        assert_eq!(error_message(&err), "Error: Failed to persist tasks: disk full");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_render_html_escapes_task_text() {
        let mut store = open_store();
        let id = store.add("<b>bold</b>").unwrap();

        let html = render_html(&store);
        assert!(html.contains(&format!("data-id=\"{}\"", id)));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_render_html_marks_completed() {
        let mut store = open_store();
        store.toggle(2).unwrap();
        store.set_filter(TaskFilter::Completed);

        let html = render_html(&store);
        assert!(html.contains("class=\"task-item completed\" data-id=\"2\""));
        assert!(html.contains("task-checkbox\" checked>"));
        assert_eq!(html.matches("task-item").count(), 1);
    }

    #[test]
    fn test_render_html_empty_state() {
        let mut store = open_store();
        store.set_filter(TaskFilter::Completed);

        let html = render_html(&store);
        assert!(html.contains("empty-state"));
        assert!(html.contains("No tasks completed"));
        assert!(html.contains(EMPTY_HINT));
    }

    #[test]
    fn test_render_lines() {
        colored::control::set_override(false);

        let mut store = open_store();
        store.toggle(1).unwrap();

        let lines = render_lines(&store);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("[x]"));
        assert!(lines[0].ends_with("Welcome to your ToDo app!"));
        assert!(lines[1].starts_with("[ ]"));
        assert_eq!(lines[4], "2 tasks left");

        store.set_filter(TaskFilter::Completed);
        store.clear_completed().unwrap();
        let lines = render_lines(&store);
        assert_eq!(lines[0], "No tasks completed");
        assert_eq!(lines[1], EMPTY_HINT);
    }
}
