//! Property-based tests for the task filter.
//!
//! Uses proptest to verify:
//! 1. An empty filter passes every task through, in order.
//! 2. Search matches exactly when the text occurs (ignoring case) in the
//!    title, description, or comments, whatever the other criteria.
//! 3. A combined filter yields the intersection of its single-criterion
//!    filters.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use taskflow::filter::TaskFilter;
use taskflow_proto::{Task, TaskFields, TaskPriority, TaskStatus};

// --- Strategies ---

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_priority() -> impl Strategy<Value = TaskPriority> {
    prop::sample::select(TaskPriority::ALL.to_vec())
}

/// Small alphabet so references and search text collide often.
fn arb_reference() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[ab]")
}

/// Space-free text over a tiny mixed-case alphabet.
fn arb_text() -> impl Strategy<Value = String> {
    "[abcABC]{0,6}"
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9]{1,8}",
        arb_text(),
        arb_text(),
        arb_text(),
        arb_status(),
        arb_priority(),
        arb_reference(),
        arb_reference(),
    )
        .prop_map(
            |(id, title, description, comments, status, priority, assignee_id, project_id)| {
                Task::new(
                    id,
                    TaskFields {
                        title,
                        description,
                        comments,
                        status,
                        priority,
                        assignee_id,
                        project_id,
                        ..TaskFields::default()
                    },
                )
            },
        )
}

fn arb_filter() -> impl Strategy<Value = TaskFilter> {
    (
        arb_reference(),
        arb_reference(),
        prop::option::of(arb_status()),
        prop::option::of(arb_priority()),
        "[abcABC]{0,2}",
    )
        .prop_map(|(assignee, project, status, priority, search)| {
            let mut filter = TaskFilter::new();
            filter.set_assignee(assignee.unwrap_or_default());
            filter.set_project(project.unwrap_or_default());
            filter.set_status(status);
            filter.set_priority(priority);
            filter.set_search(search);
            filter
        })
}

fn ids(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|t| t.id.clone()).collect()
}

// --- Properties ---

proptest! {
    #[test]
    fn empty_filter_is_identity(tasks in prop::collection::vec(arb_task(), 0..16)) {
        let filter = TaskFilter::new();
        prop_assert!(filter.is_empty());
        prop_assert_eq!(filter.apply(&tasks), tasks);
    }

    #[test]
    fn search_matches_iff_substring(task in arb_task(), search in "[abcABC]{1,3}") {
        let mut filter = TaskFilter::new();
        filter.set_search(search.clone());
        let needle = search.to_lowercase();
        let f = &task.fields;
        let expected = [&f.title, &f.description, &f.comments]
            .iter()
            .any(|text| text.to_lowercase().contains(&needle));
        prop_assert_eq!(filter.matches(&task), expected);
    }

    #[test]
    fn search_is_independent_of_other_criteria(task in arb_task(), search in "[abcABC]{1,3}") {
        // With every other criterion set to the task's own values, search
        // alone decides.
        let mut narrowed = TaskFilter::new();
        narrowed.set_assignee(task.fields.assignee_id.clone().unwrap_or_default());
        narrowed.set_project(task.fields.project_id.clone().unwrap_or_default());
        narrowed.set_status(Some(task.fields.status));
        narrowed.set_priority(Some(task.fields.priority));
        narrowed.set_search(search.clone());

        let mut search_only = TaskFilter::new();
        search_only.set_search(search);
        prop_assert_eq!(narrowed.matches(&task), search_only.matches(&task));
    }

    #[test]
    fn combined_is_intersection(
        tasks in prop::collection::vec(arb_task(), 0..16),
        filter in arb_filter(),
    ) {
        let singles = [
            TaskFilter { assignee_id: filter.assignee_id.clone(), ..TaskFilter::default() },
            TaskFilter { project_id: filter.project_id.clone(), ..TaskFilter::default() },
            TaskFilter { status: filter.status, ..TaskFilter::default() },
            TaskFilter { priority: filter.priority, ..TaskFilter::default() },
            TaskFilter { search: filter.search.clone(), ..TaskFilter::default() },
        ];
        let intersection: Vec<Task> = tasks
            .iter()
            .filter(|t| singles.iter().all(|single| single.matches(t)))
            .cloned()
            .collect();
        prop_assert_eq!(ids(&filter.apply(&tasks)), ids(&intersection));
    }

    #[test]
    fn view_preserves_collection_order(
        tasks in prop::collection::vec(arb_task(), 0..16),
        filter in arb_filter(),
    ) {
        let mut tasks = tasks;
        for (i, task) in tasks.iter_mut().enumerate() {
            task.id = i.to_string();
        }
        let positions: Vec<usize> = filter
            .apply(&tasks)
            .iter()
            .map(|t| t.id.parse().unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
