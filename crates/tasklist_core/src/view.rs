use crate::model::{PriorityFilter, SortKey, Task};

/// Filter then stable-sort a copy of `tasks`. The input order is never touched.
pub fn derived_view(tasks: &[Task], sort_key: SortKey, filter: PriorityFilter) -> Vec<Task> {
    let mut view: Vec<Task> = tasks
        .iter()
        .filter(|task| filter.matches(task.priority))
        .cloned()
        .collect();

    // `sort_by_key` is stable, equal keys keep stored order.
    match sort_key {
        SortKey::Newest => {}
        SortKey::Priority => view.sort_by_key(|task| task.priority.rank()),
        SortKey::Completed => view.sort_by_key(|task| task.completed),
        SortKey::Reminder => view.sort_by_key(|task| task.reminder_seconds),
    }

    view
}
