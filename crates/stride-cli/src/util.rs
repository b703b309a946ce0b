use stride_core::error::CoreError;
use stride_core::store::TaskRecord;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Ambiguous ID prefix '{0}'")]
    AmbiguousId(String, Vec<(String, String)>),
}

/// Resolves a full id or a unique id prefix against `records`.
pub fn resolve_task_id<R: TaskRecord>(records: &[R], short_id: &str) -> anyhow::Result<String> {
    let short_id = short_id.trim();
    if short_id.len() < 2 {
        return Err(CoreError::Validation("Short ID must be at least 2 characters long.".to_string()).into());
    }
    if let Some(exact) = records.iter().find(|r| r.id() == short_id) {
        return Ok(exact.id().to_string());
    }

    let matches: Vec<&R> = records.iter().filter(|r| r.id().starts_with(short_id)).collect();
    match matches.as_slice() {
        [only] => Ok(only.id().to_string()),
        [] => Err(CoreError::NotFound(format!("No task found with ID prefix '{}'", short_id)).into()),
        many => Err(CliError::AmbiguousId(
            short_id.to_string(),
            many.iter()
                .map(|r| (r.id().to_string(), r.task().title.clone()))
                .collect(),
        )
        .into()),
    }
}

/// Display form of an id. UUID v7 ids start with a timestamp, so the prefix
/// runs into the random bits.
pub fn short_id(id: &str) -> &str {
    if id.starts_with("local-") {
        return id;
    }
    id.get(..18).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stride_core::models::{Task, TaskPriority, TaskStatus};

    fn task(id: &str, title: &str) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            due_date: now,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            tags: vec![],
            owner_id: "me".to_string(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn unique_prefix_resolves() {
        let tasks = vec![task("0192abcd", "One"), task("0193ffff", "Two")];
        assert_eq!(resolve_task_id(&tasks, "0193").unwrap(), "0193ffff");
    }

    #[test]
    fn ambiguous_prefix_lists_candidates() {
        let tasks = vec![task("0192abcd", "One"), task("0192ffff", "Two")];
        let err = resolve_task_id(&tasks, "0192").unwrap_err();
        match err.downcast_ref::<CliError>() {
            Some(CliError::AmbiguousId(_, candidates)) => assert_eq!(candidates.len(), 2),
            None => panic!("expected an ambiguity error, got {}", err),
        }
    }

    #[test]
    fn local_ids_resolve_exactly() {
        let tasks = vec![task("local-task-1", "One"), task("local-task-10", "Ten")];
        assert_eq!(resolve_task_id(&tasks, "local-task-1").unwrap(), "local-task-1");
        assert!(resolve_task_id(&tasks, "x").is_err());
    }
}
