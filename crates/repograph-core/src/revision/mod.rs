//! Revisions of the tracked branch and the push events that announce them.

pub mod model;

pub use model::{CommitAuthor, PushCommit, PushEvent, RevisionInfo};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_payload() {
        let payload = r#"{
            "ref": "refs/heads/main",
            "after": "abc123",
            "commits": [{
                "id": "abc123",
                "message": "Add parser",
                "timestamp": "2026-01-02T10:00:00Z",
                "author": {"name": "Dev", "email": "dev@example.com"},
                "added": ["src/a.py"],
                "modified": [],
                "removed": ["old.py"]
            }],
            "head_commit": {
                "id": "abc123",
                "message": "Add parser",
                "timestamp": "2026-01-02T10:00:00Z",
                "author": {"name": "Dev"}
            }
        }"#;

        let event: PushEvent = serde_json::from_str(payload).unwrap();
        assert!(!event.is_ping());
        assert_eq!(event.commits.as_ref().unwrap()[0].removed, vec!["old.py"]);

        let info = event.revision_info().unwrap();
        assert_eq!(info.revision, "abc123");
        assert_eq!(info.message, "Add parser");
        assert_eq!(info.author, "Dev");
    }

    #[test]
    fn test_ping_payload() {
        let event: PushEvent =
            serde_json::from_str(r#"{"zen": "Keep it logically awesome.", "hook_id": 1}"#).unwrap();
        assert!(event.is_ping());
        assert!(event.revision_info().is_none());
    }

    #[test]
    fn test_revision_info_without_head_commit() {
        let event: PushEvent = serde_json::from_str(
            r#"{"after": "r9", "commits": [{"message": "first"}, {"message": "second"}]}"#,
        )
        .unwrap();
        assert_eq!(event.revision_info().unwrap().message, "second");
    }
}
