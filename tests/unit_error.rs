use std::path::PathBuf;

use taskqueue::error::{exit_codes, Error, ErrorKind, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::MissingField("title".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let missing = Error::ProjectNotFound("proj-3".to_string());
    assert_eq!(missing.exit_code(), exit_codes::USER_ERROR);

    let frozen = Error::TaskFrozen("task-1".to_string());
    assert_eq!(frozen.exit_code(), exit_codes::BLOCKED);

    let lock = Error::LockFailed(PathBuf::from("/tmp/tasks.json.lock"));
    assert_eq!(lock.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn every_variant_has_one_kind() {
    let cases = [
        (Error::InvalidArgument("bad".to_string()), ErrorKind::Validation),
        (
            Error::FinalizeBlocked {
                project_id: "proj-1".to_string(),
                blocking: vec!["task-2".to_string()],
            },
            ErrorKind::Validation,
        ),
        (
            Error::TaskNotFound {
                project_id: "proj-1".to_string(),
                task_id: "task-9".to_string(),
            },
            ErrorKind::NotFound,
        ),
        (Error::AlreadyApproved("task-1".to_string()), ErrorKind::Conflict),
        (
            Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")),
            ErrorKind::Storage,
        ),
    ];
    for (err, kind) in cases {
        assert_eq!(err.kind(), kind, "{err}");
    }
}

#[test]
fn json_error_includes_kind_code_and_details() {
    let err = Error::FinalizeBlocked {
        project_id: "proj-1".to_string(),
        blocking: vec!["task-1".to_string(), "task-3".to_string()],
    };
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert!(json.message.contains("task-1, task-3"));

    let value = serde_json::to_value(&json).expect("serialize");
    assert_eq!(value["kind"], "ValidationError");
    assert_eq!(value["details"]["blockingTasks"][1], "task-3");
}

#[test]
fn json_error_omits_empty_details() {
    let err = Error::OperationFailed("boom".to_string());
    let value = serde_json::to_value(JsonError::from(&err)).expect("serialize");
    assert_eq!(value["kind"], "StorageError");
    assert!(value.get("details").is_none());
}
