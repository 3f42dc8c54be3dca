mod support;

use ldvault_backend::paths::info::{GIT_COMMIT, VERSION};
use ldvault_backend::router::{KeyType, Route, key_segment};
use ldvault_backend::{BackendError, Operation};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::TestEnv;

#[test]
fn resolves_every_route() {
    let cases = [
        (Operation::Read, "info", Route::Info),
        (Operation::Update, "config", Route::Config),
        (Operation::List, "role", Route::Roles),
        (
            Operation::Read,
            "role/eng",
            Route::Role {
                custom_role: "eng".into(),
            },
        ),
        (
            Operation::Read,
            "role/eng/reset",
            Route::RoleReset {
                custom_role: "eng".into(),
            },
        ),
        (Operation::Create, "relay/policy", Route::RelayPolicy),
        (
            Operation::Read,
            "relay/foo",
            Route::Relay { name: "foo".into() },
        ),
        (
            Operation::Read,
            "project/web/test",
            Route::ProjectEnv {
                project: "web".into(),
                env: "test".into(),
            },
        ),
        (
            Operation::Read,
            "project/web/test/reset/sdk",
            Route::ProjectEnvReset {
                project: "web".into(),
                env: "test".into(),
                key_type: KeyType::Sdk,
            },
        ),
        (
            Operation::Delete,
            "coderefs/repoa",
            Route::CodeRefs {
                project: "repoa".into(),
            },
        ),
    ];

    for (op, path, expected) in cases {
        assert_eq!(Route::resolve(op, path).unwrap(), expected, "{op} {path}");
    }
}

#[test]
fn surrounding_slashes_are_ignored() {
    assert_eq!(Route::resolve(Operation::Read, "/info/").unwrap(), Route::Info);
}

#[test]
fn path_parameters_are_lowercased() {
    assert_eq!(
        Route::resolve(Operation::Read, "project/Web/PROD").unwrap(),
        Route::ProjectEnv {
            project: "web".into(),
            env: "prod".into(),
        }
    );
}

#[test]
fn reading_relay_policy_addresses_a_relay_named_policy() {
    assert_eq!(
        Route::resolve(Operation::Read, "relay/policy").unwrap(),
        Route::Relay {
            name: "policy".into()
        }
    );
}

#[test]
fn unknown_paths_are_rejected() {
    for path in ["", "nope", "role/eng/extra", "project/web", "coderefs"] {
        let err = Route::resolve(Operation::Read, path).unwrap_err();
        assert!(
            matches!(err, BackendError::UnsupportedPath(_)),
            "{path:?} gave {err:?}"
        );
        assert_eq!(err.status_code(), 404);
    }
}

#[test]
fn unsupported_operations_are_rejected() {
    let cases = [
        (Operation::Delete, "info"),
        (Operation::Delete, "config"),
        (Operation::Read, "role"),
        (Operation::Update, "role/eng"),
        (Operation::Delete, "project/web/test"),
        (Operation::Create, "coderefs/repoa"),
    ];
    for (op, path) in cases {
        let err = Route::resolve(op, path).unwrap_err();
        assert!(
            matches!(err, BackendError::UnsupportedOperation { operation, .. } if operation == op),
            "{op} {path} gave {err:?}"
        );
        assert_eq!(err.status_code(), 405);
    }
}

#[test]
fn key_segments_follow_launchdarkly_key_rules() {
    for ok in ["a", "ab", "my-project", "my.project_2", "A_B", "x-y.z"] {
        assert!(key_segment("project", ok).is_ok(), "{ok:?}");
    }
    for bad in ["-a", "a-", ".a", "a.", "a b", "a@b", "ü", ""] {
        assert!(key_segment("project", bad).is_err(), "{bad:?}");
    }
}

#[test]
fn reset_type_parses_case_insensitively() {
    assert_eq!("SDK".parse::<KeyType>().unwrap(), KeyType::Sdk);
    assert_eq!("mobile".parse::<KeyType>().unwrap(), KeyType::Mobile);
    assert!("client".parse::<KeyType>().is_err());
}

#[tokio::test]
async fn info_reports_version_and_commit() {
    let env = TestEnv::new().await;
    let response = env.read("info").await.unwrap().unwrap();
    assert_eq!(
        serde_json::Value::Object(response.data),
        json!({ "version": VERSION, "commit": GIT_COMMIT })
    );
    assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn info_rejects_request_data() {
    let env = TestEnv::new().await;
    let err = env.read_with("info", json!({ "x": 1 })).await.unwrap_err();
    assert!(matches!(err, BackendError::UnknownFields(_)));
}

#[tokio::test]
async fn handle_request_reports_unsupported_operation() {
    let env = TestEnv::configured().await;
    let err = env.delete("info").await.unwrap_err();
    assert!(err.is_user_error());
    assert_eq!(err.to_string(), "unsupported operation delete on info");
}
