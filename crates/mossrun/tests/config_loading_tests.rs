//! Table-driven tests for configuration loading and validation.

mod common;

use std::io::Write;

use mossrun::config::{load_config, load_config_from_str};
use mossrun::{ConfigError, LanguageRegistry, ProcessorConfig};

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/srv/media/{job_id}/uploads"
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/srv/media/{job_id}/uploads",
            "database_path": "/var/lib/mossrun/mossrun.db",
            "worker_count": 4,
            "debug": true,
            "json_logs": true,
            "languages": [
                { "code": "PY", "name": "Python", "moss_name": "python", "extensions": ["py"] },
                { "code": "HS", "name": "Haskell", "moss_name": "haskell" }
            ],
            "retry": { "backoff_base": 1.2, "max_attempts": 10, "max_retry_duration_secs": 3600 },
            "moss": {
                "server": "moss.example.org",
                "port": 7691,
                "connect_timeout_secs": 5,
                "read_timeout_secs": 120,
                "http_timeout_secs": 10,
                "use_basename": false,
                "experimental": true,
                "comment": "CS101"
            },
            "defaults": { "max_until_ignored": 5, "max_displayed_matches": 100 }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "backoff_base_lower_bound",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/m/{job_id}",
            "retry": { "backoff_base": 1.0 }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "backoff_base_upper_bound",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/m/{job_id}",
            "retry": { "backoff_base": 2.0 }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "unsupported_version",
        config_json: r#"{ "version": "0.9", "upload_directory": "/m/{job_id}" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "missing_upload_directory",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: false,
        expected_error: Some("upload_directory"),
    },
    ConfigTestCase {
        name: "upload_directory_without_placeholder",
        config_json: r#"{ "version": "1.0", "upload_directory": "/srv/media/uploads" }"#,
        should_succeed: false,
        expected_error: Some("{job_id}"),
    },
    ConfigTestCase {
        name: "zero_workers",
        config_json: r#"{ "version": "1.0", "upload_directory": "/m/{job_id}", "worker_count": 0 }"#,
        should_succeed: false,
        expected_error: Some("worker_count"),
    },
    ConfigTestCase {
        name: "backoff_base_below_one",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/m/{job_id}",
            "retry": { "backoff_base": 0.5 }
        }"#,
        should_succeed: false,
        expected_error: Some("backoff_base"),
    },
    ConfigTestCase {
        name: "backoff_base_above_two",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/m/{job_id}",
            "retry": { "backoff_base": 3.0 }
        }"#,
        should_succeed: false,
        expected_error: Some("backoff_base"),
    },
    ConfigTestCase {
        name: "zero_attempts",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/m/{job_id}",
            "retry": { "max_attempts": 0 }
        }"#,
        should_succeed: false,
        expected_error: Some("max_attempts"),
    },
    ConfigTestCase {
        name: "zero_retry_duration",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/m/{job_id}",
            "retry": { "max_retry_duration_secs": 0 }
        }"#,
        should_succeed: false,
        expected_error: Some("max_retry_duration_secs"),
    },
    ConfigTestCase {
        name: "duplicate_language_code",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/m/{job_id}",
            "languages": [
                { "code": "JA", "name": "Java", "moss_name": "java" },
                { "code": "JA", "name": "Java 21", "moss_name": "java" }
            ]
        }"#,
        should_succeed: false,
        expected_error: Some("Duplicate language code"),
    },
    ConfigTestCase {
        name: "empty_moss_language",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/m/{job_id}",
            "languages": [ { "code": "PY", "name": "Python", "moss_name": " " } ]
        }"#,
        should_succeed: false,
        expected_error: Some("Empty MOSS language identifier"),
    },
    ConfigTestCase {
        name: "malformed_json",
        config_json: r#"{ "version": "1.0", "upload_directory": "#,
        should_succeed: false,
        expected_error: Some("Failed to parse config JSON"),
    },
];

#[test]
fn test_json_config_loading() {
    for test_case in CONFIG_TESTS {
        let result = load_config_from_str(test_case.config_json);

        if test_case.should_succeed {
            assert!(
                result.is_ok(),
                "Test '{}': Expected success but got error: {:?}",
                test_case.name,
                result.err()
            );
        } else {
            assert!(
                result.is_err(),
                "Test '{}': Expected error but got success",
                test_case.name
            );

            if let Some(expected_error) = test_case.expected_error {
                let error_msg = result.err().unwrap().to_string();
                assert!(
                    error_msg.contains(expected_error),
                    "Test '{}': Expected error containing '{}', got '{}'",
                    test_case.name,
                    expected_error,
                    error_msg
                );
            }
        }
    }
}

#[test]
fn test_full_config_reaches_processor() {
    let config = load_config_from_str(CONFIG_TESTS[1].config_json).unwrap();
    let processor = ProcessorConfig::from_config(&config);

    assert_eq!(processor.languages.moss_language("HS"), Some("haskell"));
    assert_eq!(processor.languages.moss_language("CP"), None);
    assert_eq!(processor.policy.base, 1.2);
    assert_eq!(processor.policy.max_attempts, 10);
    assert_eq!(processor.policy.max_total.as_secs(), 3600);
    assert!(!processor.use_basename);
    assert_eq!(processor.default_comment, "CS101");
    assert!(processor.debug);
    assert_eq!(
        processor.upload_root("abc"),
        std::path::PathBuf::from("/srv/media/abc/uploads")
    );
}

#[test]
fn test_default_languages_cover_moss_identifiers() {
    let config = load_config_from_str(CONFIG_TESTS[0].config_json).unwrap();
    let registry = LanguageRegistry::new(&config.languages);

    for (code, moss) in [
        ("PY", "python"),
        ("JA", "java"),
        ("CP", "cc"),
        ("CX", "c"),
        ("CS", "csharp"),
        ("JS", "javascript"),
        ("PL", "perl"),
        ("MP", "mips"),
    ] {
        assert_eq!(registry.moss_language(code), Some(moss), "language {}", code);
    }
    assert_eq!(registry.moss_language("RB"), None);
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG_TESTS[0].config_json.as_bytes()).unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.upload_directory, "/srv/media/{job_id}/uploads");
}

#[test]
fn test_load_config_missing_file() {
    let harness = common::TestHarness::new();
    let err = load_config(harness.root().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}
