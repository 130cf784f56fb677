//! Integration tests for CLI commands

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Helper to run the berth binary
fn berth(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_berth"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("BERTH_NAMESPACE")
        .env_remove("BERTH_MAX_INPUT_SIZE")
        .output()
        .expect("Failed to execute berth")
}

/// Get a fixture path
fn fixture(name: &str) -> String {
    format!("{}/{}", concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures"), name)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("Output should be valid JSON")
}

mod convert_command {
    use super::*;

    #[test]
    fn test_convert_to_stdout_stream() {
        let output = berth(&["convert", &fixture("web.yml")]);
        assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

        let stream = stdout(&output);
        let kinds: Vec<String> = stream
            .split("\n---\n")
            .map(|doc| {
                let value: serde_yaml::Value = serde_yaml::from_str(doc).unwrap();
                value["kind"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(kinds, vec!["Deployment", "Service", "ConfigMap"]);
        assert!(stream.contains("value: production"));
    }

    #[test]
    fn test_convert_json_result() {
        let output = berth(&["convert", &fixture("stack.yml"), "--json"]);
        assert_eq!(output.status.code(), Some(0));

        let result = json(&output);
        assert_eq!(result["success"], true);
        assert_eq!(result["files"].as_array().unwrap().len(), 9);
        assert_eq!(result["metadata"]["services_converted"], 3);
        assert_eq!(result["metadata"]["volumes_converted"], 1);
        assert_eq!(result["metadata"]["compose_version"], "3.9");

        let codes: Vec<&str> = result["warnings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["code"].as_str().unwrap())
            .collect();
        assert!(codes.contains(&"UNSUPPORTED_DEPENDS_ON"));
        assert!(codes.contains(&"UNSUPPORTED_NETWORKS"));
        assert!(codes.contains(&"SECRET_IN_ENVIRONMENT"));
    }

    #[test]
    fn test_convert_warnings_go_to_stderr() {
        let output = berth(&["convert", &fixture("stack.yml")]);
        assert!(output.status.success());
        assert!(stderr(&output).contains("UNSUPPORTED_DEPENDS_ON"));
        assert!(!stdout(&output).contains("UNSUPPORTED_DEPENDS_ON"));
    }

    #[test]
    fn test_convert_partial_success() {
        let output = berth(&["convert", &fixture("partial.yml"), "--json"]);
        assert_eq!(output.status.code(), Some(1));

        let result = json(&output);
        assert_eq!(result["success"], false);
        let codes: Vec<&str> = result["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["MISSING_IMAGE", "UNSUPPORTED_VOLUME_DRIVER"]);
        assert!(
            result["files"]
                .as_array()
                .unwrap()
                .iter()
                .any(|f| f["name"] == "cache-deployment.yaml")
        );
    }

    #[test]
    fn test_convert_parse_error() {
        let output = berth(&["convert", &fixture("invalid.yml")]);
        assert_eq!(output.status.code(), Some(2));
        assert!(stdout(&output).is_empty());
        assert!(stderr(&output).contains("PARSE_ERROR"));
    }

    #[test]
    fn test_convert_from_stdin() {
        let mut child = Command::new(env!("CARGO_BIN_EXE_berth"))
            .args(["convert", "-", "--namespace", "staging"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn berth");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(b"services:\n  worker:\n    image: busybox\n")
            .unwrap();
        let output = child.wait_with_output().unwrap();

        assert!(output.status.success());
        let stream = stdout(&output);
        assert!(stream.contains("kind: Deployment"));
        assert!(stream.contains("namespace: staging"));
    }

    #[test]
    fn test_convert_options_from_env() {
        let output = Command::new(env!("CARGO_BIN_EXE_berth"))
            .args(["convert", &fixture("web.yml")])
            .env("BERTH_NAMESPACE", "from-env")
            .env("BERTH_SERVICE_TYPE", "NodePort")
            .output()
            .unwrap();
        assert!(output.status.success());
        let stream = stdout(&output);
        assert!(stream.contains("namespace: from-env"));
        assert!(stream.contains("type: NodePort"));
    }

    #[test]
    fn test_convert_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("manifests");
        let out_str = out.to_str().unwrap();

        let output = berth(&["convert", &fixture("stack.yml"), "-o", out_str]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).is_empty());
        assert!(out.join("deployments/api-deployment.yaml").is_file());
        assert!(out.join("services/web-service.yaml").is_file());
        assert!(out.join("pvcs/db-pvc-0.yaml").is_file());
        assert!(out.join("volumes/pgdata-pv.yaml").is_file());

        let again = berth(&["convert", &fixture("stack.yml"), "-o", out_str]);
        assert_eq!(again.status.code(), Some(64));
        assert!(stderr(&again).contains("not empty"));

        let forced = berth(&["convert", &fixture("stack.yml"), "-o", out_str, "--force"]);
        assert!(forced.status.success());
    }

    #[test]
    fn test_convert_rejects_path_like_service_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a/out");
        let mut child = Command::new(env!("CARGO_BIN_EXE_berth"))
            .args(["convert", "-", "-o", out.to_str().unwrap()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn berth");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(b"services:\n  ../../escaped:\n    image: nginx\n")
            .unwrap();
        let output = child.wait_with_output().unwrap();

        assert_eq!(output.status.code(), Some(2));
        assert!(stderr(&output).contains("PARSE_ERROR"));
        assert!(!dir.path().join("escaped-deployment.yaml").exists());
        assert!(!dir.path().join("a/escaped-deployment.yaml").exists());
    }

    #[test]
    fn test_convert_unknown_type() {
        let output = berth(&["convert", &fixture("web.yml"), "--type", "helm"]);
        assert_eq!(output.status.code(), Some(64));
        assert!(stderr(&output).contains("docker-compose"));
    }

    #[test]
    fn test_convert_missing_file() {
        let output = berth(&["convert", &fixture("does-not-exist.yml")]);
        assert_eq!(output.status.code(), Some(5));
    }

    #[test]
    fn test_convert_input_too_large() {
        let output = berth(&["convert", &fixture("stack.yml"), "--max-size", "16"]);
        assert_eq!(output.status.code(), Some(64));
        assert!(stderr(&output).contains("maximum size"));
    }

    #[test]
    fn test_convert_bad_label() {
        let output = berth(&["convert", &fixture("web.yml"), "--label", "novalue"]);
        assert_eq!(output.status.code(), Some(64));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_valid_document() {
        let output = berth(&["validate", &fixture("stack.yml")]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("is a valid docker-compose document"));
    }

    #[test]
    fn test_validate_invalid_document() {
        let output = berth(&["validate", &fixture("invalid.yml")]);
        assert_eq!(output.status.code(), Some(2));
        assert!(stderr(&output).contains("environment"));
    }

    #[test]
    fn test_validate_json_output_with_errors() {
        let output = berth(&["validate", &fixture("invalid.yml"), "--json"]);
        assert_eq!(output.status.code(), Some(2));

        let result = json(&output);
        assert_eq!(result["valid"], false);
        assert_eq!(result["errors"][0]["code"], "PARSE_ERROR");
        assert_eq!(result["errors"][0]["field"], "services.web.environment");
    }
}

mod types_command {
    use super::*;

    #[test]
    fn test_types_lists_compose() {
        let output = berth(&["types"]);
        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("docker-compose-to-kubernetes"));
        assert!(out.contains("docker-compose, compose"));
    }

    #[test]
    fn test_types_json() {
        let output = berth(&["types", "--json"]);
        let converters = json(&output);
        assert_eq!(converters[0]["types"][1], "compose");
    }
}

#[test]
fn test_usage_error_exit_code() {
    let output = berth(&["convert"]);
    assert_eq!(output.status.code(), Some(64));
}
