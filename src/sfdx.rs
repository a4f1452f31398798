//! Helpers for talking to the Salesforce CLI.

use pipeline::{CommandFailure, CommandOutput, ShellOptions, SuppressPolicy};
use serde::Deserialize;

/// Message the CLI reports when a permission set is already assigned.
const DUPLICATE_ASSIGNMENT: &str = "Duplicate PermissionSetAssignment";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Command produced no JSON output")]
    NoJson,
    #[error("Unexpected query result shape: {0}")]
    BadQueryResult(#[source] serde_json::Error),
    #[error("Query returned no records")]
    NoRecords,
}

/// Make `command` produce machine-readable output, so `on_success`
/// callbacks and suppression predicates can inspect it.
pub fn json_command(command: &str) -> String {
    format!("{command} --json")
}

#[derive(Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Deserialize)]
struct QueryResult {
    records: Vec<QueryRecord>,
}

#[derive(Deserialize)]
struct QueryRecord {
    #[serde(rename = "Id")]
    id: String,
}

/// Pull `result.records[0].Id` out of `sf data query --json` output.
pub fn first_record_id(output: &CommandOutput) -> Result<String, Error> {
    let json = output.stdout_json.as_ref().ok_or(Error::NoJson)?;
    let response = QueryResponse::deserialize(json).map_err(Error::BadQueryResult)?;
    response
        .result
        .records
        .into_iter()
        .next()
        .map(|record| record.id)
        .ok_or(Error::NoRecords)
}

/// True if a failed `sf org assign permset` only failed because
/// the permission sets were already assigned.
pub fn is_duplicate_permset_assignment(failure: &CommandFailure) -> bool {
    let output = failure.output;
    let failures = output
        .stdout_json
        .as_ref()
        .and_then(|json| json.pointer("/result/failures"))
        .and_then(|failures| failures.as_array());

    let duplicate = match failures {
        Some(failures) if !failures.is_empty() => failures.iter().all(|f| {
            f.get("message")
                .and_then(|m| m.as_str())
                .is_some_and(|m| m.contains(DUPLICATE_ASSIGNMENT))
        }),
        _ => output.stdout.contains(DUPLICATE_ASSIGNMENT) || output.stderr.contains(DUPLICATE_ASSIGNMENT),
    };
    if duplicate {
        log::debug!("`{}` failed on a duplicate assignment", failure.command);
    }
    duplicate
}

/// Suppress failures that are only duplicate permission set assignments.
pub fn suppress_duplicate_assignments() -> SuppressPolicy {
    SuppressPolicy::when(is_duplicate_permset_assignment)
}

/// Options used by most `sf` tasks: fail the pipeline, and show output when doing so.
pub fn strict() -> ShellOptions {
    ShellOptions::default()
        .suppress(SuppressPolicy::Never)
        .render_stdio_on_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput::new(Some(code), stdout.into(), stderr.into())
    }

    fn is_dup(output: &CommandOutput) -> bool {
        is_duplicate_permset_assignment(&CommandFailure {
            command: "sf org assign permset -n AFDX_User_Perms --json",
            output,
        })
    }

    #[test]
    fn test_json_command() {
        assert_eq!(
            json_command("sf org assign permset -n AFDX_User_Perms"),
            "sf org assign permset -n AFDX_User_Perms --json"
        );
    }

    #[test]
    fn test_first_record_id() {
        let out = output(
            0,
            r#"{"status": 0, "result": {"records": [{"attributes": {"type": "Profile"}, "Id": "00e5g000000ABCD"}], "totalSize": 1, "done": true}}"#,
            "",
        );
        assert_eq!(first_record_id(&out).unwrap(), "00e5g000000ABCD");

        let empty = output(0, r#"{"status": 0, "result": {"records": [], "totalSize": 0}}"#, "");
        assert!(matches!(first_record_id(&empty), Err(Error::NoRecords)));

        assert!(matches!(first_record_id(&output(0, "text", "")), Err(Error::NoJson)));
        assert!(matches!(
            first_record_id(&output(0, r#"{"result": 3}"#, "")),
            Err(Error::BadQueryResult(_))
        ));
    }

    #[test]
    fn test_duplicate_assignment_json() {
        let dup = output(
            1,
            r#"{"status": 1, "result": {"successes": [], "failures": [
                {"name": "AFDX_User_Perms", "message": "Duplicate PermissionSetAssignment:  Assignee=0055g00000ABCDE, PermissionSet=0PS5g000000XYZ"}
            ]}}"#,
            "",
        );
        assert!(is_dup(&dup));

        let mixed = output(
            1,
            r#"{"status": 1, "result": {"successes": [], "failures": [
                {"name": "A", "message": "Duplicate PermissionSetAssignment: ..."},
                {"name": "B", "message": "Permission set not found"}
            ]}}"#,
            "",
        );
        assert!(!is_dup(&mixed));

        let other = output(1, r#"{"status": 1, "result": {"failures": []}, "message": "No default org"}"#, "");
        assert!(!is_dup(&other));
    }

    #[test]
    fn test_duplicate_assignment_text() {
        assert!(is_dup(&output(1, "", "Error: Duplicate PermissionSetAssignment")));
        assert!(!is_dup(&output(1, "", "Error: No default org set")));
    }
}
