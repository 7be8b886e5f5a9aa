//! Engine-backed integration tests
//!
//! These exercise real containers and are ignored by default; run them on a
//! host with a reachable Docker engine via `cargo test -- --ignored`.

use std::time::Duration;

use runcell::config::ExecutorConfig;
use runcell::sandbox::{CodeExecutor, ContainerExecutor, ExecutionRequest, ExecutionStatus};

fn test_executor(scratch: &tempfile::TempDir) -> ContainerExecutor {
    let config = ExecutorConfig {
        scratch_root: scratch.path().to_path_buf(),
        ..ExecutorConfig::default()
    };
    ContainerExecutor::new(&config).expect("docker client")
}

fn scratch_is_empty(scratch: &tempfile::TempDir) -> bool {
    std::fs::read_dir(scratch.path())
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

#[tokio::test]
#[ignore]
async fn hello_world_completes_and_cleans_up() {
    let scratch = tempfile::tempdir().unwrap();
    let executor = test_executor(&scratch);

    let request = ExecutionRequest::new("print('hello')", "python");
    let result = executor.execute(request).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout.trim_end(), "hello");
    assert!(scratch_is_empty(&scratch), "workspace must not outlive the run");
}

#[tokio::test]
#[ignore]
async fn nonzero_exit_is_reported_not_raised() {
    let scratch = tempfile::tempdir().unwrap();
    let executor = test_executor(&scratch);

    let request = ExecutionRequest::new("import sys; sys.exit(2)", "python");
    let result = executor.execute(request).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, 2);
    assert!(scratch_is_empty(&scratch));
}

#[tokio::test]
#[ignore]
async fn deadline_terminates_hung_program() {
    let scratch = tempfile::tempdir().unwrap();
    let executor = test_executor(&scratch);

    let timeout = Duration::from_secs(2);
    let request = ExecutionRequest::new("import time; time.sleep(60)", "python")
        .with_timeout(timeout);
    let result = executor.execute(request).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::TimedOut);
    assert_ne!(result.exit_code, 0);
    // Elapsed time sits at the deadline boundary, within teardown latency
    assert!(result.execution_time >= timeout);
    assert!(result.execution_time < timeout + Duration::from_secs(10));
    assert!(scratch_is_empty(&scratch));
}

#[tokio::test]
#[ignore]
async fn partial_output_survives_timeout() {
    let scratch = tempfile::tempdir().unwrap();
    let executor = test_executor(&scratch);

    let code = "import sys, time\nprint('early', flush=True)\ntime.sleep(60)\n";
    let request = ExecutionRequest::new(code, "python").with_timeout(Duration::from_secs(3));
    let result = executor.execute(request).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::TimedOut);
    assert!(result.stdout.contains("early"));
    assert!(result.stderr.contains("timed out"));
}

#[tokio::test]
#[ignore]
async fn concurrent_sessions_are_disjoint() {
    let scratch = tempfile::tempdir().unwrap();
    let executor = std::sync::Arc::new(test_executor(&scratch));

    // Each program writes and reads only files in its own workspace; any
    // cross-session sharing would surface as unexpected directory entries
    let code = r#"
import os
entries = sorted(os.listdir('.'))
assert entries == ['code.py'], entries
print('isolated')
"#;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let executor = executor.clone();
        let request = ExecutionRequest::new(code, "python");
        handles.push(tokio::spawn(async move { executor.execute(request).await }));
    }

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
        assert!(result.stdout.contains("isolated"));
    }

    assert!(scratch_is_empty(&scratch));
}

#[tokio::test]
#[ignore]
async fn unknown_language_runs_generic_profile() {
    let scratch = tempfile::tempdir().unwrap();
    let executor = test_executor(&scratch);

    let request = ExecutionRequest::new("echo fallback", "klingon");
    let result = executor.execute(request).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.stdout.trim_end(), "fallback");
}

#[tokio::test]
#[ignore]
async fn probe_reports_available_engine() {
    let scratch = tempfile::tempdir().unwrap();
    let executor = test_executor(&scratch);
    assert!(executor.is_available().await);
}
