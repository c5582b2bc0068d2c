// tests/hook_runner.rs

#![cfg(unix)]

use std::fs;
use std::path::PathBuf;

use devmirror::errors::DevmirrorError;
use devmirror::hooks::{parse_hook, HookRunner};
use devmirror_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;

fn runner(cwd: &TempDir, raw_hooks: &[&str]) -> HookRunner {
    let hooks = raw_hooks.iter().map(|raw| parse_hook(raw)).collect();
    HookRunner::new(hooks, Some(cwd.path().to_path_buf()))
}

fn log_path(cwd: &TempDir) -> PathBuf {
    cwd.path().join("log.txt")
}

#[tokio::test]
async fn init_runs_every_hook_in_declared_order() {
    with_timeout(async {
        init_tracing();

        let cwd = TempDir::new().unwrap();
        let runner = runner(
            &cwd,
            &[
                "echo one >> log.txt",
                "echo two >> log.txt",
                "echo bound >> log.txt#watch:trigger.txt",
            ],
        );

        runner.run_init().await.expect("init pass");

        let log = fs::read_to_string(log_path(&cwd)).expect("read log");
        assert_eq!(log, "one\ntwo\nbound\n");
    })
    .await;
}

#[tokio::test]
async fn update_runs_global_hooks_only() {
    with_timeout(async {
        init_tracing();

        let cwd = TempDir::new().unwrap();
        let runner = runner(
            &cwd,
            &[
                "echo global >> log.txt",
                "echo bound >> log.txt#watch:trigger.txt",
            ],
        );

        runner
            .run_update(&cwd.path().join("whatever.ts"))
            .await
            .expect("update pass");

        let log = fs::read_to_string(log_path(&cwd)).expect("read log");
        assert_eq!(log, "global\n");
    })
    .await;
}

#[tokio::test]
async fn failing_hook_aborts_the_remaining_hooks() {
    with_timeout(async {
        init_tracing();

        let cwd = TempDir::new().unwrap();
        let runner = runner(&cwd, &["exit 3", "echo after >> log.txt"]);

        let err = runner.run_init().await.expect_err("hook should fail");
        match err {
            DevmirrorError::Hook { command, exit_code } => {
                assert_eq!(command, "exit 3");
                assert_eq!(exit_code, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(!log_path(&cwd).exists(), "later hooks must not have run");
    })
    .await;
}

#[tokio::test]
async fn run_hook_executes_a_single_hook_by_index() {
    with_timeout(async {
        init_tracing();

        let cwd = TempDir::new().unwrap();
        let runner = runner(
            &cwd,
            &[
                "echo zero >> log.txt",
                "echo one >> log.txt#watch:trigger.txt",
            ],
        );

        runner.run_hook(1).await.expect("run bound hook");
        let log = fs::read_to_string(log_path(&cwd)).expect("read log");
        assert_eq!(log, "one\n");

        // Out-of-range indices are ignored, not fatal.
        runner.run_hook(42).await.expect("out of range is a no-op");
    })
    .await;
}

#[tokio::test]
async fn hooks_run_in_the_configured_working_directory() {
    with_timeout(async {
        init_tracing();

        let cwd = TempDir::new().unwrap();
        let runner = runner(&cwd, &["pwd > log.txt"]);

        runner.run_init().await.expect("init pass");

        let log = fs::read_to_string(log_path(&cwd)).expect("read log");
        let reported = PathBuf::from(log.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            cwd.path().canonicalize().unwrap()
        );
    })
    .await;
}
