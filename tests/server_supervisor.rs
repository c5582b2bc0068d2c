// tests/server_supervisor.rs

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use devmirror::errors::DevmirrorError;
use devmirror::server::{process_alive, PidLease, ServerState, ServerSupervisor};
use devmirror_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;

/// Write a fake server script that stays alive until terminated.
///
/// `exec` makes the script process *be* the sleep, so a termination
/// request reaches it directly.
fn write_server_script(dir: &Path) -> PathBuf {
    let path = dir.join("server.sh");
    fs::write(&path, "echo started >> starts.log\nexec sleep 30\n").expect("write script");
    path
}

fn supervisor(dir: &TempDir) -> ServerSupervisor {
    let script = write_server_script(dir.path());
    let mut sup = ServerSupervisor::new(
        Some(script),
        Some(dir.path().to_path_buf()),
        None,
    );
    sup.set_runner("sh");
    sup
}

#[tokio::test]
async fn start_and_stop_manage_the_pid_record() {
    with_timeout(async {
        init_tracing();

        let dir = TempDir::new().unwrap();
        let mut sup = supervisor(&dir);

        sup.start().await.expect("start");
        assert_eq!(sup.state(), ServerState::Running);

        let pid = sup.current_pid().expect("pid of running server");
        assert!(process_alive(pid));
        assert_eq!(sup.lease().read().expect("read lease"), Some(pid));

        sup.stop().await.expect("stop");
        assert_eq!(sup.state(), ServerState::Stopped);
        assert_eq!(sup.lease().read().expect("read lease"), None);
        assert!(!process_alive(pid));
    })
    .await;
}

#[tokio::test]
async fn consecutive_restarts_leave_exactly_one_live_process() {
    with_timeout(async {
        init_tracing();

        let dir = TempDir::new().unwrap();
        let mut sup = supervisor(&dir);

        sup.start().await.expect("start");
        let first = sup.current_pid().unwrap();

        sup.restart().await.expect("restart once");
        sup.restart().await.expect("restart twice");

        let last = sup.current_pid().unwrap();
        assert_ne!(first, last);
        assert!(!process_alive(first));
        assert!(process_alive(last));

        // The pid record always names the currently live process.
        assert_eq!(sup.lease().read().expect("read lease"), Some(last));

        sup.stop().await.expect("stop");
    })
    .await;
}

#[tokio::test]
async fn orphan_reclamation_terminates_a_live_recorded_process() {
    with_timeout(async {
        init_tracing();

        let dir = TempDir::new().unwrap();

        // Simulate a crashed prior run: a live process whose pid is in
        // the record with nobody supervising it.
        let mut orphan = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn orphan");
        let pid = orphan.id().expect("orphan pid");
        // Reap it once it dies so the liveness probe sees it gone.
        tokio::spawn(async move {
            let _ = orphan.wait().await;
        });

        let lease = PidLease::new(dir.path());
        lease.acquire(pid).expect("record orphan pid");

        let sup = ServerSupervisor::new(None, Some(dir.path().to_path_buf()), None);
        sup.reclaim_orphan().await.expect("reclaim");

        assert!(!process_alive(pid));
        assert_eq!(lease.read().expect("read lease"), None);
    })
    .await;
}

#[tokio::test]
async fn stale_pid_record_is_cleared_without_blocking() {
    with_timeout(async {
        init_tracing();

        let dir = TempDir::new().unwrap();

        // A process that has already exited and been reaped.
        let mut done = tokio::process::Command::new("sh")
            .arg("-c")
            .arg("exit 0")
            .spawn()
            .expect("spawn short-lived process");
        let pid = done.id().expect("pid");
        done.wait().await.expect("wait");

        let lease = PidLease::new(dir.path());
        lease.acquire(pid).expect("record stale pid");

        let sup = ServerSupervisor::new(None, Some(dir.path().to_path_buf()), None);
        sup.reclaim_orphan().await.expect("reclaim stale");
        assert_eq!(lease.read().expect("read lease"), None);
    })
    .await;
}

#[tokio::test]
async fn spawn_failure_surfaces_and_leaves_supervisor_stopped() {
    with_timeout(async {
        init_tracing();

        let dir = TempDir::new().unwrap();
        let script = write_server_script(dir.path());
        let mut sup = ServerSupervisor::new(
            Some(script),
            Some(dir.path().to_path_buf()),
            None,
        );
        sup.set_runner("devmirror-no-such-runner");

        let err = sup.start().await.expect_err("spawn must fail");
        assert!(matches!(err, DevmirrorError::Spawn(_)));
        assert_eq!(sup.state(), ServerState::Stopped);
        assert_eq!(sup.lease().read().expect("read lease"), None);
    })
    .await;
}

#[tokio::test]
async fn start_without_server_file_is_a_noop() {
    with_timeout(async {
        init_tracing();

        let dir = TempDir::new().unwrap();
        let mut sup = ServerSupervisor::new(None, Some(dir.path().to_path_buf()), None);

        sup.start().await.expect("noop start");
        assert_eq!(sup.state(), ServerState::Stopped);
        assert_eq!(sup.lease().read().expect("read lease"), None);

        sup.stop().await.expect("noop stop");
    })
    .await;
}
