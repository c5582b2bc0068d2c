// tests/watch_registry.rs

//! The listing-diff state machine is driven directly here (no reliance
//! on notify event timing): tests create/delete entries on disk and
//! feed the ambiguous rename events the platform would deliver.

use std::ffi::OsStr;
use std::sync::Arc;

use devmirror::context::RunContext;
use devmirror::engine::RuntimeEvent;
use devmirror::scan::{self, Outcome};
use devmirror::watch::{spawn_watcher, RenameAction, WatchTree};
use devmirror_test_utils::builders::TempProject;
use devmirror_test_utils::{init_tracing, with_timeout};
use tokio::sync::mpsc;

async fn attached_tree(
    project: &TempProject,
) -> (WatchTree, Arc<RunContext>, mpsc::Receiver<RuntimeEvent>) {
    let ctx = project.ctx().watch(true).build();
    scan::mirror(&ctx.src_root, &ctx.dest_root, &ctx)
        .await
        .expect("initial mirror");

    let (rt_tx, rt_rx) = mpsc::channel(64);
    let mut tree = WatchTree::new(spawn_watcher(rt_tx).expect("spawn watcher"));
    tree.attach(&ctx.src_root, &ctx).await.expect("attach");
    (tree, ctx, rt_rx)
}

#[tokio::test]
async fn attach_tracks_directories_and_eligible_files() {
    with_timeout(async {
        init_tracing();

        let project = TempProject::new();
        project.write("a.ts", "let x: number = 1");
        project.write("b.css", "body {}");
        project.write("sub/c.ts", "let c: number = 3");

        let (tree, _ctx, _rx) = attached_tree(&project).await;

        // Root and sub are watched; only transpile-eligible files get
        // their own watch.
        assert_eq!(tree.watched_dirs(), 2);
        assert_eq!(tree.watched_files(), 2);
    })
    .await;
}

#[tokio::test]
async fn create_delete_cycles_leave_no_residual_bookkeeping() {
    with_timeout(async {
        init_tracing();

        let project = TempProject::new();
        project.write("a.ts", "let x: number = 1");

        let (mut tree, ctx, _rx) = attached_tree(&project).await;
        let ctx = &ctx;
        let base_dirs = tree.watched_dirs();
        let base_files = tree.watched_files();

        for i in 0..4 {
            let name = format!("new{i}.ts");
            project.write(&name, "let n: number = 0");
            let action = tree
                .process_rename(&ctx.src_root, OsStr::new(&name), ctx)
                .await
                .expect("process create");
            assert!(matches!(action, RenameAction::Created(_)));
            assert!(project.dest_exists(&format!("new{i}.js")));

            project.remove(&name);
            let action = tree
                .process_rename(&ctx.src_root, OsStr::new(&name), ctx)
                .await
                .expect("process delete");
            assert!(matches!(action, RenameAction::Removed(_)));
        }

        assert_eq!(tree.watched_dirs(), base_dirs);
        assert_eq!(tree.watched_files(), base_files);
    })
    .await;
}

#[tokio::test]
async fn created_directory_is_mirrored_and_watched_recursively() {
    with_timeout(async {
        init_tracing();

        let project = TempProject::new();
        project.write("a.ts", "let x: number = 1");

        let (mut tree, ctx, _rx) = attached_tree(&project).await;
        let ctx = &ctx;

        project.write("newdir/d.ts", "let d: number = 4");
        let action = tree
            .process_rename(&ctx.src_root, OsStr::new("newdir"), ctx)
            .await
            .expect("process create");
        assert!(matches!(action, RenameAction::Created(_)));

        assert_eq!(project.read_dest("newdir/d.js").as_deref(), Some("let d = 4"));
        assert_eq!(tree.watched_dirs(), 2);
        assert_eq!(tree.watched_files(), 2);

        project.remove("newdir");
        let action = tree
            .process_rename(&ctx.src_root, OsStr::new("newdir"), ctx)
            .await
            .expect("process delete");
        assert!(matches!(action, RenameAction::Removed(_)));

        // Descendant watches must be gone along with the directory's.
        assert_eq!(tree.watched_dirs(), 1);
        assert_eq!(tree.watched_files(), 1);
    })
    .await;
}

#[tokio::test]
async fn unchanged_content_suppresses_the_rebuild() {
    with_timeout(async {
        init_tracing();

        let project = TempProject::new();
        let src_file = project.write("a.ts", "let x: number = 1");

        let (mut tree, ctx, _rx) = attached_tree(&project).await;
        let ctx = &ctx;

        // The initial mirror already produced this output, so the first
        // change event is a no-op against the destination.
        let outcome = tree.process_change(&src_file, ctx).await.expect("change");
        assert_eq!(outcome, Some(Outcome::Unchanged));

        project.write("a.ts", "let x: number = 2");
        let outcome = tree.process_change(&src_file, ctx).await.expect("change");
        assert_eq!(outcome, Some(Outcome::Written));
        assert_eq!(project.read_dest("a.js").as_deref(), Some("let x = 2"));

        // Duplicate event for the same content: suppressed by the
        // source hash, without touching the destination.
        let outcome = tree.process_change(&src_file, ctx).await.expect("change");
        assert_eq!(outcome, Some(Outcome::Unchanged));
    })
    .await;
}

#[tokio::test]
async fn paths_outside_the_tree_are_ignored() {
    with_timeout(async {
        init_tracing();

        let project = TempProject::new();
        project.write("a.ts", "let x: number = 1");

        let (mut tree, ctx, _rx) = attached_tree(&project).await;
        let ctx = &ctx;

        let stray = project.path().join("outside.ts");
        let outcome = tree.process_change(&stray, ctx).await.expect("change");
        assert_eq!(outcome, None);

        let action = tree
            .process_rename(&project.path().join("elsewhere"), OsStr::new("x.ts"), ctx)
            .await
            .expect("rename");
        assert!(matches!(action, RenameAction::Ignored));
    })
    .await;
}

#[tokio::test]
async fn deleting_a_source_retains_its_generated_output() {
    with_timeout(async {
        init_tracing();

        let project = TempProject::new();
        project.write("a.ts", "let x: number = 1");
        project.write("b.ts", "let y: number = 2");

        let (mut tree, ctx, _rx) = attached_tree(&project).await;
        let ctx = &ctx;

        project.remove("a.ts");
        let action = tree
            .process_rename(&ctx.src_root, OsStr::new("a.ts"), ctx)
            .await
            .expect("process delete");
        assert!(matches!(action, RenameAction::Removed(_)));

        // Stale-output retention: the generated file stays in place.
        assert!(project.dest_exists("a.js"));
        assert_eq!(tree.watched_files(), 1);
    })
    .await;
}

#[tokio::test]
async fn close_all_empties_the_registry() {
    with_timeout(async {
        init_tracing();

        let project = TempProject::new();
        project.write("a.ts", "let x: number = 1");
        project.write("sub/c.ts", "let c: number = 3");

        let (mut tree, _ctx, _rx) = attached_tree(&project).await;
        assert!(tree.watched_dirs() > 0);

        tree.close_all();
        assert_eq!(tree.watched_dirs(), 0);
        assert_eq!(tree.watched_files(), 0);
    })
    .await;
}
