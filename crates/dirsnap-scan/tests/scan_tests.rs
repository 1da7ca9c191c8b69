use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dirsnap_scan::{
    FileInfo, MemoryFs, ScanConfig, ScanEngine, ScanError, ScanEvent, ScanOptions, TreeNode,
    WarningKind, shared, start_scan, start_scan_with_cancel,
};
use tokio_util::sync::CancellationToken;

/// /data
/// ├── A/            (dir)
/// │   └── z.txt
/// ├── a_link -> /elsewhere
/// ├── b.txt         (10 bytes)
/// └── deep/one/two/three/leaf.txt
fn example_fs() -> MemoryFs {
    let fs = MemoryFs::new();
    fs.add_file("/data/b.txt", 10);
    fs.add_file("/data/A/z.txt", 2);
    fs.add_file("/elsewhere/inner/x.txt", 1);
    fs.add_symlink("/data/a_link", "/elsewhere");
    fs.add_file("/data/deep/one/two/three/leaf.txt", 5);
    fs.add_file("/data/deep/one/sibling.txt", 5);
    fs.add_file("/data/deep/one/two/zz.txt", 5);
    fs.add_file("/data/zeta/last.txt", 5);
    fs
}

fn root_of(engine: &ScanEngine<MemoryFs>, path: &str) -> TreeNode {
    TreeNode::new(engine.inspect(Path::new(path)))
}

fn child_names(node: &TreeNode) -> Vec<String> {
    node.children()
        .iter()
        .map(|c| c.info().name().to_string())
        .collect()
}

fn assert_sorted_everywhere(node: &TreeNode) {
    for pair in node.children().windows(2) {
        assert_eq!(
            pair[0].info().cmp_path(pair[1].info()),
            std::cmp::Ordering::Less,
            "{} should sort before {}",
            pair[0].info().path().display(),
            pair[1].info().path().display()
        );
    }
    for child in node.children() {
        assert_sorted_everywhere(child);
    }
}

#[test]
fn test_example_scenario_non_recursive() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");

    let mut options = ScanOptions::new().recursive(false);
    engine.scan(&mut root, &mut options).unwrap();

    assert_eq!(child_names(&root), vec!["A", "a_link", "b.txt", "deep", "zeta"]);
    assert!(root.children().iter().all(TreeNode::is_leaf));
    assert_eq!(root.children()[2].info().size(), Some(10));
}

#[test]
fn test_example_scenario_recursive() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");

    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();

    assert_eq!(child_names(&root), vec!["A", "a_link", "b.txt", "deep", "zeta"]);
    assert_eq!(child_names(&root.children()[0]), vec!["z.txt"]);

    let link = &root.children()[1];
    assert!(link.info().is_dir());
    assert!(link.info().is_symlink());
    assert_eq!(link.child_count(), 0);
}

#[test]
fn test_determinism_across_scans() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut first = root_of(&engine, "/data");
    let mut second = root_of(&engine, "/data");

    engine.scan(&mut first, &mut ScanOptions::new()).unwrap();
    engine.scan(&mut second, &mut ScanOptions::new()).unwrap();

    assert_sorted_everywhere(&first);
    assert_eq!(first, second);
}

#[test]
fn test_idempotent_refresh() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");

    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();
    let before = root.clone();
    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();

    assert_eq!(root, before);
    assert_eq!(root.descendant_count(), before.descendant_count());
}

#[test]
fn test_refresh_drops_stale_entries() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");
    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();
    assert!(root.find(Path::new("/data/A/z.txt")).is_some());

    engine.fs().remove("/data/A");
    engine.fs().add_file("/data/new.txt", 1);
    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();

    assert!(root.find(Path::new("/data/A")).is_none());
    assert!(root.find(Path::new("/data/A/z.txt")).is_none());
    assert!(root.find(Path::new("/data/new.txt")).is_some());
}

#[test]
fn test_filter_excludes_and_prunes() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");
    let listed = RefCell::new(Vec::new());

    let mut options = ScanOptions::new()
        .filter(|info| info.name() != "deep")
        .on_before_scan_dir(|dir| {
            listed.borrow_mut().push(dir.path().to_path_buf());
            Ok(())
        });
    let report = engine.scan(&mut root, &mut options).unwrap();
    drop(options);

    assert!(root.iter().all(|n| !n.info().path().starts_with("/data/deep")));
    assert!(
        listed
            .borrow()
            .iter()
            .all(|p| !p.starts_with("/data/deep"))
    );
    assert_eq!(report.entries_filtered, 1);
}

#[test]
fn test_hook_runs_before_each_directory_in_order() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");
    let mut listed = Vec::new();

    let mut options = ScanOptions::new().on_before_scan_dir(|dir| {
        listed.push(dir.path().to_path_buf());
        Ok(())
    });
    engine.scan(&mut root, &mut options).unwrap();
    drop(options);

    let expected: Vec<PathBuf> = [
        "/data",
        "/data/A",
        "/data/deep",
        "/data/deep/one",
        "/data/deep/one/two",
        "/data/deep/one/two/three",
        "/data/zeta",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    assert_eq!(listed, expected);
}

#[test]
fn test_missing_entry_does_not_fail_scan() {
    let fs = example_fs();
    fs.add_vanishing("/data/ghost");
    let engine = ScanEngine::with_fs(fs);
    let mut root = root_of(&engine, "/data");

    let report = engine.scan(&mut root, &mut ScanOptions::new()).unwrap();

    let ghost = root.find(Path::new("/data/ghost")).unwrap();
    assert!(!ghost.info().exists());
    assert!(!ghost.info().is_dir());
    assert_eq!(ghost.info().size(), None);
    assert_eq!(ghost.info().modified(), None);
    assert!(ghost.is_leaf());
    assert_eq!(report.entries_missing, 1);
}

#[test]
fn test_failure_three_levels_deep_unwinds_to_root() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");
    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();
    assert!(root.child_count() > 0);

    engine
        .fs()
        .fail_listing("/data/deep/one/two", io::ErrorKind::PermissionDenied);
    let mut listed = Vec::new();
    let mut options = ScanOptions::new().on_before_scan_dir(|dir| {
        listed.push(dir.path().to_path_buf());
        Ok(())
    });
    let err = engine.scan(&mut root, &mut options).unwrap_err();
    drop(options);

    assert!(matches!(
        err,
        ScanError::PermissionDenied { ref path } if path == Path::new("/data/deep/one/two")
    ));
    // Neither the previous snapshot nor the partial rebuild survives.
    assert!(root.is_leaf());
    // Directories after the failing branch were never visited.
    assert_eq!(listed.last().unwrap(), Path::new("/data/deep/one/two"));
    assert!(!listed.contains(&PathBuf::from("/data/zeta")));
}

#[test]
fn test_keep_going_tolerates_nested_failure() {
    let fs = example_fs();
    fs.fail_listing("/data/deep/one/two", io::ErrorKind::PermissionDenied);
    let engine = ScanEngine::with_fs(fs);
    let mut root = root_of(&engine, "/data");

    let mut options = ScanOptions::new().abort_on_child_error(false);
    let report = engine.scan(&mut root, &mut options).unwrap();

    let failed = root.find(Path::new("/data/deep/one/two")).unwrap();
    assert!(failed.is_leaf());
    assert!(root.find(Path::new("/data/deep/one/sibling.txt")).is_some());
    assert!(root.find(Path::new("/data/zeta/last.txt")).is_some());

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::PermissionDenied);
    assert_eq!(report.warnings[0].path, PathBuf::from("/data/deep/one/two"));
}

#[test]
fn test_keep_going_still_fails_at_root() {
    let fs = example_fs();
    fs.fail_listing("/data", io::ErrorKind::PermissionDenied);
    let engine = ScanEngine::with_fs(fs);
    let mut root = root_of(&engine, "/data");

    let mut options = ScanOptions::new().abort_on_child_error(false);
    let err = engine.scan(&mut root, &mut options).unwrap_err();

    assert!(err.is_listing());
    assert!(root.is_leaf());
}

#[test]
fn test_hook_failure_skips_listing() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");

    let mut options =
        ScanOptions::new().on_before_scan_dir(|dir| Err(ScanError::hook(dir.path(), "denied")));
    let err = engine.scan(&mut root, &mut options).unwrap_err();

    assert!(matches!(err, ScanError::Hook { .. }));
    assert!(root.is_leaf());
}

#[test]
fn test_nested_hook_rejection_becomes_warning() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");

    let mut options = ScanOptions::new()
        .abort_on_child_error(false)
        .on_before_scan_dir(|dir| {
            if dir.name() == "A" {
                Err(ScanError::hook(dir.path(), "off limits"))
            } else {
                Ok(())
            }
        });
    let report = engine.scan(&mut root, &mut options).unwrap();

    assert!(root.find(Path::new("/data/A")).unwrap().is_leaf());
    assert_eq!(report.warnings[0].kind, WarningKind::HookRejected);
}

#[test]
fn test_interrupt_aborts_even_when_keeping_going() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");

    let mut options = ScanOptions::new()
        .abort_on_child_error(false)
        .on_before_scan_dir(|dir| {
            if dir.name() == "deep" {
                Err(ScanError::Interrupted)
            } else {
                Ok(())
            }
        });
    let err = engine.scan(&mut root, &mut options).unwrap_err();

    assert!(matches!(err, ScanError::Interrupted));
    assert!(root.is_leaf());
}

#[test]
fn test_snapshot_applies_config_filters() {
    let fs = example_fs();
    fs.add_file("/data/.hidden", 1);
    fs.add_file("/data/A/debug.log", 1);
    let engine = ScanEngine::with_fs(fs);

    let config = ScanConfig::builder()
        .root("/data")
        .include_hidden(false)
        .ignore_patterns(vec!["*.log".to_string()])
        .build()
        .unwrap();
    let snapshot = engine.snapshot(&config).unwrap();

    assert!(snapshot.root.find(Path::new("/data/.hidden")).is_none());
    assert!(snapshot.root.find(Path::new("/data/A/debug.log")).is_none());
    assert_eq!(snapshot.stats.total_symlinks, 1);
    assert_eq!(snapshot.stats.max_depth, 5);
}

#[test]
fn test_scan_shared_rescans_one_subtree() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut root = root_of(&engine, "/data");
    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();
    let tree = shared(root);

    engine.fs().add_file("/data/A/new.txt", 3);
    engine
        .scan_shared(&tree, Path::new("/data/A"), &mut ScanOptions::new())
        .unwrap();

    let guard = tree.read().unwrap();
    assert_eq!(
        child_names(guard.find(Path::new("/data/A")).unwrap()),
        vec!["new.txt", "z.txt"]
    );
    assert!(guard.find(Path::new("/data/zeta/last.txt")).is_some());
}

#[test]
fn test_scan_shared_unknown_node() {
    let engine = ScanEngine::with_fs(example_fs());
    let tree = shared(root_of(&engine, "/data"));

    let err = engine
        .scan_shared(&tree, Path::new("/data/A"), &mut ScanOptions::new())
        .unwrap_err();
    assert!(matches!(err, ScanError::NodeNotFound { .. }));
}

#[tokio::test]
async fn test_background_scan_completes() {
    let engine = Arc::new(ScanEngine::with_fs(example_fs()));
    let tree = shared(root_of(&engine, "/data"));

    let handle = start_scan(engine, tree.clone(), ScanConfig::new("/data"));
    let report = handle.finish().await.unwrap();

    assert_eq!(report.dirs_scanned, 7);
    let guard = tree.read().unwrap();
    assert_eq!(child_names(&guard), vec!["A", "a_link", "b.txt", "deep", "zeta"]);
}

#[tokio::test]
async fn test_background_scan_cancelled_keeps_previous_children() {
    let engine = Arc::new(ScanEngine::with_fs(example_fs()));
    let mut root = root_of(&engine, "/data");
    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();
    let before = root.clone();
    let tree = shared(root);

    engine.fs().add_file("/data/later.txt", 1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut handle = start_scan_with_cancel(engine, tree.clone(), ScanConfig::new("/data"), cancel);
    let mut outcome = None;
    while let Some(event) = handle.recv().await {
        if let ScanEvent::Complete(result) = event {
            outcome = Some(result);
        }
    }

    assert!(matches!(outcome, Some(Err(ScanError::Interrupted))));
    assert_eq!(*tree.read().unwrap(), before);
}

#[tokio::test]
async fn test_failed_background_scan_empties_node() {
    let engine = Arc::new(ScanEngine::with_fs(example_fs()));
    let mut root = root_of(&engine, "/data");
    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();
    let tree = shared(root);

    engine.fs().fail_listing("/data/zeta", io::ErrorKind::PermissionDenied);
    let err = start_scan(engine, tree.clone(), ScanConfig::new("/data"))
        .finish()
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::PermissionDenied { .. }));
    assert!(tree.read().unwrap().is_leaf());
}

#[tokio::test]
async fn test_concurrent_background_scans_report_their_own_progress() {
    let fs = MemoryFs::new();
    for i in 0..50 {
        fs.add_dir(format!("/left/d{i:03}"));
        fs.add_dir(format!("/right/d{i:03}"));
    }
    let engine = Arc::new(ScanEngine::with_fs(fs));
    let left_tree = shared(root_of(&engine, "/left"));
    let right_tree = shared(root_of(&engine, "/right"));

    let left = start_scan(engine.clone(), left_tree, ScanConfig::new("/left"));
    let right = start_scan(engine, right_tree, ScanConfig::new("/right"));

    async fn collect(mut handle: dirsnap_scan::ScanHandle) -> (Vec<PathBuf>, bool) {
        let mut paths = Vec::new();
        let mut ok = false;
        while let Some(event) = handle.recv().await {
            match event {
                ScanEvent::Progress(progress) => paths.push(progress.current_path),
                ScanEvent::Complete(result) => ok = result.is_ok(),
            }
        }
        (paths, ok)
    }
    let ((left_paths, left_ok), (right_paths, right_ok)) =
        tokio::join!(collect(left), collect(right));

    assert!(left_ok && right_ok);
    assert!(!left_paths.is_empty());
    assert!(!right_paths.is_empty());
    assert!(left_paths.iter().all(|p| p.starts_with("/left")));
    assert!(right_paths.iter().all(|p| p.starts_with("/right")));
}

#[tokio::test]
async fn test_background_rescan_of_relative_root() {
    let absolute = std::path::absolute("relative_data").unwrap();
    let fs = MemoryFs::new();
    fs.add_file(absolute.join("a.txt"), 1);
    let engine = Arc::new(ScanEngine::with_fs(fs));

    let config = ScanConfig::new("relative_data");
    let snapshot = engine.snapshot(&config).unwrap();
    assert_eq!(snapshot.root_path(), absolute.as_path());
    let tree = shared(snapshot.root);

    engine.fs().add_file(absolute.join("b.txt"), 1);
    start_scan(engine, tree.clone(), config).finish().await.unwrap();

    assert_eq!(child_names(&tree.read().unwrap()), vec!["a.txt", "b.txt"]);
}

#[test]
fn test_zero_max_depth_in_loaded_config_is_rejected() {
    let engine = ScanEngine::with_fs(example_fs());
    let mut config = ScanConfig::new("/data");
    config.max_depth = Some(0);

    assert!(matches!(
        ScanOptions::from_config(&config),
        Err(ScanError::InvalidConfig { .. })
    ));
    assert!(matches!(
        engine.snapshot(&config),
        Err(ScanError::InvalidConfig { .. })
    ));
}

#[test]
fn test_root_info_is_never_reassigned() {
    let engine = ScanEngine::with_fs(example_fs());
    let seeded = FileInfo::directory("/data", false);
    let mut root = TreeNode::new(seeded.clone());

    engine.scan(&mut root, &mut ScanOptions::new()).unwrap();
    assert_eq!(root.info(), &seeded);
}
