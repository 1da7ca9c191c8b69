use dirsnap_core::{
    EntryState, FileInfo, ScanConfig, ScanWarning, Snapshot, TreeNode, TreeStats, WarningKind,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

fn sample_tree() -> TreeNode {
    let now = SystemTime::now();
    let mut root = TreeNode::new(FileInfo::directory("/data", false));

    let dir = root.append_child(FileInfo::directory("/data/A", false));
    dir.append_child(FileInfo::file("/data/A/z.txt", 4, Some(now), false));

    root.append_child(FileInfo::directory("/data/a_link", true));
    root.append_child(FileInfo::file("/data/b.txt", 10, Some(now), false));
    root.append_child(FileInfo::missing("/data/c.tmp"));
    root
}

#[test]
fn test_entry_state_variants() {
    let file = FileInfo::file("/data/b.txt", 10, None, true);
    match file.state() {
        EntryState::Existing {
            is_dir,
            is_symlink,
            size,
            modified,
        } => {
            assert!(!is_dir);
            assert!(is_symlink);
            assert_eq!(*size, Some(10));
            assert!(modified.is_none());
        }
        EntryState::Missing => panic!("Expected existing entry"),
    }

    let gone = FileInfo::missing("/data/b.txt");
    assert_eq!(gone.state(), &EntryState::Missing);
    assert!(!gone.is_symlink());
    assert_eq!(gone.name(), "b.txt");
}

#[test]
fn test_tree_stats_from_nodes() {
    let tree = sample_tree();
    let stats = tree.stats();

    assert_eq!(
        stats,
        TreeStats {
            total_size: 14,
            total_files: 2,
            total_dirs: 2,
            total_symlinks: 1,
            total_missing: 1,
            max_depth: 2,
        }
    );
}

#[test]
fn test_find_mut_then_clear_subtree() {
    let mut tree = sample_tree();

    let dir = tree.find_mut(Path::new("/data/A")).unwrap();
    assert_eq!(dir.child_count(), 1);
    dir.clear_children();

    assert!(tree.find(Path::new("/data/A/z.txt")).is_none());
    assert_eq!(tree.child_count(), 4);
    assert_eq!(tree.descendant_count(), 4);
}

#[test]
fn test_iter_is_top_down_preorder() {
    let tree = sample_tree();
    let paths: Vec<_> = tree
        .iter()
        .map(|node| node.info().path().to_path_buf())
        .collect();

    assert_eq!(
        paths,
        vec![
            PathBuf::from("/data"),
            PathBuf::from("/data/A"),
            PathBuf::from("/data/A/z.txt"),
            PathBuf::from("/data/a_link"),
            PathBuf::from("/data/b.txt"),
            PathBuf::from("/data/c.tmp"),
        ]
    );
}

#[test]
fn test_snapshot_summary() {
    let warning = ScanWarning::new("/data/A", "denied", WarningKind::PermissionDenied);
    let snapshot = Snapshot::new(
        sample_tree(),
        ScanConfig::new("/data"),
        Duration::from_millis(5),
        vec![warning],
    );

    assert_eq!(snapshot.root_path(), Path::new("/data"));
    assert_eq!(snapshot.stats.total_files, 2);
    assert_eq!(snapshot.paths().len(), 5);
    assert!(snapshot.has_warnings());
}

#[test]
fn test_snapshot_json_export() {
    let snapshot = Snapshot::new(
        sample_tree(),
        ScanConfig::new("/data"),
        Duration::ZERO,
        Vec::new(),
    );

    let json = serde_json::to_value(&snapshot).unwrap();
    let missing = &json["root"]["children"][3]["info"];
    assert_eq!(missing["state"]["state"], "missing");
    assert_eq!(missing["name"], "c.tmp");

    let restored: Snapshot = serde_json::from_value(json).unwrap();
    assert_eq!(restored.root, snapshot.root);
}
