//! Mount-table mutating tests. Run with `sudo -E cargo test -- --ignored`.

use std::path::Path;
use std::process::Command;

use mount::{UnmountOptions, iter_mounts, mount_id_of_path, unmount};

fn mount_tmpfs(target: &Path) {
    let status = Command::new("mount")
        .args(["-t", "tmpfs", "tmpfs"])
        .arg(target)
        .status()
        .expect("spawn mount");
    assert!(status.success(), "mount tmpfs on {}", target.display());
}

fn mounts_below(path: &Path) -> usize {
    iter_mounts(None, false)
        .filter_map(Result::ok)
        .filter(|record| record.mountpoint.starts_with(path) && record.mountpoint != path)
        .count()
}

#[test]
#[ignore = "requires root and mounts tmpfs"]
fn recursive_unmount_removes_nested_mounts() {
    if !test_support::is_root() {
        eprintln!("not root, skipping test");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let top = dir.path().join("top");
    std::fs::create_dir(&top).expect("mkdir top");
    mount_tmpfs(&top);
    for child in ["a", "b"] {
        let child = top.join(child);
        std::fs::create_dir(&child).expect("mkdir child");
        mount_tmpfs(&child);
        let grandchild = child.join("nested");
        std::fs::create_dir(&grandchild).expect("mkdir grandchild");
        mount_tmpfs(&grandchild);
    }
    assert_eq!(mounts_below(&top), 4);

    let top_id = mount_id_of_path(&top).expect("top mount id");
    let children: Vec<_> = iter_mounts(Some(top_id), true)
        .collect::<Result<_, _>>()
        .expect("children");
    assert_eq!(children.len(), 2);

    unmount(&top, &UnmountOptions::new().recursive(true)).expect("recursive unmount");
    assert_eq!(mounts_below(&top), 0);
    assert!(mount_id_of_path(&top).expect("parent mount") != top_id);
}

#[test]
#[ignore = "requires root and mounts tmpfs"]
fn non_recursive_unmount_of_busy_parent_keeps_it_mounted() {
    if !test_support::is_root() {
        eprintln!("not root, skipping test");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let top = dir.path().join("top");
    std::fs::create_dir(&top).expect("mkdir top");
    mount_tmpfs(&top);
    let child = top.join("child");
    std::fs::create_dir(&child).expect("mkdir child");
    mount_tmpfs(&child);

    let top_id = mount_id_of_path(&top).expect("top mount id");
    assert!(unmount(&top, &UnmountOptions::new()).is_err());
    assert_eq!(mount_id_of_path(&top).expect("still mounted"), top_id);

    unmount(&top, &UnmountOptions::new().recursive(true)).expect("cleanup");
}

#[test]
#[ignore = "requires root and mounts tmpfs"]
fn failed_recursive_unmount_keeps_target_mounted() {
    if !test_support::is_root() {
        eprintln!("not root, skipping test");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let top = dir.path().join("top");
    std::fs::create_dir(&top).expect("mkdir top");
    mount_tmpfs(&top);
    let child = top.join("child");
    std::fs::create_dir(&child).expect("mkdir child");
    mount_tmpfs(&child);
    let top_id = mount_id_of_path(&top).expect("top mount id");
    let child_id = mount_id_of_path(&child).expect("child mount id");

    // an open file keeps the child busy
    let held = std::fs::File::create(child.join("held")).expect("create held file");
    let err = unmount(&top, &UnmountOptions::new().recursive(true))
        .expect_err("busy child must fail the recursive unmount");
    let canonical = std::fs::canonicalize(&child).expect("canonicalize child");
    assert_eq!(err.path(), Some(canonical.as_path()));
    assert_eq!(mount_id_of_path(&top).expect("top still mounted"), top_id);
    assert_eq!(mount_id_of_path(&child).expect("child still mounted"), child_id);

    drop(held);
    unmount(&top, &UnmountOptions::new().recursive(true)).expect("cleanup");
}
