use blockdupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use blockdupe::scanner::{Checksum, HashSettings, WalkerConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn write(dir: &std::path::Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path.canonicalize().unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"content a");
    write(dir.path(), "b.txt", b"content b");
    write(dir.path(), "c.txt", b"content c");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.eliminated_by_size, 0);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"duplicate");
    let b = write(dir.path(), "b.txt", b"duplicate");
    write(dir.path(), "c.txt", b"unique");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths, vec![a, b]);
    assert_eq!(groups[0].size, 9);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 9);
}

#[test]
fn test_scan_three_twenty_byte_files() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"0123456789ABCDEFGHIJ");
    let b = write(dir.path(), "b", b"0123456789ABCDEFGHIJ");
    write(dir.path(), "c", b"0123456789abcdefghij");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths, vec![a, b]);
    assert_eq!(summary.refinement_passes, 2);
    assert_eq!(summary.bytes_hashed, 60);
}

#[test]
fn test_scan_empty_files_with_zero_min_size() {
    let dir = tempdir().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");
    write(dir.path(), "e3", b"");

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_min_size(0));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
    assert_eq!(groups[0].size, 0);
    assert_eq!(summary.refinement_passes, 0);
    assert_eq!(summary.bytes_hashed, 0);
}

#[test]
fn test_scan_empty_files_skipped_by_default() {
    let dir = tempdir().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_scan_large_files_differing_late() {
    let dir = tempdir().unwrap();
    let base = vec![7u8; 64 * 1024];
    let mut late = base.clone();
    *late.last_mut().unwrap() = 8;

    write(dir.path(), "one.bin", &base);
    write(dir.path(), "two.bin", &base);
    write(dir.path(), "three.bin", &late);

    let config = FinderConfig::default()
        .with_hash_settings(HashSettings::new(4096, Checksum::Crc32).unwrap());
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert!(!groups[0].paths.iter().any(|p| p.ends_with("three.bin")));
    assert_eq!(summary.refinement_passes, 16);
}

#[test]
fn test_scan_checksums_agree() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"same content here");
    write(dir.path(), "b", b"same content here");
    write(dir.path(), "c", b"same content HERE");

    let scan = |checksum| {
        let config = FinderConfig::default()
            .with_hash_settings(HashSettings::new(5, checksum).unwrap());
        DuplicateFinder::new(config)
            .find_duplicates(dir.path())
            .unwrap()
            .0
    };

    let md5 = scan(Checksum::Md5);
    let crc = scan(Checksum::Crc32);
    assert_eq!(md5.len(), 1);
    assert_eq!(md5[0].paths, crc[0].paths);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..4 {
        write(dir.path(), &format!("dup{i}.txt"), b"repeated payload");
    }
    write(dir.path(), "sub/x.txt", b"other payload!!!");
    write(dir.path(), "sub/y.txt", b"other payload!!!");

    let config =
        FinderConfig::default().with_walker_config(WalkerConfig::default().with_max_depth(1));
    let finder = DuplicateFinder::new(config);

    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first.len(), 2);
    let members = |groups: &[blockdupe::duplicates::DuplicateGroup]| {
        groups.iter().map(|g| g.paths.clone()).collect::<Vec<_>>()
    };
    assert_eq!(members(&first), members(&second));
}

#[test]
#[cfg(unix)]
fn test_scan_unreadable_file_is_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"locked content");
    let b = write(dir.path(), "b", b"locked content");
    fs::set_permissions(&b, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores file permissions
    if fs::File::open(&b).is_ok() {
        return;
    }

    let result = DuplicateFinder::with_defaults().find_duplicates(dir.path());
    assert!(matches!(result, Err(FinderError::Hash(_))));

    fs::set_permissions(&b, fs::Permissions::from_mode(0o644)).unwrap();
}
