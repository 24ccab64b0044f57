use blockdupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use blockdupe::scanner::WalkerConfig;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_duplicates_across_roots() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    fs::write(dir1.path().join("photo.jpg"), b"jpeg bytes").unwrap();
    fs::write(dir2.path().join("copy.jpg"), b"jpeg bytes").unwrap();
    fs::write(dir2.path().join("other.jpg"), b"jpeg BYTES").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].paths[0].ends_with("photo.jpg"));
    assert!(groups[0].paths[1].ends_with("copy.jpg"));
    assert_eq!(summary.total_files, 3);
}

#[test]
fn test_same_root_twice_is_not_a_duplicate() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("lonely.txt"), b"only one").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_nested_roots_with_depth() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    fs::write(dir.path().join("a.bin"), b"12345").unwrap();
    fs::write(nested.join("b.bin"), b"12345").unwrap();

    let config =
        FinderConfig::default().with_walker_config(WalkerConfig::default().with_max_depth(3));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), nested])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.total_files, 2);
}

#[test]
fn test_missing_root_fails_before_walking() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let result = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), missing]);
    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}
