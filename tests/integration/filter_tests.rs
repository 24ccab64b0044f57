use blockdupe::duplicates::{DuplicateFinder, FinderConfig};
use blockdupe::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn scan(root: &Path, walker: WalkerConfig) -> Vec<Vec<String>> {
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));
    let (groups, _) = finder.find_duplicates(root).unwrap();
    groups
        .iter()
        .map(|g| {
            g.paths
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        })
        .collect()
}

#[test]
fn test_depth_limits_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "top.txt", b"shared");
    write(dir.path(), "l1/one.txt", b"shared");
    write(dir.path(), "l1/l2/two.txt", b"shared");

    assert!(scan(dir.path(), WalkerConfig::default()).is_empty());
    // Depth-first, children sorted by name: l1/ is visited before top.txt
    assert_eq!(
        scan(dir.path(), WalkerConfig::default().with_max_depth(1)),
        vec![vec!["one.txt", "top.txt"]]
    );
    assert_eq!(
        scan(dir.path(), WalkerConfig::default().with_max_depth(2))[0].len(),
        3
    );
}

#[test]
fn test_excluded_subdirectory_at_any_depth() {
    let dir = tempdir().unwrap();
    write(dir.path(), "keep/a.txt", b"payload");
    write(dir.path(), "skip/b.txt", b"payload");
    write(dir.path(), "skip/deep/c.txt", b"payload");

    for depth in [1, 2, 10] {
        let walker = WalkerConfig::default()
            .with_max_depth(depth)
            .with_exclude_dirs(vec![dir.path().join("skip")]);
        assert!(scan(dir.path(), walker).is_empty(), "depth {depth}");
    }
}

#[test]
fn test_name_filter_glob() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.log", b"same bytes");
    write(dir.path(), "b.LOG", b"same bytes");
    write(dir.path(), "data.LOG.bak", b"same bytes");
    write(dir.path(), "notes.txt", b"same bytes");

    let walker =
        WalkerConfig::default().with_name_filter(Some(glob::Pattern::new("*.log").unwrap()));
    assert_eq!(scan(dir.path(), walker), vec![vec!["a.log", "b.LOG"]]);

    let walker =
        WalkerConfig::default().with_name_filter(Some(glob::Pattern::new("?.*").unwrap()));
    assert_eq!(scan(dir.path(), walker), vec![vec!["a.log", "b.LOG"]]);
}

#[test]
fn test_min_size_drops_small_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "s1", b"tiny");
    write(dir.path(), "s2", b"tiny");
    write(dir.path(), "l1", b"considerably larger");
    write(dir.path(), "l2", b"considerably larger");

    let groups = scan(dir.path(), WalkerConfig::default().with_min_size(10));
    assert_eq!(groups, vec![vec!["l1", "l2"]]);
}
