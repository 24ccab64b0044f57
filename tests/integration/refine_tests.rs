use blockdupe::duplicates::{FinderError, GroupTable, Refiner};
use blockdupe::scanner::{Checksum, FileEntry, HashError, HashSettings};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn entry(dir: &Path, name: &str, content: &[u8]) -> FileEntry {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    FileEntry::new(path, content.len() as u64)
}

fn settings(block: usize) -> HashSettings {
    HashSettings::new(block, Checksum::Md5).unwrap()
}

#[test]
fn test_pass_by_pass_three_files() {
    let dir = tempdir().unwrap();
    let files = vec![
        entry(dir.path(), "a", b"AAAAAAAAAABBBBBBBBBB"),
        entry(dir.path(), "b", b"AAAAAAAAAABBBBBBBBBB"),
        entry(dir.path(), "c", b"AAAAAAAAAACCCCCCCCCC"),
    ];
    let mut table = GroupTable::from_size_groups(vec![(20, files)], settings(10));
    let refiner = Refiner::new(2);

    let first = refiner.pass(&mut table, 1).unwrap();
    assert!(first.finished.is_empty());
    assert_eq!(table.len(), 1);
    assert_eq!(table.ids()[0].get(), 0);
    assert_eq!(table.file_count(), 3);
    assert_eq!(first.stats.kept_groups, 1);

    let second = refiner.pass(&mut table, 2).unwrap();
    assert!(table.is_empty());
    assert_eq!(second.stats.split_groups, 1);
    assert_eq!(second.stats.dropped_files, 1);
    assert_eq!(second.finished.len(), 1);
    assert_eq!(second.finished[0].id.get(), 1);
    assert!(second.finished[0].paths.iter().all(|p| !p.ends_with("c")));
}

#[test]
fn test_split_ids_are_fresh_and_ascending() {
    let dir = tempdir().unwrap();
    let files = vec![
        entry(dir.path(), "p1", b"xxxx1111"),
        entry(dir.path(), "q1", b"yyyy2222"),
        entry(dir.path(), "p2", b"xxxx1111"),
        entry(dir.path(), "q2", b"yyyy2222"),
    ];
    let other = vec![
        entry(dir.path(), "r1", b"zzz"),
        entry(dir.path(), "r2", b"zzz"),
    ];
    let table = GroupTable::from_size_groups(vec![(8, files), (3, other)], settings(4));

    let (groups, stats) = Refiner::new(1).run(table).unwrap();

    // r-group keeps id 1 and finishes in pass 1; splits of group 0 get 2 and 3
    let ids: Vec<u64> = groups.iter().map(|g| g.id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(stats.passes, 2);
    assert_eq!(stats.split_groups, 1);
    assert_eq!(stats.dropped_files, 0);
}

#[test]
fn test_members_exactly_one_block_finish_in_one_pass() {
    let dir = tempdir().unwrap();
    let files = vec![
        entry(dir.path(), "a", b"0123456789"),
        entry(dir.path(), "b", b"0123456789"),
        entry(dir.path(), "c", b"0123456789"),
    ];
    let table = GroupTable::from_size_groups(vec![(10, files)], settings(10));

    let (groups, stats) = Refiner::new(4).run(table).unwrap();
    assert_eq!(stats.passes, 1);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
}

#[test]
fn test_file_changed_during_scan() {
    let dir = tempdir().unwrap();
    let files = vec![
        entry(dir.path(), "a", b"0123456789abcdefghij"),
        entry(dir.path(), "b", b"0123456789abcdefghij"),
    ];
    let mut table = GroupTable::from_size_groups(vec![(20, files)], settings(10));
    let refiner = Refiner::new(1);

    // Shrink b after its size was recorded
    fs::write(dir.path().join("b"), b"0123456789").unwrap();
    refiner.pass(&mut table, 1).unwrap();

    let result = refiner.pass(&mut table, 2);
    assert!(matches!(
        result,
        Err(FinderError::Hash(HashError::Truncated { position: 10, .. }))
    ));
}
