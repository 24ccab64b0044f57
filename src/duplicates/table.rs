//! Active group table for block-by-block refinement.
//!
//! # Overview
//!
//! A [`Group`] holds the hashing state of two or more files that have agreed
//! on every block read so far. The [`GroupTable`] owns all active groups,
//! keyed by [`GroupId`], and allocates ids. Ids increase monotonically over a
//! whole run and are never reused, including across table rebuilds.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::scanner::{ChunkHasher, FileEntry, HashSettings};

/// Identifier of a candidate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(u64);

impl GroupId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A set of files believed identical so far.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    size: u64,
    members: Vec<ChunkHasher>,
}

impl Group {
    /// Id of this group.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Size shared by all members.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Member hashing state, in discovery order.
    #[must_use]
    pub fn members(&self) -> &[ChunkHasher] {
        &self.members
    }

    /// Mutable member hashing state.
    pub fn members_mut(&mut self) -> &mut [ChunkHasher] {
        &mut self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a group held by a table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A group is finished when every member has been read to the end.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.members.iter().all(ChunkHasher::is_finished)
    }

    /// Take the members out, consuming the group.
    #[must_use]
    pub fn into_members(self) -> Vec<ChunkHasher> {
        self.members
    }
}

/// Mapping from group id to active group.
#[derive(Debug, Default)]
pub struct GroupTable {
    groups: BTreeMap<GroupId, Group>,
    next_id: u64,
}

impl GroupTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the initial table from size buckets.
    ///
    /// Buckets with fewer than two files are skipped.
    #[must_use]
    pub fn from_size_groups(
        buckets: impl IntoIterator<Item = (u64, Vec<FileEntry>)>,
        settings: HashSettings,
    ) -> Self {
        let mut table = Self::new();
        for (size, files) in buckets {
            let members = files
                .into_iter()
                .map(|file| ChunkHasher::new(file.path, file.size, settings))
                .collect();
            table.create(size, members);
        }
        table
    }

    /// Allocate the next group id.
    pub fn allocate_id(&mut self) -> GroupId {
        let id = GroupId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a group with a fresh id.
    ///
    /// Returns `None`, dropping the members, when fewer than two are given.
    pub fn create(&mut self, size: u64, members: Vec<ChunkHasher>) -> Option<GroupId> {
        if members.len() < 2 {
            return None;
        }
        debug_assert!(members.iter().all(|m| m.size() == size));
        let id = self.allocate_id();
        self.groups.insert(id, Group { id, size, members });
        Some(id)
    }

    /// Put a group back under its existing id.
    pub fn reinsert(&mut self, group: Group) {
        debug_assert!(group.id.0 < self.next_id);
        debug_assert!(group.len() >= 2);
        self.groups.insert(group.id, group);
    }

    /// Remove a group.
    pub fn remove(&mut self, id: GroupId) -> Option<Group> {
        self.groups.remove(&id)
    }

    /// Look up a group.
    #[must_use]
    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Number of groups in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the table holds no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of files across all groups.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.groups.values().map(Group::len).sum()
    }

    /// Iterate groups in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Group ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<GroupId> {
        self.groups.keys().copied().collect()
    }

    /// Move every group out, in ascending id order, leaving an empty table
    /// that keeps its id counter.
    pub fn drain(&mut self) -> Vec<Group> {
        std::mem::take(&mut self.groups).into_values().collect()
    }

    /// Remove and return every finished group, in ascending id order.
    pub fn take_finished(&mut self) -> Vec<Group> {
        let finished: Vec<GroupId> = self
            .groups
            .values()
            .filter(|g| g.is_finished())
            .map(Group::id)
            .collect();
        finished
            .into_iter()
            .filter_map(|id| self.groups.remove(&id))
            .collect()
    }
}
