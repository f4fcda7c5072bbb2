// Directory tree walk: classifies every cluster reachable from a
// directory entry, pre-order

use crate::checker::Checker;
use crate::cluster_map::ClusterState;
use crate::dir_entry::{DirEntry, DIR_ENTRY_SIZE};
use fatscan_core::Finding;
use log::debug;

impl Checker {
    /// Scan every slot of the fixed root directory region.
    ///
    /// All slots are visited, not just up to the first empty one: on a
    /// corrupt image the end-of-directory convention cannot be trusted.
    pub(crate) fn walk_root(&mut self) {
        let offset = self.geometry.root_dir_offset;
        let count = self.geometry.root_entries as usize;
        debug!("walking root directory: {count} slots at {offset:#x}");
        for i in 0..count {
            let slot = offset + i * DIR_ENTRY_SIZE;
            let entry = DirEntry::parse(&self.image.bytes()[slot..slot + DIR_ENTRY_SIZE]);
            self.visit_entry(&entry, slot, None, 0);
        }
    }

    /// Follow a directory's own cluster chain, scanning the slots of
    /// each cluster and recursing into subdirectories.
    ///
    /// The head is classified `DirectoryHead`, later clusters of the
    /// chain `ChainLink`/`EndOfChain`, all owned by the head. Ownership
    /// is the only defense against chain cycles; depth is unbounded.
    pub(crate) fn walk_directory(&mut self, name: &str, head: u16, depth: u32) {
        let slots_per_cluster = self.geometry.bytes_per_cluster as usize / DIR_ENTRY_SIZE;
        let mut cluster = head;
        let mut visited: u32 = 0;

        loop {
            if let Err(owner) = self.map.claim(cluster, head) {
                self.report.record(Finding::CrossLinkDetected {
                    cluster,
                    owner,
                    claimant: head,
                });
                return;
            }
            let state = if cluster == head {
                ClusterState::DirectoryHead
            } else {
                ClusterState::ChainLink
            };
            self.map.classify(cluster, state);
            visited += 1;

            let base = self.geometry.cluster_offset(cluster);
            for i in 0..slots_per_cluster {
                let slot = base + i * DIR_ENTRY_SIZE;
                let entry =
                    DirEntry::parse(&self.image.bytes()[slot..slot + DIR_ENTRY_SIZE]);
                self.visit_entry(&entry, slot, Some(cluster), depth);
            }

            let value = self.fat_entry(cluster);
            if self.geometry.is_end_of_chain(value) {
                if cluster != head {
                    self.map.classify(cluster, ClusterState::EndOfChain);
                }
                return;
            }
            if !self.geometry.is_valid_cluster(value) {
                self.report.record(Finding::BrokenChain {
                    path: name.to_string(),
                    start_cluster: head,
                    cluster,
                    length: visited,
                });
                if cluster != head {
                    self.map.classify(cluster, ClusterState::EndOfChain);
                }
                return;
            }
            self.map.set_successor(cluster, value);
            cluster = value;
        }
    }

    /// Dispatch one directory slot.
    fn visit_entry(&mut self, entry: &DirEntry, slot: usize, parent: Option<u16>, depth: u32) {
        if entry.is_empty() || entry.is_deleted() || entry.is_dot() {
            return;
        }
        if entry.is_long_name() {
            // long-name fragments are opaque; the 8.3 entry follows
            return;
        }
        if entry.is_volume_label() {
            let label = entry.display_name();
            debug!("volume label: {label}");
            self.volume_label = Some(label);
            return;
        }

        let name = entry.display_name();
        let indent = depth as usize * 4;

        if entry.is_directory() {
            // hidden directories are OS trash cans; never descend
            if entry.is_hidden() {
                debug!("{:indent$}{name}/ (hidden directory, skipped)", "");
                return;
            }
            debug!(
                "{:indent$}{name}/ (directory, start cluster {})",
                "", entry.start_cluster
            );
            if !self.geometry.is_valid_cluster(entry.start_cluster) {
                self.report.record(Finding::InvalidClusterReference {
                    path: name,
                    cluster: entry.start_cluster,
                });
                return;
            }
            if let Some(parent) = parent {
                self.map.set_successor(parent, entry.start_cluster);
            }
            self.walk_directory(&name, entry.start_cluster, depth + 1);
            return;
        }

        debug!(
            "{:indent$}{name} ({} bytes, start cluster {}) {}",
            "",
            entry.file_size,
            entry.start_cluster,
            entry.attribute_letters()
        );
        if entry.start_cluster == 0 && entry.file_size == 0 {
            // never-allocated empty file
            return;
        }
        if !self.geometry.is_valid_cluster(entry.start_cluster) {
            self.report.record(Finding::InvalidClusterReference {
                path: name,
                cluster: entry.start_cluster,
            });
            return;
        }

        if self.map.record(entry.start_cluster).owner.is_none() {
            self.map.classify(entry.start_cluster, ClusterState::FileHead);
        }
        let chain = self.verify_chain(&name, entry.start_cluster, entry.file_size);
        self.reconcile_size(&name, slot, entry.file_size, &chain);
    }
}
