// Orphan recovery: sweep the cluster map for clusters the walk never
// reached and recover them as FOUNDn.DAT files

use crate::boot_sector::FAT_FREE;
use crate::checker::Checker;
use crate::cluster_map::ClusterState;
use crate::dir_entry::{self, DIR_ENTRY_SIZE, SLOT_DELETED, SLOT_EMPTY};
use fatscan_core::Finding;
use log::{info, warn};

/// A maximal run of orphan clusters, contiguous by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrphanRun {
    pub head: u16,
    pub length: u32,
}

impl OrphanRun {
    /// Size for the synthesized entry, saturating at the 32-bit size
    /// field's maximum (a run can cover more bytes than the field holds).
    pub fn recovered_size(&self, bytes_per_cluster: u32) -> u32 {
        self.length.saturating_mul(bytes_per_cluster)
    }
}

impl Checker {
    /// One linear pass over the data clusters, after the walk.
    ///
    /// Clusters the walk classified stay as they are, except that
    /// FAT-free clusters are (re)classified `Free` either way. A cluster
    /// still unclassified with a non-free, non-bad FAT value is an
    /// orphan; contiguous orphans are grouped into runs and each run
    /// becomes one synthetic root entry. This is the second of the two
    /// places the image is mutated.
    pub(crate) fn reclaim(&mut self) -> Vec<OrphanRun> {
        let total = self.geometry.total_clusters;
        let mut runs: Vec<OrphanRun> = Vec::new();
        let mut current: Option<OrphanRun> = None;

        for cluster in 2..total {
            let cluster = cluster as u16;
            let value = self.fat_entry(cluster);

            let orphan = if self.map.state(cluster) == ClusterState::Unclassified {
                if value == FAT_FREE {
                    self.map.classify(cluster, ClusterState::Free);
                    false
                } else if self.geometry.is_bad(value) {
                    self.map.classify(cluster, ClusterState::Bad);
                    false
                } else {
                    self.map.classify(cluster, ClusterState::Orphan);
                    self.report.record(Finding::OrphanCluster { cluster });
                    true
                }
            } else {
                if value == FAT_FREE {
                    // reached by a chain, but the FAT says free
                    self.map.classify(cluster, ClusterState::Free);
                }
                false
            };

            if orphan {
                match current.as_mut() {
                    Some(run) => run.length += 1,
                    None => current = Some(OrphanRun { head: cluster, length: 1 }),
                }
                let head = current.as_ref().map_or(cluster, |run| run.head);
                let claimed = self.map.claim(cluster, head);
                debug_assert!(claimed.is_ok(), "unclassified clusters are unowned");
            } else if let Some(run) = current.take() {
                self.recover_run(&run);
                runs.push(run);
            }
        }
        if let Some(run) = current.take() {
            self.recover_run(&run);
            runs.push(run);
        }

        runs
    }

    /// Synthesize a directory entry for one orphan run.
    fn recover_run(&mut self, run: &OrphanRun) {
        let size = run.recovered_size(self.geometry.bytes_per_cluster);
        self.found_files += 1;
        let name = format!("FOUND{}.DAT", self.found_files);

        if self.insert_root_entry(&name, run.head, size) {
            info!(
                "recovered {} orphan cluster(s) at {} as {name}",
                run.length, run.head
            );
            self.report.record(Finding::OrphanRecovered {
                name,
                start_cluster: run.head,
                clusters: run.length,
                size,
            });
        } else {
            warn!("root directory full, cannot create {name}");
            self.report.record(Finding::RootDirectoryFull { name });
        }
    }

    /// Entry-creation primitive: write a fully-formed entry into the
    /// first empty or deleted root slot, keeping the end-of-directory
    /// terminator when an empty slot is consumed.
    fn insert_root_entry(&mut self, name: &str, start_cluster: u16, size: u32) -> bool {
        let root = self.geometry.root_dir_offset;
        let count = self.geometry.root_entries as usize;

        for i in 0..count {
            let slot = root + i * DIR_ENTRY_SIZE;
            let first_byte = self.image.bytes()[slot];
            if first_byte != SLOT_EMPTY && first_byte != SLOT_DELETED {
                continue;
            }
            let was_empty = first_byte == SLOT_EMPTY;
            let buf = self.image.bytes_mut();
            dir_entry::write_entry(&mut buf[slot..slot + DIR_ENTRY_SIZE], name, start_cluster, size);
            if was_empty && i + 1 < count {
                buf[slot + DIR_ENTRY_SIZE] = SLOT_EMPTY;
            }
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovered_size_saturates_at_field_maximum() {
        // 65524 clusters of 512 KiB outgrow the 32-bit size field
        let run = OrphanRun { head: 2, length: 65_524 };
        assert_eq!(run.recovered_size(512 * 1024), u32::MAX);
        assert_eq!(run.recovered_size(512), 65_524 * 512);
    }
}
