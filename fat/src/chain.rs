// Chain verification: walk a file's FAT chain against its declared size

use crate::checker::Checker;
use crate::cluster_map::ClusterState;
use fatscan_core::Finding;

/// How a chain walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainTerminal {
    /// The chain reached an end: either where the declared size says it
    /// should, or at an early end-of-chain marker (a size defect the
    /// reconciler reports).
    Completed,
    /// A free, bad or out-of-range FAT value before the declared end.
    Broken,
    /// The walk hit a cluster another chain already owns.
    CrossLinked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainResult {
    /// Clusters actually walked.
    pub length: u32,
    pub terminal: ChainTerminal,
}

impl Checker {
    /// Walk the chain from `start`, claiming and classifying each
    /// cluster.
    ///
    /// The declared size is authoritative for where the chain ends: once
    /// the cluster holding the file's final byte is reached it is marked
    /// `EndOfChain` and whatever the FAT links to past it is left for
    /// the orphan sweep. A cluster is never visited twice; the ownership
    /// claim rejects both cross-links and cycles.
    pub(crate) fn verify_chain(
        &mut self,
        path: &str,
        start: u16,
        declared_size: u32,
    ) -> ChainResult {
        let cluster_size = self.geometry.bytes_per_cluster;
        let mut cluster = start;
        let mut length: u32 = 0;

        loop {
            if let Err(owner) = self.map.claim(cluster, start) {
                self.report.record(Finding::CrossLinkDetected {
                    cluster,
                    owner,
                    claimant: start,
                });
                return ChainResult {
                    length,
                    terminal: ChainTerminal::CrossLinked,
                };
            }

            let bytes_remaining = declared_size.saturating_sub(length * cluster_size);
            length += 1;

            if bytes_remaining <= cluster_size {
                // this cluster holds the file's final byte
                self.map.classify(cluster, ClusterState::EndOfChain);
                return ChainResult {
                    length,
                    terminal: ChainTerminal::Completed,
                };
            }
            self.map.classify(cluster, ClusterState::ChainLink);

            let value = self.fat_entry(cluster);
            if self.geometry.is_end_of_chain(value) {
                // intact but shorter than declared; the reconciler will
                // report the size as too big
                self.map.classify(cluster, ClusterState::EndOfChain);
                return ChainResult {
                    length,
                    terminal: ChainTerminal::Completed,
                };
            }
            if !self.geometry.is_valid_cluster(value) {
                self.report.record(Finding::BrokenChain {
                    path: path.to_string(),
                    start_cluster: start,
                    cluster,
                    length,
                });
                self.map.classify(cluster, ClusterState::EndOfChain);
                return ChainResult {
                    length,
                    terminal: ChainTerminal::Broken,
                };
            }

            self.map.set_successor(cluster, value);
            cluster = value;
        }
    }
}
