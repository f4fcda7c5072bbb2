// Size reconciliation: the directory entry's size field against the
// chain the FAT actually holds

use crate::chain::{ChainResult, ChainTerminal};
use crate::checker::Checker;
use crate::dir_entry::{self, DIR_ENTRY_SIZE};
use fatscan_core::{Finding, SizeDirection};
use log::warn;

impl Checker {
    /// Rewrite the entry's size field when the declared size and the
    /// walked chain disagree. This is one of the two places the image is
    /// mutated.
    pub(crate) fn reconcile_size(
        &mut self,
        path: &str,
        slot: usize,
        declared: u32,
        chain: &ChainResult,
    ) {
        if chain.terminal == ChainTerminal::CrossLinked {
            // the clusters belong to another chain; rewriting this
            // entry's size would destroy the one copy of the truth
            return;
        }

        let cluster_size = self.geometry.bytes_per_cluster;
        let expected = declared.div_ceil(cluster_size);
        if expected == chain.length {
            return;
        }

        let corrected = chain.length * cluster_size;
        let direction = if expected > chain.length {
            SizeDirection::TooBig
        } else {
            SizeDirection::TooSmall
        };
        warn!("{path}: declared size {declared} is {direction}, correcting to {corrected}");

        let buf = self.image.bytes_mut();
        dir_entry::put_file_size(&mut buf[slot..slot + DIR_ENTRY_SIZE], corrected);
        self.report.record(Finding::SizeMismatch {
            path: path.to_string(),
            declared,
            corrected,
            direction,
        });
    }
}
