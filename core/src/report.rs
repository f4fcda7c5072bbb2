// Findings report shared by the check engine and the CLI

use serde::Serialize;
use std::fmt;

/// Which way a declared file size disagrees with its cluster chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeDirection {
    TooBig,
    TooSmall,
}

impl fmt::Display for SizeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeDirection::TooBig => write!(f, "too big"),
            SizeDirection::TooSmall => write!(f, "too small"),
        }
    }
}

/// One inconsistency observed (and where applicable, repaired) during a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A directory entry or chain link points outside the data area.
    InvalidClusterReference { path: String, cluster: u16 },
    /// A chain hit a free or invalid FAT value before its declared end.
    BrokenChain {
        path: String,
        start_cluster: u16,
        cluster: u16,
        length: u32,
    },
    /// Two chains claim the same cluster; the first owner wins.
    CrossLinkDetected {
        cluster: u16,
        owner: u16,
        claimant: u16,
    },
    /// Declared size disagreed with the chain; the entry was rewritten.
    SizeMismatch {
        path: String,
        declared: u32,
        corrected: u32,
        direction: SizeDirection,
    },
    /// A non-free cluster no directory entry reaches.
    OrphanCluster { cluster: u16 },
    /// A run of orphans recovered into a synthetic root entry.
    OrphanRecovered {
        name: String,
        start_cluster: u16,
        clusters: u32,
        size: u32,
    },
    /// No free root slot was left for a recovery entry.
    RootDirectoryFull { name: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::InvalidClusterReference { path, cluster } => {
                write!(f, "{path}: start cluster {cluster} is outside the data area")
            }
            Finding::BrokenChain {
                path,
                start_cluster,
                cluster,
                length,
            } => write!(
                f,
                "{path}: chain from cluster {start_cluster} breaks at cluster {cluster} \
                 after {length} cluster(s)"
            ),
            Finding::CrossLinkDetected {
                cluster,
                owner,
                claimant,
            } => write!(
                f,
                "cluster {cluster} is cross-linked: owned by chain {owner}, \
                 also claimed by chain {claimant}"
            ),
            Finding::SizeMismatch {
                path,
                declared,
                corrected,
                direction,
            } => write!(
                f,
                "{path}: declared size {declared} is {direction}, corrected to {corrected}"
            ),
            Finding::OrphanCluster { cluster } => {
                write!(f, "cluster {cluster} is an orphan")
            }
            Finding::OrphanRecovered {
                name,
                start_cluster,
                clusters,
                size,
            } => write!(
                f,
                "recovered {clusters} orphan cluster(s) starting at {start_cluster} \
                 as {name} ({size} bytes)"
            ),
            Finding::RootDirectoryFull { name } => {
                write!(f, "root directory full: could not create {name}")
            }
        }
    }
}

/// Accumulated findings from one full pass over an image.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for finding in &self.findings {
            match finding {
                Finding::InvalidClusterReference { .. } => summary.invalid_references += 1,
                Finding::BrokenChain { .. } => summary.broken_chains += 1,
                Finding::CrossLinkDetected { .. } => summary.cross_links += 1,
                Finding::SizeMismatch { .. } => summary.size_mismatches += 1,
                Finding::OrphanCluster { .. } => summary.orphan_clusters += 1,
                Finding::OrphanRecovered { .. } => summary.recovered_files += 1,
                Finding::RootDirectoryFull { .. } => summary.recovery_failures += 1,
            }
        }
        summary
    }
}

/// Per-kind finding counts for the end-of-run summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub invalid_references: usize,
    pub broken_chains: usize,
    pub cross_links: usize,
    pub size_mismatches: usize,
    pub orphan_clusters: usize,
    pub recovered_files: usize,
    pub recovery_failures: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.invalid_references
            + self.broken_chains
            + self.cross_links
            + self.size_mismatches
            + self.orphan_clusters
            + self.recovered_files
            + self.recovery_failures
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            return write!(f, "No inconsistencies found.");
        }
        write!(
            f,
            "{} finding(s): {} invalid reference(s), {} broken chain(s), \
             {} cross-link(s), {} size mismatch(es), {} orphan cluster(s), \
             {} file(s) recovered, {} recovery failure(s)",
            self.total(),
            self.invalid_references,
            self.broken_chains,
            self.cross_links,
            self.size_mismatches,
            self.orphan_clusters,
            self.recovered_files,
            self.recovery_failures,
        )
    }
}
