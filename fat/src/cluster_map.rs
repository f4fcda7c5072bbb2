// Cluster state map: the single source of truth for classification,
// chain linkage and ownership

/// Classification of a cluster as the scan learns about it.
///
/// `FileHead` and `DirectoryHead` are set when a directory entry is first
/// seen; the chain walk refines file clusters into `ChainLink` or
/// `EndOfChain`, so after a full pass every data cluster ends in one of
/// {Free, Bad, DirectoryHead, ChainLink, EndOfChain, Orphan}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    Unclassified,
    Free,
    Bad,
    EndOfChain,
    DirectoryHead,
    FileHead,
    ChainLink,
    Orphan,
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterRecord {
    pub state: ClusterState,
    pub successor: Option<u16>,
    pub owner: Option<u16>,
}

impl Default for ClusterRecord {
    fn default() -> Self {
        Self {
            state: ClusterState::Unclassified,
            successor: None,
            owner: None,
        }
    }
}

/// One record per cluster, indexed by cluster number.
pub struct ClusterMap {
    records: Vec<ClusterRecord>,
}

impl ClusterMap {
    pub fn new(total_clusters: u32) -> Self {
        Self {
            records: vec![ClusterRecord::default(); total_clusters as usize],
        }
    }

    pub fn len(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, cluster: u16) -> &ClusterRecord {
        &self.records[cluster as usize]
    }

    pub fn state(&self, cluster: u16) -> ClusterState {
        self.records[cluster as usize].state
    }

    pub fn classify(&mut self, cluster: u16, state: ClusterState) {
        self.records[cluster as usize].state = state;
    }

    pub fn set_successor(&mut self, cluster: u16, next: u16) {
        self.records[cluster as usize].successor = Some(next);
    }

    /// Claim `cluster` for the chain headed at `head`.
    ///
    /// The first claim wins; any later claim is rejected with the
    /// existing owner, including a repeat claim naming the same head
    /// (two entries sharing a start cluster are still cross-linked).
    /// This rule is also the cycle guard for chain and directory walks.
    pub fn claim(&mut self, cluster: u16, head: u16) -> Result<(), u16> {
        let record = &mut self.records[cluster as usize];
        match record.owner {
            Some(owner) => Err(owner),
            None => {
                record.owner = Some(head);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_start_unclassified() {
        let map = ClusterMap::new(8);
        assert_eq!(map.len(), 8);
        for cluster in 0..8 {
            assert_eq!(map.state(cluster), ClusterState::Unclassified);
            assert_eq!(map.record(cluster).owner, None);
        }
    }

    #[test]
    fn test_first_claim_wins() {
        let mut map = ClusterMap::new(16);
        assert_eq!(map.claim(9, 2), Ok(()));
        assert_eq!(map.claim(9, 5), Err(2));
        assert_eq!(map.record(9).owner, Some(2));
    }

    #[test]
    fn test_repeat_claim_same_head_is_rejected() {
        // two directory entries declaring the same start cluster
        let mut map = ClusterMap::new(16);
        assert_eq!(map.claim(9, 9), Ok(()));
        assert_eq!(map.claim(9, 9), Err(9));
    }

    #[test]
    fn test_classify_and_link() {
        let mut map = ClusterMap::new(8);
        map.classify(2, ClusterState::FileHead);
        map.classify(2, ClusterState::ChainLink);
        map.set_successor(2, 3);
        assert_eq!(map.state(2), ClusterState::ChainLink);
        assert_eq!(map.record(2).successor, Some(3));
    }
}
