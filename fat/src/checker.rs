// Checker context: owns the image, geometry, cluster map and report for
// one reconciliation pass

use crate::boot_sector::Geometry;
use crate::cluster_map::{ClusterMap, ClusterRecord, ClusterState};
use crate::image::FatImage;
use fatscan_core::{Report, ScanError};
use log::info;

/// One full consistency pass over a FAT image.
///
/// Built once per scan: the directory walk and the orphan sweep mutate
/// the map and the image through this context and nowhere else.
pub struct Checker {
    pub(crate) image: FatImage,
    pub(crate) geometry: Geometry,
    pub(crate) map: ClusterMap,
    pub(crate) report: Report,
    pub(crate) volume_label: Option<String>,
    pub(crate) found_files: u32,
}

impl Checker {
    pub fn new(image: FatImage) -> Result<Self, ScanError> {
        let geometry = Geometry::parse(image.bytes())?;
        info!(
            "{:?} volume: {} data clusters of {} bytes, {} root entries",
            geometry.fat_type,
            geometry.total_clusters - 2,
            geometry.bytes_per_cluster,
            geometry.root_entries
        );
        let map = ClusterMap::new(geometry.total_clusters);
        Ok(Self {
            image,
            geometry,
            map,
            report: Report::new(),
            volume_label: None,
            found_files: 0,
        })
    }

    /// Run the full reconciliation: walk the directory tree, then sweep
    /// the map for orphans.
    pub fn run(&mut self) -> Report {
        self.walk_root();
        self.reclaim();
        info!("{}", self.report.summary());
        self.report.clone()
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn volume_label(&self) -> Option<&str> {
        self.volume_label.as_deref()
    }

    pub fn cluster_state(&self, cluster: u16) -> ClusterState {
        self.map.state(cluster)
    }

    pub fn cluster_record(&self, cluster: u16) -> &ClusterRecord {
        self.map.record(cluster)
    }

    /// Whether any repair was written into the image buffer.
    pub fn has_repairs(&self) -> bool {
        self.image.is_dirty()
    }

    /// Write repairs back to the backing file.
    pub fn flush(&mut self) -> Result<(), ScanError> {
        self.image.flush()
    }

    pub fn into_image(self) -> FatImage {
        self.image
    }

    /// FAT accessor: the stored successor/marker value for `cluster`.
    /// The checker never writes the FAT.
    pub(crate) fn fat_entry(&self, cluster: u16) -> u16 {
        self.geometry.fat_value(self.image.bytes(), cluster)
    }
}
