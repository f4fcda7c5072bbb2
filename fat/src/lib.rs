// FAT12/FAT16 image consistency checking and repair engine

pub mod boot_sector;
pub mod chain;
pub mod checker;
pub mod cluster_map;
pub mod dir_entry;
pub mod image;
pub mod orphan;
pub mod reconcile;
pub mod walk;

pub use boot_sector::{FatType, Geometry};
pub use chain::{ChainResult, ChainTerminal};
pub use checker::Checker;
pub use cluster_map::{ClusterMap, ClusterRecord, ClusterState};
pub use image::FatImage;
pub use orphan::OrphanRun;
