//! Scene access: metadata extraction and band rasters

pub mod hdf;
pub mod memory;
pub mod metadata;

pub use hdf::HdfScene;
pub use memory::MemoryScene;
pub use metadata::{band_rasters, BandRaster, SceneMetadata, SceneReader};
