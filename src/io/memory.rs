use crate::io::metadata::SceneReader;
use crate::types::{AsterError, AsterImage, AsterResult, BandId};
use std::collections::{BTreeMap, HashMap};

/// Scene held entirely in memory.
///
/// Band rasters are exposed under HDF-EOS style sub-dataset names so they go
/// through the same enumeration as a file-backed scene.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    scene_id: String,
    metadata: BTreeMap<String, String>,
    subdatasets: Vec<String>,
    rasters: HashMap<String, AsterImage>,
}

impl MemoryScene {
    pub fn new(scene_id: &str) -> Self {
        Self {
            scene_id: scene_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn without_metadata(mut self, key: &str) -> Self {
        self.metadata.remove(key);
        self
    }

    /// Register a sub-dataset name without pixels
    pub fn with_subdataset(mut self, name: &str) -> Self {
        self.subdatasets.push(name.to_string());
        self
    }

    /// Add a band raster at native resolution
    pub fn with_band(mut self, band: BandId, data: AsterImage) -> Self {
        let name = format!("MEM:\"{}\":ImageData{}", self.scene_id, band.label());
        self.subdatasets.push(name.clone());
        self.rasters.insert(name, data);
        self
    }
}

impl SceneReader for MemoryScene {
    fn scene_id(&self) -> &str {
        &self.scene_id
    }

    fn metadata_item(&self, key: &str) -> Option<String> {
        self.metadata.get(key).cloned()
    }

    fn metadata_entries(&self) -> Vec<String> {
        self.metadata.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
    }

    fn subdataset_names(&self) -> Vec<String> {
        self.subdatasets.clone()
    }

    fn read_raster(&self, name: &str) -> AsterResult<AsterImage> {
        self.rasters
            .get(name)
            .cloned()
            .ok_or_else(|| AsterError::InvalidFormat(format!("No raster data for sub-dataset {}", name)))
    }
}
