use crate::io::metadata::SceneReader;
use crate::types::{AsterError, AsterImage, AsterResult};
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// ASTER L1T HDF-EOS scene opened through GDAL's HDF4 driver.
///
/// Product metadata and sub-dataset names are read once on open; band
/// sub-datasets are opened on demand, one dataset per read, so the reader can
/// be shared across worker threads.
pub struct HdfScene {
    path: PathBuf,
    scene_id: String,
    metadata: HashMap<String, String>,
    entries: Vec<String>,
    subdatasets: Vec<String>,
}

impl HdfScene {
    pub fn open<P: AsRef<Path>>(path: P) -> AsterResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(AsterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )));
        }

        log::info!("Opening ASTER scene: {}", path.display());
        let dataset = Dataset::open(&path)?;

        let entries = dataset.metadata_domain("").unwrap_or_default();
        let metadata: HashMap<String, String> = entries
            .iter()
            .filter_map(|e| e.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        // SUBDATASET_<n>_NAME=<name>, SUBDATASET_<n>_DESC=<description>
        let subdatasets: Vec<String> = dataset
            .metadata_domain("SUBDATASETS")
            .unwrap_or_default()
            .iter()
            .filter_map(|e| e.split_once('='))
            .filter(|(k, _)| k.ends_with("_NAME"))
            .map(|(_, v)| v.to_string())
            .collect();

        log::debug!(
            "{} metadata entries, {} sub-datasets",
            entries.len(),
            subdatasets.len()
        );

        Ok(Self {
            scene_id: path.display().to_string(),
            path,
            metadata,
            entries,
            subdatasets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SceneReader for HdfScene {
    fn scene_id(&self) -> &str {
        &self.scene_id
    }

    fn metadata_item(&self, key: &str) -> Option<String> {
        self.metadata.get(key).cloned()
    }

    fn metadata_entries(&self) -> Vec<String> {
        self.entries.clone()
    }

    fn subdataset_names(&self) -> Vec<String> {
        self.subdatasets.clone()
    }

    fn read_raster(&self, name: &str) -> AsterResult<AsterImage> {
        let dataset = Dataset::open(Path::new(name))?;
        let (width, height) = dataset.raster_size();
        let rasterband = dataset.rasterband(1)?;
        let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| AsterError::Processing(format!("Failed to reshape {}: {}", name, e)))
    }
}
