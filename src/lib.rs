//! asterl1t: ASTER L1T digital numbers to radiance and reflectance
//!
//! Reads the per-band rasters of one ASTER Level 1T scene, reprojects every band
//! from its native geographic grid onto a caller supplied grid, applies the
//! per-band/per-gain unit conversion and, optionally, the solar geometry and
//! Earth-Sun distance correction to top-of-atmosphere reflectance.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    AsterError, AsterImage, AsterCube, AsterProduct, AsterResult, BandDiagnostic, BandId,
    DestinationGrid, GainSetting, GeoPoint, GeoTransform, GridSpec, ProcessingMode,
    ReferenceSystem, ResamplingMethod, SkipReason, SolarGeometry,
};

pub use io::{HdfScene, MemoryScene, SceneMetadata, SceneReader};
pub use crate::core::{AffineResampler, GdalWarper, ProcessingParams, Resampler, SceneProcessor};

use std::path::Path;

/// Convert one ASTER L1T HDF file with GDAL reprojection
pub fn process_aster_file<P: AsRef<Path>>(
    path: P,
    destination: &DestinationGrid,
    params: ProcessingParams,
) -> AsterResult<AsterProduct> {
    let scene = HdfScene::open(path)?;
    let warper = GdalWarper::new();
    SceneProcessor::new(&warper, params).process(&scene, destination)
}

#[cfg(feature = "python")]
mod python {
    use super::*;
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray2};
    use pyo3::prelude::*;

    fn to_py_err(e: AsterError) -> PyErr {
        match e {
            AsterError::InvalidFormat(_) | AsterError::InvalidGeometry(_) => {
                PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e))
            }
            _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e)),
        }
    }

    /// Reflectance (or radiance) of an ASTER L1T .hdf file on the given grid.
    ///
    /// Returns an array of shape rows x cols x bands, bands ordered
    /// 1, 2, 3B, 3N, 4 ... 14 (10 slots for reflectance, 15 for radiance).
    #[pyfunction]
    #[pyo3(signature = (aster_file, destination, dst_transform, dst_crs, resampling="bilinear", return_radiance=false))]
    fn process_aster_dataset<'py>(
        py: Python<'py>,
        aster_file: &str,
        destination: PyReadonlyArray2<'py, f32>,
        dst_transform: [f64; 6],
        dst_crs: &str,
        resampling: &str,
        return_radiance: bool,
    ) -> PyResult<&'py PyArray3<f32>> {
        let grid = DestinationGrid::new(
            destination.as_array().to_owned(),
            GeoTransform::from_array(dst_transform),
            dst_crs.parse().map_err(to_py_err)?,
        );
        let params = ProcessingParams {
            mode: if return_radiance {
                ProcessingMode::Radiance
            } else {
                ProcessingMode::Reflectance
            },
            resampling: resampling.parse().map_err(to_py_err)?,
            parallel: true,
        };

        let path = aster_file.to_string();
        let product = py
            .allow_threads(move || process_aster_file(&path, &grid, params))
            .map_err(to_py_err)?;
        Ok(product.data.into_pyarray(py))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(process_aster_dataset, m)?)?;
        Ok(())
    }
}
