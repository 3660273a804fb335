use crate::core::reproject::Resampler;
use crate::types::{AsterError, AsterImage, AsterResult, GridSpec, ReferenceSystem, ResamplingMethod};
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;

/// GDAL-backed reprojection between arbitrary reference systems
#[derive(Debug, Clone)]
pub struct GdalWarper {
    /// Working memory limit handed to the warper, bytes (0 = GDAL default)
    pub memory_limit: f64,
    /// Approximation error threshold in pixels (0 = exact transforms)
    pub max_error: f64,
}

impl Default for GdalWarper {
    fn default() -> Self {
        Self {
            memory_limit: 0.0,
            max_error: 0.0,
        }
    }
}

impl GdalWarper {
    pub fn new() -> Self {
        Self::default()
    }

    fn resample_alg(method: ResamplingMethod) -> gdal_sys::GDALResampleAlg::Type {
        use gdal_sys::GDALResampleAlg::*;
        match method {
            ResamplingMethod::Nearest => GRA_NearestNeighbour,
            ResamplingMethod::Bilinear => GRA_Bilinear,
            ResamplingMethod::Cubic => GRA_Cubic,
            ResamplingMethod::CubicSpline => GRA_CubicSpline,
            ResamplingMethod::Lanczos => GRA_Lanczos,
            ResamplingMethod::Average => GRA_Average,
            ResamplingMethod::Mode => GRA_Mode,
        }
    }

    fn spatial_ref(crs: &ReferenceSystem) -> AsterResult<SpatialRef> {
        Ok(match crs {
            ReferenceSystem::Epsg(code) => SpatialRef::from_epsg(*code)?,
            ReferenceSystem::Wkt(wkt) => SpatialRef::from_wkt(wkt)?,
        })
    }

    /// Single-band in-memory dataset holding `image` on `grid`
    fn mem_dataset(image: &AsterImage, grid: &GridSpec) -> AsterResult<Dataset> {
        let driver = DriverManager::get_driver_by_name("MEM")?;
        let (height, width) = image.dim();
        let mut dataset = driver.create_with_band_type::<f32, _>("", width as isize, height as isize, 1)?;
        dataset.set_geo_transform(&grid.transform.to_array())?;
        dataset.set_spatial_ref(&Self::spatial_ref(&grid.crs)?)?;

        {
            let mut rasterband = dataset.rasterband(1)?;
            let flat_data: Vec<f32> = image.iter().cloned().collect();
            let buffer = Buffer::new((width, height), flat_data);
            rasterband.write((0, 0), (width, height), &buffer)?;
        }
        Ok(dataset)
    }
}

impl Resampler for GdalWarper {
    fn reproject(
        &self,
        source: &AsterImage,
        src: &GridSpec,
        destination: &mut AsterImage,
        dst: &GridSpec,
        method: ResamplingMethod,
    ) -> AsterResult<()> {
        let src_ds = Self::mem_dataset(source, src)?;
        let dst_ds = Self::mem_dataset(destination, dst)?;

        let result = unsafe {
            gdal_sys::GDALReprojectImage(
                src_ds.c_dataset(),
                std::ptr::null(),
                dst_ds.c_dataset(),
                std::ptr::null(),
                Self::resample_alg(method),
                self.memory_limit,
                self.max_error,
                None,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if result != gdal_sys::CPLErr::CE_None {
            return Err(AsterError::Processing(format!(
                "GDALReprojectImage failed ({:?} -> {}, {:?})",
                src.crs, dst.crs, method
            )));
        }

        let (height, width) = destination.dim();
        let band = dst_ds.rasterband(1)?;
        let warped = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;
        *destination = Array2::from_shape_vec((height, width), warped.data)
            .map_err(|e| AsterError::Processing(format!("Failed to reshape warped band: {}", e)))?;
        Ok(())
    }
}
