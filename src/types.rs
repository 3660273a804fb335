use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Digital numbers and calibrated values are carried as 32-bit floats
pub type AsterReal = f32;

/// 2D single-band image (rows x cols)
pub type AsterImage = Array2<AsterReal>;

/// 3D multi-band stack (rows x cols x bands)
pub type AsterCube = Array3<AsterReal>;

/// EPSG code of the geographic system the scene corners are expressed in
pub const SOURCE_EPSG: u32 = 4326;

/// ASTER band labels in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BandId {
    B1,
    B2,
    B3B,
    B3N,
    B4,
    B5,
    B6,
    B7,
    B8,
    B9,
    B10,
    B11,
    B12,
    B13,
    B14,
}

impl BandId {
    /// All bands, ordered by output index
    pub const ALL: [BandId; 15] = [
        BandId::B1,
        BandId::B2,
        BandId::B3B,
        BandId::B3N,
        BandId::B4,
        BandId::B5,
        BandId::B6,
        BandId::B7,
        BandId::B8,
        BandId::B9,
        BandId::B10,
        BandId::B11,
        BandId::B12,
        BandId::B13,
        BandId::B14,
    ];

    /// Label as written in the product metadata ("1", "3N", "14", ...)
    pub fn label(&self) -> &'static str {
        match self {
            BandId::B1 => "1",
            BandId::B2 => "2",
            BandId::B3B => "3B",
            BandId::B3N => "3N",
            BandId::B4 => "4",
            BandId::B5 => "5",
            BandId::B6 => "6",
            BandId::B7 => "7",
            BandId::B8 => "8",
            BandId::B9 => "9",
            BandId::B10 => "10",
            BandId::B11 => "11",
            BandId::B12 => "12",
            BandId::B13 => "13",
            BandId::B14 => "14",
        }
    }
}

impl std::fmt::Display for BandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for BandId {
    type Err = AsterError;

    /// Accepts zero-padded labels as found in gain entries ("01", "03N")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('0').to_uppercase();
        BandId::ALL
            .iter()
            .copied()
            .find(|band| band.label() == trimmed)
            .ok_or_else(|| AsterError::InvalidFormat(format!("Unknown ASTER band: '{}'", s)))
    }
}

/// Instrument gain settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GainSetting {
    High,
    Normal,
    LowGain1,
    LowGain2,
}

impl GainSetting {
    /// Column in the unit conversion table
    pub fn column(&self) -> usize {
        match self {
            GainSetting::High => 0,
            GainSetting::Normal => 1,
            GainSetting::LowGain1 => 2,
            GainSetting::LowGain2 => 3,
        }
    }
}

impl std::fmt::Display for GainSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainSetting::High => write!(f, "HGH"),
            GainSetting::Normal => write!(f, "NOR"),
            GainSetting::LowGain1 => write!(f, "LG1"),
            GainSetting::LowGain2 => write!(f, "LG2"),
        }
    }
}

impl FromStr for GainSetting {
    type Err = AsterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HGH" | "HIGH" => Ok(GainSetting::High),
            "NOR" | "NORMAL" => Ok(GainSetting::Normal),
            "LG1" | "LOW1" => Ok(GainSetting::LowGain1),
            "LG2" | "LOW2" => Ok(GainSetting::LowGain2),
            _ => Err(AsterError::InvalidFormat(format!("Unknown gain setting: '{}'", s))),
        }
    }
}

/// Output quantity of a conversion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// At-sensor radiance for all 15 bands
    Radiance,
    /// Top-of-atmosphere reflectance for the VNIR/SWIR bands
    Reflectance,
}

impl ProcessingMode {
    /// Number of band slots in the output cube
    pub fn band_count(&self) -> usize {
        match self {
            ProcessingMode::Radiance => 15,
            // band "9" keeps its fixed index 9
            ProcessingMode::Reflectance => 10,
        }
    }
}

/// Resampling methods offered by the reprojection primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingMethod {
    Nearest,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
    Average,
    Mode,
}

impl FromStr for ResamplingMethod {
    type Err = AsterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" | "near" => Ok(ResamplingMethod::Nearest),
            "bilinear" => Ok(ResamplingMethod::Bilinear),
            "cubic" => Ok(ResamplingMethod::Cubic),
            "cubic_spline" | "cubicspline" => Ok(ResamplingMethod::CubicSpline),
            "lanczos" => Ok(ResamplingMethod::Lanczos),
            "average" => Ok(ResamplingMethod::Average),
            "mode" => Ok(ResamplingMethod::Mode),
            _ => Err(AsterError::InvalidFormat(format!("Unknown resampling method: '{}'", s))),
        }
    }
}

/// Coordinate reference system identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceSystem {
    Epsg(u32),
    Wkt(String),
}

impl FromStr for ReferenceSystem {
    type Err = AsterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AsterError::InvalidFormat("Empty reference system".to_string()));
        }
        let upper = trimmed.to_uppercase();
        if let Some(code) = upper.strip_prefix("EPSG:") {
            let code = code
                .parse::<u32>()
                .map_err(|e| AsterError::InvalidFormat(format!("Invalid EPSG code '{}': {}", trimmed, e)))?;
            return Ok(ReferenceSystem::Epsg(code));
        }
        Ok(ReferenceSystem::Wkt(trimmed.to_string()))
    }
}

impl std::fmt::Display for ReferenceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceSystem::Epsg(code) => write!(f, "EPSG:{}", code),
            ReferenceSystem::Wkt(wkt) => write!(f, "{}", wkt),
        }
    }
}

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Six-coefficient affine transform, GDAL ordering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_array(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Map continuous pixel coordinates (col, row) to georeferenced (x, y)
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.top_left_x + col * self.pixel_width + row * self.rotation_x,
            self.top_left_y + col * self.rotation_y + row * self.pixel_height,
        )
    }

    /// Inverse transform, `None` when the matrix is singular
    pub fn invert(&self) -> Option<GeoTransform> {
        let det = self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y;
        if det.abs() < 1e-15 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = self.pixel_height * inv_det;
        let b = -self.rotation_x * inv_det;
        let d = -self.rotation_y * inv_det;
        let e = self.pixel_width * inv_det;
        Some(GeoTransform {
            top_left_x: -(a * self.top_left_x + b * self.top_left_y),
            pixel_width: a,
            rotation_x: b,
            top_left_y: -(d * self.top_left_x + e * self.top_left_y),
            rotation_y: d,
            pixel_height: e,
        })
    }
}

/// Georeferencing of a raster grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub transform: GeoTransform,
    pub crs: ReferenceSystem,
}

/// Caller-provided target grid; `fill` fixes the shape and background values
#[derive(Debug, Clone)]
pub struct DestinationGrid {
    pub fill: AsterImage,
    pub transform: GeoTransform,
    pub crs: ReferenceSystem,
}

impl DestinationGrid {
    pub fn new(fill: AsterImage, transform: GeoTransform, crs: ReferenceSystem) -> Self {
        Self { fill, transform, crs }
    }

    /// Destination grid with a constant background
    pub fn filled(rows: usize, cols: usize, value: AsterReal, transform: GeoTransform, crs: ReferenceSystem) -> Self {
        Self::new(Array2::from_elem((rows, cols), value), transform, crs)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.fill.dim()
    }

    pub fn grid_spec(&self) -> GridSpec {
        GridSpec {
            transform: self.transform,
            crs: self.crs.clone(),
        }
    }

    pub fn validate(&self) -> AsterResult<()> {
        let (rows, cols) = self.shape();
        if rows == 0 || cols == 0 {
            return Err(AsterError::InvalidGeometry(format!(
                "Destination grid has empty shape {}x{}",
                rows, cols
            )));
        }
        if self.transform.to_array().iter().any(|v| !v.is_finite()) || self.transform.invert().is_none() {
            return Err(AsterError::InvalidGeometry(format!(
                "Destination transform is not invertible: {:?}",
                self.transform.to_array()
            )));
        }
        Ok(())
    }
}

/// Sun position at acquisition time, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarGeometry {
    pub azimuth: f64,
    pub elevation: f64,
}

/// Why a band slot was left at the fill value
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No unit conversion coefficient for the band at this gain
    MissingCoefficient(GainSetting),
    /// No solar irradiance constant, reflectance is undefined
    NoIrradiance,
    /// The band has no slot in the requested output
    NoOutputSlot,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingCoefficient(gain) => write!(f, "no unit conversion coefficient for gain {}", gain),
            SkipReason::NoIrradiance => write!(f, "no solar irradiance constant"),
            SkipReason::NoOutputSlot => write!(f, "band has no slot in the output"),
        }
    }
}

/// Recoverable per-band condition reported next to the product
#[derive(Debug, Clone, PartialEq)]
pub struct BandDiagnostic {
    pub band: BandId,
    pub reason: SkipReason,
}

/// Result of converting one scene
#[derive(Debug, Clone)]
pub struct AsterProduct {
    pub scene_id: String,
    pub mode: ProcessingMode,
    /// rows x cols x bands, band axis ordered by the band index table
    pub data: AsterCube,
    pub bands_written: Vec<BandId>,
    pub diagnostics: Vec<BandDiagnostic>,
}

impl AsterProduct {
    pub fn band(&self, band: BandId) -> Option<ndarray::ArrayView2<'_, AsterReal>> {
        let index = crate::core::calibration::band_index(band);
        if index < self.data.dim().2 {
            Some(self.data.index_axis(ndarray::Axis(2), index))
        } else {
            None
        }
    }
}

/// Error types for ASTER processing
#[derive(Debug, thiserror::Error)]
pub enum AsterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Metadata error in scene '{scene}', field {field}: {reason}")]
    Metadata {
        scene: String,
        field: String,
        reason: String,
    },

    #[error("Invalid grid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for ASTER operations
pub type AsterResult<T> = Result<T, AsterError>;
