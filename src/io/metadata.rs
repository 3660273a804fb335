//! Scene metadata extraction from ASTER L1T product metadata.

use crate::types::{AsterError, AsterImage, AsterResult, BandId, GainSetting, GeoPoint, SolarGeometry};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;

/// Access to an opened scene: product metadata, per-band raster sources and
/// their pixels. Implemented by the GDAL HDF reader and the in-memory scene.
pub trait SceneReader: Send + Sync {
    /// Identifier used in diagnostics (usually the file path)
    fn scene_id(&self) -> &str;

    /// Value of a product-level metadata item
    fn metadata_item(&self, key: &str) -> Option<String>;

    /// All product-level metadata as "KEY=VALUE" entries
    fn metadata_entries(&self) -> Vec<String>;

    /// Names of the sub-datasets contained in the scene
    fn subdataset_names(&self) -> Vec<String>;

    /// Read one sub-dataset at native resolution
    fn read_raster(&self, name: &str) -> AsterResult<AsterImage>;
}

/// A band raster available in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct BandRaster {
    pub band: BandId,
    pub name: String,
}

/// Scene-level values needed for calibration and gridding
#[derive(Debug, Clone)]
pub struct SceneMetadata {
    pub scene_id: String,
    pub gains: HashMap<BandId, GainSetting>,
    pub solar: SolarGeometry,
    pub upper_left: GeoPoint,
    pub lower_right: GeoPoint,
    pub calendar_date: String,
    pub acquisition_date: NaiveDate,
}

/// Bands whose gain is not reported in the metadata
const FIXED_GAIN_BANDS: [BandId; 5] = [BandId::B10, BandId::B11, BandId::B12, BandId::B13, BandId::B14];

impl SceneMetadata {
    /// Extract all scene metadata; any missing or malformed field is fatal
    pub fn extract(reader: &dyn SceneReader) -> AsterResult<Self> {
        let scene_id = reader.scene_id().to_string();
        let fail = |field: &str, reason: String| AsterError::Metadata {
            scene: scene_id.clone(),
            field: field.to_string(),
            reason,
        };
        let required = |key: &str| {
            reader
                .metadata_item(key)
                .ok_or_else(|| fail(key, "missing".to_string()))
        };

        let solar = parse_pair(&required("SOLARDIRECTION")?)
            .map(|(azimuth, elevation)| SolarGeometry { azimuth, elevation })
            .map_err(|e| fail("SOLARDIRECTION", e))?;
        let upper_left = parse_pair(&required("UPPERLEFT")?)
            .map(|(lat, lon)| GeoPoint { lat, lon })
            .map_err(|e| fail("UPPERLEFT", e))?;
        let lower_right = parse_pair(&required("LOWERRIGHT")?)
            .map(|(lat, lon)| GeoPoint { lat, lon })
            .map_err(|e| fail("LOWERRIGHT", e))?;

        let calendar_date = required("CALENDARDATE")?.trim().to_string();
        let acquisition_date = crate::core::radiometry::parse_calendar_date(&calendar_date)
            .map_err(|e| fail("CALENDARDATE", e.to_string()))?;

        let mut gains = parse_gains(&reader.metadata_entries()).map_err(|e| fail("GAIN", e))?;
        // never reported for the TIR bands; forced even if present
        for band in FIXED_GAIN_BANDS {
            gains.insert(band, GainSetting::Normal);
        }

        log::debug!(
            "Scene {}: date {}, sun az/el {:.3}/{:.3}, UL {:?}, LR {:?}, {} gain entries",
            scene_id,
            calendar_date,
            solar.azimuth,
            solar.elevation,
            upper_left,
            lower_right,
            gains.len()
        );

        Ok(Self {
            scene_id,
            gains,
            solar,
            upper_left,
            lower_right,
            calendar_date,
            acquisition_date,
        })
    }

    /// Gain for a band; absence is a metadata error
    pub fn gain(&self, band: BandId) -> AsterResult<GainSetting> {
        self.gains.get(&band).copied().ok_or_else(|| AsterError::Metadata {
            scene: self.scene_id.clone(),
            field: "GAIN".to_string(),
            reason: format!("no gain reported for band {}", band),
        })
    }
}

/// Band rasters among the scene's sub-datasets ("...ImageData<band>")
pub fn band_rasters(reader: &dyn SceneReader) -> AsterResult<Vec<BandRaster>> {
    let mut rasters = Vec::new();
    for name in reader.subdataset_names() {
        let Some(pos) = name.rfind("ImageData") else {
            continue;
        };
        let label = &name[pos + "ImageData".len()..];
        let band = label.parse::<BandId>().map_err(|_| AsterError::Metadata {
            scene: reader.scene_id().to_string(),
            field: "SUBDATASETS".to_string(),
            reason: format!("unknown band '{}' in sub-dataset {}", label, name),
        })?;
        rasters.push(BandRaster { band, name });
    }
    Ok(rasters)
}

/// "a, b" -> (a, b)
fn parse_pair(value: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(format!("expected two comma separated numbers, got '{}'", value));
    }
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|e| format!("invalid number '{}': {}", s, e))
            .and_then(|v| if v.is_finite() { Ok(v) } else { Err(format!("non-finite value '{}'", s)) })
    };
    Ok((parse(parts[0])?, parse(parts[1])?))
}

/// Gain entries "GAIN.<n>=<band>, <gain>"
fn parse_gains(entries: &[String]) -> Result<HashMap<BandId, GainSetting>, String> {
    let key_re = Regex::new(r"^GAIN(\.\d+)?$").map_err(|e| e.to_string())?;
    let value_re = Regex::new(r"^\s*([0-9]+[A-Za-z]?)\s*,\s*([A-Za-z0-9]+)\s*$").map_err(|e| e.to_string())?;

    let mut gains = HashMap::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            continue;
        };
        if !key_re.is_match(key.trim()) {
            continue;
        }
        let cap = value_re
            .captures(value)
            .ok_or_else(|| format!("malformed gain entry '{}'", entry))?;
        let band = cap[1].parse::<BandId>().map_err(|e| e.to_string())?;
        let gain = cap[2].parse::<GainSetting>().map_err(|e| e.to_string())?;
        gains.insert(band, gain);
    }
    Ok(gains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryScene;

    fn complete_scene() -> MemoryScene {
        MemoryScene::new("AST_L1T_test.hdf")
            .with_metadata("SOLARDIRECTION", "45.123, 60.0")
            .with_metadata("UPPERLEFT", "-20.5, -50.25")
            .with_metadata("LOWERRIGHT", "-21.1, -49.6")
            .with_metadata("CALENDARDATE", "20170615")
            .with_metadata("GAIN.1", "01, HGH")
            .with_metadata("GAIN.2", "02, NOR")
            .with_metadata("GAIN.3", "3N, LG1")
            .with_metadata("GAIN.4", "3B, NOR")
            .with_metadata("GAIN.5", "04, LG2")
    }

    #[test]
    fn test_extract_complete_metadata() {
        let meta = SceneMetadata::extract(&complete_scene()).unwrap();
        assert_eq!(meta.solar.azimuth, 45.123);
        assert_eq!(meta.solar.elevation, 60.0);
        assert_eq!(meta.upper_left, GeoPoint { lat: -20.5, lon: -50.25 });
        assert_eq!(meta.lower_right, GeoPoint { lat: -21.1, lon: -49.6 });
        assert_eq!(meta.calendar_date, "20170615");
        assert_eq!(meta.gain(BandId::B1).unwrap(), GainSetting::High);
        assert_eq!(meta.gain(BandId::B3N).unwrap(), GainSetting::LowGain1);
        assert_eq!(meta.gain(BandId::B4).unwrap(), GainSetting::LowGain2);
        assert!(meta.gain(BandId::B9).is_err());
    }

    #[test]
    fn test_tir_gains_default_to_normal() {
        let scene = complete_scene().with_metadata("GAIN.10", "10, HGH");
        let meta = SceneMetadata::extract(&scene).unwrap();
        for band in FIXED_GAIN_BANDS {
            assert_eq!(meta.gain(band).unwrap(), GainSetting::Normal);
        }
    }

    #[test]
    fn test_missing_fields_are_fatal() {
        for key in ["SOLARDIRECTION", "UPPERLEFT", "LOWERRIGHT", "CALENDARDATE"] {
            let scene = complete_scene().without_metadata(key);
            match SceneMetadata::extract(&scene) {
                Err(AsterError::Metadata { scene, field, .. }) => {
                    assert_eq!(scene, "AST_L1T_test.hdf");
                    assert_eq!(field, key);
                }
                other => panic!("expected metadata error for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_malformed_fields_are_fatal() {
        let bad = [
            ("SOLARDIRECTION", "45.1"),
            ("UPPERLEFT", "north, west"),
            ("CALENDARDATE", "2017-06-15"),
            ("GAIN.1", "01 HGH"),
            ("GAIN.2", "02, MED"),
        ];
        for (key, value) in bad {
            let scene = complete_scene().with_metadata(key, value);
            assert!(SceneMetadata::extract(&scene).is_err(), "{}={} accepted", key, value);
        }
    }

    #[test]
    fn test_band_rasters_from_subdatasets() {
        let scene = complete_scene()
            .with_subdataset("HDF4_EOS:EOS_SWATH:\"f.hdf\":VNIR_Swath:ImageData1")
            .with_subdataset("HDF4_EOS:EOS_SWATH:\"f.hdf\":VNIR_Swath:ImageData3N")
            .with_subdataset("HDF4_EOS:EOS_SWATH:\"f.hdf\":TIR_Swath:ImageData14")
            .with_subdataset("HDF4_EOS:EOS_SWATH:\"f.hdf\":VNIR_Swath:Latitude");
        let rasters = band_rasters(&scene).unwrap();
        let bands: Vec<BandId> = rasters.iter().map(|r| r.band).collect();
        assert_eq!(bands, vec![BandId::B1, BandId::B3N, BandId::B14]);

        let broken = complete_scene().with_subdataset("x:ImageData15");
        assert!(matches!(band_rasters(&broken), Err(AsterError::Metadata { .. })));
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("1.5, -2.25").unwrap(), (1.5, -2.25));
        assert!(parse_pair("1.5").is_err());
        assert!(parse_pair("1.5, 2, 3").is_err());
        assert!(parse_pair("nan, 2").is_err());
    }
}
