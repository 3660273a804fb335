use crate::types::{
    AsterError, AsterImage, AsterReal, AsterResult, DestinationGrid, GeoPoint, GeoTransform, GridSpec,
    ReferenceSystem, ResamplingMethod, SOURCE_EPSG,
};
use std::collections::HashMap;

/// Raster reprojection primitive.
///
/// Resamples `source` on `src` onto `destination` on `dst`. Destination pixels
/// without source coverage are left untouched, so callers pre-fill
/// `destination` with their background.
pub trait Resampler: Send + Sync {
    fn reproject(
        &self,
        source: &AsterImage,
        src: &GridSpec,
        destination: &mut AsterImage,
        dst: &GridSpec,
        method: ResamplingMethod,
    ) -> AsterResult<()>;
}

/// Source transform spanning the scene corners
///
/// Built "from bounds": west/north from the upper-left corner, east/south from
/// the lower-right corner, no rotation.
pub fn source_transform(
    upper_left: GeoPoint,
    lower_right: GeoPoint,
    shape: (usize, usize),
) -> AsterResult<GeoTransform> {
    let (rows, cols) = shape;
    if rows == 0 || cols == 0 {
        return Err(AsterError::InvalidGeometry(format!("Source band has empty shape {}x{}", rows, cols)));
    }
    let finite = [upper_left.lat, upper_left.lon, lower_right.lat, lower_right.lon]
        .iter()
        .all(|v| v.is_finite());
    if !finite || upper_left.lat <= lower_right.lat || upper_left.lon >= lower_right.lon {
        return Err(AsterError::InvalidGeometry(format!(
            "Upper-left corner {:?} is not strictly north-west of lower-right corner {:?}",
            upper_left, lower_right
        )));
    }

    let (west, north) = (upper_left.lon, upper_left.lat);
    let (east, south) = (lower_right.lon, lower_right.lat);
    Ok(GeoTransform {
        top_left_x: west,
        pixel_width: (east - west) / cols as f64,
        rotation_x: 0.0,
        top_left_y: north,
        rotation_y: 0.0,
        pixel_height: (south - north) / rows as f64,
    })
}

/// Projects one band from its native scene grid onto the destination grid
pub struct BandReprojector<'a> {
    resampler: &'a dyn Resampler,
    method: ResamplingMethod,
}

impl<'a> BandReprojector<'a> {
    pub fn new(resampler: &'a dyn Resampler, method: ResamplingMethod) -> Self {
        Self { resampler, method }
    }

    pub fn reproject(
        &self,
        source: &AsterImage,
        upper_left: GeoPoint,
        lower_right: GeoPoint,
        destination: &DestinationGrid,
    ) -> AsterResult<AsterImage> {
        let src = GridSpec {
            transform: source_transform(upper_left, lower_right, source.dim())?,
            crs: ReferenceSystem::Epsg(SOURCE_EPSG),
        };
        let mut dst = destination.fill.clone();
        log::debug!(
            "Reprojecting {:?} -> {:?} ({:?})",
            source.dim(),
            dst.dim(),
            self.method
        );
        self.resampler
            .reproject(source, &src, &mut dst, &destination.grid_spec(), self.method)?;
        Ok(dst)
    }
}

/// Inverse-mapping resampler for grids that share one reference system
#[derive(Debug, Clone, Default)]
pub struct AffineResampler;

impl AffineResampler {
    pub fn new() -> Self {
        Self
    }
}

impl Resampler for AffineResampler {
    fn reproject(
        &self,
        source: &AsterImage,
        src: &GridSpec,
        destination: &mut AsterImage,
        dst: &GridSpec,
        method: ResamplingMethod,
    ) -> AsterResult<()> {
        if src.crs != dst.crs {
            return Err(AsterError::Processing(format!(
                "AffineResampler cannot transform between {} and {}",
                src.crs, dst.crs
            )));
        }
        let src_inverse = src
            .transform
            .invert()
            .ok_or_else(|| AsterError::InvalidGeometry("Source transform is not invertible".to_string()))?;

        // destination pixel (col, row) -> source pixel coordinates
        let to_source = |col: f64, row: f64| {
            let (x, y) = dst.transform.apply(col, row);
            src_inverse.apply(x, y)
        };

        let (src_rows, src_cols) = source.dim();
        let in_bounds = |x: f64, y: f64| x >= 0.0 && y >= 0.0 && x < src_cols as f64 && y < src_rows as f64;

        for ((row, col), out) in destination.indexed_iter_mut() {
            let (x, y) = to_source(col as f64 + 0.5, row as f64 + 0.5);
            if !in_bounds(x, y) {
                continue;
            }
            *out = match method {
                ResamplingMethod::Nearest => source[[y.floor() as usize, x.floor() as usize]],
                ResamplingMethod::Bilinear => sample_kernel(source, x, y, 1.0, triangle),
                ResamplingMethod::Cubic => sample_kernel(source, x, y, 2.0, catmull_rom),
                ResamplingMethod::CubicSpline => sample_kernel(source, x, y, 2.0, cubic_b_spline),
                ResamplingMethod::Lanczos => sample_kernel(source, x, y, 3.0, lanczos3),
                ResamplingMethod::Average | ResamplingMethod::Mode => {
                    let corners = [
                        to_source(col as f64, row as f64),
                        to_source(col as f64 + 1.0, row as f64),
                        to_source(col as f64, row as f64 + 1.0),
                        to_source(col as f64 + 1.0, row as f64 + 1.0),
                    ];
                    let footprint = footprint_values(source, &corners);
                    if footprint.is_empty() {
                        source[[y.floor() as usize, x.floor() as usize]]
                    } else if method == ResamplingMethod::Average {
                        footprint.iter().sum::<AsterReal>() / footprint.len() as AsterReal
                    } else {
                        most_frequent(&footprint)
                    }
                }
            };
        }
        Ok(())
    }
}

/// Separable kernel resampling around the continuous source position (x, y)
fn sample_kernel(source: &AsterImage, x: f64, y: f64, radius: f64, kernel: fn(f64) -> f64) -> AsterReal {
    let (rows, cols) = source.dim();
    // pixel centres sit at integer + 0.5
    let cx = x - 0.5;
    let cy = y - 0.5;
    let reach = radius.ceil() as i64;
    let (base_x, base_y) = (cx.floor() as i64, cy.floor() as i64);

    let mut sum = 0.0f64;
    let mut weight_sum = 0.0f64;
    for j in (base_y - reach + 1)..=(base_y + reach) {
        let wy = kernel(cy - j as f64);
        if wy == 0.0 {
            continue;
        }
        let sy = j.clamp(0, rows as i64 - 1) as usize;
        for i in (base_x - reach + 1)..=(base_x + reach) {
            let wx = kernel(cx - i as f64);
            if wx == 0.0 {
                continue;
            }
            let sx = i.clamp(0, cols as i64 - 1) as usize;
            let w = wx * wy;
            sum += w * source[[sy, sx]] as f64;
            weight_sum += w;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        source[[cy.round().clamp(0.0, rows as f64 - 1.0) as usize, cx.round().clamp(0.0, cols as f64 - 1.0) as usize]]
    } else {
        (sum / weight_sum) as AsterReal
    }
}

fn triangle(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        1.0 - t
    } else {
        0.0
    }
}

/// Keys cubic convolution, a = -0.5
fn catmull_rom(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        1.5 * t.powi(3) - 2.5 * t.powi(2) + 1.0
    } else if t < 2.0 {
        -0.5 * t.powi(3) + 2.5 * t.powi(2) - 4.0 * t + 2.0
    } else {
        0.0
    }
}

fn cubic_b_spline(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        (3.0 * t.powi(3) - 6.0 * t.powi(2) + 4.0) / 6.0
    } else if t < 2.0 {
        (2.0 - t).powi(3) / 6.0
    } else {
        0.0
    }
}

fn lanczos3(t: f64) -> f64 {
    const A: f64 = 3.0;
    let t = t.abs();
    if t < f64::EPSILON {
        1.0
    } else if t < A {
        let pt = std::f64::consts::PI * t;
        A * pt.sin() * (pt / A).sin() / (pt * pt)
    } else {
        0.0
    }
}

/// Source pixels whose centres fall inside the quadrilateral bounding box
fn footprint_values(source: &AsterImage, corners: &[(f64, f64); 4]) -> Vec<AsterReal> {
    let (rows, cols) = source.dim();
    let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

    let first_col = (min_x - 0.5).ceil().max(0.0) as usize;
    let first_row = (min_y - 0.5).ceil().max(0.0) as usize;
    let last_col = ((max_x - 0.5).floor().min(cols as f64 - 1.0)).max(-1.0);
    let last_row = ((max_y - 0.5).floor().min(rows as f64 - 1.0)).max(-1.0);
    if last_col < 0.0 || last_row < 0.0 {
        return Vec::new();
    }

    let mut values = Vec::new();
    for r in first_row..=last_row as usize {
        for c in first_col..=last_col as usize {
            values.push(source[[r, c]]);
        }
    }
    values
}

/// Most frequent value, lowest value wins ties
fn most_frequent(values: &[AsterReal]) -> AsterReal {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for v in values {
        *counts.entry(v.to_bits()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(bits, n)| (AsterReal::from_bits(bits), n))
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.total_cmp(&a.0)))
        .map(|(v, _)| v)
        .unwrap_or(AsterReal::NAN)
}
