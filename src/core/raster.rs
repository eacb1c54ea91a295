//! Projection and rasterization of reconciled footprints
//!
//! One uniform scale maps the geographic bounding box of the whole building
//! set onto the canvas; each footprint becomes a closed, filled polygon path.
//! Longitude and latitude degrees are not equal-area, but across a single
//! city extent the distortion of a shared linear scale is accepted.

use raqote::{DrawOptions, DrawTarget, PathBuilder, SolidSource, Source};

use crate::core::error::{Error, Result};
use crate::core::model::Building;

/// Smallest span a bounding box axis may report, in degrees. Keeps the
/// derived scale finite when every point shares a longitude or latitude.
const MIN_SPAN: f64 = 1e-9;

/// Minimum corners a footprint needs before it is worth filling
const MIN_POLYGON_POINTS: usize = 3;

/// Geographic extent of a building set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Scan every node of every building once. Fails with
    /// [`Error::EmptyInput`] when there is not a single point to cover.
    pub fn compute(buildings: &[Building]) -> Result<Self> {
        let mut nodes = buildings.iter().flat_map(|building| building.nodes.iter());

        let Some(first) = nodes.next() else {
            return Err(Error::EmptyInput);
        };

        let mut bbox = BoundingBox {
            min_lon: first.lon,
            max_lon: first.lon,
            min_lat: first.lat,
            max_lat: first.lat,
        };
        for node in nodes {
            bbox.min_lon = bbox.min_lon.min(node.lon);
            bbox.max_lon = bbox.max_lon.max(node.lon);
            bbox.min_lat = bbox.min_lat.min(node.lat);
            bbox.max_lat = bbox.max_lat.max(node.lat);
        }
        Ok(bbox)
    }

    pub fn lon_span(&self) -> f64 {
        (self.max_lon - self.min_lon).max(MIN_SPAN)
    }

    pub fn lat_span(&self) -> f64 {
        (self.max_lat - self.min_lat).max(MIN_SPAN)
    }
}

/// Geographic-to-pixel mapping with a single uniform scale
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    min_lon: f64,
    max_lat: f64,
    scale: f64,
}

impl Projection {
    /// Uniform scale: the smaller of the per-axis scales, so the whole
    /// extent fits the canvas without geographic distortion.
    pub fn new(bbox: &BoundingBox, width: u32, height: u32) -> Self {
        let scale_x = f64::from(width) / bbox.lon_span();
        let scale_y = f64::from(height) / bbox.lat_span();
        Self {
            min_lon: bbox.min_lon,
            max_lat: bbox.max_lat,
            scale: scale_x.min(scale_y),
        }
    }

    /// Project a geographic point into pixel space. Y is flipped: latitude
    /// grows northward, raster rows grow downward.
    pub fn project(&self, lat: f64, lon: f64) -> (f32, f32) {
        let x = (lon - self.min_lon) * self.scale;
        let y = (self.max_lat - lat) * self.scale;
        (x as f32, y as f32)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// Fill every footprint onto a white canvas as a solid black polygon.
///
/// Buildings with fewer than three effective corners are silently skipped.
/// Render order does not matter; footprints do not overlap in practice, and
/// an overlapping fill just paints the same color twice.
pub fn render(buildings: &[Building], width: u32, height: u32) -> Result<DrawTarget> {
    let canvas_width = checked_dimension(width, "width")?;
    let canvas_height = checked_dimension(height, "height")?;

    let bbox = BoundingBox::compute(buildings)?;
    let projection = Projection::new(&bbox, width, height);

    let mut target = DrawTarget::new(canvas_width, canvas_height);
    target.clear(SolidSource::from_unpremultiplied_argb(0xff, 0xff, 0xff, 0xff));

    let fill = Source::Solid(SolidSource::from_unpremultiplied_argb(0xff, 0x00, 0x00, 0x00));
    let draw_options = DrawOptions::new();

    for building in buildings {
        if building.effective_points() < MIN_POLYGON_POINTS {
            continue;
        }

        let mut pb = PathBuilder::new();
        let (x0, y0) = projection.project(building.nodes[0].lat, building.nodes[0].lon);
        pb.move_to(x0, y0);
        for node in &building.nodes[1..] {
            let (x, y) = projection.project(node.lat, node.lon);
            pb.line_to(x, y);
        }
        pb.close();

        target.fill(&pb.finish(), &fill, &draw_options);
    }

    Ok(target)
}

fn checked_dimension(value: u32, name: &str) -> Result<i32> {
    if value == 0 {
        return Err(Error::InvalidInput(format!("canvas {name} must be non-zero")));
    }
    i32::try_from(value)
        .map_err(|_| Error::InvalidInput(format!("canvas {name} {value} out of range")))
}
