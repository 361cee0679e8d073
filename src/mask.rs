//! Foreground mask synthesis.
//!
//! No segmentation model is ever loaded. Background removal goes through the
//! [`SegmentationStrategy`] trait, whose production implementation,
//! [`RadialFallback`], keeps a soft-edged disc around the image centre. A
//! model-backed strategy would implement the same trait and slot in via
//! [`strategy_for`].
//!
//! ## Mask styles
//!
//! Coordinates are normalised so the centres of the edge pixels sit at ±1 on
//! each axis; `d` below is the Euclidean length of that normalised offset.
//! Corner pixels therefore sit at `d = √2` and are fully transparent under
//! the radial style on any image at least 4 pixels on each side.
//!
//! | Style | Alpha |
//! |---|---|
//! | [`MaskStyle::RadialAlpha`] | 255 for `d ≤ 0.6`, then `255·(1.4 − d)` floored at 0 |
//! | [`MaskStyle::EllipticalSoft`] | `255·(1 − e²)^0.3` inside an ellipse of radii 0.35·w, 0.45·h |
//! | [`MaskStyle::ColorVarianceEdge`] | `255·(edge distance / max edge distance)^0.8` |
//!
//! `ColorVarianceEdge` looks only at position, never at colour; the name is
//! kept for compatibility with existing configurations.

use crate::imaging::RasterImage;
use serde::{Deserialize, Serialize};

/// Per-pixel opacity map, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl Mask {
    fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut alpha = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                alpha.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            alpha,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[u8] {
        &self.alpha
    }

    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// Alpha at `(x, y)`, or `None` outside the mask.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        (x < self.width && y < self.height)
            .then(|| self.alpha[(y as usize) * self.width as usize + x as usize])
    }
}

/// Geometric mask shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskStyle {
    RadialAlpha,
    EllipticalSoft,
    ColorVarianceEdge,
}

/// Build a mask of the given style. Pure and deterministic.
pub fn synthesize(width: u32, height: u32, style: MaskStyle) -> Mask {
    let grid = Grid::new(width, height);
    match style {
        MaskStyle::RadialAlpha => Mask::from_fn(width, height, |x, y| {
            let (nx, ny) = grid.normalized(x, y);
            radial_alpha((nx * nx + ny * ny).sqrt())
        }),
        MaskStyle::EllipticalSoft => {
            let rx = (0.35 * width as f64).max(f64::EPSILON);
            let ry = (0.45 * height as f64).max(f64::EPSILON);
            Mask::from_fn(width, height, |x, y| {
                let dx = (x as f64 - grid.cx) / rx;
                let dy = (y as f64 - grid.cy) / ry;
                let d2 = dx * dx + dy * dy;
                if d2 < 1.0 {
                    to_alpha(255.0 * (1.0 - d2).powf(0.3))
                } else {
                    0
                }
            })
        }
        MaskStyle::ColorVarianceEdge => {
            // Largest edge distance any pixel can have.
            let reach = (width.min(height).saturating_sub(1) / 2).max(1) as f64;
            Mask::from_fn(width, height, |x, y| {
                let edge = x.min(y).min(width - 1 - x).min(height - 1 - y) as f64;
                to_alpha(255.0 * (edge / reach).min(1.0).powf(0.8))
            })
        }
    }
}

/// Radial falloff as a function of normalised distance from centre.
pub fn radial_alpha(d: f64) -> u8 {
    if d <= 0.6 {
        255
    } else {
        to_alpha(255.0 * (1.4 - d))
    }
}

fn to_alpha(v: f64) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}

const MIN_HALF_EXTENT: f64 = 1.5;

/// Centre and half-extent of the pixel grid.
struct Grid {
    cx: f64,
    cy: f64,
    half_w: f64,
    half_h: f64,
}

impl Grid {
    fn new(width: u32, height: u32) -> Self {
        let cx = width.saturating_sub(1) as f64 / 2.0;
        let cy = height.saturating_sub(1) as f64 / 2.0;
        // Axes narrower than 4 pixels get a 1.5px half-extent so their
        // centre pixel still lands inside the opaque core.
        Self {
            cx,
            cy,
            half_w: cx.max(MIN_HALF_EXTENT),
            half_h: cy.max(MIN_HALF_EXTENT),
        }
    }

    fn normalized(&self, x: u32, y: u32) -> (f64, f64) {
        (
            (x as f64 - self.cx) / self.half_w,
            (y as f64 - self.cy) / self.half_h,
        )
    }
}

/// Something that can decide which pixels of an image are foreground.
pub trait SegmentationStrategy {
    /// Short identifier shown by `info` and in logs.
    fn name(&self) -> &'static str;

    /// Produce a mask with the same dimensions as `image`.
    fn mask(&self, image: &RasterImage) -> Mask;
}

/// Geometric fallback: a radial alpha gradient centred on the image.
#[derive(Debug, Default, Clone, Copy)]
pub struct RadialFallback;

impl SegmentationStrategy for RadialFallback {
    fn name(&self) -> &'static str {
        "radial"
    }

    fn mask(&self, image: &RasterImage) -> Mask {
        synthesize(image.width(), image.height(), MaskStyle::RadialAlpha)
    }
}

/// Weighted blend of a luma edge map, the elliptical centre mask and the
/// edge-distance mask (0.3 / 0.4 / 0.3).
#[derive(Debug, Default, Clone, Copy)]
pub struct BlendedHeuristic;

const EDGE_WEIGHT: f64 = 0.3;
const CENTER_WEIGHT: f64 = 0.4;
const BORDER_WEIGHT: f64 = 0.3;

impl SegmentationStrategy for BlendedHeuristic {
    fn name(&self) -> &'static str {
        "blended"
    }

    fn mask(&self, image: &RasterImage) -> Mask {
        let (w, h) = (image.width(), image.height());
        let edges = edge_map(image);
        let center = synthesize(w, h, MaskStyle::EllipticalSoft);
        let border = synthesize(w, h, MaskStyle::ColorVarianceEdge);

        let alpha = edges
            .iter()
            .zip(center.values())
            .zip(border.values())
            .map(|((&e, &c), &b)| {
                to_alpha(EDGE_WEIGHT * e as f64 + CENTER_WEIGHT * c as f64 + BORDER_WEIGHT * b as f64)
            })
            .collect();

        Mask {
            width: w,
            height: h,
            alpha,
        }
    }
}

/// Absolute 4-neighbour Laplacian of luma, clamped to 0–255. Borders replicate.
fn edge_map(image: &RasterImage) -> Vec<u8> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let stride = image.channels() as usize;
    let luma: Vec<f64> = image
        .pixels()
        .chunks_exact(stride)
        .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
        .collect();

    let at = |x: isize, y: isize| {
        let x = x.clamp(0, w as isize - 1) as usize;
        let y = y.clamp(0, h as isize - 1) as usize;
        luma[y * w + x]
    };

    let mut out = Vec::with_capacity(w * h);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let lap = at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1) - 4.0 * at(x, y);
            out.push(to_alpha(lap.abs()));
        }
    }
    out
}

/// Which segmentation strategy background removal uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Radial,
    Blended,
}

/// Instantiate the configured strategy.
pub fn strategy_for(kind: StrategyKind) -> Box<dyn SegmentationStrategy> {
    match kind {
        StrategyKind::Radial => Box::new(RadialFallback),
        StrategyKind::Blended => Box::new(BlendedHeuristic),
    }
}
