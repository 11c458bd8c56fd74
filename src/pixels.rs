//! Reduces still images to a single-channel intensity grid.

use std::path::{Path, PathBuf};

use crate::prelude::*;

// BT.601 luma weights
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

const RGB_STRIDE: usize = 3;

/// Anything that can hand over a `width × height` grid of intensities in
/// `0..=255`.
pub trait PixelSource {
    fn pixels(&self) -> R<PixelGrid>;
}

/// Row-major grid of grayscale intensities. Row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    intensities: Vec<u8>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, intensities: Vec<u8>) -> R<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("Image has no pixels ({width}x{height})"));
        }
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| anyhow!("Image dimensions {width}x{height} overflow"))?;
        if intensities.len() != expected {
            return Err(anyhow!(
                "A {width}x{height} grid needs {expected} intensities, got {}",
                intensities.len()
            ));
        }
        Ok(Self {
            width,
            height,
            intensities,
        })
    }

    /// Builds a grid from packed 8-bit RGB triples.
    pub fn from_rgb(width: usize, height: usize, rgb: &[u8]) -> R<Self> {
        if rgb.len() % RGB_STRIDE != 0 {
            return Err(anyhow!(
                "RGB data of {} bytes is not a whole number of pixels",
                rgb.len()
            ));
        }
        let intensities = rgb
            .chunks_exact(RGB_STRIDE)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect();
        Self::new(width, height, intensities)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.intensities.get(y * self.width + x).copied()
    }

    /// Intensities of column `x`, top to bottom.
    pub fn column(&self, x: usize) -> impl Iterator<Item = u8> + '_ {
        self.intensities
            .iter()
            .skip(x)
            .step_by(self.width)
            .take(if x < self.width { self.height } else { 0 })
            .copied()
    }
}

impl PixelSource for PixelGrid {
    fn pixels(&self) -> R<PixelGrid> {
        Ok(self.clone())
    }
}

/// BT.601 luma, truncated toward zero.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    (f64::from(r) * LUMA_R + f64::from(g) * LUMA_G + f64::from(b) * LUMA_B) as u8
}

/// A PNG or JPEG file on disk. Any alpha channel is dropped.
#[derive(Debug, Clone)]
pub struct ImagePixels {
    path: PathBuf,
}

impl ImagePixels {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PixelSource for ImagePixels {
    fn pixels(&self) -> R<PixelGrid> {
        let image = image::open(&self.path)
            .with_context(|| format!("Failed to open image: {}", self.path.display()))?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        tracing::debug!(path = %self.path.display(), width, height, "loaded image");

        PixelGrid::from_rgb(width as usize, height as usize, rgb.as_raw())
            .with_context(|| format!("Unusable image: {}", self.path.display()))
    }
}
