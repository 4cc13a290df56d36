//! Block rendering of fingerprints.

use crate::config::RenderConfig;
use crate::error::{PhashError, Result};
use crate::fingerprint::{Fingerprint, FuzzyFingerprint};
use image::{ImageFormat, Rgb, RgbImage};
use log::debug;
use std::path::Path;

/// Returns the edge length of the square grid used for `bit_length` bits,
/// `floor(sqrt(bit_length))`.
pub fn grid_side(bit_length: u32) -> u32 {
    let mut side = f64::from(bit_length).sqrt() as u32;
    while u64::from(side) * u64::from(side) > u64::from(bit_length) {
        side -= 1;
    }
    while u64::from(side + 1) * u64::from(side + 1) <= u64::from(bit_length) {
        side += 1;
    }
    side
}

/// Renders `bit_length` cells with caller supplied colors.
///
/// `color_index[i]` selects the palette entry of bit `i`. Cells are laid out
/// column-major: bit `i` lands in column `i / side`, row `i % side`, with
/// `side = floor(sqrt(bit_length))`. Bits beyond `side * side` are not drawn,
/// so a length that is not a perfect square loses its trailing bits.
///
/// Every cell becomes a `block_size x block_size` square; the image is
/// `block_size * side` pixels wide and high.
pub fn render_indexed(
    bit_length: u32,
    color_index: &[usize],
    palette: &[Rgb<u8>],
    block_size: u32,
) -> Result<RgbImage> {
    let side = grid_side(bit_length);
    let cells = (side as usize) * (side as usize);

    if palette.is_empty() {
        return Err(PhashError::InvalidArgument("palette is empty".to_string()));
    }
    if color_index.len() < cells {
        return Err(PhashError::InvalidArgument(format!(
            "{} color indices for {} cells",
            color_index.len(),
            cells
        )));
    }
    if let Some(&idx) = color_index[..cells].iter().find(|&&idx| idx >= palette.len()) {
        return Err(PhashError::InvalidArgument(format!(
            "color index {} outside of a palette of {} colors",
            idx,
            palette.len()
        )));
    }

    fill_blocks(side, block_size, |i| palette[color_index[i]])
}

fn fill_blocks<F>(side: u32, block_size: u32, color_of: F) -> Result<RgbImage>
where
    F: Fn(usize) -> Rgb<u8>,
{
    if block_size == 0 {
        return Err(PhashError::InvalidArgument(
            "block size must be greater than zero".to_string(),
        ));
    }
    let too_large = || {
        PhashError::InvalidArgument(format!(
            "image of {} blocks of {} pixels is too large",
            side, block_size
        ))
    };
    let dimension = side.checked_mul(block_size).ok_or_else(too_large)?;
    // The RGB buffer must be addressable as a single allocation.
    let fits = (dimension as usize)
        .checked_mul(dimension as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .is_some_and(|bytes| bytes <= isize::MAX as usize);
    if !fits {
        return Err(too_large());
    }

    let side = side as usize;
    Ok(RgbImage::from_fn(dimension, dimension, |x, y| {
        let column = (x / block_size) as usize;
        let row = (y / block_size) as usize;
        color_of(column * side + row)
    }))
}

/// Renders fingerprints as grids of colored blocks.
#[derive(Debug, Clone, Default)]
pub struct BlockRenderer {
    config: RenderConfig,
}

impl BlockRenderer {
    /// Creates a renderer with the given configuration.
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Renders unset bits in the light color and set bits in the dark color.
    ///
    /// Assumes the default bit order. Algorithms that emit bits in a different
    /// order should map them with [`BlockRenderer::render_with`].
    pub fn render(&self, fp: &Fingerprint) -> Result<RgbImage> {
        let color_index: Vec<usize> = fp.bits().map(usize::from).collect();
        let palette = [Rgb(self.config.light), Rgb(self.config.dark)];
        self.render_with(fp, &color_index, &palette)
    }

    /// Renders a fingerprint with a caller supplied color index per bit.
    pub fn render_with(
        &self,
        fp: &Fingerprint,
        color_index: &[usize],
        palette: &[Rgb<u8>],
    ) -> Result<RgbImage> {
        render_indexed(fp.bit_length(), color_index, palette, self.config.block_size)
    }

    /// Renders a fuzzy fingerprint by blending from the light color (bit
    /// certainly unset) to the dark color (bit certainly set).
    pub fn render_certainty(&self, fuzzy: &FuzzyFingerprint) -> Result<RgbImage> {
        let side = grid_side(fuzzy.bit_length());
        let light = self.config.light;
        let dark = self.config.dark;
        let colors: Vec<Rgb<u8>> = (0..fuzzy.bit_length())
            .map(|bit| fuzzy.probability(bit).map(|p| blend(light, dark, p)))
            .collect::<Result<_>>()?;

        fill_blocks(side, self.config.block_size, |i| colors[i])
    }

    /// Renders a fingerprint and writes it as PNG.
    pub fn save_png<P: AsRef<Path>>(&self, fp: &Fingerprint, path: P) -> Result<()> {
        let path = path.as_ref();
        let img = self.render(fp)?;
        img.save_with_format(path, ImageFormat::Png)?;
        debug!(
            "rendered {}x{} fingerprint image to {}",
            img.width(),
            img.height(),
            path.display()
        );
        Ok(())
    }
}

fn blend(from: [u8; 3], to: [u8; 3], t: f64) -> Rgb<u8> {
    let mix = |a: u8, b: u8| -> u8 {
        let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgb([mix(from[0], to[0]), mix(from[1], to[1]), mix(from[2], to[2])])
}
