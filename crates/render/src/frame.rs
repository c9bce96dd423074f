//! Frame buffer and the tiles it is rendered in.

use glam::Vec3;

/// Maps a linear channel value to 8 bits: `round(clamp(v, 0, 1) * 255)`.
///
/// NaN maps to 0.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Axis aligned pixel rectangle, `x1`/`y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileRect {
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    #[must_use]
    pub const fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }
}

/// Pixels of one rectangle, rendered independently of the frame buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub rect: TileRect,
    /// Row-major within the tile.
    pub pixels: Vec<Vec3>,
}

impl Tile {
    #[must_use]
    pub fn new(rect: TileRect) -> Self {
        Self { rect, pixels: vec![Vec3::ZERO; rect.area()] }
    }

    /// Sets the pixel at image coordinates `(x, y)`, which must lie inside the tile.
    pub fn set(&mut self, x: u32, y: u32, color: Vec3) {
        let i =
            (y - self.rect.y0) as usize * self.rect.width() as usize + (x - self.rect.x0) as usize;
        self.pixels[i] = color;
    }
}

/// Row-major linear RGB frame buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    tile_size: u32,
    pixels: Vec<Vec3>,
}

impl Image {
    #[must_use]
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        Self {
            width,
            height,
            tile_size: tile_size.max(1),
            pixels: vec![Vec3::ZERO; width as usize * height as usize],
        }
    }

    #[must_use]
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize)
            .then(|| Self { width, height, tile_size: 32, pixels })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[must_use]
    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Vec3] {
        &mut self.pixels
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Vec3> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    pub fn set(&mut self, x: u32, y: u32, color: Vec3) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.pixels[i] = color;
        }
    }

    const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Tiles per row and per column, rounding partial tiles up.
    #[must_use]
    pub const fn tile_grid(&self) -> (u32, u32) {
        (self.width.div_ceil(self.tile_size), self.height.div_ceil(self.tile_size))
    }

    #[must_use]
    pub const fn tile_count(&self) -> usize {
        let (tx, ty) = self.tile_grid();
        tx as usize * ty as usize
    }

    /// Rectangle of tile `index` in row-major tile order, clipped to the image.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tile(&self, index: usize) -> Option<TileRect> {
        if index >= self.tile_count() {
            return None;
        }
        let (tx, _) = self.tile_grid();
        let col = (index % tx as usize) as u32;
        let row = (index / tx as usize) as u32;
        let x0 = col * self.tile_size;
        let y0 = row * self.tile_size;
        Some(TileRect {
            x0,
            y0,
            x1: (x0 + self.tile_size).min(self.width),
            y1: (y0 + self.tile_size).min(self.height),
        })
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileRect> + '_ {
        (0..self.tile_count()).filter_map(|i| self.tile(i))
    }

    /// Copies a rendered tile into the frame buffer.
    pub fn merge_tile(&mut self, tile: &Tile) {
        let width = tile.rect.width() as usize;
        if width == 0 {
            return;
        }
        for (row, src) in tile.pixels.chunks_exact(width).enumerate() {
            let y = tile.rect.y0 as usize + row;
            if y >= self.height as usize {
                break;
            }
            let start = y * self.width as usize + tile.rect.x0 as usize;
            let end = (start + width).min((y + 1) * self.width as usize);
            self.pixels[start..end].copy_from_slice(&src[..end - start]);
        }
    }

    /// 8-bit RGB bytes, row-major.
    #[must_use]
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| [quantize(c.x), quantize(c.y), quantize(c.z)])
            .collect()
    }
}
