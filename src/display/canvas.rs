use std::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

/// Monochrome frame buffer, fully redrawn every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; (width * height) as usize],
        }
    }

    /// Fill with the "off" value so nothing from the previous frame survives.
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Out-of-bounds writes are clipped.
    pub fn set(&mut self, x: i32, y: i32, on: bool) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx] = on;
        }
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map(|idx| self.pixels[idx]).unwrap_or(false)
    }

    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|on| **on).count()
    }

    pub fn is_blank(&self) -> bool {
        self.lit() == 0
    }

    /// Lit pixels inside the horizontal band `[top, top + height)`.
    pub fn lit_in_band(&self, top: i32, height: i32) -> usize {
        (top..top + height)
            .flat_map(|y| (0..self.width as i32).map(move |x| (x, y)))
            .filter(|(x, y)| self.get(*x, *y))
            .count()
    }

    /// Every pixel as `(x, y, on)`, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, bool)> + '_ {
        self.pixels.iter().enumerate().map(move |(idx, on)| {
            let idx = idx as u32;
            (idx % self.width, idx / self.width, *on)
        })
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}
