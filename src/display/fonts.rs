use std::fs;
use std::path::Path;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10, FONT_7X14, FONT_9X18},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use fontdue::{Font, FontSettings};

use super::{
    canvas::Canvas,
    layout::{FaceKind, Frame},
};
use crate::{
    config::{FontConfig, BUILTIN_FONT},
    Error, Result,
};

/// Coverage at or above half lights the pixel.
const COVERAGE_THRESHOLD: u8 = 128;

/// A TrueType font rasterized at one pixel size.
#[derive(Clone)]
pub struct TtfFace {
    font: Font,
    px: f32,
    ascent: f32,
}

impl TtfFace {
    pub fn load(path: &Path, px: u32) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|err| Error::Font(format!("{}: {err}", path.display())))?;
        Self::from_bytes(&bytes, px)
            .map_err(|err| Error::Font(format!("{}: {err}", path.display())))
    }

    pub fn from_bytes(bytes: &[u8], px: u32) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|err| Error::Font(err.to_string()))?;
        Ok(Self::from_font(font, px))
    }

    fn from_font(font: Font, px: u32) -> Self {
        let px = px as f32;
        let ascent = font
            .horizontal_line_metrics(px)
            .map(|metrics| metrics.ascent)
            .unwrap_or(px);
        Self { font, px, ascent }
    }

    /// Same typeface at another size.
    pub fn resized(&self, px: u32) -> Self {
        Self::from_font(self.font.clone(), px)
    }

    /// `(x, y)` is the top-left of the line box, not the baseline.
    fn draw(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str) {
        let baseline = y as f32 + self.ascent;
        let mut pen = x as f32;
        for ch in text.chars() {
            let (metrics, coverage) = self.font.rasterize(ch, self.px);
            let left = (pen + metrics.xmin as f32).round() as i32;
            let top = (baseline - metrics.ymin as f32 - metrics.height as f32).round() as i32;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    if coverage[row * metrics.width + col] >= COVERAGE_THRESHOLD {
                        canvas.set(left + col as i32, top + row as i32, true);
                    }
                }
            }
            pen += metrics.advance_width;
        }
    }
}

#[derive(Clone)]
pub enum Face {
    Ttf(TtfFace),
    Mono(&'static MonoFont<'static>),
}

impl Face {
    /// Closest embedded bitmap font for a requested pixel size.
    pub fn builtin(px: u32) -> Self {
        let font = match px {
            0..=11 => &FONT_6X10,
            12..=17 => &FONT_7X14,
            18..=21 => &FONT_9X18,
            _ => &FONT_10X20,
        };
        Face::Mono(font)
    }

    pub fn draw(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str) {
        match self {
            Face::Ttf(face) => face.draw(canvas, x, y, text),
            Face::Mono(font) => {
                let style = MonoTextStyle::new(*font, BinaryColor::On);
                let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
                    .draw(canvas);
            }
        }
    }
}

/// Text faces are mandatory; icon faces are present only when the icon font loaded.
#[derive(Clone)]
pub struct FontSet {
    text: Face,
    text_large: Face,
    icon: Option<Face>,
    icon_large: Option<Face>,
}

impl FontSet {
    /// Load the text font. Failing here is fatal for the daemon.
    pub fn load_text(cfg: &FontConfig, font_dir: &Path) -> Result<Self> {
        if cfg.text_font == BUILTIN_FONT {
            return Ok(Self::builtin(cfg.text_size, cfg.text_size_large));
        }
        let path = FontConfig::resolve(font_dir, &cfg.text_font);
        let text = TtfFace::load(&path, cfg.text_size)?;
        let text_large = text.resized(cfg.text_size_large);
        Ok(Self {
            text: Face::Ttf(text),
            text_large: Face::Ttf(text_large),
            icon: None,
            icon_large: None,
        })
    }

    pub fn builtin(text_size: u32, text_size_large: u32) -> Self {
        Self {
            text: Face::builtin(text_size),
            text_large: Face::builtin(text_size_large),
            icon: None,
            icon_large: None,
        }
    }

    /// Load the icon font. On error the set stays text-only.
    pub fn load_icons(&mut self, cfg: &FontConfig, font_dir: &Path) -> Result<()> {
        let path = FontConfig::resolve(font_dir, &cfg.icon_font);
        let icon = TtfFace::load(&path, cfg.icon_size)?;
        self.icon_large = Some(Face::Ttf(icon.resized(cfg.text_size_large)));
        self.icon = Some(Face::Ttf(icon));
        Ok(())
    }

    pub fn with_icons(mut self, icon: Face, icon_large: Face) -> Self {
        self.icon = Some(icon);
        self.icon_large = Some(icon_large);
        self
    }

    pub fn icons_loaded(&self) -> bool {
        self.icon.is_some()
    }

    fn face(&self, kind: FaceKind) -> Option<&Face> {
        match kind {
            FaceKind::Text => Some(&self.text),
            FaceKind::TextLarge => Some(&self.text_large),
            FaceKind::Icon => self.icon.as_ref(),
            FaceKind::IconLarge => self.icon_large.as_ref(),
        }
    }

    /// Rasterize every operation of `frame` onto `canvas`. Icon operations are
    /// skipped when no icon face is loaded.
    pub fn draw_frame(&self, frame: &Frame, canvas: &mut Canvas) {
        for op in frame.ops() {
            if let Some(face) = self.face(op.face) {
                face.draw(canvas, op.x, op.y, &op.text);
            }
        }
    }
}
