//! Frame composition: turns one tick's values into positioned draw operations.
//!
//! Nothing here touches pixels. The composed [`Frame`] is handed to the
//! renderer afterwards, so layout is identical every tick for the same inputs.

use crate::{
    config::Thresholds,
    metrics::{DiskUsage, MemoryUsage, NetworkFact, Snapshot},
};

use super::icons::{classify, Glyph, IconSet, Level};

pub const STATUS_LINES: usize = 4;
/// Temperature column on the load line when an icon precedes it.
pub const TEMP_COLUMN_ICON_X: i32 = 75;
/// Temperature column on the load line in text-only mode.
pub const TEMP_COLUMN_TEXT_X: i32 = 80;
pub const OFFLINE_MARGIN_X: i32 = 10;
pub const OFFLINE_HOSTNAME_Y: i32 = 8;
pub const OFFLINE_STATUS_Y: i32 = 32;
pub const OFFLINE_WORD: &str = "OFFLINE";
const OFFLINE_ICON_KEY: &str = "offline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceKind {
    Text,
    TextLarge,
    Icon,
    IconLarge,
}

impl FaceKind {
    pub fn is_icon(&self) -> bool {
        matches!(self, FaceKind::Icon | FaceKind::IconLarge)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOp {
    pub x: i32,
    pub y: i32,
    pub face: FaceKind,
    pub text: String,
}

/// An ordered list of draw operations covering the whole canvas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    ops: Vec<DrawOp>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: i32, y: i32, face: FaceKind, text: impl Into<String>) {
        self.ops.push(DrawOp {
            x,
            y,
            face,
            text: text.into(),
        });
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text (non-icon) strings drawn at row `y`, left to right.
    pub fn texts_at(&self, y: i32) -> Vec<&str> {
        self.row(y, false)
    }

    /// Icon strings drawn at row `y`, left to right.
    pub fn glyphs_at(&self, y: i32) -> Vec<&str> {
        self.row(y, true)
    }

    fn row(&self, y: i32, icons: bool) -> Vec<&str> {
        let mut row: Vec<&DrawOp> = self
            .ops
            .iter()
            .filter(|op| op.y == y && op.face.is_icon() == icons)
            .collect();
        row.sort_by_key(|op| op.x);
        row.into_iter().map(|op| op.text.as_str()).collect()
    }
}

/// Four evenly spaced bands derived from the canvas height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pitch: i32,
}

impl Layout {
    pub fn new(height: u32) -> Self {
        Self {
            pitch: (height / STATUS_LINES as u32) as i32,
        }
    }

    /// Top y of band `line` (0-based).
    pub fn band(&self, line: usize) -> i32 {
        self.pitch * line as i32
    }
}

/// Per-metric verdicts for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    pub load: Level,
    pub temperature: Level,
    pub memory: Level,
    pub disk: Level,
}

impl Levels {
    pub fn classify(snapshot: &Snapshot, thresholds: &Thresholds) -> Self {
        Self {
            load: classify(snapshot.load, thresholds.load_warn),
            temperature: classify(snapshot.temperature, thresholds.temp_warn),
            memory: classify(snapshot.memory.percent, thresholds.mem_warn),
            disk: classify(snapshot.disk.percent, thresholds.disk_warn),
        }
    }
}

pub fn format_load(load: f64) -> String {
    format!("{load:.2}")
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.0}C")
}

/// An unavailable reading (zero total) shows bare zeros.
pub fn format_memory(memory: &MemoryUsage) -> String {
    if memory.total_gib <= 0.0 {
        return format!("0/0GB {:.0}%", memory.percent);
    }
    format!(
        "{:.1}/{:.1}GB {:.0}%",
        memory.used_gib, memory.total_gib, memory.percent
    )
}

pub fn format_disk(disk: &DiskUsage) -> String {
    format!("{}/{}GB {:.0}%", disk.used, disk.total, disk.percent)
}

/// Lay out the four status lines: network fact, load + temperature, memory, disk.
pub fn compose_status(
    layout: &Layout,
    icons: &IconSet,
    fact: &NetworkFact,
    snapshot: &Snapshot,
    levels: &Levels,
) -> Frame {
    let mut frame = Frame::new();

    let y = layout.band(0);
    icon_line(&mut frame, y, icons.glyph(fact.kind.icon_key()), &fact.value);

    let y = layout.band(1);
    icon_line(
        &mut frame,
        y,
        icons.glyph_for("load", levels.load),
        &format_load(snapshot.load),
    );
    let temperature = format_temperature(snapshot.temperature);
    match icons.glyph_for("temp", levels.temperature) {
        Some(glyph) => {
            frame.push(TEMP_COLUMN_ICON_X, y, FaceKind::Icon, glyph.text);
            frame.push(TEMP_COLUMN_ICON_X + glyph.advance, y, FaceKind::Text, temperature);
        }
        None => frame.push(TEMP_COLUMN_TEXT_X, y, FaceKind::Text, temperature),
    }

    let y = layout.band(2);
    icon_line(
        &mut frame,
        y,
        icons.glyph_for("mem", levels.memory),
        &format_memory(&snapshot.memory),
    );

    let y = layout.band(3);
    icon_line(
        &mut frame,
        y,
        icons.glyph_for("disk", levels.disk),
        &format_disk(&snapshot.disk),
    );

    frame
}

/// Hostname plus a large "OFFLINE" marker, shown once on shutdown.
pub fn compose_offline(icons: &IconSet, hostname: &str) -> Frame {
    let mut frame = Frame::new();
    frame.push(OFFLINE_MARGIN_X, OFFLINE_HOSTNAME_Y, FaceKind::Text, hostname);

    let mut x = OFFLINE_MARGIN_X;
    if let Some(glyph) = icons.glyph_large(OFFLINE_ICON_KEY) {
        frame.push(x, OFFLINE_STATUS_Y, FaceKind::IconLarge, glyph.text);
        x += glyph.advance;
    }
    frame.push(x, OFFLINE_STATUS_Y, FaceKind::TextLarge, OFFLINE_WORD);
    frame
}

fn icon_line(frame: &mut Frame, y: i32, glyph: Option<Glyph>, text: &str) {
    let mut x = 0;
    if let Some(glyph) = glyph {
        frame.push(x, y, FaceKind::Icon, glyph.text);
        x += glyph.advance;
    }
    frame.push(x, y, FaceKind::Text, text);
}
