pub mod canvas;
pub mod fonts;
pub mod icons;
pub mod layout;
pub mod panel;

pub use canvas::Canvas;
pub use fonts::{Face, FontSet};
pub use icons::{IconSet, Level};
pub use layout::{Frame, Layout, Levels};
pub use panel::{MemoryPanel, Panel};
