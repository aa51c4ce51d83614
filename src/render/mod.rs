//! Rendering surfaces for the gallery.

mod html;
mod surface;

pub use html::{HtmlPage, DEFAULT_TEMPLATE};
pub use surface::{check_regions, MemorySurface, Region, RenderError, Surface};
