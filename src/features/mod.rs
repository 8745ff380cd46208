pub mod segments;
pub mod speed_inputs;
pub mod triangle;

use crate::app::UiEvent;
use crate::config::Palette;
use crate::gfx::{draw::DrawContext, math::Rect};

/// A piece of the screen that owns a rectangle of it.
pub trait Feature {
    fn name(&self) -> &'static str;
    fn layout(&mut self, area: Rect);
    fn update(&mut self, now: f64);
    /// Returns true when the event was consumed.
    fn handle_event(&mut self, event: &UiEvent, now: f64) -> bool;
    fn render(&self, draw: &mut DrawContext, palette: &Palette, now: f64);
}
