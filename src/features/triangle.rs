use super::Feature;
use crate::app::UiEvent;
use crate::config::Palette;
use crate::gfx::{anim::{perimeter_point, EdgeSequence}, draw::DrawContext, math::{Rect, Vec2}};
use crate::speeds::EdgeDurations;

/// Equilateral triangle centred in `area`, pointing up. The side is
/// `scale` times the shorter side of the area.
///
/// Returns top, bottom-left, bottom-right.
pub fn triangle_vertices(area: Rect, scale: f32) -> [Vec2; 3] {
    let side = area.width.min(area.height) * scale;
    let height = 3.0f32.sqrt() / 2.0 * side;
    let c = area.center();

    [
        Vec2::new(c.x, c.y - height / 2.0),
        Vec2::new(c.x - side / 2.0, c.y + height / 2.0),
        Vec2::new(c.x + side / 2.0, c.y + height / 2.0),
    ]
}

/// The triangle outline and the dot running around it.
pub struct TriangleView {
    vertices: [Vec2; 3],
    sequence: EdgeSequence,
    scale: f32,
    stroke_width: f32,
    dot_radius: f32,
}

impl TriangleView {
    pub fn new(durations: EdgeDurations, scale: f32, stroke_width: f32, dot_radius: f32) -> Self {
        Self {
            vertices: [Vec2::default(); 3],
            sequence: EdgeSequence::new(durations),
            scale,
            stroke_width,
            dot_radius,
        }
    }

    /// Swaps in new edge durations; the dot starts over at the top vertex.
    pub fn set_durations(&mut self, durations: EdgeDurations, now: f64) {
        self.sequence.set_durations(durations, now);
    }

    pub fn progress(&self) -> f32 {
        self.sequence.progress()
    }

    pub fn dot_position(&self) -> Vec2 {
        perimeter_point(&self.vertices, self.sequence.progress())
    }
}

impl Feature for TriangleView {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn layout(&mut self, area: Rect) {
        self.vertices = triangle_vertices(area, self.scale);
    }

    fn update(&mut self, now: f64) {
        self.sequence.update(now);
    }

    fn handle_event(&mut self, _event: &UiEvent, _now: f64) -> bool {
        false
    }

    fn render(&self, draw: &mut DrawContext, palette: &Palette, _now: f64) {
        draw.polygon_outline(&self.vertices, self.stroke_width, palette.triangle);
        draw.circle(self.dot_position(), self.dot_radius, palette.dot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_form_an_equilateral_triangle() {
        let area = Rect::new(0.0, 0.0, 400.0, 600.0);
        let [top, left, right] = triangle_vertices(area, 0.8);

        let side = 320.0;
        assert!((top.distance(left) - side).abs() < 1e-3);
        assert!((left.distance(right) - side).abs() < 1e-3);
        assert!((right.distance(top) - side).abs() < 1e-3);

        assert_eq!(top.x, 200.0);
        assert!(left.y > top.y);
        assert_eq!(left.y, right.y);
        assert!(left.x < right.x);
    }

    #[test]
    fn triangle_is_centred_in_its_area() {
        let area = Rect::new(0.0, 100.0, 300.0, 200.0);
        let [top, left, _] = triangle_vertices(area, 0.8);
        let mid_y = (top.y + left.y) / 2.0;
        assert!((mid_y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn dot_follows_progress() {
        let mut view = TriangleView::new(EdgeDurations::default(), 0.8, 2.0, 10.0);
        let area = Rect::new(0.0, 0.0, 400.0, 400.0);
        view.layout(area);
        let [top, _, right] = triangle_vertices(area, 0.8);

        view.set_durations(EdgeDurations::default(), 5.0);
        assert_eq!(view.dot_position(), top);

        view.update(5.5);
        let halfway = Vec2::new((top.x + right.x) / 2.0, (top.y + right.y) / 2.0);
        assert!(view.dot_position().distance(halfway) < 0.5);
    }
}
