use crate::config::{Config, Palette};
use crate::features::{speed_inputs::SpeedInputs, triangle::TriangleView, Feature};
use crate::gfx::{draw::DrawContext, math::{Rect, Vec2}};
use crate::speeds::{Edge, EdgeDurations};
use log::{debug, info, trace, warn};

/// Title the single screen is hosted under.
pub const SCREEN_TITLE: &str = "Tri-Chi-Gong";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Tab { reverse: bool },
    Enter,
    Escape,
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    PointerEnter { pos: Vec2 },
    PointerLeave,
    PointerMove { pos: Vec2 },
    PointerDown { pos: Vec2, button: u32 },
    PointerUp,
    Scroll { pos: Vec2, delta: f32 },
    Key(KeyInput),
}

/// Splits the surface into the triangle area and the input row below it.
/// Portrait surfaces give the inputs a taller row.
pub fn screen_layout(size: [u32; 2]) -> (Rect, Rect) {
    let width = size[0] as f32;
    let height = size[1] as f32;
    let triangle_share = if height > width { 0.8 } else { 0.9 };

    let triangle_height = height * triangle_share;
    let row_width = width * 0.9;

    (
        Rect::new(0.0, 0.0, width, triangle_height),
        Rect::new((width - row_width) / 2.0, triangle_height, row_width, height - triangle_height),
    )
}

pub struct App {
    pub config: Config,
    pub palette: Palette,
    pub size: [u32; 2],
    pub time: f64,

    durations: EdgeDurations,
    triangle: TriangleView,
    inputs: SpeedInputs,

    // Startup load bookkeeping
    loaded: bool,
    edited_before_load: bool,

    pending_saves: Vec<(Edge, u32)>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let durations = EdgeDurations::default();
        let size = [config.window.width, config.window.height];
        let triangle = TriangleView::new(
            durations,
            config.triangle_scale,
            config.stroke_width,
            config.dot_radius,
        );

        let mut app = Self {
            palette: config.theme.palette(),
            config,
            size,
            time: 0.0,
            durations,
            triangle,
            inputs: SpeedInputs::new(durations),
            loaded: false,
            edited_before_load: false,
            pending_saves: Vec::new(),
        };
        app.layout();
        app
    }

    fn layout(&mut self) {
        let (triangle_area, input_row) = screen_layout(self.size);
        self.triangle.layout(triangle_area);
        self.inputs.layout(input_row);
        debug!(
            "Laid out {} in {:?}, {} in {:?}",
            self.triangle.name(),
            triangle_area,
            self.inputs.name(),
            input_row
        );
    }

    pub fn resize(&mut self, size: [u32; 2]) {
        if size != self.size {
            info!("Surface resized to {}x{}", size[0], size[1]);
            self.size = size;
            self.layout();
        }
    }

    pub fn durations(&self) -> EdgeDurations {
        self.durations
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn progress(&self) -> f32 {
        self.triangle.progress()
    }

    pub fn dot_position(&self) -> Vec2 {
        self.triangle.dot_position()
    }

    pub fn inputs(&self) -> &SpeedInputs {
        &self.inputs
    }

    /// Sets one edge duration. A real change is persisted and restarts the
    /// dot from the top vertex.
    pub fn set_speed(&mut self, edge: Edge, ms: u32) {
        if !self.durations.set(edge, ms) {
            return;
        }
        let ms = self.durations.get(edge);
        if !self.loaded {
            self.edited_before_load = true;
        }

        info!("{} changed to {}", edge, ms);
        self.pending_saves.push((edge, ms));
        self.triangle.set_durations(self.durations, self.time);
        self.inputs.show(self.durations);
    }

    /// Applies the durations read from storage at startup.
    pub fn apply_loaded(&mut self, speeds: EdgeDurations) {
        if self.edited_before_load {
            warn!(
                "Speeds edited before saved values finished loading; showing the saved values, \
                 but the edits already written will be loaded on the next start"
            );
        }
        self.loaded = true;

        if speeds != self.durations {
            self.durations = speeds;
            self.triangle.set_durations(speeds, self.time);
            self.inputs.show(speeds);
        }
    }

    /// Saves queued since the last call, oldest first.
    pub fn drain_saves(&mut self) -> Vec<(Edge, u32)> {
        std::mem::take(&mut self.pending_saves)
    }

    pub fn handle_event(&mut self, event: UiEvent) {
        let consumed = self.inputs.handle_event(&event, self.time)
            || self.triangle.handle_event(&event, self.time);
        if !consumed {
            trace!("Unhandled event: {:?}", event);
        }

        for (edge, ms) in self.inputs.take_edits() {
            self.set_speed(edge, ms);
        }
    }

    pub fn update(&mut self, dt: f64) {
        self.time += dt;
        self.triangle.update(self.time);
        self.inputs.update(self.time);
    }

    pub fn render(&self, draw: &mut DrawContext) {
        self.triangle.render(draw, &self.palette, self.time);
        self.inputs.render(draw, &self.palette, self.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn app() -> App {
        App::new(Config::default())
    }

    fn type_into(app: &mut App, edge: Edge, keys: &[KeyInput]) {
        let pos = app.inputs().field_rect(edge).center();
        app.handle_event(UiEvent::PointerDown { pos, button: 0x110 });
        for &key in keys {
            app.handle_event(UiEvent::Key(key));
        }
    }

    #[test]
    fn layout_follows_orientation() {
        let (tri, row) = screen_layout([400, 1000]);
        assert!((tri.height - 800.0).abs() < EPS);
        assert!((row.y - 800.0).abs() < EPS);
        assert!((row.width - 360.0).abs() < EPS);

        let (tri, row) = screen_layout([1000, 400]);
        assert!((tri.height - 360.0).abs() < EPS);
        assert!((row.height - 40.0).abs() < EPS);
    }

    #[test]
    fn starts_with_defaults() {
        let app = app();
        assert_eq!(app.durations(), EdgeDurations::default());
        assert!(!app.is_loaded());
        assert_eq!(app.progress(), 0.0);
    }

    #[test]
    fn changing_one_speed_restarts_the_loop() {
        let mut app = app();
        app.apply_loaded(EdgeDurations::default());
        app.update(0.4);
        assert!(app.progress() > 0.1);

        // 1000 -> 100 -> 10 -> 1 -> 15 -> 150 -> 1500
        type_into(&mut app, Edge::Second, &[
            KeyInput::Backspace,
            KeyInput::Backspace,
            KeyInput::Backspace,
            KeyInput::Char('5'),
            KeyInput::Char('0'),
            KeyInput::Char('0'),
        ]);
        assert_eq!(app.durations(), EdgeDurations::new(1000, 1500, 1000));
        assert_eq!(app.progress(), 0.0);

        let saves = app.drain_saves();
        assert_eq!(saves.last(), Some(&(Edge::Second, 1500)));
        assert!(saves.iter().all(|(edge, _)| *edge == Edge::Second));
        assert!(app.drain_saves().is_empty());

        // speed1, then speed2, then speed3 milliseconds per third
        app.update(0.5);
        assert!((app.progress() - 1.0 / 6.0).abs() < EPS);
        app.update(0.5);
        app.update(0.75);
        assert!((app.progress() - 0.5).abs() < EPS);
        app.update(0.75);
        app.update(0.5);
        assert!((app.progress() - 5.0 / 6.0).abs() < EPS);
        app.update(0.5);
        assert!(app.progress() < EPS || app.progress() > 1.0 - EPS);
    }

    #[test]
    fn loaded_speeds_replace_defaults_without_saving() {
        let mut app = app();
        app.update(0.3);
        app.apply_loaded(EdgeDurations::new(500, 1000, 1000));

        assert!(app.is_loaded());
        assert_eq!(app.durations().speed1, 500);
        assert_eq!(app.progress(), 0.0);
        assert!(app.drain_saves().is_empty());
    }

    #[test]
    fn edits_before_load_are_overwritten() {
        let mut app = app();
        type_into(&mut app, Edge::First, &[KeyInput::Backspace]);
        assert_eq!(app.durations().speed1, 100);

        app.apply_loaded(EdgeDurations::new(750, 1000, 1000));
        assert_eq!(app.durations().speed1, 750);

        // The early edit still goes to the store and is what the next start reads
        assert_eq!(app.drain_saves(), vec![(Edge::First, 100)]);
    }

    #[test]
    fn same_value_is_a_no_op() {
        let mut app = app();
        app.apply_loaded(EdgeDurations::default());
        app.update(0.2);
        let before = app.progress();

        app.set_speed(Edge::Third, 1000);
        assert_eq!(app.progress(), before);
        assert!(app.drain_saves().is_empty());
    }

    #[test]
    fn zero_falls_back_to_default() {
        let mut app = app();
        app.set_speed(Edge::Third, 400);
        app.set_speed(Edge::Third, 0);
        assert_eq!(app.durations().speed3, 1000);
        assert_eq!(app.drain_saves(), vec![(Edge::Third, 400), (Edge::Third, 1000)]);
    }

    #[test]
    fn dot_keeps_pace_after_long_uptime() {
        let mut app = app();
        app.time = 604_800.0;
        app.apply_loaded(EdgeDurations::new(500, 1000, 1000));
        assert_eq!(app.progress(), 0.0);

        for _ in 0..15 {
            app.update(1.0 / 60.0);
        }
        assert!((app.progress() - 1.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn resize_moves_the_triangle() {
        let mut app = app();
        let before = app.dot_position();
        app.resize([1000, 600]);
        assert_ne!(app.dot_position(), before);
        assert_eq!(app.size, [1000, 600]);
    }
}
