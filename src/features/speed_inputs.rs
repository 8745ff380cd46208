use super::segments::{digits_of, render_number, DigitLayout};
use super::Feature;
use crate::app::{KeyInput, UiEvent};
use crate::config::Palette;
use crate::gfx::{anim::{lerp, Timeline}, draw::DrawContext, math::{Color, Rect, Vec2}};
use crate::speeds::{coerce_speed, Edge, EdgeDurations, MAX_SPEED_MS};
use log::debug;

const FIELD_HEIGHT: f32 = 40.0;
const FIELD_MARGIN: f32 = 5.0;
const FIELD_RADIUS: f32 = 10.0;
const FIELD_PADDING: f32 = 10.0;
const BORDER: f32 = 1.0;
const SCROLL_STEP_MS: u32 = 100;

/// Three numeric fields, one per edge, laid out side by side.
pub struct SpeedInputs {
    fields: [Rect; 3],
    values: [u32; 3],
    focused: Option<Edge>,
    focus_tl: Timeline,
    edits: Vec<(Edge, u32)>,
}

/// Text after typing `c` into a field that shows `current`.
pub fn type_char(current: u32, c: char) -> Option<u32> {
    if !(c.is_ascii_digit() || c == '.') {
        return None;
    }
    let mut text = current.to_string();
    text.push(c);
    Some(coerce_speed(&text))
}

/// Value after deleting the last character of `current`.
pub fn backspace(current: u32) -> u32 {
    let mut text = current.to_string();
    text.pop();
    coerce_speed(&text)
}

pub fn scroll_step(current: u32, delta: f32) -> u32 {
    if delta > 0.0 {
        current.saturating_add(SCROLL_STEP_MS).min(MAX_SPEED_MS)
    } else if delta < 0.0 {
        current.saturating_sub(SCROLL_STEP_MS).max(SCROLL_STEP_MS)
    } else {
        current
    }
}

impl SpeedInputs {
    pub fn new(durations: EdgeDurations) -> Self {
        Self {
            fields: [Rect::new(0.0, 0.0, 0.0, 0.0); 3],
            values: durations.as_array(),
            focused: None,
            focus_tl: Timeline::new(0.15),
            edits: Vec::new(),
        }
    }

    /// Mirrors the current durations into the fields.
    pub fn show(&mut self, durations: EdgeDurations) {
        self.values = durations.as_array();
    }

    pub fn focused(&self) -> Option<Edge> {
        self.focused
    }

    pub fn field_rect(&self, edge: Edge) -> Rect {
        self.fields[edge.index()]
    }

    /// Edits made since the last call, oldest first.
    pub fn take_edits(&mut self) -> Vec<(Edge, u32)> {
        std::mem::take(&mut self.edits)
    }

    fn field_at(&self, pos: Vec2) -> Option<Edge> {
        Edge::ALL
            .into_iter()
            .find(|edge| self.fields[edge.index()].contains(pos))
    }

    fn focus(&mut self, edge: Option<Edge>, now: f64) {
        if self.focused != edge {
            debug!("Input focus: {:?} -> {:?}", self.focused, edge);
            self.focused = edge;
            if edge.is_some() {
                self.focus_tl.start(now);
            }
        }
    }

    fn edit(&mut self, edge: Edge, value: u32) {
        let slot = &mut self.values[edge.index()];
        if *slot != value {
            *slot = value;
            self.edits.push((edge, value));
        }
    }

    fn handle_key(&mut self, key: KeyInput, now: f64) -> bool {
        match key {
            KeyInput::Tab { reverse } => {
                let next = match (self.focused, reverse) {
                    (Some(edge), false) => edge.next(),
                    (Some(edge), true) => edge.prev(),
                    (None, false) => Edge::First,
                    (None, true) => Edge::Third,
                };
                self.focus(Some(next), now);
                true
            }
            KeyInput::Escape | KeyInput::Enter => {
                let had_focus = self.focused.is_some();
                self.focus(None, now);
                had_focus
            }
            KeyInput::Backspace => match self.focused {
                Some(edge) => {
                    self.edit(edge, backspace(self.values[edge.index()]));
                    true
                }
                None => false,
            },
            KeyInput::Char(c) => match self.focused {
                Some(edge) => match type_char(self.values[edge.index()], c) {
                    Some(value) => {
                        self.edit(edge, value);
                        true
                    }
                    None => false,
                },
                None => false,
            },
        }
    }
}

impl Feature for SpeedInputs {
    fn name(&self) -> &'static str {
        "speed inputs"
    }

    fn layout(&mut self, area: Rect) {
        let height = FIELD_HEIGHT.min(area.height);
        let y = area.y + (area.height - height) / 2.0;
        let slot = area.width / 3.0;
        for edge in Edge::ALL {
            let x = area.x + slot * edge.index() as f32 + FIELD_MARGIN;
            let width = (slot - FIELD_MARGIN * 2.0).max(0.0);
            self.fields[edge.index()] = Rect::new(x, y, width, height);
        }
    }

    fn update(&mut self, now: f64) {
        self.focus_tl.update(now);
    }

    fn handle_event(&mut self, event: &UiEvent, now: f64) -> bool {
        match event {
            UiEvent::PointerDown { pos, .. } => {
                let hit = self.field_at(*pos);
                self.focus(hit, now);
                hit.is_some()
            }
            UiEvent::Scroll { pos, delta } => match self.field_at(*pos) {
                Some(edge) => {
                    self.edit(edge, scroll_step(self.values[edge.index()], *delta));
                    true
                }
                None => false,
            },
            UiEvent::Key(key) => self.handle_key(*key, now),
            _ => false,
        }
    }

    fn render(&self, draw: &mut DrawContext, palette: &Palette, now: f64) {
        let border = Color::rgba(128, 128, 128, 255);

        for edge in Edge::ALL {
            let r = self.fields[edge.index()];
            if r.width <= 0.0 || r.height <= 0.0 {
                continue;
            }

            let focus = if self.focused == Some(edge) {
                self.focus_tl.eased_progress()
            } else {
                0.0
            };
            let fill = Color::new(
                lerp(palette.field.r, palette.field_focused.r, focus),
                lerp(palette.field.g, palette.field_focused.g, focus),
                lerp(palette.field.b, palette.field_focused.b, focus),
                lerp(palette.field.a, palette.field_focused.a, focus),
            );

            draw.round_rect(r.x, r.y, r.width, r.height, FIELD_RADIUS, border);
            draw.round_rect(
                r.x + BORDER,
                r.y + BORDER,
                r.width - BORDER * 2.0,
                r.height - BORDER * 2.0,
                FIELD_RADIUS - BORDER,
                fill,
            );

            let value = self.values[edge.index()];
            let count = digits_of(value).len();
            let text_area = Rect::new(
                r.x + FIELD_PADDING,
                r.y,
                (r.width - FIELD_PADDING * 2.0).max(0.0),
                r.height,
            );
            let layout = DigitLayout::fit(count, text_area, r.height * 0.5);
            render_number(draw, value, &layout, palette.digits);

            // Blinking caret after the last digit
            if self.focused == Some(edge) && (now * 2.0).fract() < 0.5 {
                let caret_x = layout.end_x(count) + layout.spacing;
                draw.rect(caret_x, layout.y, BORDER * 2.0, layout.digit_height, palette.digits);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laid_out() -> SpeedInputs {
        let mut inputs = SpeedInputs::new(EdgeDurations::default());
        inputs.layout(Rect::new(0.0, 600.0, 300.0, 100.0));
        inputs
    }

    fn click(inputs: &mut SpeedInputs, edge: Edge) {
        let c = inputs.field_rect(edge).center();
        inputs.handle_event(&UiEvent::PointerDown { pos: c, button: 0x110 }, 0.0);
    }

    #[test]
    fn typing_appends_to_the_shown_value() {
        assert_eq!(type_char(1000, '5'), Some(10005));
        assert_eq!(type_char(1000, 'x'), None);
        assert_eq!(backspace(1000), 100);
        assert_eq!(backspace(5), 1000);
    }

    #[test]
    fn scroll_steps_are_bounded() {
        assert_eq!(scroll_step(1000, 1.0), 1100);
        assert_eq!(scroll_step(150, -1.0), 100);
        assert_eq!(scroll_step(MAX_SPEED_MS, 1.0), MAX_SPEED_MS);
    }

    #[test]
    fn fields_split_the_row() {
        let inputs = laid_out();
        let a = inputs.field_rect(Edge::First);
        let c = inputs.field_rect(Edge::Third);
        assert_eq!(a.height, FIELD_HEIGHT);
        assert_eq!(a.x, FIELD_MARGIN);
        assert!((c.x + c.width - (300.0 - FIELD_MARGIN)).abs() < 1e-3);
        assert!((a.center().y - 650.0).abs() < 1e-3);
    }

    #[test]
    fn click_focuses_and_keys_edit() {
        let mut inputs = laid_out();
        click(&mut inputs, Edge::Second);
        assert_eq!(inputs.focused(), Some(Edge::Second));

        for _ in 0..3 {
            inputs.handle_event(&UiEvent::Key(KeyInput::Backspace), 0.1);
        }
        inputs.handle_event(&UiEvent::Key(KeyInput::Char('5')), 0.2);

        assert_eq!(
            inputs.take_edits(),
            vec![
                (Edge::Second, 100),
                (Edge::Second, 10),
                (Edge::Second, 1),
                (Edge::Second, 15),
            ]
        );
        assert!(inputs.take_edits().is_empty());
    }

    #[test]
    fn clearing_a_field_falls_back_to_default() {
        let mut inputs = SpeedInputs::new(EdgeDurations::new(7, 1000, 1000));
        inputs.layout(Rect::new(0.0, 0.0, 300.0, 40.0));
        click(&mut inputs, Edge::First);
        inputs.handle_event(&UiEvent::Key(KeyInput::Backspace), 0.0);
        assert_eq!(inputs.take_edits(), vec![(Edge::First, 1000)]);
    }

    #[test]
    fn keys_without_focus_are_ignored() {
        let mut inputs = laid_out();
        assert!(!inputs.handle_event(&UiEvent::Key(KeyInput::Char('1')), 0.0));
        assert!(inputs.take_edits().is_empty());
    }

    #[test]
    fn tab_cycles_focus() {
        let mut inputs = laid_out();
        inputs.handle_event(&UiEvent::Key(KeyInput::Tab { reverse: false }), 0.0);
        assert_eq!(inputs.focused(), Some(Edge::First));
        inputs.handle_event(&UiEvent::Key(KeyInput::Tab { reverse: true }), 0.0);
        assert_eq!(inputs.focused(), Some(Edge::Third));
        inputs.handle_event(&UiEvent::Key(KeyInput::Escape), 0.0);
        assert_eq!(inputs.focused(), None);
    }

    #[test]
    fn click_outside_drops_focus() {
        let mut inputs = laid_out();
        click(&mut inputs, Edge::First);
        let gap = Vec2::new(150.0, 10.0);
        inputs.handle_event(&UiEvent::PointerDown { pos: gap, button: 0x110 }, 0.0);
        assert_eq!(inputs.focused(), None);
    }

    #[test]
    fn scrolling_over_a_field_edits_it() {
        let mut inputs = laid_out();
        let pos = inputs.field_rect(Edge::Third).center();
        inputs.handle_event(&UiEvent::Scroll { pos, delta: -1.0 }, 0.0);
        assert_eq!(inputs.take_edits(), vec![(Edge::Third, 900)]);
    }

    #[test]
    fn unchanged_values_are_not_reported() {
        let mut inputs = laid_out();
        click(&mut inputs, Edge::First);
        // "1000" -> "1000." still reads as 1000
        inputs.handle_event(&UiEvent::Key(KeyInput::Char('.')), 0.0);
        assert!(inputs.take_edits().is_empty());
    }
}
