//! Seven-segment digits drawn out of thin bevelled slices.

use crate::gfx::{draw::DrawContext, math::{Color, Rect}};

// Segments a..g: top, upper right, lower right, bottom, lower left, upper left, middle
const SEGMENT_MAP: [[bool; 7]; 10] = [
    [true, true, true, true, true, true, false],     // 0
    [false, true, true, false, false, false, false], // 1
    [true, true, false, true, true, false, true],    // 2
    [true, true, true, true, false, false, true],    // 3
    [false, true, true, false, false, true, true],   // 4
    [true, false, true, true, false, true, true],    // 5
    [true, false, true, true, true, true, true],     // 6
    [true, true, true, false, false, false, false],  // 7
    [true, true, true, true, true, true, true],      // 8
    [true, true, true, true, false, true, true],     // 9
];

/// digit_width = WIDTH_RATIO * digit_height
const WIDTH_RATIO: f32 = 0.62;
/// spacing = SPACING_RATIO * digit_width
const SPACING_RATIO: f32 = 0.25;

pub fn digits_of(mut value: u32) -> Vec<u8> {
    let mut digits = Vec::new();
    loop {
        digits.push((value % 10) as u8);
        value /= 10;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

/// Where a run of `count` digits goes when centred in `area` at most
/// `max_height` tall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitLayout {
    pub x: f32,
    pub y: f32,
    pub digit_width: f32,
    pub digit_height: f32,
    pub spacing: f32,
}

impl DigitLayout {
    pub fn fit(count: usize, area: Rect, max_height: f32) -> Self {
        let count = count.max(1) as f32;
        let width_per_height = WIDTH_RATIO * (count + SPACING_RATIO * (count - 1.0));

        let digit_height = max_height
            .min(area.height)
            .min(area.width / width_per_height)
            .max(0.0);
        let digit_width = digit_height * WIDTH_RATIO;
        let spacing = digit_width * SPACING_RATIO;
        let total_width = digit_height * width_per_height;

        Self {
            x: area.x + (area.width - total_width) / 2.0,
            y: area.y + (area.height - digit_height) / 2.0,
            digit_width,
            digit_height,
            spacing,
        }
    }

    pub fn digit_x(&self, index: usize) -> f32 {
        self.x + index as f32 * (self.digit_width + self.spacing)
    }

    /// Right edge of the last of `count` digits.
    pub fn end_x(&self, count: usize) -> f32 {
        self.digit_x(count) - self.spacing
    }
}

pub fn render_number(draw: &mut DrawContext, value: u32, layout: &DigitLayout, color: Color) {
    for (i, digit) in digits_of(value).into_iter().enumerate() {
        render_digit(
            draw,
            digit,
            layout.digit_x(i),
            layout.y,
            layout.digit_width,
            layout.digit_height,
            color,
        );
    }
}

pub fn render_digit(draw: &mut DrawContext, digit: u8, x: f32, y: f32, width: f32, height: f32, color: Color) {
    if digit > 9 { return; }
    let segments = SEGMENT_MAP[digit as usize];
    let segment_width = width * 0.8;
    let segment_thickness = width * 0.15;
    let h_offset = width * 0.1;
    let v_segment_height = height * 0.4;
    let bevel = segment_thickness * 0.5;

    if segments[0] { render_horizontal_segment(draw, x + h_offset, y, segment_width, segment_thickness, bevel, color); }
    if segments[1] { render_vertical_segment(draw, x + width - segment_thickness, y + segment_thickness, v_segment_height, segment_thickness, bevel, color, false); }
    if segments[2] { render_vertical_segment(draw, x + width - segment_thickness, y + height * 0.5 + segment_thickness * 0.5, v_segment_height, segment_thickness, bevel, color, true); }
    if segments[3] { render_horizontal_segment(draw, x + h_offset, y + height - segment_thickness, segment_width, segment_thickness, bevel, color); }
    if segments[4] { render_vertical_segment(draw, x, y + height * 0.5 + segment_thickness * 0.5, v_segment_height, segment_thickness, bevel, color, true); }
    if segments[5] { render_vertical_segment(draw, x, y + segment_thickness, v_segment_height, segment_thickness, bevel, color, false); }
    if segments[6] { render_middle_segment(draw, x + h_offset, y + height * 0.5 - segment_thickness * 0.5, segment_width, segment_thickness, bevel, color); }
}

const SLICES: usize = 8;

fn render_horizontal_segment(draw: &mut DrawContext, x: f32, y: f32, width: f32, thickness: f32, bevel: f32, color: Color) {
    for i in 0..SLICES {
        let t = i as f32 / (SLICES - 1) as f32;
        let y_pos = y + (t * thickness);
        let x_inset = (t - 0.5).abs() * 2.0 * bevel;
        let slice_width = width - (2.0 * x_inset);
        if slice_width > 0.0 {
            draw.rect(x + x_inset, y_pos, slice_width, thickness / SLICES as f32 + 0.5, color);
        }
    }
}

fn render_vertical_segment(draw: &mut DrawContext, x: f32, y: f32, height: f32, thickness: f32, bevel: f32, color: Color, is_bottom: bool) {
    for i in 0..SLICES {
        let t = i as f32 / (SLICES - 1) as f32;
        let x_pos = x + (t * thickness);
        let inset = (t - 0.5).abs() * 2.0 * bevel;
        let (inset_top, inset_bottom) = if is_bottom { (0.0, inset) } else { (inset, 0.0) };
        let slice_height = height - inset_top - inset_bottom;
        if slice_height > 0.0 {
            draw.rect(x_pos, y + inset_top, thickness / SLICES as f32 + 0.5, slice_height, color);
        }
    }
}

fn render_middle_segment(draw: &mut DrawContext, x: f32, y: f32, width: f32, thickness: f32, bevel: f32, color: Color) {
    for i in 0..SLICES {
        let t = i as f32 / (SLICES - 1) as f32;
        let y_pos = y + (t * thickness);
        let x_inset = (t - 0.5).abs() * 2.0 * bevel * 1.2;
        let slice_width = width - (2.0 * x_inset);
        if slice_width > 0.0 {
            draw.rect(x + x_inset, y_pos, slice_width, thickness / SLICES as f32 + 0.5, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_numbers_into_digits() {
        assert_eq!(digits_of(0), vec![0]);
        assert_eq!(digits_of(1000), vec![1, 0, 0, 0]);
        assert_eq!(digits_of(9_999_999).len(), 7);
    }

    #[test]
    fn short_numbers_use_full_height() {
        let area = Rect::new(0.0, 0.0, 200.0, 40.0);
        let layout = DigitLayout::fit(4, area, 24.0);
        assert_eq!(layout.digit_height, 24.0);
        // centred both ways
        assert!((layout.y - 8.0).abs() < 1e-4);
        let right_gap = area.width - layout.end_x(4);
        assert!((layout.x - right_gap).abs() < 1e-3);
    }

    #[test]
    fn long_numbers_shrink_to_fit() {
        let area = Rect::new(10.0, 0.0, 60.0, 40.0);
        let layout = DigitLayout::fit(7, area, 24.0);
        assert!(layout.digit_height < 24.0);
        assert!(layout.x >= area.x - 1e-4);
        assert!(layout.end_x(7) <= area.x + area.width + 1e-3);
    }
}
