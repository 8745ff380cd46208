use super::math::Vec2;
use crate::speeds::{Edge, EdgeDurations};

pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn lerp_vec(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    Vec2::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

#[derive(Debug, Clone)]
pub struct Timeline {
    pub start_time: f64,
    pub duration: f64,
    pub current_time: f64,
}

impl Timeline {
    pub fn new(duration: f64) -> Self {
        Self {
            start_time: 0.0,
            duration,
            current_time: 0.0,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.start_time = now;
        self.current_time = now;
    }

    pub fn update(&mut self, now: f64) {
        self.current_time = now;
    }

    pub fn progress(&self) -> f32 {
        let elapsed = self.current_time - self.start_time;
        (elapsed / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn eased_progress(&self) -> f32 {
        ease_in_out(self.progress())
    }
}

const ONE_THIRD: f32 = 1.0 / 3.0;
const TWO_THIRDS: f32 = 2.0 / 3.0;

/// Point on the triangle outline for a perimeter progress `t`.
///
/// `vertices` are top, bottom-left, bottom-right. The dot runs
/// top -> bottom-right -> bottom-left -> top, one edge per third of `t`.
/// Values outside [0, 1) wrap around.
pub fn perimeter_point(vertices: &[Vec2; 3], t: f32) -> Vec2 {
    let mut t = t.rem_euclid(1.0);
    if !(t < 1.0) {
        // rem_euclid rounds tiny negatives up to exactly 1.0; NaN lands here too
        t = 0.0;
    }

    let (from, to, segment_start) = if t < ONE_THIRD {
        (vertices[0], vertices[2], 0.0)
    } else if t < TWO_THIRDS {
        (vertices[2], vertices[1], ONE_THIRD)
    } else {
        (vertices[1], vertices[0], TWO_THIRDS)
    };

    lerp_vec(from, to, (t - segment_start) * 3.0)
}

/// Repeating, non-reversing three-step timeline.
///
/// Edge `i` covers progress [i/3, (i+1)/3) and takes exactly its configured
/// number of milliseconds, so progress does not advance at a constant rate
/// when the edges differ.
#[derive(Debug, Clone)]
pub struct EdgeSequence {
    durations: EdgeDurations,
    start_time: f64,
    current_time: f64,
}

impl EdgeSequence {
    pub fn new(durations: EdgeDurations) -> Self {
        Self {
            durations,
            start_time: 0.0,
            current_time: 0.0,
        }
    }

    pub fn durations(&self) -> EdgeDurations {
        self.durations
    }

    /// Replaces the durations and restarts from progress 0.
    pub fn set_durations(&mut self, durations: EdgeDurations, now: f64) {
        self.durations = durations;
        self.restart(now);
    }

    pub fn restart(&mut self, now: f64) {
        self.start_time = now;
        self.current_time = now;
    }

    pub fn update(&mut self, now: f64) {
        self.current_time = now;
    }

    pub fn cycle_ms(&self) -> u64 {
        self.durations.total_ms()
    }

    fn locate(&self) -> (Edge, f64) {
        let elapsed_ms = (self.current_time - self.start_time).max(0.0) * 1000.0;
        let mut into_cycle = elapsed_ms % self.cycle_ms() as f64;

        for edge in Edge::ALL {
            let duration = self.durations.get(edge) as f64;
            if into_cycle < duration {
                return (edge, into_cycle / duration);
            }
            into_cycle -= duration;
        }
        // Only reachable through float rounding at the very end of a cycle
        (Edge::First, 0.0)
    }

    /// Perimeter progress in [0, 1).
    pub fn progress(&self) -> f32 {
        let (edge, local) = self.locate();
        let progress = ((edge.index() as f64 + local) / 3.0) as f32;
        if progress < 1.0 {
            progress
        } else {
            0.0
        }
    }

    /// Edge the dot is currently travelling.
    pub fn segment(&self) -> Edge {
        self.locate().0
    }
}
