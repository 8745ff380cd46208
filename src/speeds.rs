use std::fmt;

/// Milliseconds per edge when nothing valid is configured.
pub const DEFAULT_SPEED_MS: u32 = 1000;

/// Largest value an input field can show (seven digits).
pub const MAX_SPEED_MS: u32 = 9_999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    First,
    Second,
    Third,
}

impl Edge {
    pub const ALL: [Edge; 3] = [Edge::First, Edge::Second, Edge::Third];

    pub fn index(self) -> usize {
        match self {
            Edge::First => 0,
            Edge::Second => 1,
            Edge::Third => 2,
        }
    }

    /// Storage key the duration of this edge is persisted under.
    pub fn key(self) -> &'static str {
        match self {
            Edge::First => "speed1",
            Edge::Second => "speed2",
            Edge::Third => "speed3",
        }
    }

    pub fn next(self) -> Edge {
        Self::ALL[(self.index() + 1) % 3]
    }

    pub fn prev(self) -> Edge {
        Self::ALL[(self.index() + 2) % 3]
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Speed {}", self.index() + 1)
    }
}

/// Time in milliseconds the dot spends on each side of the triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDurations {
    pub speed1: u32,
    pub speed2: u32,
    pub speed3: u32,
}

impl Default for EdgeDurations {
    fn default() -> Self {
        Self {
            speed1: DEFAULT_SPEED_MS,
            speed2: DEFAULT_SPEED_MS,
            speed3: DEFAULT_SPEED_MS,
        }
    }
}

impl EdgeDurations {
    pub fn new(speed1: u32, speed2: u32, speed3: u32) -> Self {
        Self {
            speed1: sanitize(speed1),
            speed2: sanitize(speed2),
            speed3: sanitize(speed3),
        }
    }

    pub fn get(&self, edge: Edge) -> u32 {
        match edge {
            Edge::First => self.speed1,
            Edge::Second => self.speed2,
            Edge::Third => self.speed3,
        }
    }

    /// Returns true if the stored value changed.
    pub fn set(&mut self, edge: Edge, ms: u32) -> bool {
        let ms = sanitize(ms);
        let slot = match edge {
            Edge::First => &mut self.speed1,
            Edge::Second => &mut self.speed2,
            Edge::Third => &mut self.speed3,
        };
        if *slot == ms {
            return false;
        }
        *slot = ms;
        true
    }

    pub fn as_array(&self) -> [u32; 3] {
        [self.speed1, self.speed2, self.speed3]
    }

    pub fn total_ms(&self) -> u64 {
        self.as_array().iter().map(|&ms| ms as u64).sum()
    }
}

fn sanitize(ms: u32) -> u32 {
    if ms == 0 {
        DEFAULT_SPEED_MS
    } else {
        ms.min(MAX_SPEED_MS)
    }
}

/// Turns user or stored text into a duration. Anything that is not a
/// positive finite number becomes the default.
pub fn coerce_speed(text: &str) -> u32 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.5 => {
            sanitize(value.round().min(MAX_SPEED_MS as f64) as u32)
        }
        _ => DEFAULT_SPEED_MS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_like_a_numeric_input() {
        assert_eq!(coerce_speed("500"), 500);
        assert_eq!(coerce_speed(" 750 "), 750);
        assert_eq!(coerce_speed("1e3"), 1000);
        assert_eq!(coerce_speed("12.6"), 13);
        assert_eq!(coerce_speed("bad"), DEFAULT_SPEED_MS);
        assert_eq!(coerce_speed(""), DEFAULT_SPEED_MS);
        assert_eq!(coerce_speed("0"), DEFAULT_SPEED_MS);
        assert_eq!(coerce_speed("-40"), DEFAULT_SPEED_MS);
        assert_eq!(coerce_speed("NaN"), DEFAULT_SPEED_MS);
        assert_eq!(coerce_speed("inf"), DEFAULT_SPEED_MS);
        assert_eq!(coerce_speed("123456789"), MAX_SPEED_MS);
    }

    #[test]
    fn set_reports_changes_only() {
        let mut speeds = EdgeDurations::default();
        assert!(!speeds.set(Edge::Second, 1000));
        assert!(speeds.set(Edge::Second, 250));
        assert_eq!(speeds.as_array(), [1000, 250, 1000]);
        assert!(speeds.set(Edge::Second, 0));
        assert_eq!(speeds.speed2, DEFAULT_SPEED_MS);
    }

    #[test]
    fn edges_map_to_fixed_keys() {
        let keys: Vec<_> = Edge::ALL.iter().map(|e| e.key()).collect();
        assert_eq!(keys, ["speed1", "speed2", "speed3"]);
        assert_eq!(Edge::Third.next(), Edge::First);
        assert_eq!(Edge::First.prev(), Edge::Third);
    }
}
