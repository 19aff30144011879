use super::types::TimeClass;

/// Placeholder for games whose source carries no time control at all.
pub const UNKNOWN_TIME_CONTROL: &str = "unknown";

const BULLET_LIMIT_SECONDS: u32 = 180;
const BLITZ_LIMIT_SECONDS: u32 = 600;
const RAPID_LIMIT_SECONDS: u32 = 1800;

/// A `"<base>"` or `"<base>+<increment>"` time control, both in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub base_seconds: u32,
    pub increment_seconds: Option<u32>,
}

impl Period {
    pub fn parse(s: &str) -> Option<Self> {
        let (base_part, inc_part) = match s.split_once('+') {
            Some((base, inc)) => (base, Some(inc)),
            None => (s, None),
        };

        let base_seconds = parse_seconds(base_part)?;
        let increment_seconds = match inc_part {
            Some(inc) => Some(parse_seconds(inc)?),
            None => None,
        };

        Some(Self {
            base_seconds,
            increment_seconds,
        })
    }

    /// Display form: a zero increment collapses to the base alone.
    pub fn format(&self) -> String {
        match self.increment_seconds {
            Some(inc) if inc > 0 => format!("{}+{}", self.base_seconds, inc),
            _ => self.base_seconds.to_string(),
        }
    }

    pub fn time_class(&self) -> TimeClass {
        classify_base_seconds(self.base_seconds)
    }
}

fn parse_seconds(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Drops a `+0` increment; anything that is not `base[+inc]` passes through.
pub fn normalize_time_control(raw: &str) -> String {
    match Period::parse(raw) {
        Some(period) if period.increment_seconds == Some(0) => period.format(),
        _ => raw.to_string(),
    }
}

pub fn classify_base_seconds(base_seconds: u32) -> TimeClass {
    match base_seconds {
        s if s < BULLET_LIMIT_SECONDS => TimeClass::Bullet,
        s if s < BLITZ_LIMIT_SECONDS => TimeClass::Blitz,
        s if s < RAPID_LIMIT_SECONDS => TimeClass::Rapid,
        _ => TimeClass::Classical,
    }
}

pub fn classify_time_control(raw: &str) -> TimeClass {
    Period::parse(raw).map_or(TimeClass::Unknown, |period| period.time_class())
}

/// Builds the time control string from a clock given as separate fields.
pub fn from_clock(initial_seconds: u32, increment_seconds: u32) -> String {
    Period {
        base_seconds: initial_seconds,
        increment_seconds: Some(increment_seconds),
    }
    .format()
}
