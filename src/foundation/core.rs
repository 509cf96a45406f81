use crate::foundation::error::{CampathError, CampathResult};

/// 0-based frame index in trajectory order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Output frame rate represented as a reduced rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRate {
    /// Numerator (frames).
    pub num: u64,
    /// Denominator (seconds), must be non-zero.
    pub den: u64,
}

/// Duration resolution used when converting float seconds to a rational rate.
const SECONDS_DENOM: u64 = 1000;

impl FrameRate {
    /// Create a validated, reduced frame rate.
    pub fn new(num: u64, den: u64) -> CampathResult<Self> {
        if den == 0 {
            return Err(CampathError::malformed("frame rate den must be > 0"));
        }
        if num == 0 {
            return Err(CampathError::malformed("frame rate num must be > 0"));
        }
        let g = gcd(num, den);
        Ok(Self {
            num: num / g,
            den: den / g,
        })
    }

    /// Rate that plays `frame_count` frames over `seconds` (`frame_count / seconds`).
    ///
    /// Seconds are resolved to millisecond precision before reduction, so `6` frames over `5.0`
    /// seconds yields exactly `6/5`.
    pub fn from_duration(frame_count: u64, seconds: f64) -> CampathResult<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(CampathError::malformed(format!(
                "duration must be a positive number of seconds, got {seconds}"
            )));
        }
        let den = (seconds * SECONDS_DENOM as f64).round() as u64;
        if den == 0 {
            return Err(CampathError::malformed(format!(
                "duration {seconds}s is below millisecond resolution"
            )));
        }
        Self::new(frame_count.saturating_mul(SECONDS_DENOM), den)
    }

    /// Convert to floating-point frames per second.
    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl std::fmt::Display for FrameRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
