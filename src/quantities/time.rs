use std::{
    fmt::Display,
    ops::{Add, Sub},
};

use format_num::format_num;
use serde::{Deserialize, Serialize};

use super::{seconds, Float, TimeSpan};

/// An instant on the simulation clock, measured from the start of the run.
#[derive(PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(Float);

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Time {
    pub const SIM_START: Time = Time(0.);
    pub const MIN: Time = Time(Float::MIN);

    #[must_use]
    pub const fn from_sim_start(t: Float) -> Time {
        Time(t)
    }

    #[must_use]
    pub const fn since_start(self) -> Float {
        self.0
    }
}

impl Sub<Time> for Time {
    type Output = TimeSpan;

    fn sub(self, rhs: Time) -> Self::Output {
        seconds(self.0 - rhs.0)
    }
}

impl Add<TimeSpan> for Time {
    type Output = Time;

    fn add(self, rhs: TimeSpan) -> Self::Output {
        Time(self.0 + rhs.seconds())
    }
}

impl Sub<TimeSpan> for Time {
    type Output = Time;

    fn sub(self, rhs: TimeSpan) -> Self::Output {
        Time(self.0 - rhs.seconds())
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}t", format_num!(".4f", self.0))
    }
}

#[cfg(test)]
mod tests {
    use crate::quantities::{seconds, Time};

    #[test]
    fn ordering_and_arithmetic() {
        let start = Time::SIM_START;
        let later = start + seconds(5.);
        assert!(later > start);
        assert_eq!(later - start, seconds(5.));
        assert_eq!(later - seconds(2.), Time::from_sim_start(3.));
        assert_eq!(Time::MIN.min(start), Time::MIN);
    }
}
