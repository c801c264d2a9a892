use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ApiException, ErrorCode};

/// Recommended routine id. The backend issues it as a string; older
/// payloads carry a bare number, which is kept in its decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutineId(pub String);

impl RoutineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for RoutineId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque coaching session token issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workout length in minutes, restricted to the durations the
/// recommender accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DurationChoice(u32);

impl DurationChoice {
    pub const OPTIONS: [DurationChoice; 5] = [
        DurationChoice(20),
        DurationChoice(30),
        DurationChoice(40),
        DurationChoice(50),
        DurationChoice(60),
    ];

    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for DurationChoice {
    type Error = ApiException;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::OPTIONS
            .iter()
            .copied()
            .find(|choice| choice.0 == minutes)
            .ok_or_else(|| {
                ApiException::new(
                    ErrorCode::Validation,
                    format!("unsupported workout duration: {minutes} min"),
                )
            })
    }
}

impl fmt::Display for DurationChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

impl Serialize for DurationChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for DurationChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let minutes = u32::deserialize(deserializer)?;
        DurationChoice::try_from(minutes).map_err(serde::de::Error::custom)
    }
}

/// Optimization bias the recommender used for a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    TimeBased,
    EfficiencyBased,
    BalanceBased,
    Other(String),
}

impl Strategy {
    pub fn as_wire(&self) -> &str {
        match self {
            Strategy::TimeBased => "time_based",
            Strategy::EfficiencyBased => "efficiency_based",
            Strategy::BalanceBased => "balance_based",
            Strategy::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Strategy::TimeBased => "Time optimized",
            Strategy::EfficiencyBased => "Efficiency focused",
            Strategy::BalanceBased => "Balanced",
            Strategy::Other(raw) => raw,
        }
    }
}

impl From<&str> for Strategy {
    fn from(raw: &str) -> Self {
        match raw {
            "time_based" => Strategy::TimeBased,
            "efficiency_based" => Strategy::EfficiencyBased,
            "balance_based" => Strategy::BalanceBased,
            other => Strategy::Other(other.to_string()),
        }
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Strategy::from(raw.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationReason {
    TooHard,
    TooLong,
    Injury,
    Interrupted,
}

impl CancellationReason {
    pub const ALL: [CancellationReason; 4] = [
        CancellationReason::TooHard,
        CancellationReason::TooLong,
        CancellationReason::Injury,
        CancellationReason::Interrupted,
    ];

    pub fn as_wire(self) -> &'static str {
        match self {
            CancellationReason::TooHard => "TOO_HARD",
            CancellationReason::TooLong => "TOO_LONG",
            CancellationReason::Injury => "INJURY",
            CancellationReason::Interrupted => "INTERRUPTED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CancellationReason::TooHard => "Too hard",
            CancellationReason::TooLong => "Too long",
            CancellationReason::Injury => "Injury",
            CancellationReason::Interrupted => "Interrupted",
        }
    }

    pub fn requires_injury_area(self) -> bool {
        self == CancellationReason::Injury
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|reason| reason.as_wire().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InjuryArea {
    Shoulder,
    Elbow,
    Waist,
    Knee,
    Ankle,
    Etc,
}

impl InjuryArea {
    pub const ALL: [InjuryArea; 6] = [
        InjuryArea::Shoulder,
        InjuryArea::Elbow,
        InjuryArea::Waist,
        InjuryArea::Knee,
        InjuryArea::Ankle,
        InjuryArea::Etc,
    ];

    pub fn as_wire(self) -> &'static str {
        match self {
            InjuryArea::Shoulder => "SHOULDER",
            InjuryArea::Elbow => "ELBOW",
            InjuryArea::Waist => "WAIST",
            InjuryArea::Knee => "KNEE",
            InjuryArea::Ankle => "ANKLE",
            InjuryArea::Etc => "ETC",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|area| area.as_wire().eq_ignore_ascii_case(raw))
    }
}
