//! Workout types: sets, exercise entries, and the persisted workout record.

use std::{fmt, str::FromStr};

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Deviation, DeviationRecord};

/// The kind of session, matched against the weekly split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Push,
    Pull,
    Legs,
    Upper,
    Lower,
    Other,
}

impl WorkoutType {
    pub const ALL: [Self; 6] = [
        Self::Push,
        Self::Pull,
        Self::Legs,
        Self::Upper,
        Self::Lower,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Legs => "legs",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Push => "Push",
            Self::Pull => "Pull",
            Self::Legs => "Legs",
            Self::Upper => "Upper",
            Self::Lower => "Lower",
            Self::Other => "Other",
        };
        f.write_str(label)
    }
}

impl FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("unknown workout type: {s}"))
    }
}

/// Most reps accepted in one set.
pub const MAX_REPS: u32 = 1000;

/// Errors raised when building a set.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SetError {
    #[error("reps must be between 1 and {MAX_REPS}, got {0}")]
    RepsOutOfRange(u32),

    #[error("effort rating must be between 1 and 10, got {0}")]
    EffortOutOfRange(u8),

    #[error("weight must be a non-negative number, got {0}")]
    InvalidWeight(f64),

    #[error("invalid set '{0}': expected REPS, WEIGHTxREPS, or WEIGHTxREPS@RPE")]
    Malformed(String),
}

/// A single performed set.
///
/// Deserializing goes through [`Set::new`], so stored and imported sets obey
/// the same bounds as typed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSet")]
pub struct Set {
    pub reps: u32,

    /// Load in pounds. `None` for bodyweight work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Rate of perceived exertion, 1–10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<u8>,
}

impl Set {
    pub fn new(reps: u32, weight: Option<f64>, effort: Option<u8>) -> Result<Self, SetError> {
        if !(1..=MAX_REPS).contains(&reps) {
            return Err(SetError::RepsOutOfRange(reps));
        }
        if let Some(e) = effort
            && !(1..=10).contains(&e)
        {
            return Err(SetError::EffortOutOfRange(e));
        }
        if let Some(w) = weight
            && !(w.is_finite() && w >= 0.0)
        {
            return Err(SetError::InvalidWeight(w));
        }
        Ok(Self {
            reps,
            weight,
            effort,
        })
    }
}

#[derive(Deserialize)]
struct RawSet {
    reps: u32,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    effort: Option<u8>,
}

impl TryFrom<RawSet> for Set {
    type Error = SetError;

    fn try_from(raw: RawSet) -> Result<Self, Self::Error> {
        Self::new(raw.reps, raw.weight, raw.effort)
    }
}

/// Parses the compact set notation used on the command line.
///
/// `8` is eight bodyweight reps, `135x8` is eight reps at 135, and
/// `135x8@9` adds an effort rating.
impl FromStr for Set {
    type Err = SetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SetError::Malformed(s.to_string());
        let (body, effort) = match s.trim().split_once('@') {
            Some((body, rpe)) => (body, Some(rpe.trim().parse::<u8>().map_err(|_| malformed())?)),
            None => (s.trim(), None),
        };
        let (weight, reps) = match body.split_once(['x', 'X']) {
            Some((w, r)) => (
                Some(w.trim().parse::<f64>().map_err(|_| malformed())?),
                r.trim().parse::<u32>().map_err(|_| malformed())?,
            ),
            None => (None, body.trim().parse::<u32>().map_err(|_| malformed())?),
        };
        Self::new(reps, weight, effort)
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.weight {
            Some(w) => write!(f, "{} @ {w} lbs", self.reps)?,
            None => write!(f, "{} reps", self.reps)?,
        }
        if let Some(e) = self.effort {
            write!(f, " (RPE {e})")?;
        }
        Ok(())
    }
}

/// One exercise and the sets performed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub name: String,
    pub sets: Vec<Set>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExerciseEntry {
    /// The heaviest set, preferring more reps among equal weights.
    pub fn top_set(&self) -> Option<&Set> {
        self.sets.iter().max_by(|a, b| {
            let wa = a.weight.unwrap_or(0.0);
            let wb = b.weight.unwrap_or(0.0);
            wa.total_cmp(&wb).then(a.reps.cmp(&b.reps))
        })
    }
}

/// One workout's performance of one exercise, as returned by history
/// queries. Repeated entries for the exercise within the workout are merged
/// into `entry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePerformance {
    pub record_id: String,
    pub date: Date,
    pub entry: ExerciseEntry,
}

/// Plan-versus-actual metadata attached to workouts captured live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub planned_template_id: String,
    pub suggested_type: WorkoutType,
    pub suggestion_reason: String,
    pub adaptations: Vec<String>,
    pub deviations: Vec<DeviationRecord>,
    pub skipped: Vec<String>,
    pub equipment_unavailable: Vec<String>,
    pub recording_mode: Deviation,
    pub bonus_exercises: usize,
}

/// A workout ready to be written to the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    /// The log handle or session id that produced this workout.
    /// Writes are idempotent per source.
    pub source_id: Uuid,
    pub date: Date,
    pub workout_type: WorkoutType,
    pub exercises: Vec<ExerciseEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
}

/// A workout as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkout {
    /// `YYYY-MM-DD-NNN`, sequenced per date.
    pub id: String,
    pub created_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
    pub workout: Workout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weighted_set() {
        let set: Set = "135x8".parse().unwrap();
        assert_eq!(set.reps, 8);
        assert_eq!(set.weight, Some(135.0));
        assert_eq!(set.effort, None);
    }

    #[test]
    fn parses_bodyweight_set_with_effort() {
        let set: Set = "12@8".parse().unwrap();
        assert_eq!(set.reps, 12);
        assert_eq!(set.weight, None);
        assert_eq!(set.effort, Some(8));
    }

    #[test]
    fn rejects_effort_out_of_range() {
        let err = "135x5@11".parse::<Set>().unwrap_err();
        assert_eq!(err, SetError::EffortOutOfRange(11));
        assert_eq!(Set::new(5, None, Some(0)), Err(SetError::EffortOutOfRange(0)));
    }

    #[test]
    fn rejects_reps_out_of_range() {
        assert_eq!(Set::new(0, Some(135.0), None), Err(SetError::RepsOutOfRange(0)));
        assert_eq!(
            Set::new(MAX_REPS + 1, None, None),
            Err(SetError::RepsOutOfRange(MAX_REPS + 1))
        );
        assert!(Set::new(MAX_REPS, None, None).is_ok());
    }

    #[test]
    fn deserializing_checks_bounds() {
        let set: Set = serde_json::from_str(r#"{"reps":8,"weight":135.0,"effort":9}"#).unwrap();
        assert_eq!(set, Set::new(8, Some(135.0), Some(9)).unwrap());

        let err = serde_json::from_str::<Set>(r#"{"reps":8,"effort":12}"#).unwrap_err();
        assert!(err.to_string().contains("effort rating"), "{err}");
        assert!(serde_json::from_str::<Set>(r#"{"reps":0}"#).is_err());
        assert!(serde_json::from_str::<Set>(r#"{"reps":5,"weight":-10.0}"#).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "heavy".parse::<Set>(),
            Err(SetError::Malformed(_))
        ));
    }

    #[test]
    fn top_set_prefers_weight_then_reps() {
        let entry = ExerciseEntry {
            name: "Bench Press".into(),
            sets: vec![
                Set::new(10, Some(135.0), None).unwrap(),
                Set::new(6, Some(155.0), None).unwrap(),
                Set::new(8, Some(155.0), None).unwrap(),
            ],
            notes: None,
        };
        let top = entry.top_set().unwrap();
        assert_eq!(top.weight, Some(155.0));
        assert_eq!(top.reps, 8);
    }

    #[test]
    fn workout_type_parses_case_insensitively() {
        assert_eq!("LEGS".parse::<WorkoutType>().unwrap(), WorkoutType::Legs);
        assert!("cardio".parse::<WorkoutType>().is_err());
    }
}
