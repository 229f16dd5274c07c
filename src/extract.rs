//! Free text → structured workout draft.
//!
//! The [`TextExtractor`] trait is the seam for any extraction backend. The
//! built-in [`ShorthandExtractor`] understands gym shorthand:
//!
//! ```text
//! bench 135x8x3, overhead 95x8x3     # weight x reps x sets
//! squat 3x5 @ 225                    # sets x reps @ weight
//! deadlift 315x5@8, 335x3            # weight x reps, optional RPE; a bare
//!                                    # scheme continues the previous exercise
//! pull-ups 3x10                      # bodyweight: sets x reps
//! lateral raises                     # known name alone: 3x10
//! ```
//!
//! Corrections arrive appended as `Correction: ...` paragraphs. A corrected
//! exercise replaces the earlier entry of the same name; `remove <name>`
//! drops one; `type <workout>` overrides the inferred workout type.

use log::debug;

use crate::{
    catalog::Catalog,
    model::{ExerciseEntry, Set, WorkoutType},
};

/// Sets and reps assumed when only an exercise name is given.
const DEFAULT_SETS: u32 = 3;
const DEFAULT_REPS: u32 = 10;

/// Most sets accepted for one exercise in one segment.
const MAX_SETS: u32 = 50;

const CORRECTION_MARKER: &str = "Correction:";

/// A successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub exercises: Vec<ExerciseEntry>,
    pub workout_type: WorkoutType,

    /// Share of the input that was understood, 0.0–1.0.
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("could not extract a workout: {reason}")]
pub struct ExtractionFailed {
    pub reason: String,
}

pub trait TextExtractor {
    fn extract(&self, raw: &str) -> Result<Extraction, ExtractionFailed>;
}

/// Deterministic extractor for workout shorthand.
pub struct ShorthandExtractor<'a> {
    catalog: &'a Catalog,
}

impl<'a> ShorthandExtractor<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }
}

impl TextExtractor for ShorthandExtractor<'_> {
    fn extract(&self, raw: &str) -> Result<Extraction, ExtractionFailed> {
        let mut parts = raw.split(CORRECTION_MARKER);
        let notes = parts.next().unwrap_or_default();

        let mut tally = Tally::default();
        let mut exercises = Vec::new();
        for segment in segments(notes) {
            tally.total += 1;
            if accept(self.apply_segment(segment, &mut exercises, false))? {
                tally.parsed += 1;
            }
        }

        let mut type_override = None;
        for correction in parts {
            for segment in segments(correction) {
                tally.total += 1;
                if let Some(t) = parse_type_directive(segment) {
                    type_override = Some(t);
                    tally.parsed += 1;
                } else if let Some(name) = parse_remove_directive(segment) {
                    let before = exercises.len();
                    exercises.retain(|e: &ExerciseEntry| !self.catalog.same_exercise(&e.name, name));
                    if exercises.len() < before {
                        tally.parsed += 1;
                    }
                } else if accept(self.apply_segment(segment, &mut exercises, true))? {
                    tally.parsed += 1;
                }
            }
        }

        if exercises.is_empty() {
            return Err(ExtractionFailed {
                reason: "no exercises recognized".into(),
            });
        }

        let workout_type =
            type_override.unwrap_or_else(|| self.catalog.infer_workout_type(&exercises));
        debug!(
            "extracted {} exercises ({}/{} segments)",
            exercises.len(),
            tally.parsed,
            tally.total
        );
        Ok(Extraction {
            exercises,
            workout_type,
            confidence: tally.confidence(),
        })
    }
}

/// Why a segment was not turned into sets.
#[derive(Debug, PartialEq)]
enum Unparsed {
    /// Not shorthand; the segment is skipped and lowers confidence.
    Unreadable,

    /// Shorthand whose numbers are out of bounds. Fails the extraction.
    OutOfRange(String),
}

/// Maps a segment outcome to "parsed or skipped", failing on bad numbers.
fn accept(outcome: Result<(), Unparsed>) -> Result<bool, ExtractionFailed> {
    match outcome {
        Ok(()) => Ok(true),
        Err(Unparsed::Unreadable) => Ok(false),
        Err(Unparsed::OutOfRange(reason)) => Err(ExtractionFailed { reason }),
    }
}

#[derive(Default)]
struct Tally {
    parsed: u32,
    total: u32,
}

impl Tally {
    #[allow(clippy::cast_precision_loss)]
    fn confidence(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.parsed as f32 / self.total as f32
        }
    }
}

impl ShorthandExtractor<'_> {
    /// Parses one segment into `exercises`.
    ///
    /// A named segment appends a new entry, or, when `replace` is set,
    /// overwrites the sets of an existing entry with the same name. A bare
    /// scheme adds sets to the most recent entry.
    fn apply_segment(
        &self,
        segment: &str,
        exercises: &mut Vec<ExerciseEntry>,
        replace: bool,
    ) -> Result<(), Unparsed> {
        let (name, scheme) = split_name(segment);

        if name.is_empty() {
            let last = exercises.last_mut().ok_or(Unparsed::Unreadable)?;
            let bodyweight = self.is_bodyweight(&last.name);
            last.sets.extend(parse_scheme(scheme, bodyweight)?);
            return Ok(());
        }

        let known = self.catalog.resolve(name).is_some();
        let sets = if scheme.is_empty() {
            // Prose without numbers is only an exercise if we know the name.
            if !known {
                return Err(Unparsed::Unreadable);
            }
            let set = Set::new(DEFAULT_REPS, None, None)
                .map_err(|e| Unparsed::OutOfRange(e.to_string()))?;
            vec![set; DEFAULT_SETS as usize]
        } else {
            parse_scheme(scheme, self.is_bodyweight(name))?
        };

        let name = self.catalog.canonical_name(name);
        if replace
            && let Some(existing) = exercises
                .iter_mut()
                .find(|e| self.catalog.same_exercise(&e.name, &name))
        {
            existing.sets = sets;
            return Ok(());
        }
        exercises.push(ExerciseEntry {
            name,
            sets,
            notes: None,
        });
        Ok(())
    }

    fn is_bodyweight(&self, name: &str) -> bool {
        self.catalog
            .resolve(name)
            .is_some_and(|ex| ex.equipment.is_empty() || ex.equipment == ["pull-up bar"])
    }
}

fn segments(text: &str) -> impl Iterator<Item = &str> {
    text.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Splits `"bench press 135x8x3"` into `("bench press", "135x8x3")`.
///
/// The scheme starts at the first word beginning with a digit.
fn split_name(segment: &str) -> (&str, &str) {
    let start = segment
        .char_indices()
        .find(|&(i, c)| {
            c.is_ascii_digit()
                && segment[..i]
                    .chars()
                    .next_back()
                    .is_none_or(char::is_whitespace)
        })
        .map_or(segment.len(), |(i, _)| i);
    (segment[..start].trim(), segment[start..].trim())
}

fn parse_type_directive(segment: &str) -> Option<WorkoutType> {
    let rest = segment.trim().strip_prefix("type")?;
    rest.trim_start_matches([' ', ':']).parse().ok()
}

fn parse_remove_directive(segment: &str) -> Option<&str> {
    let lower = segment.to_lowercase();
    ["remove ", "drop ", "delete "].iter().find_map(|prefix| {
        lower
            .starts_with(prefix)
            .then(|| segment[prefix.len()..].trim())
    })
}

/// Parses a set scheme into sets.
///
/// `bodyweight` decides how a two-number scheme reads: `3x15` is sets by
/// reps for push-ups but weight by reps for a barbell lift.
fn parse_scheme(scheme: &str, bodyweight: bool) -> Result<Vec<Set>, Unparsed> {
    let cleaned = scheme
        .to_lowercase()
        .replace("lbs", "")
        .replace("lb", "")
        .replace(' ', "");
    let (body, at) = match cleaned.split_once('@') {
        Some((body, at)) => (
            body.to_string(),
            Some(at.parse::<f64>().map_err(|_| Unparsed::Unreadable)?),
        ),
        None => (cleaned, None),
    };
    let numbers = body
        .split(['x', '*'])
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Unparsed::Unreadable)?;

    // `@` after a scheme is an effort rating when it fits 1–10, else a weight.
    let effort = at.filter(|v| (1.0..=10.0).contains(v) && v.fract() == 0.0);
    let at_weight = at.filter(|_| effort.is_none());

    let (weight, reps, sets) = match (numbers.as_slice(), at_weight) {
        ([w, r, s], None) => (Some(*w), *r, *s),
        ([s, r], Some(w)) => (Some(w), *r, *s),
        ([s, r], None) if bodyweight => (None, *r, *s),
        ([w, r], None) => (Some(*w), *r, 1.0),
        ([r], None) => (None, *r, 1.0),
        _ => return Err(Unparsed::Unreadable),
    };

    let reps = whole(reps).ok_or(Unparsed::Unreadable)?;
    let sets = whole(sets).ok_or(Unparsed::Unreadable)?;
    if !(1..=MAX_SETS).contains(&sets) {
        return Err(Unparsed::OutOfRange(format!(
            "sets must be between 1 and {MAX_SETS}, got {sets}"
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let effort = effort.map(|e| e as u8);
    let set = Set::new(reps, weight, effort).map_err(|e| Unparsed::OutOfRange(e.to_string()))?;
    Ok(vec![set; sets as usize])
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole(n: f64) -> Option<u32> {
    (n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n)).then(|| n as u32)
}
