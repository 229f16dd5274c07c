//! Plan-versus-actual classification.
//!
//! A performed exercise is `exact` when it names the planned one, `modified`
//! when it is a known substitute or the same movement on other equipment,
//! and `different` otherwise. `different` is an ordinary outcome, not a
//! failure.

use std::collections::BTreeSet;

use crate::{
    catalog::{Catalog, normalize_name},
    model::{Deviation, PlannedExercise},
};

/// Words naming an implement rather than a movement.
const EQUIPMENT_WORDS: &[&str] = &[
    "barbell", "bb", "dumbbell", "db", "cable", "machine", "smith", "ez", "trap", "band",
    "kettlebell", "kb",
];

pub struct DeviationDetector<'a> {
    catalog: &'a Catalog,
}

impl<'a> DeviationDetector<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn classify(&self, planned: &PlannedExercise, performed: &str) -> Deviation {
        let catalog = self.catalog;
        if catalog.same_exercise(&planned.name, performed) {
            return Deviation::Exact;
        }

        let original = planned.substituted_for.as_deref();
        let related = original.is_some_and(|o| catalog.same_exercise(o, performed))
            || catalog.is_substitute(&planned.name, performed)
            || catalog.is_substitute(performed, &planned.name)
            || self.same_movement(&planned.name, performed);
        if related {
            Deviation::Modified
        } else {
            Deviation::Different
        }
    }

    fn same_movement(&self, a: &str, b: &str) -> bool {
        let a = core_words(&self.catalog.canonical_name(a));
        let b = core_words(&self.catalog.canonical_name(b));
        !a.is_empty() && a == b
    }
}

/// The movement words of a name, equipment stripped.
fn core_words(name: &str) -> BTreeSet<String> {
    normalize_name(name)
        .split_whitespace()
        .filter(|w| !EQUIPMENT_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(name: &str) -> PlannedExercise {
        PlannedExercise {
            name: name.into(),
            target_sets: 3,
            target_reps: 8,
            target_weight: None,
            substituted_for: None,
        }
    }

    #[test]
    fn exact_ignores_case_punctuation_and_synonyms() {
        let catalog = Catalog::builtin();
        let detector = DeviationDetector::new(&catalog);
        let bench = planned("Barbell Bench Press");

        assert_eq!(detector.classify(&bench, "barbell  bench press"), Deviation::Exact);
        assert_eq!(detector.classify(&bench, "bench"), Deviation::Exact);
        assert_eq!(detector.classify(&planned("Pull-Up"), "pullups"), Deviation::Exact);
    }

    #[test]
    fn substitutes_are_modified_in_both_directions() {
        let catalog = Catalog::builtin();
        let detector = DeviationDetector::new(&catalog);

        assert_eq!(
            detector.classify(&planned("Barbell Back Squat"), "Leg Press"),
            Deviation::Modified
        );
        // Leg Extension lists Goblet Squat, not the other way round.
        assert_eq!(
            detector.classify(&planned("Goblet Squat"), "Leg Extension"),
            Deviation::Modified
        );
    }

    #[test]
    fn performing_the_original_of_a_substitution_is_modified() {
        let catalog = Catalog::builtin();
        let detector = DeviationDetector::new(&catalog);
        let mut sub = planned("Push-Up");
        sub.substituted_for = Some("Incline Barbell Press".into());

        assert_eq!(
            detector.classify(&sub, "Incline Barbell Press"),
            Deviation::Modified
        );
    }

    #[test]
    fn equipment_variants_are_modified() {
        let catalog = Catalog::builtin();
        let detector = DeviationDetector::new(&catalog);

        assert_eq!(
            detector.classify(&planned("Goblet Squat"), "kettlebell goblet squat"),
            Deviation::Modified
        );
        assert_eq!(
            detector.classify(&planned("Lateral Raise"), "band lateral raise"),
            Deviation::Modified
        );
    }

    #[test]
    fn unrelated_is_different() {
        let catalog = Catalog::builtin();
        let detector = DeviationDetector::new(&catalog);

        assert_eq!(
            detector.classify(&planned("Barbell Bench Press"), "Barbell Curl"),
            Deviation::Different
        );
        assert_eq!(
            detector.classify(&planned("Overhead Press"), "Rowing Machine"),
            Deviation::Different
        );
    }

    #[test]
    fn core_words_strip_equipment() {
        let words = core_words("Dumbbell Bench Press");
        assert_eq!(
            words,
            BTreeSet::from(["bench".to_string(), "press".to_string()])
        );
        assert!(core_words("Cable Machine").is_empty());
    }
}
