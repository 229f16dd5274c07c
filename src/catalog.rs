//! Exercise catalog: canonical names, synonyms, equipment, and substitutions.
//!
//! Names entered by the user are folded to a lookup key (case, punctuation,
//! whitespace, trailing plural `s`) and resolved through each exercise's
//! synonyms. The substitution table lists, per exercise, the closest
//! equivalents in preference order. Every substitute works the same muscle
//! group.

use std::collections::{BTreeSet, HashMap};

use crate::model::{ExerciseEntry, TemplateDefinition, TemplateExercise, WorkoutType};

/// Primary muscle group worked by an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuscleGroup {
    Chest,
    Shoulders,
    Triceps,
    Back,
    Biceps,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Core,
}

impl MuscleGroup {
    /// Groups trained on a given workout type.
    pub fn for_workout(workout_type: WorkoutType) -> &'static [Self] {
        use MuscleGroup::*;
        match workout_type {
            WorkoutType::Push => &[Chest, Shoulders, Triceps],
            WorkoutType::Pull => &[Back, Biceps],
            WorkoutType::Legs => &[Quads, Hamstrings, Glutes, Calves],
            WorkoutType::Upper => &[Chest, Shoulders, Triceps, Back, Biceps],
            WorkoutType::Lower => &[Quads, Hamstrings, Glutes, Calves, Core],
            WorkoutType::Other => &[
                Chest, Shoulders, Triceps, Back, Biceps, Quads, Hamstrings, Glutes, Calves, Core,
            ],
        }
    }
}

/// A catalog entry.
#[derive(Debug)]
pub struct CatalogExercise {
    pub name: &'static str,
    pub synonyms: &'static [&'static str],
    pub group: MuscleGroup,

    /// Equipment required. Empty for bodyweight movements.
    pub equipment: &'static [&'static str],

    /// Progresses in the larger lower-body increment.
    pub lower_body: bool,
}

impl CatalogExercise {
    pub fn needs_any(&self, unavailable: &BTreeSet<String>) -> bool {
        self.equipment.iter().any(|e| unavailable.contains(*e))
    }
}

macro_rules! exercise {
    ($name:literal, [$($syn:literal),*], $group:ident, [$($eq:literal),*]) => {
        exercise!($name, [$($syn),*], $group, [$($eq),*], false)
    };
    ($name:literal, [$($syn:literal),*], $group:ident, [$($eq:literal),*], $lower:literal) => {
        CatalogExercise {
            name: $name,
            synonyms: &[$($syn),*],
            group: MuscleGroup::$group,
            equipment: &[$($eq),*],
            lower_body: $lower,
        }
    };
}

static EXERCISES: &[CatalogExercise] = &[
    // Chest
    exercise!("Barbell Bench Press", ["bench", "bench press", "flat bench", "bb bench"], Chest, ["barbell", "bench"]),
    exercise!("Dumbbell Bench Press", ["db bench", "dumbbell bench", "db bench press"], Chest, ["dumbbell", "bench"]),
    exercise!("Incline Barbell Press", ["incline bench", "incline barbell bench"], Chest, ["barbell", "bench"]),
    exercise!("Incline Dumbbell Press", ["incline db press", "incline press", "incline dumbbell bench"], Chest, ["dumbbell", "bench"]),
    exercise!("Machine Chest Press", ["chest press"], Chest, ["machine"]),
    exercise!("Cable Fly", ["cable flye", "cable crossover"], Chest, ["cable"]),
    exercise!("Dumbbell Fly", ["db fly", "dumbbell flye"], Chest, ["dumbbell", "bench"]),
    exercise!("Push-Up", ["pushup", "push up"], Chest, []),
    // Shoulders
    exercise!("Overhead Press", ["ohp", "overhead", "military press", "barbell overhead press"], Shoulders, ["barbell"]),
    exercise!("Dumbbell Shoulder Press", ["db shoulder press", "seated dumbbell press", "db ohp"], Shoulders, ["dumbbell"]),
    exercise!("Pike Push-Up", ["pike pushup"], Shoulders, []),
    exercise!("Lateral Raise", ["lateral", "side raise", "dumbbell lateral raise", "lat raise"], Shoulders, ["dumbbell"]),
    exercise!("Cable Lateral Raise", [], Shoulders, ["cable"]),
    exercise!("Face Pull", [], Shoulders, ["cable"]),
    exercise!("Rear Delt Fly", ["reverse fly", "rear delt raise"], Shoulders, ["dumbbell"]),
    exercise!("Band Pull-Apart", ["pull apart"], Shoulders, ["band"]),
    // Triceps
    exercise!("Tricep Pushdown", ["pushdown", "cable pushdown", "triceps pushdown", "rope pushdown"], Triceps, ["cable"]),
    exercise!("Overhead Tricep Extension", ["overhead extension", "tricep extension"], Triceps, ["dumbbell"]),
    exercise!("Skull Crusher", ["lying tricep extension"], Triceps, ["barbell", "bench"]),
    exercise!("Dip", ["tricep dip", "parallel bar dip"], Triceps, ["dip station"]),
    exercise!("Bench Dip", [], Triceps, ["bench"]),
    // Back
    exercise!("Barbell Row", ["row", "bent over row", "bb row"], Back, ["barbell"]),
    exercise!("Dumbbell Row", ["db row", "one arm row"], Back, ["dumbbell", "bench"]),
    exercise!("Seated Cable Row", ["cable row"], Back, ["cable"]),
    exercise!("Pull-Up", ["pullup", "pull up", "chin up", "chinup"], Back, ["pull-up bar"]),
    exercise!("Lat Pulldown", ["pulldown", "lat pull down"], Back, ["cable"]),
    exercise!("Deadlift", ["conventional deadlift", "dl"], Back, ["barbell"], true),
    // Biceps
    exercise!("Barbell Curl", ["curl", "bb curl"], Biceps, ["barbell"]),
    exercise!("Dumbbell Curl", ["db curl", "bicep curl"], Biceps, ["dumbbell"]),
    exercise!("Hammer Curl", [], Biceps, ["dumbbell"]),
    exercise!("Cable Curl", [], Biceps, ["cable"]),
    // Quads
    exercise!("Barbell Back Squat", ["squat", "back squat"], Quads, ["barbell", "squat rack"], true),
    exercise!("Smith Machine Squat", ["smith squat"], Quads, ["smith machine"], true),
    exercise!("Leg Press", [], Quads, ["machine"], true),
    exercise!("Goblet Squat", [], Quads, ["dumbbell"], true),
    exercise!("Bodyweight Squat", ["air squat"], Quads, [], true),
    exercise!("Bulgarian Split Squat", ["split squat", "bss"], Quads, ["dumbbell", "bench"], true),
    exercise!("Leg Extension", [], Quads, ["machine"], true),
    exercise!("Walking Lunge", ["lunge"], Quads, ["dumbbell"], true),
    // Hamstrings
    exercise!("Romanian Deadlift", ["rdl"], Hamstrings, ["barbell"], true),
    exercise!("Dumbbell Romanian Deadlift", ["db rdl"], Hamstrings, ["dumbbell"], true),
    exercise!("Leg Curl", ["hamstring curl", "lying leg curl", "seated leg curl"], Hamstrings, ["machine"], true),
    exercise!("Nordic Curl", ["nordic"], Hamstrings, [], true),
    // Glutes
    exercise!("Hip Thrust", ["barbell hip thrust"], Glutes, ["barbell", "bench"], true),
    exercise!("Glute Bridge", [], Glutes, [], true),
    // Calves
    exercise!("Standing Calf Raise", ["calf raise"], Calves, ["machine"], true),
    exercise!("Dumbbell Calf Raise", ["db calf raise"], Calves, ["dumbbell"], true),
    // Core
    exercise!("Plank", [], Core, []),
    exercise!("Hanging Leg Raise", ["leg raise"], Core, ["pull-up bar"]),
    exercise!("Cable Crunch", [], Core, ["cable"]),
    exercise!("Ab Wheel Rollout", ["ab wheel", "rollout"], Core, ["ab wheel"]),
];

/// Closest equivalents per exercise, best first.
static SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("Barbell Bench Press", &["Dumbbell Bench Press", "Machine Chest Press", "Push-Up"]),
    ("Dumbbell Bench Press", &["Barbell Bench Press", "Machine Chest Press", "Push-Up"]),
    ("Incline Barbell Press", &["Incline Dumbbell Press", "Dumbbell Bench Press", "Push-Up"]),
    ("Incline Dumbbell Press", &["Incline Barbell Press", "Machine Chest Press", "Push-Up"]),
    ("Machine Chest Press", &["Dumbbell Bench Press", "Barbell Bench Press", "Push-Up"]),
    ("Cable Fly", &["Dumbbell Fly", "Push-Up"]),
    ("Dumbbell Fly", &["Cable Fly", "Push-Up"]),
    ("Overhead Press", &["Dumbbell Shoulder Press", "Pike Push-Up"]),
    ("Dumbbell Shoulder Press", &["Overhead Press", "Pike Push-Up"]),
    ("Lateral Raise", &["Cable Lateral Raise"]),
    ("Cable Lateral Raise", &["Lateral Raise"]),
    ("Face Pull", &["Rear Delt Fly", "Band Pull-Apart"]),
    ("Rear Delt Fly", &["Face Pull", "Band Pull-Apart"]),
    ("Tricep Pushdown", &["Overhead Tricep Extension", "Dip", "Bench Dip"]),
    ("Overhead Tricep Extension", &["Tricep Pushdown", "Skull Crusher", "Bench Dip"]),
    ("Skull Crusher", &["Overhead Tricep Extension", "Tricep Pushdown", "Bench Dip"]),
    ("Dip", &["Bench Dip", "Tricep Pushdown"]),
    ("Barbell Row", &["Dumbbell Row", "Seated Cable Row"]),
    ("Dumbbell Row", &["Barbell Row", "Seated Cable Row"]),
    ("Seated Cable Row", &["Dumbbell Row", "Barbell Row"]),
    ("Pull-Up", &["Lat Pulldown", "Dumbbell Row"]),
    ("Lat Pulldown", &["Pull-Up", "Dumbbell Row"]),
    ("Deadlift", &["Romanian Deadlift", "Dumbbell Romanian Deadlift"]),
    ("Barbell Curl", &["Dumbbell Curl", "Cable Curl"]),
    ("Dumbbell Curl", &["Barbell Curl", "Cable Curl", "Hammer Curl"]),
    ("Hammer Curl", &["Dumbbell Curl", "Cable Curl"]),
    ("Cable Curl", &["Dumbbell Curl", "Barbell Curl"]),
    ("Barbell Back Squat", &["Smith Machine Squat", "Leg Press", "Goblet Squat", "Bulgarian Split Squat"]),
    ("Smith Machine Squat", &["Barbell Back Squat", "Leg Press", "Goblet Squat"]),
    ("Leg Press", &["Barbell Back Squat", "Goblet Squat", "Bulgarian Split Squat"]),
    ("Goblet Squat", &["Barbell Back Squat", "Leg Press", "Bodyweight Squat"]),
    ("Bulgarian Split Squat", &["Walking Lunge", "Goblet Squat"]),
    ("Leg Extension", &["Goblet Squat", "Bulgarian Split Squat"]),
    ("Walking Lunge", &["Bulgarian Split Squat", "Goblet Squat", "Bodyweight Squat"]),
    ("Romanian Deadlift", &["Dumbbell Romanian Deadlift", "Leg Curl", "Nordic Curl"]),
    ("Dumbbell Romanian Deadlift", &["Romanian Deadlift", "Leg Curl", "Nordic Curl"]),
    ("Leg Curl", &["Romanian Deadlift", "Nordic Curl"]),
    ("Hip Thrust", &["Glute Bridge"]),
    ("Standing Calf Raise", &["Dumbbell Calf Raise"]),
    ("Dumbbell Calf Raise", &["Standing Calf Raise"]),
    ("Hanging Leg Raise", &["Plank", "Ab Wheel Rollout"]),
    ("Cable Crunch", &["Ab Wheel Rollout", "Plank"]),
];

/// Fallback keywords for names the catalog doesn't know.
const LOWER_BODY_KEYWORDS: &[&str] = &["squat", "leg", "deadlift", "calf", "lunge", "hip"];

/// Folds an exercise name to its lookup key.
///
/// Lowercases, turns punctuation into spaces, collapses whitespace, and
/// drops a trailing plural `s` from each word (`Pull-Ups` → `pull up`).
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(singular)
        .collect::<Vec<_>>()
        .join(" ")
}

fn singular(word: &str) -> &str {
    if word.len() >= 3 && word.ends_with('s') && !word.ends_with("ss") {
        &word[..word.len() - 1]
    } else {
        word
    }
}

/// Folds an equipment name: lowercase, singular, common shorthands expanded.
pub fn normalize_equipment(item: &str) -> String {
    let folded = item
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let folded = match folded.as_str() {
        "db" | "dbs" => "dumbbell".to_string(),
        "bb" => "barbell".to_string(),
        "smith" => "smith machine".to_string(),
        "rack" | "squat racks" => "squat rack".to_string(),
        "pullup bar" | "pull up bar" | "chin up bar" => "pull-up bar".to_string(),
        "cable machine" | "cable machines" | "cable station" => "cable".to_string(),
        _ => folded,
    };
    match folded.strip_suffix('s') {
        Some(stem) if !folded.ends_with("ss") && stem.len() >= 3 => stem.to_string(),
        _ => folded,
    }
}

/// Lookup over the built-in exercise catalog.
#[derive(Debug)]
pub struct Catalog {
    index: HashMap<String, &'static CatalogExercise>,
    substitutes: HashMap<&'static str, &'static [&'static str]>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let mut index = HashMap::new();
        for exercise in EXERCISES {
            index.insert(normalize_name(exercise.name), exercise);
            for synonym in exercise.synonyms {
                index.insert(normalize_name(synonym), exercise);
            }
        }
        let substitutes = SUBSTITUTIONS.iter().copied().collect();
        Self { index, substitutes }
    }

    /// Resolves a user-entered name to its catalog entry.
    pub fn resolve(&self, name: &str) -> Option<&'static CatalogExercise> {
        self.index.get(&normalize_name(name)).copied()
    }

    /// The canonical name for `name`, or `name` title-cased if unknown.
    pub fn canonical_name(&self, name: &str) -> String {
        match self.resolve(name) {
            Some(ex) => ex.name.to_string(),
            None => title_case(name),
        }
    }

    /// Whether two names refer to the same exercise.
    pub fn same_exercise(&self, a: &str, b: &str) -> bool {
        match (self.resolve(a), self.resolve(b)) {
            (Some(x), Some(y)) => x.name == y.name,
            _ => normalize_name(a) == normalize_name(b),
        }
    }

    /// Known substitutes for `name`, best first. Empty when unknown.
    pub fn substitutes(&self, name: &str) -> Vec<&'static CatalogExercise> {
        let Some(ex) = self.resolve(name) else {
            return Vec::new();
        };
        self.substitutes
            .get(ex.name)
            .into_iter()
            .flat_map(|subs| subs.iter())
            .filter_map(|s| self.resolve(s))
            .collect()
    }

    /// Whether `candidate` is listed as a substitute for `name`.
    pub fn is_substitute(&self, name: &str, candidate: &str) -> bool {
        self.substitutes(name)
            .iter()
            .any(|s| self.same_exercise(s.name, candidate))
    }

    /// All catalog exercises trained on a workout type, in catalog order.
    pub fn pool_for(&self, workout_type: WorkoutType) -> Vec<&'static CatalogExercise> {
        let groups = MuscleGroup::for_workout(workout_type);
        EXERCISES
            .iter()
            .filter(|ex| groups.contains(&ex.group))
            .collect()
    }

    /// Catalog exercises in the same muscle group as `name`.
    pub fn same_group(&self, name: &str) -> Vec<&'static CatalogExercise> {
        let Some(ex) = self.resolve(name) else {
            return Vec::new();
        };
        EXERCISES
            .iter()
            .filter(|other| other.group == ex.group && other.name != ex.name)
            .collect()
    }

    /// Whether `name` progresses in the lower-body increment.
    pub fn is_lower_body(&self, name: &str) -> bool {
        match self.resolve(name) {
            Some(ex) => ex.lower_body,
            None => {
                let lower = name.to_lowercase();
                LOWER_BODY_KEYWORDS.iter().any(|k| lower.contains(k))
            }
        }
    }

    /// Guesses the workout type by majority vote over the exercises.
    ///
    /// Ties resolve to Push, then Pull, then Legs. Returns `Other`
    /// when no exercise is recognized.
    pub fn infer_workout_type(&self, exercises: &[ExerciseEntry]) -> WorkoutType {
        let (mut push, mut pull, mut legs) = (0, 0, 0);
        for entry in exercises {
            match self.resolve(&entry.name).map(|ex| ex.group) {
                Some(MuscleGroup::Chest | MuscleGroup::Shoulders | MuscleGroup::Triceps) => {
                    push += 1;
                }
                Some(MuscleGroup::Back | MuscleGroup::Biceps) => pull += 1,
                Some(
                    MuscleGroup::Quads
                    | MuscleGroup::Hamstrings
                    | MuscleGroup::Glutes
                    | MuscleGroup::Calves,
                ) => legs += 1,
                Some(MuscleGroup::Core) | None => {}
            }
        }
        let max = push.max(pull).max(legs);
        if max == 0 {
            WorkoutType::Other
        } else if push == max {
            WorkoutType::Push
        } else if pull == max {
            WorkoutType::Pull
        } else {
            WorkoutType::Legs
        }
    }
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Templates seeded into an empty record store.
pub fn default_templates() -> Vec<TemplateDefinition> {
    fn slot(name: &str, target_sets: u32, target_reps: u32) -> TemplateExercise {
        TemplateExercise {
            name: name.to_string(),
            target_sets,
            target_reps,
            target_weight: None,
        }
    }

    vec![
        TemplateDefinition {
            id: "push_a".into(),
            name: "Push A".into(),
            workout_type: WorkoutType::Push,
            exercises: vec![
                slot("Barbell Bench Press", 4, 8),
                slot("Overhead Press", 3, 8),
                slot("Incline Dumbbell Press", 3, 10),
                slot("Lateral Raise", 3, 12),
                slot("Tricep Pushdown", 3, 12),
            ],
        },
        TemplateDefinition {
            id: "pull_a".into(),
            name: "Pull A".into(),
            workout_type: WorkoutType::Pull,
            exercises: vec![
                slot("Deadlift", 3, 5),
                slot("Pull-Up", 3, 8),
                slot("Barbell Row", 3, 8),
                slot("Face Pull", 3, 15),
                slot("Barbell Curl", 3, 10),
            ],
        },
        TemplateDefinition {
            id: "legs_a".into(),
            name: "Legs A".into(),
            workout_type: WorkoutType::Legs,
            exercises: vec![
                slot("Barbell Back Squat", 4, 6),
                slot("Romanian Deadlift", 3, 8),
                slot("Leg Press", 3, 10),
                slot("Leg Curl", 3, 12),
                slot("Standing Calf Raise", 4, 12),
            ],
        },
        TemplateDefinition {
            id: "upper_a".into(),
            name: "Upper A".into(),
            workout_type: WorkoutType::Upper,
            exercises: vec![
                slot("Barbell Bench Press", 3, 8),
                slot("Barbell Row", 3, 8),
                slot("Dumbbell Shoulder Press", 3, 10),
                slot("Lat Pulldown", 3, 10),
                slot("Dumbbell Curl", 2, 12),
                slot("Tricep Pushdown", 2, 12),
            ],
        },
        TemplateDefinition {
            id: "lower_a".into(),
            name: "Lower A".into(),
            workout_type: WorkoutType::Lower,
            exercises: vec![
                slot("Barbell Back Squat", 3, 8),
                slot("Romanian Deadlift", 3, 8),
                slot("Bulgarian Split Squat", 3, 10),
                slot("Hip Thrust", 3, 10),
                slot("Hanging Leg Raise", 3, 12),
            ],
        },
    ]
}
