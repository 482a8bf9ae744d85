//! Core vocabulary of a trivia session: modes, difficulty tiers, categories,
//! languages, captured settings, and the question record itself.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Maximum number of distinct categories a mixed selection may hold.
pub const MAX_MIXED_CATEGORIES: usize = 3;
/// Number of options every question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Game variant chosen from the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// General-audience trivia night.
    #[default]
    Classic,
    /// Ages 5 to 10, always played on the easiest tier.
    Kids,
    /// School curriculum topics.
    Students,
    /// Three random categories drawn once difficulty is chosen.
    LocalTournament,
}

/// Ordered difficulty tiers, easiest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    /// Gentle questions for warming up.
    Easy,
    /// Default difficulty.
    Medium,
    /// For seasoned players.
    Hard,
    /// Obscure trivia.
    Impossible,
}

impl Difficulty {
    /// The easiest tier, forced whenever the session plays in [`Mode::Kids`].
    pub const fn easiest() -> Self {
        Difficulty::Easy
    }

    /// Stable identifier sent to the question provider.
    pub fn tag(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
            Difficulty::Impossible => "IMPOSSIBLE",
        }
    }
}

/// Language the questions are generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
pub enum Language {
    /// Primary language.
    #[default]
    #[serde(rename = "ar")]
    Arabic,
    /// Secondary language.
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Human readable language name used when talking to the question provider.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Arabic => "Arabic",
            Language::English => "English",
        }
    }

    /// Parse the short language tag used in configuration files.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "ar" => Some(Language::Arabic),
            "en" => Some(Language::English),
            _ => None,
        }
    }

    /// Label given to a local tournament when the host did not name it.
    pub fn local_tournament_label(self) -> &'static str {
        match self {
            Language::Arabic => "بطولة محلية",
            Language::English => "Local Tournament",
        }
    }
}

/// Question categories offered across all modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Identify the country from its flag.
    Flags,
    /// General knowledge.
    General,
    /// Quranic knowledge.
    Quran,
    /// Hadith and prophetic tradition.
    Hadith,
    /// Household life.
    House,
    /// Civilizations and heritage.
    Civilization,
    /// Riddles.
    Riddles,
    /// Regional dialects.
    Dialects,
    /// Science.
    Science,
    /// Mathematics.
    Math,
    /// Football.
    Football,
    /// Cars.
    Cars,
    /// Animals.
    Animals,
    /// Cartoons.
    Cartoons,
    /// Colors and shapes.
    ColorsShapes,
    /// Fruits and vegetables.
    FruitsVeg,
    /// History.
    History,
    /// Geography.
    Geography,
    /// Physics.
    Physics,
    /// Arabic language.
    Arabic,
}

impl Category {
    /// Stable identifier sent to the question provider.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Flags => "FLAGS",
            Category::General => "GENERAL",
            Category::Quran => "QURAN",
            Category::Hadith => "HADITH",
            Category::House => "HOUSE",
            Category::Civilization => "CIVILIZATION",
            Category::Riddles => "RIDDLES",
            Category::Dialects => "DIALECTS",
            Category::Science => "SCIENCE",
            Category::Math => "MATH",
            Category::Football => "FOOTBALL",
            Category::Cars => "CARS",
            Category::Animals => "ANIMALS",
            Category::Cartoons => "CARTOONS",
            Category::ColorsShapes => "COLORS_SHAPES",
            Category::FruitsVeg => "FRUITS_VEG",
            Category::History => "HISTORY",
            Category::Geography => "GEOGRAPHY",
            Category::Physics => "PHYSICS",
            Category::Arabic => "ARABIC",
        }
    }
}

const CLASSIC_CATEGORIES: &[Category] = &[
    Category::Flags,
    Category::General,
    Category::Quran,
    Category::Hadith,
    Category::House,
    Category::Civilization,
    Category::Riddles,
    Category::Dialects,
    Category::Science,
    Category::Math,
    Category::Football,
    Category::Cars,
];

const KIDS_CATEGORIES: &[Category] = &[
    Category::Quran,
    Category::Animals,
    Category::Cartoons,
    Category::ColorsShapes,
    Category::FruitsVeg,
    Category::General,
    Category::Football,
    Category::Cars,
];

const STUDENT_CATEGORIES: &[Category] = &[
    Category::Quran,
    Category::History,
    Category::Geography,
    Category::Physics,
    Category::Science,
    Category::Math,
    Category::Arabic,
    Category::Flags,
    Category::General,
    Category::Civilization,
];

impl Mode {
    /// Categories a host may pick from in the CATEGORY phase for this mode.
    pub fn category_pool(self) -> &'static [Category] {
        match self {
            Mode::Classic | Mode::LocalTournament => CLASSIC_CATEGORIES,
            Mode::Kids => KIDS_CATEGORIES,
            Mode::Students => STUDENT_CATEGORIES,
        }
    }

    /// Difficulty imposed by the mode regardless of explicit input.
    pub fn forced_difficulty(self) -> Option<Difficulty> {
        match self {
            Mode::Kids => Some(Difficulty::easiest()),
            _ => None,
        }
    }
}

/// Deduplicated union of the classic and student pools, in first-seen order.
pub fn tournament_pool() -> Vec<Category> {
    let mut pool: Vec<Category> =
        Vec::with_capacity(CLASSIC_CATEGORIES.len() + STUDENT_CATEGORIES.len());
    for category in CLASSIC_CATEGORIES.iter().chain(STUDENT_CATEGORIES) {
        if !pool.contains(category) {
            pool.push(*category);
        }
    }
    pool
}

/// Draw three distinct categories uniformly from the tournament pool.
pub fn draw_tournament_categories<R: Rng + ?Sized>(rng: &mut R) -> CategorySet {
    let pool = tournament_pool();
    let drawn: Vec<Category> = pool
        .choose_multiple(rng, MAX_MIXED_CATEGORIES)
        .copied()
        .collect();
    CategorySet(drawn)
}

/// Reasons a category selection is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategorySetError {
    /// No category was selected.
    #[error("at least one category is required")]
    Empty,
    /// More categories than a mix allows.
    #[error("at most 3 distinct categories may be mixed (got {0})")]
    TooMany(usize),
}

/// One to three distinct categories, in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategorySet(Vec<Category>);

impl CategorySet {
    /// Build a selection, dropping repeated entries while keeping first-seen order.
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Result<Self, CategorySetError> {
        let mut unique = Vec::new();
        for category in categories {
            if !unique.contains(&category) {
                unique.push(category);
            }
        }
        match unique.len() {
            0 => Err(CategorySetError::Empty),
            n if n > MAX_MIXED_CATEGORIES => Err(CategorySetError::TooMany(n)),
            _ => Ok(Self(unique)),
        }
    }

    /// Selection holding a single category.
    pub fn single(category: Category) -> Self {
        Self(vec![category])
    }

    /// Categories in selection order.
    pub fn as_slice(&self) -> &[Category] {
        &self.0
    }

    /// Number of categories selected.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a set built through [`CategorySet::new`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First selected category; drives fallback tagging for mixed selections.
    pub fn primary(&self) -> Category {
        self.0[0]
    }

    /// True when more than one category is mixed.
    pub fn is_mixed(&self) -> bool {
        self.0.len() > 1
    }
}

impl<'de> Deserialize<'de> for CategorySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Vec::<Category>::deserialize(deserializer)?;
        CategorySet::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Settings captured while walking the setup phases.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Chosen difficulty, once picked.
    pub difficulty: Option<Difficulty>,
    /// Chosen categories, once picked.
    pub categories: Option<CategorySet>,
    /// Tournament label, once named.
    pub tournament_name: Option<String>,
}

/// Match settings carried by a decoded match code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSettings {
    /// Categories the match draws from.
    pub categories: CategorySet,
    /// Difficulty of the match.
    pub difficulty: Difficulty,
    /// Tournament label, absent for friendlies.
    pub tournament_name: Option<String>,
}

/// A multiple-choice question ready to be played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Question {
    /// Unique within the batch it was generated in.
    pub id: String,
    /// Question wording.
    pub text: String,
    /// Exactly four options in display order.
    pub options: Vec<String>,
    /// Exact text of the correct option.
    pub correct_answer: String,
    /// Illustration shown next to the question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Short note shown after adjudication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// ISO 3166 alpha-2 code for flag questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Structural defects that make a question unplayable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionDefect {
    /// The question text is blank.
    #[error("question text is empty")]
    EmptyText,
    /// The question does not have exactly four options.
    #[error("expected 4 options, got {0}")]
    OptionCount(usize),
    /// The correct answer is not exactly one of the options.
    #[error("correct answer appears {0} times among the options")]
    CorrectAnswerCount(usize),
}

impl Question {
    /// Check the invariants every playable question must hold.
    ///
    /// Matching is exact textual equality; no normalisation is applied.
    pub fn validate(&self) -> Result<(), QuestionDefect> {
        if self.text.trim().is_empty() {
            return Err(QuestionDefect::EmptyText);
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(QuestionDefect::OptionCount(self.options.len()));
        }
        let hits = self
            .options
            .iter()
            .filter(|option| **option == self.correct_answer)
            .count();
        if hits != 1 {
            return Err(QuestionDefect::CorrectAnswerCount(hits));
        }
        Ok(())
    }

    /// Whether `option` is the correct answer.
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }
}

/// Keep an image reference only when it is directly loadable.
pub fn usable_image(reference: Option<&str>) -> Option<String> {
    reference
        .map(str::trim)
        .filter(|value| value.starts_with("http") || value.starts_with("data:"))
        .map(str::to_owned)
}
