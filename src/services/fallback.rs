//! Deterministic local question set served whenever the provider cannot be used.

use crate::state::game::{Category, Language, Question};

const FLAG_FALLBACK_CODE: &str = "EG";

/// Build `count` placeholder questions tagged to `category` and `language`.
///
/// The set is identical for identical inputs: flags questions all show the same
/// flag, every other category gets numbered test questions whose correct option
/// is the first one.
pub fn fallback_questions(
    category: Category,
    language: Language,
    count: usize,
    flag_image_base: &str,
) -> Vec<Question> {
    (0..count)
        .map(|index| fallback_question(category, language, index, flag_image_base))
        .collect()
}

fn fallback_question(
    category: Category,
    language: Language,
    index: usize,
    flag_image_base: &str,
) -> Question {
    let explanation = match language {
        Language::Arabic => "سؤال تجريبي",
        Language::English => "Mock Question",
    };

    let (text, options, correct, image, country_code) = if category == Category::Flags {
        let (text, options): (&str, [&str; 4]) = match language {
            Language::Arabic => ("ما هي هذه الدولة؟", ["مصر", "السعودية", "الإمارات", "قطر"]),
            Language::English => (
                "Which country is this?",
                ["Egypt", "Saudi Arabia", "UAE", "Qatar"],
            ),
        };
        (
            text.to_owned(),
            options.map(str::to_owned).to_vec(),
            options[0].to_owned(),
            Some(flag_image_url(flag_image_base, FLAG_FALLBACK_CODE)),
            Some(FLAG_FALLBACK_CODE.to_owned()),
        )
    } else {
        let text = match language {
            Language::Arabic => format!("سؤال تجريبي {}", index + 1),
            Language::English => format!("Test Question {}", index + 1),
        };
        (
            text,
            ["A", "B", "C", "D"].map(str::to_owned).to_vec(),
            "A".to_owned(),
            None,
            None,
        )
    };

    Question {
        id: format!("fallback-{index}"),
        text,
        options,
        correct_answer: correct,
        image,
        explanation: Some(explanation.to_owned()),
        country_code,
    }
}

/// Flag image derived from a country code: `{base}/{cc}.png`, lowercase.
pub fn flag_image_url(base: &str, country_code: &str) -> String {
    format!(
        "{}/{}.png",
        base.trim_end_matches('/'),
        country_code.to_ascii_lowercase()
    )
}
