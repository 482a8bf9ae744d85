//! Match codes: portable, self-contained descriptors of match settings.
//!
//! A code is the literal prefix `SG-` followed by the standard base64 encoding
//! of a small JSON object `{c, d, n?, t}`. Codes are **not** a security
//! boundary: they carry no signature, no expiry and no replay protection, and
//! anyone holding one can read or forge the settings it describes.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    error::ServiceError,
    state::game::{Category, CategorySet, CategorySetError, Difficulty, MatchSettings},
};

/// Literal prefix every match code starts with.
pub const MATCH_CODE_PREFIX: &str = "SG-";

/// Kind of match a code was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum MatchKind {
    /// Casual match between two local teams.
    #[default]
    #[serde(rename = "F")]
    Friendly,
    /// Named tournament match.
    #[serde(rename = "T")]
    Tournament,
}

/// Why a code could not be decoded. Callers only ever see one generic message.
#[derive(Debug, Error)]
pub enum MatchCodeError {
    /// The code lacks the `SG-` prefix.
    #[error("code does not start with the `SG-` prefix")]
    MissingPrefix,
    /// The body is not base64.
    #[error("code body is not valid base64")]
    Encoding(#[from] base64::DecodeError),
    /// The payload is not the expected JSON.
    #[error("code payload is not valid JSON")]
    Payload(#[from] serde_json::Error),
    /// A required field is absent.
    #[error("code payload lacks required field `{0}`")]
    MissingField(&'static str),
    /// The encoded categories do not form a valid set.
    #[error("code categories are invalid")]
    InvalidCategories(#[from] CategorySetError),
}

impl From<MatchCodeError> for ServiceError {
    fn from(err: MatchCodeError) -> Self {
        debug!(error = %err, "rejected match code");
        ServiceError::InvalidMatchCode
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    c: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<String>,
    #[serde(default)]
    t: MatchKind,
}

/// Encode `settings` as a shareable match code.
pub fn encode(kind: MatchKind, settings: &MatchSettings) -> String {
    let payload = Payload {
        c: Some(settings.categories.as_slice().to_vec()),
        d: Some(settings.difficulty),
        n: settings.tournament_name.clone(),
        t: kind,
    };
    // Serializing plain enums and strings into JSON cannot fail.
    let json = serde_json::to_vec(&payload).unwrap_or_default();
    format!("{MATCH_CODE_PREFIX}{}", STANDARD.encode(json))
}

/// Decode a match code, validating the prefix and the required fields.
pub fn decode(code: &str) -> Result<(MatchKind, MatchSettings), MatchCodeError> {
    let body = code
        .trim()
        .strip_prefix(MATCH_CODE_PREFIX)
        .ok_or(MatchCodeError::MissingPrefix)?;
    let bytes = STANDARD.decode(body)?;
    let payload: Payload = serde_json::from_slice(&bytes)?;

    let categories = payload.c.ok_or(MatchCodeError::MissingField("c"))?;
    let difficulty = payload.d.ok_or(MatchCodeError::MissingField("d"))?;
    let categories = CategorySet::new(categories)?;

    Ok((
        payload.t,
        MatchSettings {
            categories,
            difficulty,
            tournament_name: payload.n,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_raw(json: &str) -> String {
        format!("{MATCH_CODE_PREFIX}{}", STANDARD.encode(json))
    }

    #[test]
    fn decoding_an_encoding_yields_the_same_settings() {
        let cases = [
            (
                MatchKind::Friendly,
                MatchSettings {
                    categories: CategorySet::single(Category::Flags),
                    difficulty: Difficulty::Easy,
                    tournament_name: None,
                },
            ),
            (
                MatchKind::Tournament,
                MatchSettings {
                    categories: CategorySet::new([
                        Category::Math,
                        Category::History,
                        Category::Cars,
                    ])
                    .unwrap(),
                    difficulty: Difficulty::Impossible,
                    tournament_name: Some("كأس رمضان".into()),
                },
            ),
        ];
        for (kind, settings) in cases {
            let code = encode(kind, &settings);
            assert!(code.starts_with(MATCH_CODE_PREFIX));
            assert_eq!(decode(&code).unwrap(), (kind, settings));
        }
    }

    #[test]
    fn payload_uses_compact_field_names() {
        let code = encode(
            MatchKind::Tournament,
            &MatchSettings {
                categories: CategorySet::single(Category::Quran),
                difficulty: Difficulty::Hard,
                tournament_name: Some("Cup".into()),
            },
        );
        let bytes = STANDARD
            .decode(code.strip_prefix(MATCH_CODE_PREFIX).unwrap())
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "c": ["QURAN"], "d": "HARD", "n": "Cup", "t": "T" })
        );
    }

    #[test]
    fn missing_prefix_is_rejected() {
        let code = encode_raw(r#"{"c":["MATH"],"d":"EASY","t":"F"}"#);
        let bare = code.trim_start_matches(MATCH_CODE_PREFIX);
        assert!(matches!(decode(bare), Err(MatchCodeError::MissingPrefix)));
    }

    #[test]
    fn required_fields_are_enforced() {
        assert!(matches!(
            decode(&encode_raw(r#"{"d":"EASY","t":"F"}"#)),
            Err(MatchCodeError::MissingField("c"))
        ));
        assert!(matches!(
            decode(&encode_raw(r#"{"c":["MATH"],"t":"F"}"#)),
            Err(MatchCodeError::MissingField("d"))
        ));
    }

    #[test]
    fn garbage_bodies_are_rejected() {
        assert!(matches!(decode("SG-@@@"), Err(MatchCodeError::Encoding(_))));
        assert!(matches!(
            decode(&encode_raw("not json")),
            Err(MatchCodeError::Payload(_))
        ));
        assert!(matches!(
            decode(&encode_raw(r#"{"c":[],"d":"EASY"}"#)),
            Err(MatchCodeError::InvalidCategories(_))
        ));
        assert!(matches!(
            decode(&encode_raw(r#"{"c":["MATH","CARS","QURAN","FLAGS"],"d":"EASY"}"#)),
            Err(MatchCodeError::InvalidCategories(_))
        ));
    }

    #[test]
    fn every_failure_maps_to_the_same_user_facing_error() {
        let err: ServiceError = decode("nope").unwrap_err().into();
        assert!(matches!(err, ServiceError::InvalidMatchCode));
    }

    #[test]
    fn kind_defaults_to_friendly() {
        let (kind, _) = decode(&encode_raw(r#"{"c":["MATH"],"d":"EASY"}"#)).unwrap();
        assert_eq!(kind, MatchKind::Friendly);
    }
}
