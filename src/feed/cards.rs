use chrono::{DateTime, Utc};

use crate::records::{FormulaRecord, DEFAULT_CONCENTRATION, DEFAULT_NAME};
use crate::util::sanitize_field;

/// Display-ready form of a [`FormulaRecord`]. Every string here is safe to
/// write to the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaCard {
    pub id: String,
    pub name: String,
    pub concentration: String,
    pub updated: Option<DateTime<Utc>>,
}

/// Sanitize first, then fall back: a field that is nothing but escape
/// sequences or whitespace gets the default too.
fn field_or_default(value: Option<&str>, default: &str) -> String {
    let cleaned = value.map(sanitize_field).unwrap_or_default();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// One card per record, in the order given.
pub fn render(records: &[FormulaRecord]) -> Vec<FormulaCard> {
    records
        .iter()
        .map(|record| FormulaCard {
            id: sanitize_field(&record.id).into_owned(),
            name: field_or_default(record.name.as_deref(), DEFAULT_NAME),
            concentration: field_or_default(record.concentration.as_deref(), DEFAULT_CONCENTRATION),
            updated: record.updated,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, name: Option<&str>, concentration: Option<&str>) -> FormulaRecord {
        FormulaRecord {
            id: id.to_string(),
            name: name.map(str::to_string),
            concentration: concentration.map(str::to_string),
            public: false,
            uid: "u1".to_string(),
            updated: None,
        }
    }

    #[test]
    fn test_defaults_for_empty_and_missing() {
        let cards = render(&[
            record("a", Some("Rose"), Some("EDT")),
            record("b", Some(""), Some("")),
            record("c", None, None),
        ]);

        let shown: Vec<(&str, &str)> = cards
            .iter()
            .map(|c| (c.name.as_str(), c.concentration.as_str()))
            .collect();
        assert_eq!(
            shown,
            vec![("Rose", "EDT"), ("Untitled", "EDP"), ("Untitled", "EDP")]
        );
    }

    #[test]
    fn test_order_is_preserved() {
        let cards = render(&[
            record("z", Some("Zest"), None),
            record("a", Some("Amber"), None),
        ]);
        assert_eq!(cards[0].id, "z");
        assert_eq!(cards[1].id, "a");
    }

    #[test]
    fn test_escape_sequences_are_neutralized() {
        let cards = render(&[record(
            "x",
            Some("\x1b[2J\x1b]0;pwned\x07Oud\nNoir"),
            Some("\x1b[31m"),
        )]);
        assert_eq!(cards[0].name, "Oud Noir");
        assert_eq!(cards[0].concentration, "EDP");
    }

    #[test]
    fn test_c1_only_name_gets_default() {
        let cards = render(&[record("x", Some("\u{9b}2J"), Some("\u{9d}0;x\u{9c}"))]);
        assert_eq!(cards[0].name, "Untitled");
        assert_eq!(cards[0].concentration, "EDP");
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert!(render(&[]).is_empty());
    }
}
