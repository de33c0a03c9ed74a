use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::error::ValidationError;

pub const TITLE_MAX_LEN: usize = 255;
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Years that format as four unsigned digits, so stored dates sort as text.
pub const DUE_YEARS: RangeInclusive<i32> = 1..=9999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_resolved && self.due_date.is_some_and(|due| due < today)
    }
}

/// Raw input for creating a todo, as submitted by a caller.
#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<ValidNewTodo, ValidationError> {
        let mut errors = ValidationError::default();
        let title = check_title(&self.title, &mut errors);
        let due_date = match self.due_date.as_deref() {
            Some(raw) => check_due_date(raw, &mut errors),
            None => None,
        };
        errors.into_result()?;

        Ok(ValidNewTodo {
            title,
            description: self
                .description
                .as_deref()
                .map(|raw| raw.trim().to_string())
                .unwrap_or_default(),
            due_date,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidNewTodo {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

/// Partial update. `None` leaves a field untouched; `due_date: Some(None)`
/// or a blank date clears it.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<String>>,
    pub is_resolved: Option<bool>,
}

impl TodoChanges {
    /// Validates the provided fields and applies them to `todo`.
    /// On error `todo` is left unchanged.
    pub fn apply_to(&self, todo: &mut Todo) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        let title = self.title.as_deref().map(|raw| check_title(raw, &mut errors));
        let due_date = self
            .due_date
            .as_ref()
            .map(|raw| raw.as_deref().and_then(|raw| check_due_date(raw, &mut errors)));
        errors.into_result()?;

        if let Some(title) = title {
            todo.title = title;
        }
        if let Some(description) = &self.description {
            todo.description = description.trim().to_string();
        }
        if let Some(due_date) = due_date {
            todo.due_date = due_date;
        }
        if let Some(is_resolved) = self.is_resolved {
            todo.is_resolved = is_resolved;
        }
        Ok(())
    }
}

fn check_title(raw: &str, errors: &mut ValidationError) -> String {
    let title = raw.trim();
    if title.is_empty() {
        errors.add("title", "title is required");
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.add(
            "title",
            format!("title must be at most {TITLE_MAX_LEN} characters"),
        );
    }
    title.to_string()
}

fn check_due_date(raw: &str, errors: &mut ValidationError) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) if DUE_YEARS.contains(&date.year()) => Some(date),
        _ => {
            errors.add("due_date", format!("'{raw}' is not a valid date (YYYY-MM-DD)"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Todo {
        let now = Utc::now();
        Todo {
            id: 1,
            title: "Buy milk".into(),
            description: String::new(),
            due_date: None,
            is_resolved: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_todo_defaults() {
        let valid = NewTodo::new("  Buy milk ").validate().unwrap();
        assert_eq!(valid.title, "Buy milk");
        assert_eq!(valid.description, "");
        assert_eq!(valid.due_date, None);
    }

    #[test]
    fn rejects_blank_title() {
        let err = NewTodo::new("   ").validate().unwrap_err();
        assert_eq!(err.get("title"), Some("title is required"));
    }

    #[test]
    fn title_length_limit_counts_characters() {
        assert!(NewTodo::new("x".repeat(255)).validate().is_ok());
        assert!(NewTodo::new("ä".repeat(255)).validate().is_ok());
        let err = NewTodo::new("x".repeat(256)).validate().unwrap_err();
        assert!(err.get("title").is_some());
    }

    #[test]
    fn collects_all_field_errors() {
        let input = NewTodo {
            title: String::new(),
            description: None,
            due_date: Some("invalid-date".into()),
        };
        let err = input.validate().unwrap_err();
        assert!(err.get("title").is_some());
        assert!(err.get("due_date").is_some());
    }

    #[test]
    fn parses_due_date_and_treats_blank_as_none() {
        let input = NewTodo {
            due_date: Some("2024-02-29".into()),
            ..NewTodo::new("Leap")
        };
        assert_eq!(
            input.validate().unwrap().due_date,
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );

        let blank = NewTodo {
            due_date: Some(" ".into()),
            ..NewTodo::new("Blank")
        };
        assert_eq!(blank.validate().unwrap().due_date, None);

        let impossible = NewTodo {
            due_date: Some("2023-02-29".into()),
            ..NewTodo::new("Nope")
        };
        assert!(impossible.validate().is_err());
    }

    #[test]
    fn rejects_years_outside_four_digits() {
        for raw in ["+12345-01-01", "-0001-01-01", "0000-12-31"] {
            let input = NewTodo {
                due_date: Some(raw.into()),
                ..NewTodo::new("Far away")
            };
            let err = input.validate().unwrap_err();
            assert!(err.get("due_date").is_some(), "{raw} accepted");
        }

        let edge = NewTodo {
            due_date: Some("9999-12-31".into()),
            ..NewTodo::new("Edge")
        };
        assert_eq!(
            edge.validate().unwrap().due_date,
            NaiveDate::from_ymd_opt(9999, 12, 31)
        );
    }

    #[test]
    fn description_is_trimmed() {
        let input = NewTodo {
            description: Some("  2 litres\n".into()),
            ..NewTodo::new("Buy milk")
        };
        assert_eq!(input.validate().unwrap().description, "2 litres");

        let mut todo = sample();
        let changes = TodoChanges {
            description: Some(" semi-skimmed ".into()),
            ..TodoChanges::default()
        };
        changes.apply_to(&mut todo).unwrap();
        assert_eq!(todo.description, "semi-skimmed");
    }

    #[test]
    fn changes_touch_only_given_fields() {
        let mut todo = sample();
        let changes = TodoChanges {
            due_date: Some(Some("2024-03-01".into())),
            ..TodoChanges::default()
        };
        changes.apply_to(&mut todo).unwrap();
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.due_date, NaiveDate::from_ymd_opt(2024, 3, 1));

        let clear = TodoChanges {
            due_date: Some(None),
            ..TodoChanges::default()
        };
        clear.apply_to(&mut todo).unwrap();
        assert_eq!(todo.due_date, None);
    }

    #[test]
    fn invalid_changes_leave_todo_untouched() {
        let mut todo = sample();
        let before = todo.clone();
        let changes = TodoChanges {
            title: Some(String::new()),
            description: Some("new".into()),
            is_resolved: Some(true),
            ..TodoChanges::default()
        };
        assert!(changes.apply_to(&mut todo).is_err());
        assert_eq!(todo, before);
    }

    #[test]
    fn overdue_only_when_unresolved_and_past_due() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut todo = sample();
        assert!(!todo.is_overdue(today));
        todo.due_date = NaiveDate::from_ymd_opt(2024, 5, 9);
        assert!(todo.is_overdue(today));
        todo.due_date = Some(today);
        assert!(!todo.is_overdue(today));
        todo.due_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        todo.is_resolved = true;
        assert!(!todo.is_overdue(today));
    }
}
