use std::collections::BTreeMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::pages;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("invalid todo: {0}")]
    Validation(ValidationError),

    #[error("todo {0} not found")]
    NotFound(i64),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("database unavailable: {0:#}")]
    Unavailable(anyhow::Error),
}

impl From<ValidationError> for TodoError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationError {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationError {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `Err(self)` if any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(id) => {
                tracing::debug!(id, "todo not found");
                (StatusCode::NOT_FOUND, Html(pages::not_found(id))).into_response()
            }
            Self::Validation(err) => {
                (StatusCode::BAD_REQUEST, Html(pages::message("Ungültige Eingabe", &err.to_string())))
                    .into_response()
            }
            err @ (Self::Storage(_) | Self::Unavailable(_)) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::message("Fehler", "Interner Fehler. Bitte später erneut versuchen.")),
                )
                    .into_response()
            }
        }
    }
}
