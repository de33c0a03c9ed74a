use std::path::PathBuf;

use axum::{
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use crate::error::{TodoError, ValidationError};
use crate::models::{NewTodo, TodoChanges};
use crate::pages::{self, FormValues};

#[derive(Clone)]
pub struct AppState {
    pub db_path: PathBuf,
}

impl AppState {
    /// Each request works on its own connection; SQLite's locking keeps
    /// concurrent mutations isolated.
    fn open(&self) -> Result<Database, TodoError> {
        Database::connect(&self.db_path).map_err(TodoError::Unavailable)
    }
}

/// Fields of the create/edit form. Browsers omit unchecked boxes.
#[derive(Debug, Deserialize)]
struct TodoForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    due_date: String,
    is_resolved: Option<String>,
}

impl TodoForm {
    fn new_todo(&self) -> NewTodo {
        NewTodo {
            description: Some(self.description.clone()),
            due_date: Some(self.due_date.clone()),
            ..NewTodo::new(self.title.as_str())
        }
    }

    /// The form always submits the whole record.
    fn changes(&self) -> TodoChanges {
        TodoChanges {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            due_date: Some(Some(self.due_date.clone())),
            is_resolved: Some(self.is_resolved.is_some()),
        }
    }

    fn values(&self) -> FormValues {
        FormValues {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date.clone(),
            is_resolved: self.is_resolved.is_some(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_todos))
        .route("/todo/create/", get(create_form).post(create_todo))
        .route("/todo/:id/", get(todo_detail))
        .route("/todo/:id/edit/", get(edit_form).post(update_todo))
        .route("/todo/:id/delete/", get(confirm_delete).post(delete_todo))
        .route("/todo/:id/toggle/", post(toggle_todo))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_todos(State(state): State<AppState>) -> Result<Html<String>, TodoError> {
    let todos = state.open()?.list()?;
    tracing::debug!(count = todos.len(), "listing todos");
    Ok(Html(pages::todo_list(&todos)))
}

async fn todo_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, TodoError> {
    let todo = state.open()?.get(id)?;
    Ok(Html(pages::todo_detail(&todo)))
}

async fn create_form() -> Html<String> {
    Html(pages::todo_form(
        None,
        &FormValues::default(),
        &ValidationError::default(),
    ))
}

async fn create_todo(
    State(state): State<AppState>,
    Form(form): Form<TodoForm>,
) -> Result<Response, TodoError> {
    match state.open()?.create(&form.new_todo()) {
        Ok(_) => Ok(redirect_home()),
        Err(TodoError::Validation(errors)) => {
            tracing::debug!(%errors, "rejected new todo");
            Ok(Html(pages::todo_form(None, &form.values(), &errors)).into_response())
        }
        Err(err) => Err(err),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, TodoError> {
    let todo = state.open()?.get(id)?;
    Ok(Html(pages::todo_form(
        Some(id),
        &FormValues::from(&todo),
        &ValidationError::default(),
    )))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<TodoForm>,
) -> Result<Response, TodoError> {
    match state.open()?.update(id, &form.changes()) {
        Ok(_) => Ok(redirect_home()),
        Err(TodoError::Validation(errors)) => {
            tracing::debug!(id, %errors, "rejected todo update");
            Ok(Html(pages::todo_form(Some(id), &form.values(), &errors)).into_response())
        }
        Err(err) => Err(err),
    }
}

async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, TodoError> {
    let todo = state.open()?.get(id)?;
    Ok(Html(pages::confirm_delete(&todo)))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, TodoError> {
    state.open()?.delete(id)?;
    Ok(redirect_home())
}

async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, TodoError> {
    state.open()?.toggle_resolved(id)?;
    Ok(redirect_home())
}

fn redirect_home() -> Response {
    (StatusCode::SEE_OTHER, [(header::LOCATION, "/")]).into_response()
}
