use chrono::{NaiveDate, Utc};

use crate::error::ValidationError;
use crate::models::{Todo, DATE_FORMAT};

const STYLE: &str = r#"
    body { margin: 0; padding: 32px; background: #f4f5f7; font-family: system-ui, sans-serif; }
    .app { max-width: 720px; margin: 0 auto; padding: 28px; background: #fff; border-radius: 16px; }
    h1 { margin: 0 0 16px; font-size: 28px; }
    .subtitle, .time { color: #64748b; }
    .time { font-size: 12px; }
    .overdue, .field-error { color: #b91c1c; font-weight: 600; }
    .todo-form { display: grid; gap: 12px; margin-bottom: 24px; }
    .todo-form input, .todo-form textarea { padding: 10px; border: 1px solid #e2e8f0; border-radius: 8px; }
    button, .button { padding: 8px 12px; border: none; border-radius: 8px; background: #e2e8f0; color: #0f172a; text-decoration: none; cursor: pointer; }
    button.delete { background: #fee2e2; color: #991b1b; }
    .todo-list { display: grid; gap: 12px; }
    .todo { display: flex; justify-content: space-between; align-items: center; padding: 12px 16px; border: 1px solid #e2e8f0; border-radius: 12px; }
    .meta { display: grid; gap: 4px; }
    .title { font-weight: 600; color: inherit; }
    .actions { display: flex; gap: 8px; align-items: center; }
    .status { padding: 4px 8px; border-radius: 999px; background: #e2e8f0; font-size: 12px; text-transform: uppercase; }
    .status.done { background: #dcfce7; color: #166534; }
"#;

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="de">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <style>{STYLE}</style>
</head>
<body>
  <div class="app">
{content}
  </div>
</body>
</html>"#,
        title = html_escape(title),
    )
}

pub fn todo_list(todos: &[Todo]) -> String {
    todo_list_at(todos, Utc::now().date_naive())
}

fn todo_list_at(todos: &[Todo], today: NaiveDate) -> String {
    let mut body = String::new();
    body.push_str(
        r#"    <h1>todos</h1>
    <div class="subtitle">Offene Aufgaben zuerst, dann nach Fälligkeit.</div>
    <p><a class="button" href="/todo/create/">Neues Todo</a></p>
    <div class="todo-list">
"#,
    );

    if todos.is_empty() {
        body.push_str("<div class=\"subtitle\">Noch keine Todos. Leg los!</div>");
    }
    for todo in todos {
        let (status_class, status_label) = status(todo);
        let toggle_label = if todo.is_resolved { "Wieder öffnen" } else { "Done" };
        body.push_str(&format!(
            r#"<div class="todo">
  <div class="meta">
    <a class="title" href="/todo/{id}/">{title}</a>
    {due}
  </div>
  <div class="actions">
    <span class="{status_class}">{status_label}</span>
    <form method="post" action="/todo/{id}/toggle/">
      <button type="submit">{toggle_label}</button>
    </form>
    <a class="button" href="/todo/{id}/edit/">Bearbeiten</a>
    <a class="button" href="/todo/{id}/delete/">Löschen</a>
  </div>
</div>
"#,
            id = todo.id,
            title = html_escape(&todo.title),
            due = due_line(todo, today),
        ));
    }

    body.push_str("    </div>");
    layout("todos", &body)
}

pub fn todo_detail(todo: &Todo) -> String {
    let (status_class, status_label) = status(todo);
    let due = todo
        .due_date
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| "keine".to_string());
    let body = format!(
        r#"    <h1>{title}</h1>
    <p><span class="{status_class}">{status_label}</span></p>
    <p>{description}</p>
    <div class="subtitle">
      Fällig: {due}<br />
      Erstellt am {created}<br />
      Geändert am {updated}
    </div>
    <div class="actions">
      <a class="button" href="/todo/{id}/edit/">Bearbeiten</a>
      <a class="button" href="/todo/{id}/delete/">Löschen</a>
      <a class="button" href="/">Zurück</a>
    </div>"#,
        id = todo.id,
        title = html_escape(&todo.title),
        description = html_escape(&todo.description),
        created = todo.created_at.format("%d.%m.%Y %H:%M"),
        updated = todo.updated_at.format("%d.%m.%Y %H:%M"),
    );
    layout(&todo.title, &body)
}

/// Values shown in the create/edit form, echoed back on validation errors.
#[derive(Debug, Default, Clone)]
pub struct FormValues {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub is_resolved: bool,
}

impl From<&Todo> for FormValues {
    fn from(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            description: todo.description.clone(),
            due_date: todo
                .due_date
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            is_resolved: todo.is_resolved,
        }
    }
}

/// `editing` is the id of the todo being edited; `None` renders the create form.
pub fn todo_form(editing: Option<i64>, values: &FormValues, errors: &ValidationError) -> String {
    let (heading, action) = match editing {
        Some(id) => ("Todo bearbeiten".to_string(), format!("/todo/{id}/edit/")),
        None => ("Neues Todo".to_string(), "/todo/create/".to_string()),
    };
    let resolved_field = if editing.is_some() {
        format!(
            r#"<label><input type="checkbox" name="is_resolved" value="on"{checked} /> Erledigt</label>"#,
            checked = if values.is_resolved { " checked" } else { "" },
        )
    } else {
        String::new()
    };
    let body = format!(
        r#"    <h1>{heading}</h1>
    <form class="todo-form" method="post" action="{action}">
      <input type="text" name="title" placeholder="Titel" maxlength="255" value="{title}" required />
      {title_error}
      <textarea name="description" placeholder="Beschreibung" rows="4">{description}</textarea>
      <input type="date" name="due_date" value="{due_date}" />
      {due_date_error}
      {resolved_field}
      <button type="submit">Speichern</button>
    </form>
    <a href="/">Abbrechen</a>"#,
        title = html_escape(&values.title),
        description = html_escape(&values.description),
        due_date = html_escape(&values.due_date),
        title_error = field_error(errors, "title"),
        due_date_error = field_error(errors, "due_date"),
    );
    layout(&heading, &body)
}

pub fn confirm_delete(todo: &Todo) -> String {
    let body = format!(
        r#"    <h1>Todo löschen?</h1>
    <div class="subtitle">"{title}" wird endgültig gelöscht.</div>
    <div class="actions">
      <form method="post" action="/todo/{id}/delete/">
        <button class="delete" type="submit">Löschen</button>
      </form>
      <a class="button" href="/">Abbrechen</a>
    </div>"#,
        id = todo.id,
        title = html_escape(&todo.title),
    );
    layout("Todo löschen", &body)
}

pub fn not_found(id: i64) -> String {
    message("Nicht gefunden", &format!("Todo {id} existiert nicht."))
}

pub fn message(heading: &str, text: &str) -> String {
    let body = format!(
        r#"    <h1>{heading}</h1>
    <div class="subtitle">{text}</div>
    <a href="/">Zurück zur Übersicht</a>"#,
        heading = html_escape(heading),
        text = html_escape(text),
    );
    layout(heading, &body)
}

fn status(todo: &Todo) -> (&'static str, &'static str) {
    if todo.is_resolved {
        ("status done", "Erledigt")
    } else {
        ("status", "Offen")
    }
}

fn due_line(todo: &Todo, today: NaiveDate) -> String {
    match todo.due_date {
        Some(date) if todo.is_overdue(today) => format!(
            r#"<div class="time overdue">Überfällig seit {}</div>"#,
            date.format("%d.%m.%Y")
        ),
        Some(date) => format!(
            r#"<div class="time">Fällig am {}</div>"#,
            date.format("%d.%m.%Y")
        ),
        None => String::new(),
    }
}

fn field_error(errors: &ValidationError, field: &str) -> String {
    errors
        .get(field)
        .map(|message| format!(r#"<div class="field-error">{}</div>"#, html_escape(message)))
        .unwrap_or_default()
}

fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
