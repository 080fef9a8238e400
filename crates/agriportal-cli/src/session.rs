//! Line-oriented admin editing session.
//!
//! Each line is one command. Mutations go to the in-memory store and are
//! recorded in the history so they can be undone and redone.

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Value, json};

use agriportal_core::{ActionKind, History, HistoryController, MemoryStore};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Create { resource: String, row: Value },
    Update { resource: String, id: String, patch: Value },
    Delete { resource: String, id: String },
    Restore { resource: String, row: Value },
    Undo,
    Redo,
    Clear,
    History,
    Show { resource: String },
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = split_word(line);
    let command = match verb {
        "create" | "restore" => {
            let (resource, json) = split_word(rest);
            let resource = required(resource, "resource")?;
            let row = parse_json(json)?;
            if verb == "create" {
                SessionCommand::Create { resource, row }
            } else {
                SessionCommand::Restore { resource, row }
            }
        }
        "update" => {
            let (resource, rest) = split_word(rest);
            let (id, json) = split_word(rest);
            SessionCommand::Update {
                resource: required(resource, "resource")?,
                id: required(id, "id")?,
                patch: parse_json(json)?,
            }
        }
        "delete" => {
            let (resource, id) = split_word(rest);
            SessionCommand::Delete {
                resource: required(resource, "resource")?,
                id: required(id, "id")?,
            }
        }
        "show" => SessionCommand::Show {
            resource: required(rest, "resource")?,
        },
        "undo" | "u" => SessionCommand::Undo,
        "redo" => SessionCommand::Redo,
        "clear" => SessionCommand::Clear,
        "history" => SessionCommand::History,
        other => bail!("Unknown command: {other}"),
    };
    Ok(Some(command))
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

fn required(word: &str, what: &str) -> Result<String> {
    let word = word.trim();
    if word.is_empty() {
        bail!("Missing {what}");
    }
    Ok(word.to_string())
}

fn parse_json(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        bail!("Missing JSON object");
    }
    serde_json::from_str(text).context("Invalid JSON")
}

/// Result of one command: a status line for humans and data for `--json`.
#[derive(Debug)]
pub struct Outcome {
    pub message: String,
    pub data: Value,
}

impl Outcome {
    fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

pub struct Session {
    controller: HistoryController<MemoryStore>,
}

impl Session {
    pub fn new(store: MemoryStore, max_entries: Option<usize>) -> Self {
        let mut history = History::new();
        history.set_capacity(max_entries);
        Self {
            controller: HistoryController::with_history(history, store),
        }
    }

    pub fn controller(&self) -> &HistoryController<MemoryStore> {
        &self.controller
    }

    pub async fn execute(&mut self, command: SessionCommand) -> Result<Outcome> {
        let outcome = match command {
            SessionCommand::Create { resource, row } => {
                let change = self.controller.handler().create(&resource, row).await?;
                let label = format!("Create {resource}/{}", change.id);
                self.controller
                    .record(change.to_new_action(ActionKind::Create, &resource, &label));
                Outcome::new(label, change.after.unwrap_or(Value::Null))
            }
            SessionCommand::Update { resource, id, patch } => {
                let change = self
                    .controller
                    .handler()
                    .update(&resource, &id, patch)
                    .await?;
                let label = format!("Update {resource}/{id}");
                self.controller
                    .record(change.to_new_action(ActionKind::Update, &resource, &label));
                Outcome::new(label, change.after.unwrap_or(Value::Null))
            }
            SessionCommand::Delete { resource, id } => {
                let change = self.controller.handler().delete(&resource, &id).await?;
                let label = format!("Delete {resource}/{id}");
                self.controller
                    .record(change.to_new_action(ActionKind::Delete, &resource, &label));
                Outcome::new(label, change.before.unwrap_or(Value::Null))
            }
            SessionCommand::Restore { resource, row } => {
                let change = self.controller.handler().restore(&resource, row).await?;
                let label = format!("Restore {resource}/{}", change.id);
                self.controller
                    .record(change.to_new_action(ActionKind::Restore, &resource, &label));
                Outcome::new(label, change.after.unwrap_or(Value::Null))
            }
            SessionCommand::Undo => match self.controller.undo().await? {
                Some(action) => Outcome::new(format!("Undo: {}", action.label), json!(action)),
                None => Outcome::new("Nothing to undo", Value::Null),
            },
            SessionCommand::Redo => match self.controller.redo().await? {
                Some(action) => Outcome::new(format!("Redo: {}", action.label), json!(action)),
                None => Outcome::new("Nothing to redo", Value::Null),
            },
            SessionCommand::Clear => {
                self.controller.clear();
                Outcome::new("History cleared", Value::Null)
            }
            SessionCommand::History => self.history_outcome(),
            SessionCommand::Show { resource } => {
                let rows = self.controller.handler().list(&resource).await;
                let message = if rows.is_empty() {
                    format!("No rows in {resource}")
                } else {
                    rows.iter()
                        .map(|r| r.to_string())
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                Outcome::new(message, Value::Array(rows))
            }
        };
        Ok(outcome)
    }

    fn history_outcome(&self) -> Outcome {
        let history = self.controller.history();
        if history.is_empty() {
            return Outcome::new(
                "History is empty",
                json!({ "cursor": null, "entries": [] }),
            );
        }

        let cursor = history.cursor();
        let lines: Vec<String> = history
            .entries()
            .iter()
            .enumerate()
            .map(|(i, action)| {
                let marker = if Some(i) == cursor { ">" } else { " " };
                let state = if cursor.is_some_and(|c| i <= c) {
                    "applied"
                } else {
                    "undone"
                };
                format!(
                    "{marker} {i:>3}  {kind:<7}  {state:<7}  {time}  {label}",
                    kind = action.kind.as_str(),
                    time = action.created_at.format("%H:%M:%S"),
                    label = action.label,
                )
            })
            .collect();

        Outcome::new(
            lines.join("\n"),
            json!({ "cursor": cursor, "entries": history.entries() }),
        )
    }
}

/// Load a seed file of `{ "<resource>": [rows...] }`.
pub async fn load_seed(path: &std::path::Path) -> Result<MemoryStore> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read seed file {}", path.display()))?;
    let seed: Value = serde_json::from_str(&contents).context("Seed file is not valid JSON")?;
    MemoryStore::from_seed(seed)
        .await
        .map_err(|e| anyhow!("Invalid seed file: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mutations() {
        assert_eq!(
            parse_line(r#"create companies {"name": "Green Acres"}"#).unwrap(),
            Some(SessionCommand::Create {
                resource: "companies".into(),
                row: json!({ "name": "Green Acres" }),
            })
        );
        assert_eq!(
            parse_line(r#"update articles a1 {"draft": false}"#).unwrap(),
            Some(SessionCommand::Update {
                resource: "articles".into(),
                id: "a1".into(),
                patch: json!({ "draft": false }),
            })
        );
        assert_eq!(
            parse_line("  delete   listings l7 ").unwrap(),
            Some(SessionCommand::Delete {
                resource: "listings".into(),
                id: "l7".into(),
            })
        );
    }

    #[test]
    fn test_parse_skips_blank_and_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   # seed articles").unwrap(), None);
    }

    #[test]
    fn test_parse_undo_shorthand() {
        assert_eq!(parse_line("u").unwrap(), Some(SessionCommand::Undo));
        assert_eq!(parse_line("undo").unwrap(), Some(SessionCommand::Undo));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("launch rockets").is_err());
        assert!(parse_line("create companies").is_err());
        assert!(parse_line("create companies {not json}").is_err());
        assert!(parse_line("delete listings").is_err());
        assert!(parse_line("show").is_err());
    }

    #[tokio::test]
    async fn test_session_undo_redo() {
        let mut session = Session::new(MemoryStore::new(), None);
        for line in [
            r#"create courses {"id": "k1", "title": "Soil health"}"#,
            r#"update courses k1 {"title": "Soil health 101"}"#,
            "undo",
        ] {
            let cmd = parse_line(line).unwrap().unwrap();
            session.execute(cmd).await.unwrap();
        }

        let row = session.controller().handler().get("courses", "k1").await.unwrap();
        assert_eq!(row["title"], "Soil health");

        let out = session.execute(SessionCommand::Redo).await.unwrap();
        assert_eq!(out.message, "Redo: Update courses/k1");
        let row = session.controller().handler().get("courses", "k1").await.unwrap();
        assert_eq!(row["title"], "Soil health 101");

        let out = session.execute(SessionCommand::Redo).await.unwrap();
        assert_eq!(out.message, "Nothing to redo");
    }

    #[tokio::test]
    async fn test_history_listing_marks_cursor() {
        let mut session = Session::new(MemoryStore::new(), Some(10));
        session
            .execute(parse_line(r#"create forum {"id": "t1"}"#).unwrap().unwrap())
            .await
            .unwrap();
        session
            .execute(parse_line("delete forum t1").unwrap().unwrap())
            .await
            .unwrap();
        session.execute(SessionCommand::Undo).await.unwrap();

        let out = session.execute(SessionCommand::History).await.unwrap();
        assert_eq!(out.data["cursor"], 0);
        assert_eq!(out.data["entries"].as_array().unwrap().len(), 2);
        let lines: Vec<&str> = out.message.lines().collect();
        assert!(lines[0].starts_with('>'));
        assert!(lines[1].contains("undone"));
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_recorded() {
        let mut session = Session::new(MemoryStore::new(), None);
        let result = session
            .execute(SessionCommand::Delete {
                resource: "listings".into(),
                id: "missing".into(),
            })
            .await;
        assert!(result.is_err());
        assert!(!session.controller().can_undo());
    }
}
