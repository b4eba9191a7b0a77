use std::path::PathBuf;

use serde_json::{json, Value};

use crate::config::{self, Settings};
use crate::model::batch::{Batch, DatasetKind};
use crate::services::{batches, pipeline, validate, voices};

mod command;
use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn path_field(payload: &Value, key: &str) -> Option<PathBuf> {
    str_field(payload, key).map(PathBuf::from)
}

fn kind_field(payload: &Value) -> Result<DatasetKind, String> {
    let raw = payload
        .get("kind")
        .cloned()
        .ok_or_else(|| "payload.kind is required".to_string())?;
    serde_json::from_value(raw)
        .map_err(|_| "payload.kind must be \"vocabulary\" or \"passages\"".to_string())
}

fn batch_from_payload(payload: &Value) -> Result<Batch, String> {
    if let Some(name) = str_field(payload, "batch") {
        return batches::embedded(name).map_err(|e| e.to_string());
    }
    if let Some(path) = path_field(payload, "batch_file") {
        return batches::from_file(&path).map_err(|e| e.to_string());
    }
    Err("payload.batch or payload.batch_file is required".to_string())
}

fn to_payload<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(json!({}))
}

/// Handles one request line against the datasets under `settings`.
pub fn handle(input: &str, settings: &Settings) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let payload = get_payload(&req);

    match Command::from(get_cmd(&req)) {
        Command::Ping => ok(
            id,
            json!({ "message": concat!("lessico-core ", env!("CARGO_PKG_VERSION"), " alive") }),
        ),

        Command::BatchesList => match batches::list() {
            Ok(list) => ok(id, json!({ "batches": list })),
            Err(e) => err(id, e.to_string()),
        },

        Command::DatasetAppend => {
            let batch = match batch_from_payload(payload) {
                Ok(b) => b,
                Err(e) => return err(id, e),
            };
            let path = settings.dataset_or(batch.kind(), path_field(payload, "dataset"));
            let opts = pipeline::AppendOptions {
                dry_run: payload.get("dry_run").and_then(|v| v.as_bool()).unwrap_or(false),
                ..Default::default()
            };

            match pipeline::append_batch(&path, &batch, &opts) {
                Ok(report) => ok(id, json!({ "report": report })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::DatasetCheck => {
            let kind = match kind_field(payload) {
                Ok(k) => k,
                Err(e) => return err(id, e),
            };
            let path = settings.dataset_or(kind, path_field(payload, "dataset"));

            match pipeline::check(kind, &path) {
                Ok(issues) => ok(
                    id,
                    json!({
                        "dataset": path,
                        "has_errors": validate::has_errors(&issues),
                        "issues": issues
                    }),
                ),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::DatasetStats => {
            let kinds: Vec<DatasetKind> = match payload.get("kind") {
                Some(_) => match kind_field(payload) {
                    Ok(k) => vec![k],
                    Err(e) => return err(id, e),
                },
                None => vec![DatasetKind::Vocabulary, DatasetKind::Passages],
            };

            let explicit = path_field(payload, "dataset").filter(|_| kinds.len() == 1);
            let mut out = Vec::with_capacity(kinds.len());
            for kind in kinds {
                match pipeline::stats(kind, &settings.dataset_or(kind, explicit.clone())) {
                    Ok(summary) => out.push(to_payload(&summary)),
                    Err(e) => return err(id, e.to_string()),
                }
            }
            ok(id, json!({ "datasets": out }))
        }

        Command::VoicesConvert => {
            let wanted: Vec<String> = payload
                .get("voices")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            let opts = config::voice_options(
                str_field(payload, "url").map(str::to_string),
                path_field(payload, "cache"),
                path_field(payload, "output"),
                wanted,
                str_field(payload, "sha256").map(str::to_string),
            );

            match voices::convert(&opts) {
                Ok(report) => ok(id, json!({ "report": report })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::Unknown => err(id, "unknown command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(settings: &Settings, req: Value) -> Value {
        serde_json::from_str(&handle(&req.to_string(), settings)).unwrap()
    }

    #[test]
    fn ping_echoes_the_request_id() {
        let s = Settings::with_data_dir("/nonexistent");
        let resp = call(&s, json!({ "id": 7, "cmd": "ping" }));
        assert_eq!(resp["id"], json!(7));
        assert_eq!(resp["status"], json!("ok"));
    }

    #[test]
    fn bad_json_and_unknown_commands_are_errors() {
        let s = Settings::with_data_dir("/nonexistent");
        let resp: Value = serde_json::from_str(&handle("{not json", &s)).unwrap();
        assert_eq!(resp["message"], json!("invalid json"));

        let resp = call(&s, json!({ "id": "a", "cmd": "translate_entries" }));
        assert_eq!(resp["status"], json!("error"));
        assert_eq!(resp["message"], json!("unknown command"));
    }

    #[test]
    fn batches_are_listed() {
        let s = Settings::with_data_dir("/nonexistent");
        let resp = call(&s, json!({ "id": 1, "cmd": "batches.list" }));
        let names: Vec<&str> = resp["payload"]["batches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"a2-topics"));
        assert!(names.contains(&"reading-practical"));
    }

    #[test]
    fn append_dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let words = dir.path().join("sample_words.json");
        std::fs::write(&words, r#"[{"id":"1","italian":"ciao"}]"#).unwrap();
        let s = Settings::with_data_dir(dir.path());

        let resp = call(
            &s,
            json!({
                "id": 2,
                "cmd": "dataset.append",
                "payload": { "batch": "a1-basics", "dry_run": true }
            }),
        );

        assert_eq!(resp["status"], json!("ok"), "{resp}");
        assert_eq!(resp["payload"]["report"]["before"], json!(1));
        assert_eq!(resp["payload"]["report"]["first_new_id"], json!("2"));
        assert_eq!(
            std::fs::read_to_string(&words).unwrap(),
            r#"[{"id":"1","italian":"ciao"}]"#
        );
    }

    #[test]
    fn append_to_missing_dataset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::with_data_dir(dir.path());

        let resp = call(
            &s,
            json!({ "id": 3, "cmd": "dataset.append", "payload": { "batch": "a1-basics" } }),
        );

        assert_eq!(resp["status"], json!("error"));
        assert!(!dir.path().join("sample_words.json").exists());
    }

    #[test]
    fn check_requires_a_known_kind() {
        let s = Settings::with_data_dir("/nonexistent");
        let resp = call(
            &s,
            json!({ "id": 4, "cmd": "dataset.check", "payload": { "kind": "songs" } }),
        );
        assert_eq!(resp["status"], json!("error"));
    }
}
