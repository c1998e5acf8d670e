use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::{CoreError, Result};
use crate::model::config::AppConfig;
use crate::model::entry::TextEntry;
use crate::services::backend::{FallbackTranslator, MockMode, MockTranslator, Translator};
use crate::services::collect::{self, LocaleLayout};
use crate::services::session::TranslationSession;
use crate::services::translation_memory::TranslationMemory;
use crate::services::{archive, config, filter, pipeline, qa, tokenizer};

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

fn str_field<'a>(payload: &'a Value, name: &str) -> &'a str {
    payload.get(name).and_then(|v| v.as_str()).unwrap_or("")
}

fn required_str<'a>(payload: &'a Value, name: &str) -> Result<&'a str> {
    let v = str_field(payload, name);
    if v.trim().is_empty() {
        return Err(CoreError::InvalidRequest(format!("payload.{name} is required")));
    }
    Ok(v)
}

fn required_path(payload: &Value, name: &str) -> Result<PathBuf> {
    required_str(payload, name).map(PathBuf::from)
}

fn bool_field(payload: &Value, name: &str, default: bool) -> bool {
    payload.get(name).and_then(|v| v.as_bool()).unwrap_or(default)
}

/// `payload.config` when given, else the persisted config. Language
/// fields in the payload override both.
fn request_config(payload: &Value) -> Result<AppConfig> {
    let mut cfg = match payload.get("config") {
        Some(v) if v.is_object() => serde_json::from_value::<AppConfig>(v.clone())
            .map_err(|e| CoreError::InvalidRequest(format!("invalid payload.config: {e}")))?,
        _ => config::load_config(&config::config_path()),
    };

    let source_lang = str_field(payload, "source_lang");
    if !source_lang.is_empty() {
        cfg.source_lang = source_lang.to_string();
    }
    let target_lang = str_field(payload, "target_lang");
    if !target_lang.is_empty() {
        cfg.target_lang = target_lang.to_string();
    }

    Ok(cfg)
}

fn mods_path(payload: &Value, cfg: &AppConfig) -> PathBuf {
    match str_field(payload, "mods_path") {
        "" => config::mods_dir(cfg),
        p => PathBuf::from(p),
    }
}

fn parse_entries_from_payload(payload: &Value) -> Result<Vec<TextEntry>> {
    let arr = payload
        .get("entries")
        .and_then(|v| v.as_array())
        .ok_or_else(|| CoreError::InvalidRequest("payload.entries must be an array".to_string()))?;

    let mut entries: Vec<TextEntry> = Vec::with_capacity(arr.len());

    for (i, v) in arr.iter().cloned().enumerate() {
        match serde_json::from_value::<TextEntry>(v) {
            Ok(e) => entries.push(e),
            Err(e) => {
                return Err(CoreError::InvalidRequest(format!("invalid entry at index {i}: {e}")))
            }
        }
    }

    Ok(entries)
}

/// `payload.backend`: `online` (default) or `mock`, an offline echo that
/// prefixes the target language.
fn make_translator(payload: &Value, cfg: &AppConfig) -> Result<Box<dyn Translator>> {
    match str_field(payload, "backend") {
        "" | "online" => Ok(Box::new(FallbackTranslator::online()?)),
        "mock" => Ok(Box::new(MockTranslator::new(MockMode::Prefix(format!(
            "{}: ",
            cfg.target_lang
        ))))),
        other => Err(CoreError::InvalidRequest(format!("unknown backend `{other}`"))),
    }
}

fn open_memory(payload: &Value, cfg: &AppConfig) -> TranslationMemory {
    let dir = mods_path(payload, cfg);
    if bool_field(payload, "use_memory", true) && dir.is_dir() {
        TranslationMemory::open(&dir, &cfg.source_lang, &cfg.target_lang)
    } else {
        TranslationMemory::ephemeral(&cfg.source_lang, &cfg.target_lang)
    }
}

pub fn handle(input: &str) -> String {
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
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);

    match dispatch(Command::from(cmd_str), payload) {
        Ok(v) => ok(id, v),
        Err(e) => {
            tracing::debug!("{cmd_str} failed: {e}");
            err(id, e.to_string())
        }
    }
}

fn dispatch(cmd: Command, payload: &Value) -> Result<Value> {
    match cmd {
        Command::Ping => Ok(json!({ "message": "lingopak-core alive" })),

        Command::ConfigLoad => {
            let path = match str_field(payload, "path") {
                "" => config::config_path(),
                p => PathBuf::from(p),
            };
            let cfg = config::load_config(&path);
            Ok(json!({ "config": cfg, "path": path }))
        }

        Command::ConfigSave => {
            let cfg_val = payload.get("config").cloned().unwrap_or(Value::Null);
            if cfg_val.is_null() {
                return Err(CoreError::InvalidRequest("payload.config is required".to_string()));
            }
            let cfg: AppConfig = serde_json::from_value(cfg_val)
                .map_err(|e| CoreError::InvalidRequest(format!("invalid payload.config: {e}")))?;
            let path = match str_field(payload, "path") {
                "" => config::config_path(),
                p => PathBuf::from(p),
            };
            config::save_config(&path, &cfg)?;
            Ok(json!({ "config": cfg, "path": path }))
        }

        Command::TextTokenize => {
            let text = str_field(payload, "text");
            Ok(json!({
                "segments": tokenizer::tokenize(text),
                "has_markup": tokenizer::has_markup(text),
            }))
        }

        Command::TextCheck => {
            let text = str_field(payload, "text");
            Ok(json!({
                "eligible": filter::is_eligible(text),
                "reason": filter::skip_reason(text),
                "is_translation_key": filter::is_translation_key(text),
                "collect": filter::should_collect(text),
            }))
        }

        Command::StringsCollect => {
            let root = required_path(payload, "path")?;
            if !root.is_dir() {
                return Err(CoreError::MissingPath(root));
            }
            let cfg = request_config(payload)?;
            let mut entries = collect::collect(&root, &LocaleLayout::from_config(&cfg));
            let from_memory = open_memory(payload, &cfg).prefill(&mut entries);
            Ok(json!({
                "entries": entries,
                "count": entries.len(),
                "from_memory": from_memory,
            }))
        }

        Command::StringsSave => {
            let root = required_path(payload, "path")?;
            let cfg = request_config(payload)?;
            let entries = parse_entries_from_payload(payload)?;
            let mut memory = open_memory(payload, &cfg);
            let report = pipeline::save_translations(&root, &entries, &mut memory, &cfg)?;
            Ok(json!({ "report": report }))
        }

        Command::TranslateText => {
            let text = str_field(payload, "text");
            let cfg = request_config(payload)?;
            let translator = make_translator(payload, &cfg)?;
            let mut memory = open_memory(payload, &cfg);

            let mut session =
                TranslationSession::new(translator.as_ref(), &cfg.source_lang, &cfg.target_lang);
            let outcome = session.auto_translate(text, &mut memory);
            memory.save_best_effort();

            Ok(json!({
                "text": outcome.text,
                "error": outcome.error.map(|e| e.to_string()),
            }))
        }

        Command::TranslateEntries => {
            let cfg = request_config(payload)?;
            let mut entries = parse_entries_from_payload(payload)?;
            let translator = make_translator(payload, &cfg)?;
            let mut memory = open_memory(payload, &cfg);

            let mut session =
                TranslationSession::new(translator.as_ref(), &cfg.source_lang, &cfg.target_lang)
                    .with_pacing(Duration::from_millis(cfg.pacing_ms));
            let report = pipeline::translate_pending(&mut entries, &mut session, &mut memory, |p| {
                tracing::debug!("translate: {}/{}", p.done, p.total);
            });
            memory.save_best_effort();

            Ok(json!({ "entries": entries, "report": report }))
        }

        Command::RunQa => {
            let entries = parse_entries_from_payload(payload)?;
            Ok(json!({ "issues": qa::run(&entries) }))
        }

        Command::ModsScan => {
            let cfg = request_config(payload)?;
            let mods = archive::scan_mods(&mods_path(payload, &cfg))?;
            Ok(json!({ "mods": mods }))
        }

        Command::ModsExtract => {
            let archive_path = required_path(payload, "archive")?;
            let cfg = request_config(payload)?;
            let path = archive::extract_mod(&archive_path, &mods_path(payload, &cfg), str_field(payload, "name"))?;
            Ok(json!({ "path": path }))
        }

        Command::ModsListExtracted => {
            let cfg = request_config(payload)?;
            let mods = archive::list_extracted(&mods_path(payload, &cfg))?;
            Ok(json!({ "mods": mods }))
        }

        Command::ModsPack => {
            let dir = required_path(payload, "path")?;
            let cfg = request_config(payload)?;

            let output = match (str_field(payload, "output"), str_field(payload, "archive")) {
                ("", "") => {
                    return Err(CoreError::InvalidRequest(
                        "payload.output or payload.archive is required".to_string(),
                    ))
                }
                ("", original) => pipeline::pack_translated(&dir, Path::new(original), &cfg)?,
                (output, _) => {
                    let output = PathBuf::from(output);
                    let backup = bool_field(payload, "backup", cfg.backup_before_pack);
                    archive::pack_mod(&dir, &output, backup)?;
                    output
                }
            };
            Ok(json!({ "output": output }))
        }

        Command::BatchTranslate => {
            let cfg = request_config(payload)?;
            let translator = make_translator(payload, &cfg)?;
            let cancel = AtomicBool::new(false);

            let report = pipeline::batch_translate(
                &mods_path(payload, &cfg),
                &cfg,
                translator.as_ref(),
                &cancel,
                |p| tracing::info!("batch: {}/{} {}", p.done, p.total, p.current),
            )?;
            Ok(json!({ "report": report }))
        }

        Command::Unknown => Err(CoreError::InvalidRequest("unknown command".to_string())),
    }
}
