use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::model::config::AppConfig;
use crate::model::entry::TextEntry;
use crate::services::archive;
use crate::services::backend::Translator;
use crate::services::collect::{self, LocaleLayout};
use crate::services::rebuild::{self, WriteOptions, WriteReport};
use crate::services::session::TranslationSession;
use crate::services::translation_memory::TranslationMemory;

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// Entry source or package name being worked on.
    pub current: String,
}

#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub translated: usize,
    pub failed: usize,
    /// Entries stored with some segments left untranslated.
    pub partial: usize,
    /// Entries answered by the translation memory.
    pub from_memory: usize,
    /// Entries that already had a translation.
    pub skipped: usize,
    pub last_error: Option<String>,
}

/// Fills every entry that has no translation yet. Entries where only some
/// segments failed keep the partial text; total failures leave the entry
/// empty. The run itself never stops early.
pub fn translate_pending<F>(
    entries: &mut [TextEntry],
    session: &mut TranslationSession,
    memory: &mut TranslationMemory,
    mut progress: F,
) -> RunReport
where
    F: FnMut(&Progress),
{
    let mut report = RunReport::default();
    let total = entries.len();

    for (i, e) in entries.iter_mut().enumerate() {
        progress(&Progress {
            done: i,
            total,
            current: e.source.clone(),
        });

        if e.is_translated() {
            report.skipped += 1;
            continue;
        }
        if e.source.trim().is_empty() {
            continue;
        }

        let remembered = memory.lookup(e.source.trim()).is_some();
        let outcome = session.auto_translate(&e.source, memory);

        match (outcome.text, outcome.error) {
            (Some(text), Some(err)) if !text.trim().is_empty() => {
                tracing::debug!("partial translation for {}:{}: {err}", e.file_rel, e.key);
                report.last_error = Some(err.to_string());
                e.translated = Some(text);
                report.partial += 1;
            }
            (_, Some(err)) => {
                tracing::debug!("translation failed for {}:{}: {err}", e.file_rel, e.key);
                report.last_error = Some(err.to_string());
                report.failed += 1;
            }
            (Some(text), None) if !text.trim().is_empty() => {
                e.translated = Some(text);
                report.translated += 1;
                if remembered {
                    report.from_memory += 1;
                }
            }
            _ => report.failed += 1,
        }
    }

    progress(&Progress {
        done: total,
        total,
        current: String::new(),
    });

    report
}

/// Records translations in memory, saves it, and writes them into the tree.
pub fn save_translations(
    root: &Path,
    entries: &[TextEntry],
    memory: &mut TranslationMemory,
    cfg: &AppConfig,
) -> Result<WriteReport> {
    memory.absorb(entries);
    memory.save_best_effort();

    rebuild::write_back(
        root,
        entries,
        &LocaleLayout::from_config(cfg),
        WriteOptions::from_config(cfg),
    )
}

/// Packs a translated tree next to its original archive and optionally
/// removes the tree. Returns the written archive.
pub fn pack_translated(extracted: &Path, original: &Path, cfg: &AppConfig) -> Result<PathBuf> {
    let output = archive::output_path_for(original, &cfg.output_suffix);
    archive::pack_mod(extracted, &output, cfg.backup_before_pack)?;

    if cfg.cleanup_after_pack {
        if let Err(e) = fs::remove_dir_all(extracted) {
            tracing::warn!("could not remove {}: {e}", extracted.display());
        }
    }

    Ok(output)
}

#[derive(Debug, Serialize)]
pub struct PackageOutcome {
    pub name: String,
    pub output: Option<PathBuf>,
    pub report: Option<RunReport>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub ok: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub packages: Vec<PackageOutcome>,
}

/// Extract, translate, write back and repack every archive in the mods
/// folder. Archives already carrying the output suffix are skipped.
/// `cancel` is checked between packages.
pub fn batch_translate<F>(
    mods_path: &Path,
    cfg: &AppConfig,
    translator: &dyn Translator,
    cancel: &AtomicBool,
    mut progress: F,
) -> Result<BatchReport>
where
    F: FnMut(&Progress),
{
    let mods: Vec<_> = archive::scan_mods(mods_path)?
        .into_iter()
        .filter(|m| !is_own_output(&m.path, &cfg.output_suffix))
        .collect();

    let total = mods.len();
    let mut report = BatchReport::default();

    for (i, m) in mods.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            tracing::info!("batch cancelled after {i} of {total} packages");
            report.cancelled = true;
            break;
        }

        progress(&Progress {
            done: i,
            total,
            current: m.name.clone(),
        });

        match translate_package(&m.path, &m.name, mods_path, cfg, translator) {
            Ok((output, run)) => {
                report.ok += 1;
                report.packages.push(PackageOutcome {
                    name: m.name.clone(),
                    output: Some(output),
                    report: Some(run),
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!("batch: {} failed: {e}", m.name);
                report.failed += 1;
                report.packages.push(PackageOutcome {
                    name: m.name.clone(),
                    output: None,
                    report: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if !report.cancelled {
        progress(&Progress {
            done: total,
            total,
            current: String::new(),
        });
    }

    Ok(report)
}

fn translate_package(
    archive_path: &Path,
    name: &str,
    mods_path: &Path,
    cfg: &AppConfig,
    translator: &dyn Translator,
) -> Result<(PathBuf, RunReport)> {
    let extracted = archive::extract_mod(archive_path, mods_path, name)?;
    let mut entries = collect::collect(&extracted, &LocaleLayout::from_config(cfg));

    let mut memory = TranslationMemory::open(mods_path, &cfg.source_lang, &cfg.target_lang);
    let hits = memory.prefill(&mut entries);
    tracing::debug!("{name}: {} entries, {hits} from memory", entries.len());

    let mut session = TranslationSession::new(translator, &cfg.source_lang, &cfg.target_lang)
        .with_pacing(Duration::from_millis(cfg.pacing_ms));
    let run = translate_pending(&mut entries, &mut session, &mut memory, |_| {});

    let written = save_translations(&extracted, &entries, &mut memory, cfg)?;
    if !written.failed.is_empty() {
        tracing::warn!("{name}: {} files could not be written", written.failed.len());
    }

    let output = pack_translated(&extracted, archive_path, cfg)?;
    Ok((output, run))
}

fn is_own_output(path: &Path, suffix: &str) -> bool {
    !suffix.is_empty()
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.ends_with(suffix))
}
