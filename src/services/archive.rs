//! Mod archives in the mods folder: listing, extraction into
//! `<mods>/.extracted/<name>/` and repacking.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{CoreError, Result};
use crate::services::atomic::tmp_path;
use crate::services::collect::rel_path;

pub const EXTRACTED_DIR: &str = ".extracted";
pub const BACKUP_DIR: &str = "backups";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Jar,
    Zip,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModArchive {
    pub path: PathBuf,
    /// Manifest `Name` when the archive has one, else the file stem.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ArchiveKind,
    pub manifest: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedMod {
    pub path: PathBuf,
    pub name: String,
}

/// Keeps letters, digits, `.`, `_` and `-` (Unicode letters included),
/// replacing everything else with `_`.
pub fn safe_mod_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn extracted_root(mods_path: &Path) -> PathBuf {
    mods_path.join(EXTRACTED_DIR)
}

/// `.jar`/`.zip` files directly in the mods folder, by file name. Names
/// starting with `.` or `_` are skipped.
pub fn scan_mods(mods_path: &Path) -> Result<Vec<ModArchive>> {
    if !mods_path.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(mods_path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut out = Vec::new();
    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if file_name.starts_with('.') || file_name.starts_with('_') {
            continue;
        }

        let kind = match archive_kind(&path) {
            Some(k) => k,
            None => continue,
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let manifest = read_manifest(&path);
        let name = manifest
            .as_ref()
            .and_then(|m| m.get("Name").or_else(|| m.get("name")))
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(stem);

        out.push(ModArchive {
            path,
            name,
            kind,
            manifest,
        });
    }

    Ok(out)
}

fn archive_kind(path: &Path) -> Option<ArchiveKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jar" => Some(ArchiveKind::Jar),
        "zip" => Some(ArchiveKind::Zip),
        _ => None,
    }
}

/// First entry named `manifest.json` (at any depth), parsed. Unreadable
/// archives or manifests yield `None`.
fn read_manifest(path: &Path) -> Option<Value> {
    let file = File::open(path).ok()?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| tracing::debug!("cannot open {}: {e}", path.display()))
        .ok()?;

    let name = archive
        .file_names()
        .find(|n| n.ends_with("manifest.json"))?
        .to_string();

    let mut entry = archive.by_name(&name).ok()?;
    let mut text = String::new();
    entry.read_to_string(&mut text).ok()?;

    serde_json::from_str(text.trim_start_matches('\u{feff}')).ok()
}

/// Extracts into `<mods>/.extracted/<safe display name>/`, overwriting
/// files already there. Returns the extraction directory.
pub fn extract_mod(archive_path: &Path, mods_path: &Path, display_name: &str) -> Result<PathBuf> {
    if !archive_path.is_file() {
        return Err(CoreError::MissingPath(archive_path.to_path_buf()));
    }

    let folder = if display_name.trim().is_empty() {
        archive_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mod".to_string())
    } else {
        display_name.to_string()
    };

    let out = extracted_root(mods_path).join(safe_mod_name(&folder));
    fs::create_dir_all(&out)?;

    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    archive.extract(&out)?;

    tracing::info!(
        "extracted {} ({} entries) to {}",
        archive_path.display(),
        archive.len(),
        out.display()
    );
    Ok(out)
}

pub fn list_extracted(mods_path: &Path) -> Result<Vec<ExtractedMod>> {
    let root = extracted_root(mods_path);
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut out: Vec<ExtractedMod> = fs::read_dir(&root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| ExtractedMod {
            name: e.file_name().to_string_lossy().into_owned(),
            path: e.path(),
        })
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

/// `<stem><suffix><ext>` next to the original archive.
pub fn output_path_for(archive_path: &Path, suffix: &str) -> PathBuf {
    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match archive_path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    archive_path.with_file_name(name)
}

/// Zips `dir` into `output` through `<output>.tmp`. With `backup`, an
/// existing `output` is first copied to `backups/<file name>.bak` beside it.
pub fn pack_mod(dir: &Path, output: &Path, backup: bool) -> Result<()> {
    if !dir.is_dir() {
        return Err(CoreError::MissingPath(dir.to_path_buf()));
    }

    if backup && output.is_file() {
        let backup_path = backup_path_for(output);
        if let Some(parent) = backup_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(output, &backup_path)?;
        tracing::debug!("backed up {} to {}", output.display(), backup_path.display());
    }

    let tmp = tmp_path(output);
    let res = write_zip(dir, &tmp).and_then(|count| {
        fs::rename(&tmp, output)?;
        Ok(count)
    });

    match res {
        Ok(count) => {
            tracing::info!("packed {count} files into {}", output.display());
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

pub fn backup_path_for(output: &Path) -> PathBuf {
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(BACKUP_DIR)
        .join(format!("{file_name}.bak"))
}

/// Returns the number of files written.
fn write_zip(dir: &Path, dest: &Path) -> Result<usize> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut zip = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        zip.start_file(rel_path(dir, entry.path()), options)?;
        let mut src = File::open(entry.path())?;
        io::copy(&mut src, &mut zip)?;
        count += 1;
    }

    zip.finish()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn make_zip(path: &Path, files: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn names_in(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn safe_names() {
        assert_eq!(safe_mod_name("My Mod: v1.2"), "My_Mod__v1.2");
        assert_eq!(safe_mod_name("ok-name_1"), "ok-name_1");
        assert_eq!(safe_mod_name("Руда мод"), "Руда_мод");
    }

    #[test]
    fn scan_reads_manifest_names() {
        let dir = TempDir::new().unwrap();
        make_zip(&dir.path().join("b.jar"), &[("manifest.json", r#"{"Name": "Better Tools"}"#)]);
        make_zip(&dir.path().join("a.zip"), &[("readme.txt", "hi")]);
        make_zip(&dir.path().join("_disabled.zip"), &[]);
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let mods = scan_mods(dir.path()).unwrap();
        let rows: Vec<(&str, ArchiveKind)> = mods.iter().map(|m| (m.name.as_str(), m.kind)).collect();
        assert_eq!(rows, vec![("a", ArchiveKind::Zip), ("Better Tools", ArchiveKind::Jar)]);
        assert!(mods[0].manifest.is_none());
    }

    #[test]
    fn missing_mods_folder_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(scan_mods(&dir.path().join("none")).unwrap().is_empty());
        assert!(list_extracted(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn extract_then_pack_keeps_files() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("mod.zip");
        make_zip(
            &archive,
            &[("manifest.json", r#"{"Name": "X"}"#), ("Server/Languages/en-US/x.lang", "a=b")],
        );

        let out = extract_mod(&archive, dir.path(), "Cool Mod").unwrap();
        assert_eq!(out, dir.path().join(".extracted").join("Cool_Mod"));
        assert_eq!(fs::read_to_string(out.join("Server/Languages/en-US/x.lang")).unwrap(), "a=b");

        let listed = list_extracted(dir.path()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Cool_Mod");

        let packed = output_path_for(&archive, "_rus");
        assert_eq!(packed, dir.path().join("mod_rus.zip"));
        pack_mod(&out, &packed, false).unwrap();

        assert_eq!(
            names_in(&packed),
            vec!["Server/Languages/en-US/x.lang", "manifest.json"]
        );
        assert!(!tmp_path(&packed).exists());
    }

    #[test]
    fn pack_backs_up_existing_output() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), "new").unwrap();

        let output = dir.path().join("mod.jar");
        fs::write(&output, "old archive").unwrap();

        pack_mod(&src, &output, true).unwrap();

        let backup = dir.path().join("backups").join("mod.jar.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), "old archive");
        assert_eq!(names_in(&output), vec!["a.txt"]);
    }

    #[test]
    fn pack_of_missing_dir_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.zip");
        assert!(pack_mod(&dir.path().join("nope"), &output, false).is_err());
        assert!(!output.exists());
        assert!(!tmp_path(&output).exists());
    }
}
