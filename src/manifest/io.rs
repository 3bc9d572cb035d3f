//! Reading manifests from MOD archives and extracted directories.
//!
//! Archives keep their manifest one level deep (`<folder>/info.json`) where the
//! folder name is not guaranteed to match the archive name. Extracted MODs keep
//! it at the directory root.

use super::ModManifest;
use crate::constants::MANIFEST_FILE;
use crate::core::ModpmError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read `info.json` from an extracted MOD directory.
pub fn read_from_dir(dir: &Path) -> Result<ModManifest> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ModManifest::from_json(&content, &dir.display().to_string())?)
}

/// Read `info.json` from a zipped MOD archive.
pub fn read_from_archive(archive_path: &Path) -> Result<ModManifest> {
    let origin = archive_path.display().to_string();
    let file = File::open(archive_path).with_context(|| format!("Failed to open {origin}"))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ModpmError::ManifestParseError {
        path: origin.clone(),
        reason: format!("not a zip archive: {e}"),
    })?;

    let entry_name = find_manifest_entry(archive.file_names()).ok_or_else(|| {
        ModpmError::ManifestParseError {
            path: origin.clone(),
            reason: format!("archive does not contain {MANIFEST_FILE}"),
        }
    })?;

    let mut content = String::new();
    archive
        .by_name(&entry_name)
        .map_err(|e| ModpmError::ManifestParseError {
            path: origin.clone(),
            reason: e.to_string(),
        })?
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read {entry_name} from {origin}"))?;

    Ok(ModManifest::from_json(&content, &origin)?)
}

/// Pick the shallowest `info.json` entry, preferring `<folder>/info.json`.
fn find_manifest_entry<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    names
        .filter(|name| *name == MANIFEST_FILE || name.ends_with(&format!("/{MANIFEST_FILE}")))
        .filter(|name| name.matches('/').count() <= 1)
        .min_by_key(|name| (name.matches('/').count() != 1, name.len()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;
    use std::io::Write;
    use tempfile::TempDir;

    const INFO: &str = r#"{"name": "zipped", "version": "1.2.0", "dependencies": ["base"]}"#;

    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_read_from_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("zipped_1.2.0.zip");
        write_archive(
            &path,
            &[("zipped_1.2.0/data.lua", "-- data"), ("zipped_1.2.0/info.json", INFO)],
        );

        let manifest = read_from_archive(&path).unwrap();
        assert_eq!(manifest.name.as_str(), "zipped");
        assert_eq!(manifest.version, Version::new(1, 2, 0));
    }

    #[test]
    fn test_archive_without_manifest_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty_1.0.0.zip");
        write_archive(&path, &[("empty/data.lua", "-- data")]);

        let err = read_from_archive(&path).unwrap_err();
        assert!(err.to_string().contains("does not contain info.json"));
    }

    #[test]
    fn test_read_from_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("info.json"), INFO).unwrap();

        let manifest = read_from_dir(temp.path()).unwrap();
        assert_eq!(manifest.name.as_str(), "zipped");
    }

    #[test]
    fn test_find_manifest_entry_prefers_top_folder() {
        let names = ["a/b/info.json", "a/info.json", "info.json"];
        assert_eq!(find_manifest_entry(names.into_iter()), Some("a/info.json".to_string()));

        let names = ["info.json"];
        assert_eq!(find_manifest_entry(names.into_iter()), Some("info.json".to_string()));

        let names = ["a/locale/en/info.json"];
        assert_eq!(find_manifest_entry(names.into_iter()), None);
    }
}
