//! Theme import
//!
//! Turns an uploaded ZIP archive into a registered theme: the archive is
//! saved to the upload scratch area, extracted, and its files dispatched
//! by extension into the theme's template and asset directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use once_cell::sync::Lazy;
use petal_core::ports::ThemeStore;
use petal_core::{CmsError, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::storage::SqliteStore;
use crate::ThemeRoots;

/// Characters that survive filename sanitization.
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").unwrap());

pub struct ThemeImporter {
    store: Arc<SqliteStore>,
    roots: ThemeRoots,
}

impl ThemeImporter {
    pub fn new(store: Arc<SqliteStore>, roots: ThemeRoots) -> Self {
        Self { store, roots }
    }

    /// Import an uploaded theme archive and return the derived theme name.
    ///
    /// Templates (`.html`) land in the theme's template directory and
    /// stylesheets (`.css`) in its asset directory, both flattened to
    /// their base names. Anything else is discarded with the scratch
    /// directory. Importing over an existing theme refreshes its files
    /// and leaves its database record, including the active flag, alone.
    pub async fn import(&self, data: Bytes, original_filename: &str) -> Result<String> {
        if original_filename.trim().is_empty() {
            return Err(CmsError::Validation("No selected file.".to_string()));
        }

        let filename = sanitize_filename(original_filename);
        if filename.is_empty() {
            return Err(CmsError::Validation(format!(
                "Unusable file name: {original_filename}"
            )));
        }
        let theme_name = derive_theme_name(&filename);

        tokio::fs::create_dir_all(&self.roots.uploads).await?;
        let archive_path = self.roots.uploads.join(&filename);
        tokio::fs::write(&archive_path, &data).await?;

        let scratch_dir = self.roots.uploads.join(&theme_name);
        if let Err(e) = extract_archive(archive_path.clone(), scratch_dir.clone()).await {
            let _ = tokio::fs::remove_file(&archive_path).await;
            return Err(e);
        }

        let template_dir = self.roots.template_dir(&theme_name);
        let asset_dir = self.roots.asset_dir(&theme_name);
        tokio::fs::create_dir_all(&template_dir).await?;
        tokio::fs::create_dir_all(&asset_dir).await?;

        if let Err(e) = dispatch_files(scratch_dir, template_dir, asset_dir).await {
            let _ = tokio::fs::remove_file(&archive_path).await;
            return Err(e);
        }

        tokio::fs::remove_file(&archive_path).await?;

        if self.store.get_theme_by_name(&theme_name).await?.is_none() {
            self.store.create_theme(&theme_name).await?;
        }

        info!("Imported theme \"{}\" from {}", theme_name, filename);
        Ok(theme_name)
    }
}

/// Reduce an uploaded filename to a safe basename: path components are
/// dropped, disallowed characters collapse to underscores, and leading
/// dots and underscores are stripped so the name cannot escape the
/// upload directory.
pub(crate) fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned = UNSAFE_CHARS.replace_all(base, "_");
    cleaned.trim_matches(['.', '_', '-']).to_string()
}

/// The theme name is everything before the first `.` of the sanitized
/// filename.
pub(crate) fn derive_theme_name(filename: &str) -> String {
    filename
        .split('.')
        .next()
        .unwrap_or(filename)
        .to_string()
}

/// Unpack `archive` into `dest` on the blocking pool. A malformed
/// archive is a validation failure; a filesystem failure mid-unpack
/// stays an I/O error.
async fn extract_archive(archive: PathBuf, dest: PathBuf) -> Result<()> {
    let names = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
        let file = std::fs::File::open(&archive)?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| zip_err(&archive, e))?;
        let names: Vec<String> = zip.file_names().map(String::from).collect();
        zip.extract(&dest).map_err(|e| zip_err(&archive, e))?;
        Ok(names)
    })
    .await
    .map_err(|e| CmsError::Server(format!("archive extraction task failed: {e}")))??;

    debug!("Extracted archive entries: {:?}", names);
    Ok(())
}

/// Only parse failures mean the upload itself was bad; disk trouble
/// while unpacking is not the uploader's fault.
fn zip_err(archive: &Path, err: zip::result::ZipError) -> CmsError {
    match err {
        zip::result::ZipError::Io(e) => {
            debug!("Extraction of {} failed: {}", archive.display(), e);
            CmsError::Io(e)
        }
        e => {
            debug!("Rejected archive {}: {}", archive.display(), e);
            CmsError::Validation("Invalid ZIP file.".to_string())
        }
    }
}

/// Walk the extraction tree, move templates and stylesheets into their
/// destinations, then drop the scratch directory. Runs on the blocking
/// pool.
async fn dispatch_files(
    scratch_dir: PathBuf,
    template_dir: PathBuf,
    asset_dir: PathBuf,
) -> Result<()> {
    let moved = tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut files = Vec::new();
        collect_files(&scratch_dir, &mut files)?;

        let mut moved = 0usize;
        for file in files {
            let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let dest = if name.ends_with(".html") {
                template_dir.join(name)
            } else if name.ends_with(".css") {
                asset_dir.join(name)
            } else {
                continue;
            };
            move_file(&file, &dest)?;
            moved += 1;
        }

        std::fs::remove_dir_all(&scratch_dir)?;
        Ok(moved)
    })
    .await
    .map_err(|e| CmsError::Server(format!("file dispatch task failed: {e}")))??;

    debug!("Relocated {} theme files", moved);
    Ok(())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Move with a copy-and-remove fallback for cross-device renames. An
/// existing destination is overwritten.
fn move_file(src: &Path, dest: &Path) -> std::io::Result<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(src, dest)?;
            std::fs::remove_file(src)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_importer() -> (tempfile::TempDir, Arc<SqliteStore>, ThemeImporter) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("cms.db");
        let store = Arc::new(SqliteStore::open(db_path.to_str().unwrap()).await.unwrap());
        let roots = ThemeRoots::under(dir.path());
        let importer = ThemeImporter::new(store.clone(), roots);
        (dir, store, importer)
    }

    fn zip_bytes(entries: &[(&str, &str)]) -> Bytes {
        use std::io::Write;

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, body) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner().into()
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[tokio::test]
    async fn imports_a_theme_archive_end_to_end() {
        let (dir, store, importer) = test_importer().await;
        let data = zip_bytes(&[
            ("base.html", "<html>{{{content}}}</html>"),
            ("style.css", "body { margin: 0 }"),
        ]);

        let name = importer.import(data, "blue.zip").await.unwrap();
        assert_eq!(name, "blue");

        let roots = ThemeRoots::under(dir.path());
        let template = std::fs::read_to_string(roots.template_dir("blue").join("base.html")).unwrap();
        assert_eq!(template, "<html>{{{content}}}</html>");
        let style = std::fs::read_to_string(roots.asset_dir("blue").join("style.css")).unwrap();
        assert_eq!(style, "body { margin: 0 }");

        // Archive and scratch directory are gone
        assert!(dir_entries(&roots.uploads).is_empty());

        let theme = store.get_theme_by_name("blue").await.unwrap().unwrap();
        assert!(!theme.active);
    }

    #[tokio::test]
    async fn flattens_nested_directories_into_the_destinations() {
        let (dir, _store, importer) = test_importer().await;
        let data = zip_bytes(&[
            ("blue/base.html", "top"),
            ("blue/partials/footer.html", "bottom"),
            ("blue/css/deep/style.css", "css"),
        ]);

        importer.import(data, "blue.zip").await.unwrap();

        let roots = ThemeRoots::under(dir.path());
        assert_eq!(
            dir_entries(&roots.template_dir("blue")),
            vec!["base.html", "footer.html"]
        );
        assert_eq!(dir_entries(&roots.asset_dir("blue")), vec!["style.css"]);
    }

    #[tokio::test]
    async fn colliding_base_names_keep_a_single_file() {
        let (dir, _store, importer) = test_importer().await;
        let data = zip_bytes(&[
            ("one/base.html", "first"),
            ("two/base.html", "second"),
        ]);

        importer.import(data, "blue.zip").await.unwrap();

        // Walk order is unspecified, so either file may win; what must
        // hold is that exactly one survives and the import succeeded.
        let roots = ThemeRoots::under(dir.path());
        assert_eq!(dir_entries(&roots.template_dir("blue")), vec!["base.html"]);
        let body = std::fs::read_to_string(roots.template_dir("blue").join("base.html")).unwrap();
        assert!(body == "first" || body == "second");
    }

    #[tokio::test]
    async fn discards_files_that_are_neither_templates_nor_stylesheets() {
        let (dir, _store, importer) = test_importer().await;
        let data = zip_bytes(&[
            ("base.html", "t"),
            ("README.md", "docs"),
            ("logo.png", "binaryish"),
        ]);

        importer.import(data, "blue.zip").await.unwrap();

        let roots = ThemeRoots::under(dir.path());
        assert_eq!(dir_entries(&roots.template_dir("blue")), vec!["base.html"]);
        assert!(dir_entries(&roots.asset_dir("blue")).is_empty());
        // The leftovers vanished with the scratch directory
        assert!(dir_entries(&roots.uploads).is_empty());
    }

    #[tokio::test]
    async fn rejects_garbage_archives_and_cleans_up() {
        let (dir, store, importer) = test_importer().await;

        let err = importer
            .import(Bytes::from_static(b"this is not a zip"), "bad.zip")
            .await
            .unwrap_err();

        assert!(matches!(err, CmsError::Validation(_)));
        let roots = ThemeRoots::under(dir.path());
        assert!(!roots.uploads.join("bad.zip").exists());
        assert!(store.get_theme_by_name("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extraction_io_failures_are_not_blamed_on_the_archive() {
        let (dir, store, importer) = test_importer().await;

        // Occupy the scratch extraction path with a plain file so a
        // well-formed archive fails on directory creation, not parsing.
        let roots = ThemeRoots::under(dir.path());
        std::fs::create_dir_all(&roots.uploads).unwrap();
        std::fs::write(roots.uploads.join("blue"), "in the way").unwrap();

        let err = importer
            .import(zip_bytes(&[("base.html", "t")]), "blue.zip")
            .await
            .unwrap_err();

        assert!(matches!(err, CmsError::Io(_)));
        // The saved archive is still swept up on this path
        assert!(!roots.uploads.join("blue.zip").exists());
        assert!(store.get_theme_by_name("blue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_empty_uploads_as_invalid_archives() {
        let (_dir, _store, importer) = test_importer().await;

        let err = importer
            .import(Bytes::new(), "empty.zip")
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_blank_filenames() {
        let (_dir, _store, importer) = test_importer().await;

        let err = importer
            .import(zip_bytes(&[("base.html", "t")]), "")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No selected file.");
    }

    #[tokio::test]
    async fn rejects_filenames_that_sanitize_to_nothing() {
        let (_dir, _store, importer) = test_importer().await;

        let err = importer
            .import(zip_bytes(&[("base.html", "t")]), "...")
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));
    }

    #[tokio::test]
    async fn reimport_refreshes_files_and_keeps_the_record() {
        let (dir, store, importer) = test_importer().await;

        importer
            .import(zip_bytes(&[("base.html", "v1")]), "blue.zip")
            .await
            .unwrap();
        store.activate_theme("blue").await.unwrap();

        importer
            .import(zip_bytes(&[("base.html", "v2")]), "blue.zip")
            .await
            .unwrap();

        let themes = store.list_themes().await.unwrap();
        assert_eq!(themes.len(), 1);
        assert!(themes[0].active);

        let roots = ThemeRoots::under(dir.path());
        let template = std::fs::read_to_string(roots.template_dir("blue").join("base.html")).unwrap();
        assert_eq!(template, "v2");
    }

    #[test]
    fn strips_path_components_and_unsafe_characters() {
        assert_eq!(sanitize_filename("blue.zip"), "blue.zip");
        assert_eq!(sanitize_filename("../../etc/passwd.zip"), "passwd.zip");
        assert_eq!(sanitize_filename("C:\\themes\\win.zip"), "win.zip");
        assert_eq!(sanitize_filename("my theme!.zip"), "my_theme_.zip");
        assert_eq!(sanitize_filename(".hidden.zip"), "hidden.zip");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn theme_name_is_the_part_before_the_first_dot() {
        assert_eq!(derive_theme_name("blue.zip"), "blue");
        assert_eq!(derive_theme_name("my.theme.zip"), "my");
        assert_eq!(derive_theme_name("noext"), "noext");
    }
}
