use anyhow::{Context, Result, anyhow};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MESSAGES_DIR: &str = "LC_MESSAGES";
const TEMPLATE_EXT: &str = "pot";
const CATALOG_EXT: &str = "po";

/// `<locale_dir>/<domain>.pot` plus `<locale_dir>/<locale>/LC_MESSAGES/<domain>.po`.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    locale_dir: PathBuf,
    domain: String,
}

impl CatalogLayout {
    pub fn new(locale_dir: impl Into<PathBuf>, domain: impl Into<String>) -> Result<Self> {
        let domain = domain.into();
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(anyhow!("text domain is empty"));
        }
        Ok(Self {
            locale_dir: locale_dir.into(),
            domain: domain.to_string(),
        })
    }

    pub fn locale_dir(&self) -> &Path {
        &self.locale_dir
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn template_path(&self) -> PathBuf {
        self.locale_dir
            .join(format!("{}.{}", self.domain, TEMPLATE_EXT))
    }

    pub fn messages_dir(&self, locale: &str) -> Result<PathBuf> {
        validate_locale(locale)?;
        Ok(self.locale_dir.join(locale).join(MESSAGES_DIR))
    }

    pub fn catalog_path(&self, locale: &str) -> Result<PathBuf> {
        Ok(self
            .messages_dir(locale)?
            .join(format!("{}.{}", self.domain, CATALOG_EXT)))
    }

    /// Existing catalog text, or an empty string when the locale has none yet.
    pub fn read_catalog(&self, locale: &str) -> Result<String> {
        let path = self.catalog_path(locale)?;
        if !path.is_file() {
            return Ok(String::new());
        }
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read catalog: {}", path.display()))
    }

    pub fn write_catalog(&self, locale: &str, content: &str) -> Result<PathBuf> {
        let dir = self.messages_dir(locale)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create locale directory: {}", dir.display()))?;
        let path = self.catalog_path(locale)?;
        write_atomically(&dir, &path, content)?;
        Ok(path)
    }

    /// Every `.po` file below the locale directory, sorted.
    pub fn catalog_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if !self.locale_dir.is_dir() {
            return Ok(files);
        }
        let mut stack = vec![self.locale_dir.clone()];
        while let Some(dir) = stack.pop() {
            let entries = fs::read_dir(&dir)
                .with_context(|| format!("failed to read directory: {}", dir.display()))?;
            for entry in entries {
                let entry = entry.with_context(|| "failed to read directory entry")?;
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .with_context(|| "failed to read file type")?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(CATALOG_EXT)
                {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

fn write_atomically(dir: &Path, path: &Path, content: &str) -> Result<()> {
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write catalog: {}", path.display()))?;
    file.persist(path)
        .with_context(|| format!("failed to replace catalog: {}", path.display()))?;
    Ok(())
}

fn validate_locale(locale: &str) -> Result<()> {
    let valid = !locale.is_empty()
        && locale != "."
        && locale != ".."
        && !locale.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(anyhow!("invalid locale name '{}'", locale))
    }
}

/// `zh_TW` -> `zh-TW`, the form the translation service expects.
pub fn language_code(locale: &str) -> String {
    locale.trim().replace('_', "-")
}

pub fn is_same_language(a: &str, b: &str) -> bool {
    language_code(a).eq_ignore_ascii_case(&language_code(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn layout_paths() {
        let layout = CatalogLayout::new("/tmp/locale", "messages").unwrap();
        assert_eq!(
            layout.template_path(),
            PathBuf::from("/tmp/locale/messages.pot")
        );
        assert_eq!(
            layout.catalog_path("zh_TW").unwrap(),
            PathBuf::from("/tmp/locale/zh_TW/LC_MESSAGES/messages.po")
        );
        assert!(layout.catalog_path("../etc").is_err());
        assert!(layout.catalog_path("").is_err());
        assert!(CatalogLayout::new("/tmp/locale", "  ").is_err());
    }

    #[test]
    fn missing_catalog_reads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let layout = CatalogLayout::new(dir.path(), "messages").unwrap();
        assert_eq!(layout.read_catalog("fr").unwrap(), "");
    }

    #[test]
    fn write_creates_directories_and_replaces_content() {
        let dir = tempdir().expect("tempdir");
        let layout = CatalogLayout::new(dir.path(), "messages").unwrap();
        let path = layout.write_catalog("fr", "first").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
        layout.write_catalog("fr", "second").unwrap();
        assert_eq!(layout.read_catalog("fr").unwrap(), "second");
        assert_eq!(
            fs::read_dir(path.parent().unwrap()).unwrap().count(),
            1,
            "no temp files left behind"
        );
    }

    #[test]
    fn catalog_files_lists_po_files_recursively() {
        let dir = tempdir().expect("tempdir");
        let layout = CatalogLayout::new(dir.path(), "messages").unwrap();
        layout.write_catalog("zh_TW", "").unwrap();
        layout.write_catalog("de", "").unwrap();
        fs::write(layout.template_path(), "").unwrap();
        let files = layout.catalog_files().unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("de/LC_MESSAGES/messages.po"),
                dir.path().join("zh_TW/LC_MESSAGES/messages.po"),
            ]
        );
    }

    #[test]
    fn language_codes() {
        assert_eq!(language_code("zh_TW"), "zh-TW");
        assert!(is_same_language("en", "EN"));
        assert!(is_same_language("pt_BR", "pt-br"));
        assert!(!is_same_language("en_US", "en"));
    }
}
