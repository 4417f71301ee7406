use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const LOCAL_FILES: &[&str] = &["po-translator.toml", "po-translator.local.toml"];
const HOME_DIR_NAME: &str = ".po-translator-rust";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source_language: String,
    pub languages: Vec<String>,
    pub source_patterns: Vec<String>,
    pub extractor: String,
    pub compiler: String,
    pub compiler_single: String,
    pub endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            languages: Vec::new(),
            source_patterns: Vec::new(),
            extractor: String::new(),
            compiler: String::new(),
            compiler_single: String::new(),
            endpoint: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    catalog: Option<CatalogSettings>,
    extract: Option<ExtractSettings>,
    tools: Option<ToolSettings>,
    service: Option<ServiceSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogSettings {
    source_language: Option<String>,
    languages: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractSettings {
    patterns: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolSettings {
    extractor: Option<String>,
    compiler: Option<String>,
    compiler_single: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSettings {
    endpoint: Option<String>,
}

/// Embedded defaults, then the working-directory files, then
/// `$HOME/.po-translator-rust/settings.toml`, then `extra_path`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut ordered_paths = LOCAL_FILES.iter().map(PathBuf::from).collect::<Vec<_>>();
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
    }
    load_settings_from(&ordered_paths, extra_path)
}

pub(crate) fn load_settings_from(paths: &[PathBuf], extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    settings.merge(parse_settings(DEFAULT_SETTINGS_TOML, Path::new("<embedded>"))?);

    for path in paths {
        if path.is_file() {
            settings.merge(read_settings_file(path)?);
        }
    }

    if let Some(extra) = extra_path {
        if !extra.is_file() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        settings.merge(read_settings_file(extra)?);
    }

    Ok(settings)
}

fn read_settings_file(path: &Path) -> Result<SettingsFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings: {}", path.display()))?;
    parse_settings(&content, path)
}

fn parse_settings(content: &str, path: &Path) -> Result<SettingsFile> {
    toml::from_str(content).with_context(|| format!("failed to parse settings: {}", path.display()))
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(catalog) = incoming.catalog {
            if let Some(source) = non_empty(catalog.source_language) {
                self.source_language = source;
            }
            if let Some(languages) = catalog.languages {
                self.languages = clean_list(languages);
            }
        }
        if let Some(patterns) = incoming.extract.and_then(|extract| extract.patterns) {
            self.source_patterns = clean_list(patterns);
        }
        if let Some(tools) = incoming.tools {
            if let Some(extractor) = non_empty(tools.extractor) {
                self.extractor = extractor;
            }
            if let Some(compiler) = non_empty(tools.compiler) {
                self.compiler = compiler;
            }
            if let Some(compiler) = non_empty(tools.compiler_single) {
                self.compiler_single = compiler;
            }
        }
        if let Some(endpoint) = incoming.service.and_then(|service| non_empty(service.endpoint)) {
            self.endpoint = endpoint;
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|existing| existing == value) {
            out.push(value.to_string());
        }
    }
    out
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(HOME_DIR_NAME))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn embedded_defaults() {
        let settings = load_settings_from(&[], None).unwrap();
        assert_eq!(settings.source_language, "en");
        assert_eq!(settings.languages, vec!["zh_TW", "zh_CN"]);
        assert_eq!(settings.source_patterns, vec!["*.py"]);
        assert_eq!(settings.extractor, "pygettext3");
        assert_eq!(settings.compiler, "msgfmt.py");
        assert_eq!(settings.compiler_single, "msgfmt");
        assert_eq!(settings.endpoint, "https://translation.googleapis.com");
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("base.toml");
        let local = dir.path().join("local.toml");
        fs::write(
            &base,
            "[catalog]\nlanguages = [\"fr\", \"de\", \"fr\"]\n[tools]\ncompiler = \"\"\n",
        )
        .unwrap();
        fs::write(&local, "[catalog]\nsource_language = \"ja\"\n").unwrap();

        let settings = load_settings_from(&[base, dir.path().join("missing.toml")], Some(&local)).unwrap();
        assert_eq!(settings.languages, vec!["fr", "de"]);
        assert_eq!(settings.source_language, "ja");
        assert_eq!(settings.compiler, "msgfmt.py");
    }

    #[test]
    fn explicit_settings_file_must_exist() {
        let dir = tempdir().expect("tempdir");
        let err = load_settings_from(&[], Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("settings file not found"));
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[ocr]\nnormalize = true\n").unwrap();
        assert!(load_settings_from(&[], Some(&path)).is_err());
    }
}
