use anyhow::{Result, anyhow};
use std::fmt;
use std::path::PathBuf;

pub mod catalog;
pub mod dispatch;
pub mod locales;
pub mod logging;
pub mod providers;
pub mod sanitize;
pub mod settings;
pub mod sync;
pub mod tools;

pub use catalog::{MergeOutput, TranslationMap, merge, parse, untranslated_ids};
pub use dispatch::{GapFill, TranslationTarget, fill_gaps};
pub use locales::CatalogLayout;
pub use providers::{GoogleTranslate, ServiceFuture, TranslationRequest, TranslationService};
pub use sanitize::sanitize;
pub use sync::{LocaleReport, TranslateOutcome, translate_catalogs};

#[derive(Debug, Clone)]
pub struct Config {
    pub locale_dir: PathBuf,
    pub textdomain: String,
    pub src_dir: PathBuf,
    pub project_id: String,
    pub location: String,
    pub skip_extract: bool,
    pub skip_compile: bool,
    /// Overrides `[catalog] languages` when non-empty.
    pub languages: Vec<String>,
    pub source_lang: Option<String>,
    pub access_token: Option<String>,
    pub settings_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub lines: Vec<String>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

pub async fn run(config: Config) -> Result<RunReport> {
    let settings = settings::load_settings(config.settings_path.as_deref())?;
    let layout = CatalogLayout::new(&config.locale_dir, &config.textdomain)?;
    let languages = resolve_languages(&config, &settings)?;
    let source_language = config
        .source_lang
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(&settings.source_language)
        .to_string();
    let parent = service_parent(&config)?;

    let mut report = RunReport::default();

    if !config.skip_extract {
        let outcome = tools::extract_template(
            &settings.extractor,
            &layout,
            &config.src_dir,
            &settings.source_patterns,
        )?;
        report.lines.push(outcome.describe());
    }

    let outcome = if layout.template_path().is_file() {
        let token = providers::resolve_access_token(config.access_token.as_deref())?;
        let service =
            GoogleTranslate::new(token, config.project_id.trim()).with_endpoint(&settings.endpoint);
        translate_catalogs(&layout, &languages, &source_language, &parent, &service).await?
    } else {
        TranslateOutcome::TemplateMissing(layout.template_path())
    };
    report.lines.extend(outcome.lines());

    if !config.skip_compile {
        let outcomes =
            tools::compile_catalogs(&settings.compiler, &settings.compiler_single, &layout)?;
        report
            .lines
            .extend(outcomes.iter().map(tools::ToolOutcome::describe));
    }

    Ok(report)
}

fn resolve_languages(config: &Config, settings: &settings::Settings) -> Result<Vec<String>> {
    let mut languages: Vec<String> = Vec::new();
    let requested = if config.languages.is_empty() {
        &settings.languages
    } else {
        &config.languages
    };
    for language in requested {
        let language = language.trim();
        if !language.is_empty() && !languages.iter().any(|existing| existing == language) {
            languages.push(language.to_string());
        }
    }
    if languages.is_empty() {
        return Err(anyhow!(
            "no languages configured (use --lang or [catalog] languages)"
        ));
    }
    Ok(languages)
}

fn service_parent(config: &Config) -> Result<String> {
    let project_id = config.project_id.trim();
    if project_id.is_empty() {
        return Err(anyhow!("cloud project id is empty"));
    }
    let location = config.location.trim();
    if location.is_empty() {
        return Err(anyhow!("cloud location is empty"));
    }
    Ok(TranslationRequest::parent_for(project_id, location))
}
