use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::catalog::{merge, parse, untranslated_ids};
use crate::dispatch::{GapFill, TranslationTarget, fill_gaps};
use crate::locales::CatalogLayout;
use crate::providers::TranslationService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleReport {
    pub locale: String,
    pub added: usize,
    pub removed: usize,
    pub fill: GapFill,
    pub path: PathBuf,
}

impl LocaleReport {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Translating {} ...", self.locale),
            format!(
                "Added {} new strings, removed {} strings",
                self.added, self.removed
            ),
            format!("{} new strings for {}", self.fill.pending(), self.locale),
        ];
        if let GapFill::SourceLocale { gaps } = self.fill {
            lines.push(format!(
                "{} is the source locale; {} strings left for manual translation",
                self.locale, gaps
            ));
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateOutcome {
    TemplateMissing(PathBuf),
    Completed(Vec<LocaleReport>),
}

impl TranslateOutcome {
    pub fn lines(&self) -> Vec<String> {
        match self {
            TranslateOutcome::TemplateMissing(path) => {
                vec![format!("{} not exists", path.display())]
            }
            TranslateOutcome::Completed(reports) => {
                reports.iter().flat_map(LocaleReport::lines).collect()
            }
        }
    }
}

/// Runs every locale in order against the template. The first failing
/// locale aborts the rest; catalogs already written stay written.
pub async fn translate_catalogs<S>(
    layout: &CatalogLayout,
    locales: &[String],
    source_language: &str,
    parent: &str,
    service: &S,
) -> Result<TranslateOutcome>
where
    S: TranslationService + ?Sized,
{
    let template_path = layout.template_path();
    if !template_path.is_file() {
        return Ok(TranslateOutcome::TemplateMissing(template_path));
    }
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("failed to read template: {}", template_path.display()))?;

    let mut reports = Vec::with_capacity(locales.len());
    for locale in locales {
        let target = TranslationTarget {
            parent: parent.to_string(),
            source_language: source_language.to_string(),
            locale: locale.clone(),
        };
        reports.push(sync_locale(layout, &template, &target, service).await?);
    }
    Ok(TranslateOutcome::Completed(reports))
}

pub async fn sync_locale<S>(
    layout: &CatalogLayout,
    template: &str,
    target: &TranslationTarget,
    service: &S,
) -> Result<LocaleReport>
where
    S: TranslationService + ?Sized,
{
    let locale = target.locale.as_str();
    info!("Translating {} ...", locale);

    let existing = layout.read_catalog(locale)?;
    let seeded = merge(&parse(&existing), template);
    info!("{}: {}", locale, seeded.summary());

    let mut translations = parse(&seeded.text);
    info!(
        "{}: {} new strings",
        locale,
        untranslated_ids(&translations).len()
    );
    let fill = fill_gaps(&mut translations, target, service).await?;

    let merged = merge(&translations, template);
    let path = layout.write_catalog(locale, &merged.text)?;
    info!("{}: wrote {}", locale, path.display());

    Ok(LocaleReport {
        locale: locale.to_string(),
        added: seeded.added,
        removed: seeded.removed,
        fill,
        path,
    })
}
