use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::catalog::{TranslationMap, untranslated_ids};
use crate::locales::{is_same_language, language_code};
use crate::providers::{PLAIN_TEXT_MIME, TranslationRequest, TranslationService};
use crate::sanitize::{escape_for_catalog, sanitize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTarget {
    pub parent: String,
    pub source_language: String,
    pub locale: String,
}

impl TranslationTarget {
    pub fn is_source_locale(&self) -> bool {
        is_same_language(&self.locale, &self.source_language)
    }

    fn request(&self, contents: Vec<String>) -> TranslationRequest {
        TranslationRequest {
            parent: self.parent.clone(),
            contents,
            mime_type: PLAIN_TEXT_MIME.to_string(),
            source_language_code: language_code(&self.source_language),
            target_language_code: language_code(&self.locale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapFill {
    NoGaps,
    /// The source locale is never machine translated; its gaps stay empty.
    SourceLocale { gaps: usize },
    Translated { count: usize },
}

impl GapFill {
    pub fn pending(&self) -> usize {
        match self {
            GapFill::NoGaps => 0,
            GapFill::SourceLocale { gaps } => *gaps,
            GapFill::Translated { count } => *count,
        }
    }
}

/// Sends every untranslated id of `map` in one request and writes the
/// answers back by position. Nothing is written unless the service returns
/// exactly one translation per id.
pub async fn fill_gaps<S>(
    map: &mut TranslationMap,
    target: &TranslationTarget,
    service: &S,
) -> Result<GapFill>
where
    S: TranslationService + ?Sized,
{
    let gaps = untranslated_ids(map);
    if gaps.is_empty() {
        return Ok(GapFill::NoGaps);
    }
    if target.is_source_locale() {
        info!(
            "{}: {} untranslated strings left for the source locale",
            target.locale,
            gaps.len()
        );
        return Ok(GapFill::SourceLocale { gaps: gaps.len() });
    }

    debug!(
        "{}: requesting {} translations from {}",
        target.locale,
        gaps.len(),
        service.name()
    );
    let translations = service
        .translate(target.request(gaps.clone()))
        .await
        .with_context(|| format!("{} request for {} failed", service.name(), target.locale))?;
    if translations.len() != gaps.len() {
        return Err(anyhow!(
            "{} returned {} translations for {} strings ({}); refusing to assign by position",
            service.name(),
            translations.len(),
            gaps.len(),
            target.locale
        ));
    }

    let count = gaps.len();
    for (id, translated) in gaps.into_iter().zip(translations) {
        map.insert(id, escape_for_catalog(&sanitize(&translated)));
    }
    Ok(GapFill::Translated { count })
}
