use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "po-translator-rust",
    version,
    about = "Merge gettext catalogs with their template and machine-translate new strings"
)]
struct Cli {
    /// Path to the locale directory (holds <domain>.pot and <locale>/LC_MESSAGES)
    locale_dir: PathBuf,

    /// Text domain (template and catalog file name)
    #[arg(short = 'd', long = "textdomain")]
    textdomain: String,

    /// Source directory scanned by the template extractor
    #[arg(long = "src")]
    src: PathBuf,

    /// Google Cloud project id
    #[arg(long = "gc-project-id", alias = "gc_project_id")]
    gc_project_id: String,

    /// Google Cloud location (e.g. global)
    #[arg(long = "gc-location", alias = "gc_location")]
    gc_location: String,

    /// Keep the existing template instead of regenerating it
    #[arg(long = "skip-extract")]
    skip_extract: bool,

    /// Do not compile catalogs after translating
    #[arg(long = "skip-compile")]
    skip_compile: bool,

    /// Locale to process (repeatable; default from settings [catalog] languages)
    #[arg(short = 'l', long = "lang")]
    lang: Vec<String>,

    /// Language the msgids are written in (default from settings)
    #[arg(short = 'L', long = "source-lang")]
    source_lang: Option<String>,

    /// OAuth access token (overrides environment variables and gcloud)
    #[arg(long = "access-token")]
    access_token: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    po_translator_rust::logging::init(cli.verbose)?;

    let report = po_translator_rust::run(po_translator_rust::Config {
        locale_dir: cli.locale_dir,
        textdomain: cli.textdomain,
        src_dir: cli.src,
        project_id: cli.gc_project_id,
        location: cli.gc_location,
        skip_extract: cli.skip_extract,
        skip_compile: cli.skip_compile,
        languages: cli.lang,
        source_lang: cli.source_lang,
        access_token: cli.access_token,
        settings_path: cli.read_settings,
    })
    .await?;

    println!("{}", report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_accepts_underscore_flag_aliases() {
        let cli = Cli::try_parse_from([
            "po-translator-rust",
            "locale",
            "-d",
            "messages",
            "--src",
            "app",
            "--gc_project_id",
            "demo",
            "--gc-location",
            "global",
            "-l",
            "zh_TW",
            "-l",
            "ja",
        ])
        .unwrap();
        assert_eq!(cli.locale_dir, PathBuf::from("locale"));
        assert_eq!(cli.gc_project_id, "demo");
        assert_eq!(cli.lang, vec!["zh_TW", "ja"]);
        assert!(!cli.skip_extract);
    }

    #[test]
    fn cli_requires_textdomain() {
        assert!(
            Cli::try_parse_from([
                "po-translator-rust",
                "locale",
                "--src",
                "app",
                "--gc-project-id",
                "demo",
                "--gc-location",
                "global",
            ])
            .is_err()
        );
    }
}
