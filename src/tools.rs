use anyhow::{Context, Result, anyhow};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use crate::locales::CatalogLayout;

/// What happened to an optional tool step. Missing or failing tools are
/// reported to the operator; they never abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Ran { tool: String, files: usize },
    Missing { tool: String, hint: String },
    Failed { tool: String, stderr: String },
    Skipped(String),
}

impl ToolOutcome {
    pub fn describe(&self) -> String {
        match self {
            ToolOutcome::Ran { tool, files } => format!("{} processed {} files", tool, files),
            ToolOutcome::Missing { tool, hint } => format!("{} not exists. {}", tool, hint),
            ToolOutcome::Failed { tool, stderr } => format!("{} failed: {}", tool, stderr),
            ToolOutcome::Skipped(reason) => reason.clone(),
        }
    }
}

/// `<extractor> -d <domain> -o <template> <sources...>`
pub fn extract_template(
    extractor: &str,
    layout: &CatalogLayout,
    src_dir: &Path,
    patterns: &[String],
) -> Result<ToolOutcome> {
    let Some(program) = find_tool(extractor) else {
        warn!("template extractor '{}' not found", extractor);
        return Ok(ToolOutcome::Missing {
            tool: extractor.to_string(),
            hint: "Please create the pot file manually".to_string(),
        });
    };
    let sources = match source_files(src_dir, patterns) {
        Ok(sources) => sources,
        Err(err) => {
            warn!("cannot list sources for {}: {:#}", extractor, err);
            return Ok(ToolOutcome::Failed {
                tool: extractor.to_string(),
                stderr: format!("{:#}", err),
            });
        }
    };
    if sources.is_empty() {
        return Ok(ToolOutcome::Skipped(format!(
            "no source files matching {} in {}",
            patterns.join(", "),
            src_dir.display()
        )));
    }
    if let Some(parent) = layout.template_path().parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create locale directory: {}", parent.display()))?;
    }

    info!("extracting {} source files with {}", sources.len(), extractor);
    let mut command = Command::new(&program);
    command
        .arg("-d")
        .arg(layout.domain())
        .arg("-o")
        .arg(layout.template_path())
        .args(&sources);
    Ok(run_tool(command, extractor, sources.len()))
}

/// Compiles every catalog with the batch compiler, or one by one with the
/// single-file compiler (`-o <file.mo> <file.po>`) when the batch tool is
/// not installed.
pub fn compile_catalogs(
    compiler: &str,
    compiler_single: &str,
    layout: &CatalogLayout,
) -> Result<Vec<ToolOutcome>> {
    let catalogs = layout.catalog_files()?;
    if catalogs.is_empty() {
        return Ok(vec![ToolOutcome::Skipped(format!(
            "no catalogs to compile in {}",
            layout.locale_dir().display()
        ))]);
    }

    if let Some(program) = find_tool(compiler) {
        info!("compiling {} catalogs with {}", catalogs.len(), compiler);
        let mut command = Command::new(&program);
        command.args(&catalogs);
        return Ok(vec![run_tool(command, compiler, catalogs.len())]);
    }

    let Some(program) = find_tool(compiler_single) else {
        warn!(
            "catalog compilers '{}' and '{}' not found",
            compiler, compiler_single
        );
        return Ok(vec![ToolOutcome::Missing {
            tool: compiler.to_string(),
            hint: "Please compile po files into mo format manually".to_string(),
        }]);
    };

    info!(
        "{} not found; compiling {} catalogs one by one with {}",
        compiler,
        catalogs.len(),
        compiler_single
    );
    let mut outcomes = Vec::with_capacity(catalogs.len());
    for catalog in &catalogs {
        let mut command = Command::new(&program);
        command
            .arg("-o")
            .arg(catalog.with_extension("mo"))
            .arg(catalog);
        outcomes.push(run_tool(command, compiler_single, 1));
    }
    Ok(outcomes)
}

fn run_tool(mut command: Command, name: &str, files: usize) -> ToolOutcome {
    let output = match command.output() {
        Ok(output) => output,
        Err(err) => {
            warn!("failed to run {}: {}", name, err);
            return ToolOutcome::Failed {
                tool: name.to_string(),
                stderr: err.to_string(),
            };
        }
    };
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!("{} exited with {}: {}", name, output.status, stderr);
        return ToolOutcome::Failed {
            tool: name.to_string(),
            stderr,
        };
    }
    ToolOutcome::Ran {
        tool: name.to_string(),
        files,
    }
}

/// A name with a path separator must point at a file; a bare name is
/// looked up on `PATH`.
pub(crate) fn find_tool(name: &str) -> Option<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Files directly inside `src_dir` whose names match one of `patterns`.
pub(crate) fn source_files(src_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let matcher = build_matcher(patterns)?;
    let entries = fs::read_dir(src_dir)
        .with_context(|| format!("failed to read source directory: {}", src_dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| "failed to read directory entry")?;
        let file_type = entry
            .file_type()
            .with_context(|| "failed to read file type")?;
        if !file_type.is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn build_matcher(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|err| anyhow!("invalid source pattern '{}': {}", pattern, err))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| anyhow!("failed to build source patterns: {}", err))
}
