//! Command-line definition and execution.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use sigil::{Input, NamedReader, Sigil, SigilConfig};
use tracing::{debug, info};

/// Render a template with variables and POSIX environment expansion.
#[derive(Debug, Parser)]
#[command(name = "sigil", version, about)]
pub struct Cli {
    /// Template file to render.
    #[arg(short = 'f', long = "filename", conflicts_with = "inline")]
    pub filename: Option<PathBuf>,

    /// Inline template text.
    #[arg(short = 'i', long)]
    pub inline: Option<String>,

    /// Expand $VAR and ${VAR} before template evaluation.
    #[arg(short = 'p', long, env = "SIGIL_POSIX", value_parser = FalseyValueParser::new())]
    pub posix: bool,

    /// Delimiter pair, e.g. "{{ }}" or "[[ ]]".
    #[arg(short = 'd', long, env = "SIGIL_DELIMS")]
    pub delims: Option<String>,

    /// Directory searched for included templates (repeatable).
    #[arg(short = 'I', long = "include-path")]
    pub include_paths: Vec<PathBuf>,

    /// YAML configuration file.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Template variables as NAME=VALUE.
    #[arg(value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid variable {s:?}: expected NAME=VALUE"))?;
    if name.is_empty() {
        return Err(format!("invalid variable {s:?}: empty name"));
    }
    Ok((name.to_string(), value.to_string()))
}

impl Cli {
    /// Builds the engine from the config file, then command-line overrides.
    pub fn engine(&self) -> Result<Sigil> {
        let config = match &self.config {
            Some(path) => SigilConfig::from_file(path)?,
            None => SigilConfig::default(),
        };
        let mut engine = Sigil::with_config(config);

        if let Some(delims) = &self.delims {
            engine.set_delimiters(delims.clone());
        }
        if self.posix {
            engine.set_posix_preprocess(true);
        }
        for dir in &self.include_paths {
            engine.push_path(dir.clone());
        }
        debug!(config = ?engine.config(), "engine configured");
        Ok(engine)
    }

    pub fn vars(&self) -> HashMap<String, String> {
        self.vars.iter().cloned().collect()
    }

    /// Renders the selected template and returns the output.
    pub fn render(&self) -> Result<String> {
        let mut engine = self.engine()?;
        let vars = self.vars();

        if let Some(path) = &self.filename {
            let body = fs::read_to_string(path)
                .with_context(|| format!("cannot read template {}", path.display()))?;
            engine.push_path(template_dir(path));
            info!(template = %path.display(), "rendering file");
            let output = engine.execute(&body, &vars, &path.display().to_string());
            engine.pop_path();
            return Ok(output?);
        }

        if let Some(inline) = &self.inline {
            return Ok(engine.execute(inline, &vars, "<inline>")?);
        }

        let stdin = NamedReader::new("<stdin>", io::stdin());
        Ok(engine.execute_input(Input::from(stdin), &vars, "")?)
    }

    pub fn run(&self) -> Result<()> {
        let output = self.render()?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

fn template_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
