//! `check-env` subcommand: is the chat API key configured in the env file?

use std::path::Path;

use anyhow::{bail, Context, Result};

pub const API_KEY_VAR: &str = "GROQ_API_KEY";
const PLACEHOLDERS: [&str; 2] = ["your_api_key_here", "your_groq_api_key_here"];

/// What the env file says about the API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Missing,
    Empty,
    Placeholder { preview: String, length: usize },
    Configured { preview: String, length: usize },
}

/// First 7 and last 4 characters. Keys too short to hide anything are fully masked.
pub fn key_preview(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub fn classify_key(value: Option<&str>) -> KeyStatus {
    match value {
        None => KeyStatus::Missing,
        Some(v) if v.trim().is_empty() => KeyStatus::Empty,
        Some(v) => {
            let preview = key_preview(v);
            let length = v.chars().count();
            if PLACEHOLDERS.contains(&v) {
                KeyStatus::Placeholder { preview, length }
            } else {
                KeyStatus::Configured { preview, length }
            }
        }
    }
}

/// Read `GROQ_API_KEY` from `path` without touching the process environment.
pub fn read_key(path: &Path) -> Result<Option<String>> {
    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut key = None;
    for entry in entries {
        let (name, value) = entry.with_context(|| format!("failed to parse {}", path.display()))?;
        if name == API_KEY_VAR {
            key = Some(value);
        }
    }
    Ok(key)
}

pub fn handle_check_env(path: &Path) -> Result<()> {
    println!("Checking env file at: {}", path.display());
    if !path.exists() {
        println!("To create it, run:");
        println!("  echo {API_KEY_VAR}=your_key_here > {}", path.display());
        bail!("env file {} does not exist", path.display());
    }

    match classify_key(read_key(path)?.as_deref()) {
        KeyStatus::Missing => {
            println!("The env file should contain a line like:");
            println!("  {API_KEY_VAR}=your_actual_api_key_here");
            println!("with no spaces around '=', no quotes, on a single line.");
            bail!("{API_KEY_VAR} is not set in {}", path.display());
        }
        KeyStatus::Empty => bail!("{API_KEY_VAR} is empty"),
        KeyStatus::Placeholder { preview, length } => {
            println!("{API_KEY_VAR} is set");
            println!("  Key preview: {preview}");
            println!("  Key length: {length} characters");
            eprintln!("WARNING: {API_KEY_VAR} still holds the placeholder value; replace it with a real key.");
        }
        KeyStatus::Configured { preview, length } => {
            println!("{API_KEY_VAR} is set");
            println!("  Key preview: {preview}");
            println!("  Key length: {length} characters");
            println!("Configuration looks good!");
        }
    }
    Ok(())
}
