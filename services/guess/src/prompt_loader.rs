use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Reads every `.md` or `.txt` file in `dir_path` into a map keyed by file stem.
/// Empty files are skipped so they fall back to the built-in wording.
pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let path = entry?.path();
        let is_template = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("md") | Some("txt")
        );
        if !path.is_file() || !is_template {
            continue;
        }

        let key = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Could not get file stem for prompt file")?
            .to_string();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

        let content = content.trim();
        if content.is_empty() {
            tracing::warn!("Prompt file {} is empty, ignoring it", path.display());
            continue;
        }
        tracing::debug!("Loaded prompt '{}'", key);
        prompts.insert(key, content.to_string());
    }

    Ok(prompts)
}
