use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read the target ID list: one ID per line, optionally double-quoted,
/// blank lines skipped. A missing file is fatal for the run.
pub fn load_targets(path: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read target list {}", path))?;

    Ok(content
        .lines()
        .map(|line| line.trim().trim_matches('"').to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Write the resolved ID list produced by a probe run, one ID per line.
pub fn save_targets(path: &str, ids: &[u64]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    let mut content = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    fs::write(path, content).with_context(|| format!("failed to write target list {}", path))
}
