//! First-boot seeding of config entries from a directory of text files.

use std::path::Path;
use std::{fs, io};

use tracing::{info, warn};

use crate::error::PromptdeskError;
use crate::store::TemplateStore;

/// Read `*.txt` / `*.md` files from `dir` as `(file stem, contents)` pairs.
pub fn load_from_dir(dir: &Path) -> io::Result<Vec<(String, String)>> {
    if !dir.exists() {
        info!(path = %dir.display(), "seed directory not found; skipping load");
        return Ok(Vec::new());
    }
    let mut loaded: Vec<(String, String)> = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(e) => Some(e.path()),
            Err(e) => {
                warn!(error = %e, "failed to read seed dir entry");
                None
            }
        })
        .filter(|path| is_text_file(path.as_path()))
        .filter_map(|path| {
            let key = path.file_stem()?.to_str()?.trim().to_string();
            if key.is_empty() {
                return None;
            }
            read_file(&path).map(|contents| (key, contents))
        })
        .collect();
    loaded.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(loaded)
}

/// Store every seed file as a config entry, but only when no entry exists yet.
/// All entries land in one transaction, so a failed seed leaves config empty.
///
/// Returns the number of entries written.
pub async fn seed_if_empty(store: &TemplateStore, dir: &Path) -> Result<usize, PromptdeskError> {
    let existing = store.get_config().await?;
    if !existing.is_empty() {
        info!(
            entries = existing.len(),
            "config already populated; skipping seed"
        );
        return Ok(0);
    }

    let entries = load_from_dir(dir)?;
    let written = store.seed_config(&entries).await?;
    info!(path = %dir.display(), entries = written, "config seeded");
    Ok(written)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"))
        == Some(true)
}

fn read_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read seed file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_text_and_markdown_files_are_seeded() {
        assert!(is_text_file(Path::new("systemPrompt.txt")));
        assert!(is_text_file(Path::new("knowledgeBase.MD")));
        assert!(!is_text_file(Path::new("manual.pdf")));
        assert!(!is_text_file(Path::new("README")));
    }
}
