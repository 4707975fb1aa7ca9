use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// Lists `.xlsx` file names in `dir`, sorted, skipping `exclude` if given.
pub fn list_spreadsheets(dir: &Path, exclude: Option<&str>) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        // Skip Excel lock files such as `~$data.xlsx`
        if !name.ends_with(".xlsx") || name.starts_with("~$") {
            continue;
        }
        if exclude == Some(name.as_str()) {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// Like [`list_spreadsheets`], but an empty result is an error: there is
/// nothing to choose from.
pub fn spreadsheet_choices(dir: &Path) -> Result<Vec<String>> {
    let names = list_spreadsheets(dir, None)?;
    if names.is_empty() {
        bail!("no .xlsx files in {}", dir.display());
    }
    Ok(names)
}
