use super::FaqDocument;
use crate::error::{FaqError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Collect every markdown file under `root` whose path (relative to `root`)
/// contains `filter`. An empty filter keeps everything.
pub fn load_documents(root: &Path, filter: &str) -> Result<Vec<FaqDocument>> {
    if !root.is_dir() {
        return Err(FaqError::IndexError(format!(
            "FAQ directory not found: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    collect_markdown_files(root, &mut files)?;
    files.sort();

    let mut documents = Vec::new();
    for path in files {
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        if !filter.is_empty() && !relative.contains(filter) {
            continue;
        }

        let raw = fs::read_to_string(&path)?;
        documents.push(parse_document(&relative, &raw)?);
    }

    Ok(documents)
}

fn collect_markdown_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_markdown_files(&path, files)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("md"))
            .unwrap_or(false)
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Split optional `---` fenced YAML frontmatter from the markdown body.
pub fn parse_document(filename: &str, raw: &str) -> Result<FaqDocument> {
    let (frontmatter, body) = split_frontmatter(raw);

    let mut metadata = match frontmatter {
        Some(yaml) if !yaml.trim().is_empty() => {
            match serde_yaml::from_str::<Value>(yaml).map_err(|e| {
                FaqError::IndexError(format!("Invalid frontmatter in {}: {}", filename, e))
            })? {
                Value::Object(map) => map,
                _ => Map::new(),
            }
        }
        _ => Map::new(),
    };

    let question = take_string(&mut metadata, "question");
    let section = take_string(&mut metadata, "section");
    let id = take_string(&mut metadata, "id");

    Ok(FaqDocument {
        filename: filename.to_string(),
        id,
        question,
        section,
        content: body.trim().to_string(),
        metadata,
    })
}

fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = match raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    {
        Some(rest) => rest,
        None => return (None, raw),
    };

    // Closing fence must sit on its own line
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let body = &rest[offset + line.len()..];
            return (Some(&rest[..offset]), body);
        }
        offset += line.len();
    }

    (None, raw)
}

fn take_string(metadata: &mut Map<String, Value>, key: &str) -> Option<String> {
    match metadata.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
