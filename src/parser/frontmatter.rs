//! YAML frontmatter extraction for job files.
//!
//! Job files are UTF-8 markdown with a leading metadata block delimited by
//! lines containing only `---`. The block is parsed as YAML; unrecognized
//! keys are ignored by the typed deserializers, and indented lines belong
//! to nested values rather than top-level keys.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

/// Extract the raw frontmatter text between the opening and closing `---`
/// delimiter lines.
///
/// # Errors
///
/// Fails when the first line is not a delimiter or no closing delimiter
/// exists.
pub fn extract_frontmatter(content: &str) -> Result<&str> {
    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.trim() == "---" => {}
        _ => bail!("No frontmatter delimiter at start of content"),
    }

    // Byte offset of the block body, right after the first newline.
    let body_start = content
        .find('\n')
        .map(|i| i + 1)
        .unwrap_or(content.len());

    let mut offset = body_start;
    for line in content[body_start..].lines() {
        if line.trim() == "---" {
            return Ok(&content[body_start..offset]);
        }
        offset += line.len() + 1;
    }

    bail!("Frontmatter not closed with ---")
}

/// Parse a typed value out of a markdown file's frontmatter.
pub fn parse_from_markdown<T: DeserializeOwned>(content: &str, type_name: &str) -> Result<T> {
    let yaml = extract_frontmatter(content)?;
    serde_yaml::from_str(yaml)
        .with_context(|| format!("Failed to parse {type_name} from frontmatter"))
}

/// Rewrite one top-level `key: value` line inside the frontmatter block,
/// leaving every other byte of the file untouched.
///
/// Indented lines are nested values and never match. Returns the rewritten
/// content, or an error if the block is malformed or the key is absent.
pub fn rewrite_top_level_field(content: &str, key: &str, value: &str) -> Result<String> {
    // Validate delimiters up front so we never rewrite a non-job file.
    extract_frontmatter(content)?;

    let prefix = format!("{key}:");
    let mut out = String::with_capacity(content.len());
    let mut delimiters_seen = 0u8;
    let mut replaced = false;

    for line in content.lines() {
        if delimiters_seen < 2 && line.trim() == "---" {
            delimiters_seen += 1;
            out.push_str(line);
            out.push('\n');
            continue;
        }

        if delimiters_seen == 1 && !replaced && line.starts_with(&prefix) {
            out.push_str(&format!("{key}: {value}"));
            out.push('\n');
            replaced = true;
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }

    if !replaced {
        bail!("Frontmatter has no top-level '{key}' field");
    }

    // lines() drops a trailing newline; only add back what was there.
    if !content.ends_with('\n') {
        out.pop();
    }

    Ok(out)
}
