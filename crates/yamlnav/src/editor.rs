use yamlnav_core::classify::split_assignment;

use crate::cache::Cache;
use crate::host::{HostError, SourceId, TextHost};

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("line {line} has no `key: value` to edit: {text:?}")]
    Unparseable { line: usize, text: String },

    #[error("line {line} does not exist ({len} lines)")]
    NoSuchLine { line: usize, len: usize },

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Replace the inline value on 1-based `line` of `source`.
///
/// `prompt` receives the current value as its default and returns the
/// replacement, or `None` to cancel. An empty or unchanged answer leaves the
/// line alone. On success the cached results for `source` are dropped.
///
/// # Errors
///
/// Returns an error if the line does not exist, does not have a
/// `key: value` shape, or the host fails to read or write it.
pub fn edit_value<H, P>(
    host: &mut H,
    cache: &mut Cache,
    source: &SourceId,
    line: usize,
    prompt: P,
) -> Result<bool, EditError>
where
    H: TextHost + ?Sized,
    P: FnOnce(&str) -> Option<String>,
{
    let lines = host.read_lines(source)?;
    let text = line
        .checked_sub(1)
        .and_then(|idx| lines.get(idx))
        .ok_or(EditError::NoSuchLine {
            line,
            len: lines.len(),
        })?;
    let (prefix, current) = split_assignment(text).ok_or_else(|| EditError::Unparseable {
        line,
        text: text.clone(),
    })?;

    let Some(new_value) = prompt(current) else {
        return Ok(false);
    };
    let new_value = new_value.trim();
    if new_value.is_empty() || new_value == current {
        return Ok(false);
    }

    let replaced = format!("{prefix} {new_value}");
    host.replace_line(source, line, &replaced)?;
    // the same file is cached under its path and, when focused, as "current"
    cache.clear(Some(&source.cache_key()));
    match source {
        SourceId::CurrentBuffer => {
            if let Some(path) = host.buffer_name() {
                cache.clear(Some(path.as_str()));
            }
        }
        SourceId::File(path) => {
            if host.buffer_name().as_ref() == Some(path) {
                cache.clear(Some(crate::host::CURRENT_BUFFER_KEY));
            }
        }
    }
    tracing::info!(%source, line, value = new_value, "edited value");
    Ok(true)
}
