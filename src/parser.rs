use crate::calendar;
use crate::config::TimelineConfig;
use crate::error::TimelineError;
use crate::ir::{Entry, EntryColor, EntryDate};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// An entry exactly as it appears in an input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<EntryColor>,
    #[serde(default, rename = "class", alias = "className", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resizeable: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<RawEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub entries: Vec<RawEntry>,
    /// Option overrides embedded next to the data, applied on top of the
    /// loaded config.
    pub options: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Entries(Vec<RawEntry>),
    Wrapped {
        #[serde(default)]
        options: Option<serde_json::Value>,
        data: Vec<RawEntry>,
    },
}

/// Reads a timeline document: either a bare entry array or an object with
/// `data` and optional `options`. JSON5 syntax is accepted.
pub fn parse_timeline(input: &str) -> Result<ParseOutput> {
    let value = match serde_json::from_str::<serde_json::Value>(input) {
        Ok(value) => value,
        Err(_) => json5::from_str::<serde_json::Value>(input)
            .map_err(|err| anyhow::anyhow!("Invalid timeline document: {err}"))?,
    };
    let document: Document = serde_json::from_value(value).map_err(|err| {
        anyhow::anyhow!("Expected an entry array or an object with `data`: {err}")
    })?;
    Ok(match document {
        Document::Entries(entries) => ParseOutput {
            entries,
            options: None,
        },
        Document::Wrapped { options, data } => ParseOutput {
            entries: data,
            options,
        },
    })
}

/// Resolves raw entries against the configured sentinels. Ids follow source
/// order; phases share their parent's id.
pub fn resolve_entries(raw: &[RawEntry], config: &TimelineConfig) -> Result<Vec<Entry>, TimelineError> {
    raw.iter()
        .enumerate()
        .map(|(idx, entry)| resolve_entry(idx, entry, config))
        .collect()
}

fn resolve_entry(idx: usize, raw: &RawEntry, config: &TimelineConfig) -> Result<Entry, TimelineError> {
    let start = resolve_date(raw.start.as_deref(), &config.dawn, EntryDate::Dawn)?;
    let end = resolve_date(raw.end.as_deref(), &config.infinity, EntryDate::Infinity)?;
    let phases = raw
        .phases
        .iter()
        .map(|phase| resolve_entry(idx, phase, config))
        .collect::<Result<Vec<_>, _>>()?;

    let mut entry = Entry::new(idx, start, end);
    entry.title = raw.title.clone();
    entry.color = raw.color.clone();
    entry.class_name = raw.class_name.clone();
    entry.z_index = raw.z_index;
    entry.layer = raw.layer;
    entry.draggable = raw.draggable;
    entry.resizeable = raw.resizeable;
    entry.phases = phases;
    entry.derive_phase_bounds();
    Ok(entry)
}

fn resolve_date(value: Option<&str>, sentinel: &str, open: EntryDate) -> Result<EntryDate, TimelineError> {
    match value {
        None => Ok(open),
        Some(text) if text == sentinel => Ok(open),
        Some(text) => calendar::parse_timestamp(text)
            .map(EntryDate::At)
            .ok_or_else(|| TimelineError::InvalidDate(text.to_string())),
    }
}
