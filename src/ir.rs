use serde::{Serialize, Serializer};

use crate::calendar::{self, Timestamp};

/// Position of an entry in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntryId(pub usize);

/// One edge of an entry: a concrete timestamp or an unbounded sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDate {
    Dawn,
    At(Timestamp),
    Infinity,
}

impl EntryDate {
    pub fn is_dawn(&self) -> bool {
        matches!(self, Self::Dawn)
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Self::Infinity)
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::At(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn resolve(&self, sentinels: &Sentinels) -> Timestamp {
        match self {
            Self::Dawn => sentinels.dawn,
            Self::At(ts) => *ts,
            Self::Infinity => sentinels.infinity,
        }
    }
}

impl Serialize for EntryDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::At(ts) => serializer.serialize_str(&calendar::format_storage(*ts)),
            _ => serializer.serialize_none(),
        }
    }
}

/// Concrete timestamps standing in for the open ends of the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinels {
    pub dawn: Timestamp,
    pub infinity: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum EntryColor {
    Single(String),
    Bars(Vec<String>),
}

impl EntryColor {
    pub fn fill(&self) -> Option<&str> {
        match self {
            Self::Single(color) => Some(color.as_str()),
            Self::Bars(_) => None,
        }
    }

    pub fn bars(&self) -> &[String] {
        match self {
            Self::Single(_) => &[],
            Self::Bars(colors) => colors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(skip)]
    pub id: EntryId,
    #[serde(skip_serializing_if = "EntryDate::is_dawn")]
    pub start: EntryDate,
    #[serde(skip_serializing_if = "EntryDate::is_infinity")]
    pub end: EntryDate,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<EntryColor>,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resizeable: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<Entry>,
}

impl Entry {
    pub fn new(id: usize, start: EntryDate, end: EntryDate) -> Self {
        Self {
            id: EntryId(id),
            start,
            end,
            title: String::new(),
            color: None,
            class_name: None,
            z_index: None,
            layer: None,
            draggable: None,
            resizeable: None,
            phases: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_phases(mut self, phases: Vec<Entry>) -> Self {
        self.phases = phases;
        self.derive_phase_bounds();
        self
    }

    pub fn has_phases(&self) -> bool {
        !self.phases.is_empty()
    }

    pub fn is_infinite_start(&self) -> bool {
        self.start.is_dawn()
    }

    pub fn is_infinite_end(&self) -> bool {
        self.end.is_infinity()
    }

    /// A parent with phases spans from its first phase's start to its last
    /// phase's end.
    pub fn derive_phase_bounds(&mut self) {
        if let (Some(first), Some(last)) = (self.phases.first(), self.phases.last()) {
            self.start = first.start;
            self.end = last.end;
        }
    }

    pub fn span(&self, sentinels: &Sentinels) -> (Timestamp, Timestamp) {
        (self.start.resolve(sentinels), self.end.resolve(sentinels))
    }
}

/// Reassigns ids so they match source order again and re-derives phase
/// bounds. Phases share their parent's id.
pub fn renumber(entries: &mut [Entry]) {
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.id = EntryId(idx);
        entry.derive_phase_bounds();
        for phase in &mut entry.phases {
            phase.id = EntryId(idx);
        }
    }
}
