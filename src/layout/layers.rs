use super::*;

/// One occupied stretch of a layer, rebuilt on every full layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerUsage {
    pub layer: u32,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl LayerUsage {
    /// A usage blocks `[start, end]` when either of its edges falls inside
    /// the range (touching counts) or when it encloses the range.
    fn conflicts(&self, start: Timestamp, end: Timestamp) -> bool {
        let inside = |ts: Timestamp| ts >= start && ts <= end;
        inside(self.start) || inside(self.end) || (self.start <= start && self.end >= end)
    }
}

#[derive(Debug, Default)]
pub struct LayerPacker {
    flatten: bool,
    usage: Vec<LayerUsage>,
    layer_count: u32,
}

impl LayerPacker {
    pub fn new(flatten: bool) -> Self {
        Self {
            flatten,
            usage: Vec::new(),
            layer_count: 0,
        }
    }

    pub fn usage(&self) -> &[LayerUsage] {
        &self.usage
    }

    /// Lowest layer with no conflicting usage.
    pub fn next_free_layer(&self, start: Timestamp, end: Timestamp) -> u32 {
        let mut layer = 0;
        while self
            .usage
            .iter()
            .any(|usage| usage.layer == layer && usage.conflicts(start, end))
        {
            layer += 1;
        }
        layer
    }

    /// Resolves the layer of a top-level entry and records it, together with
    /// its phases, as used.
    pub fn place(&mut self, entry: &Entry, sentinels: &Sentinels) -> u32 {
        let (start, end) = entry.span(sentinels);
        let layer = match entry.layer {
            Some(layer) => layer,
            None => {
                let layer = if self.flatten {
                    self.next_free_layer(start, end)
                } else {
                    self.layer_count
                };
                self.layer_count += 1;
                layer
            }
        };
        self.record(layer, start, end);
        for phase in &entry.phases {
            let (start, end) = phase.span(sentinels);
            self.record(layer, start, end);
        }
        layer
    }

    fn record(&mut self, layer: u32, start: Timestamp, end: Timestamp) {
        self.usage.push(LayerUsage { layer, start, end });
    }
}

pub fn assign_layers(
    entries: &[Entry],
    flatten: bool,
    sentinels: &Sentinels,
) -> BTreeMap<EntryId, u32> {
    let mut packer = LayerPacker::new(flatten);
    entries
        .iter()
        .map(|entry| (entry.id, packer.place(entry, sentinels)))
        .collect()
}
