//! Live traffic events attached to edges
//!
//! Each edge carries a variable-length list of event codes. What a code means
//! is looked up in a [`TrafficEventTable`] supplied by the traffic feed.

use rustc_hash::FxHashMap;

use crate::graph::EdgeId;

/// How an event changes travel on the affected edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrafficEffect {
    /// Road is closed
    Blocked,
    /// Fixed delay in seconds added to the traversal time
    Delay(f64),
    /// Absolute speed limit in km/h
    SpeedCap(f64),
    /// Multiplier applied to the free-flow speed, in `(0, 1]`
    SpeedFactor(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficEvent {
    pub effect: TrafficEffect,
    /// Applies only to heavy goods vehicles
    pub heavy_vehicles_only: bool,
}

impl TrafficEvent {
    pub fn new(effect: TrafficEffect) -> Self {
        Self {
            effect,
            heavy_vehicles_only: false,
        }
    }

    pub fn heavy_only(effect: TrafficEffect) -> Self {
        Self {
            effect,
            heavy_vehicles_only: true,
        }
    }
}

/// Event code → meaning
#[derive(Debug, Clone, Default)]
pub struct TrafficEventTable {
    events: FxHashMap<u16, TrafficEvent>,
}

impl TrafficEventTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: u16, event: TrafficEvent) -> &mut Self {
        self.events.insert(code, event);
        self
    }

    pub fn get(&self, code: u16) -> Option<&TrafficEvent> {
        self.events.get(&code)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Event codes per edge in CSR layout, plus the table to interpret them
#[derive(Debug, Clone, Default)]
pub struct TrafficStore {
    offsets: Vec<u32>,
    codes: Vec<u16>,
    table: TrafficEventTable,
}

impl TrafficStore {
    /// `per_edge[e]` lists the codes active on edge `e`
    pub fn new(per_edge: Vec<Vec<u16>>, table: TrafficEventTable) -> Self {
        let mut offsets = Vec::with_capacity(per_edge.len() + 1);
        let mut codes = Vec::new();
        offsets.push(0);
        for list in per_edge {
            codes.extend(list);
            offsets.push(codes.len() as u32);
        }
        Self {
            offsets,
            codes,
            table,
        }
    }

    /// Codes on `edge`, empty for edges without events
    pub fn codes(&self, edge: EdgeId) -> &[u16] {
        let e = edge as usize;
        if e + 1 >= self.offsets.len() {
            return &[];
        }
        &self.codes[self.offsets[e] as usize..self.offsets[e + 1] as usize]
    }

    pub fn table(&self) -> &TrafficEventTable {
        &self.table
    }
}
