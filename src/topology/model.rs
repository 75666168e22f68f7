// topology/model.rs — NUMA topology data model.

use serde::{Deserialize, Serialize};

// ─── CellMeasurement ─────────────────────────────────────────────────────────

/// One NUMA cell as reported by a single producer.
///
/// `id` is the NUMA cell/node number. It is unique within one producer's
/// report but is not required to appear in (or be unique across) the other
/// producer's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellMeasurement {
    /// NUMA cell/node number.
    pub id: i64,
    /// CPU ids assigned to the cell, in the producer's order.
    pub cpuset: Vec<i64>,
    /// Total memory assigned to the cell (unit is producer-defined and
    /// treated opaquely here).
    pub memory: i64,
    /// CPUs currently in use within the cell.
    pub cpu_usage: i64,
    /// Memory currently in use within the cell.
    pub memory_usage: i64,
    /// CPU ids pinned to workloads.
    pub pinned_cpus: Vec<i64>,
}

// ─── ProducerTopology ────────────────────────────────────────────────────────

/// The JSON document persisted in each producer's text column:
/// `{ "cells": [CellMeasurement, …] }`.
///
/// An absent column means the producer has never reported; an empty `cells`
/// list is a report of zero cells. The two are distinct states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProducerTopology {
    pub cells: Vec<CellMeasurement>,
}

impl ProducerTopology {
    pub fn new(cells: Vec<CellMeasurement>) -> Self {
        Self { cells }
    }
}

// ─── AggregatedCell ──────────────────────────────────────────────────────────

/// One cell of the merged view returned to readers.
///
/// For a cell id reported by both producers, `cpu_usage` and `memory_usage`
/// are sums and `pinned_cpus` is the deduplicated union; `cpuset` and
/// `memory` come from the nova entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedCell {
    pub id: i64,
    pub cpuset: Vec<i64>,
    pub memory: i64,
    pub cpu_usage: i64,
    pub pinned_cpus: Vec<i64>,
    pub memory_usage: i64,
}

impl From<&CellMeasurement> for AggregatedCell {
    fn from(cell: &CellMeasurement) -> AggregatedCell {
        AggregatedCell {
            id: cell.id,
            cpuset: cell.cpuset.clone(),
            memory: cell.memory,
            cpu_usage: cell.cpu_usage,
            pinned_cpus: cell.pinned_cpus.clone(),
            memory_usage: cell.memory_usage,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
