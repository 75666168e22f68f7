// topology/handlers.rs — read / write / delete orchestration.
//
// Wired to the REST boundary in rest/routes/numa_topologies.rs:
//   show_topologies    — load both producer payloads, merge, return the view
//   update_topologies  — upsert one or both producer payloads
//   delete_topologies  — load-then-delete with a concurrency check
//
// Each operation takes the caller's AuthContext explicitly and returns typed
// errors; mapping to HTTP status codes happens at the boundary.

use serde::{Deserialize, Serialize};

use crate::policy::{AuthContext, Permission, PolicyViolation};
use crate::topology::aggregate::merge;
use crate::topology::model::{AggregatedCell, CellMeasurement, ProducerTopology};
use crate::topology::store::{NumaTopologyRow, StoreError, TopologyStore};

// ─── View ─────────────────────────────────────────────────────────────────────

/// Merged read response for one resource provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumaTopologiesView {
    pub uuid: String,
    pub numa_topologies: Vec<AggregatedCell>,
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error("stored topology payload for resource provider {uuid} is not decodable: {source}")]
    CorruptPayload {
        uuid: String,
        source: serde_json::Error,
    },
    #[error("failed to encode topology payload: {0}")]
    Encode(#[from] serde_json::Error),
}

// ─── Operations ───────────────────────────────────────────────────────────────

/// Load the record for `uuid`, merge whichever producer payloads are present,
/// and return the combined per-cell view.
pub async fn show_topologies(
    store: &TopologyStore,
    auth: &AuthContext,
    uuid: &str,
) -> Result<NumaTopologiesView, TopologyError> {
    auth.can(Permission::Show)?;

    let record = store.get(uuid).await?;
    let nova = decode_producer(uuid, record.nova_numa_topology.as_deref())?;
    let zun = decode_producer(uuid, record.zun_numa_topology.as_deref())?;
    let numa_topologies = merge(
        nova.as_ref().map(|t| t.cells.as_slice()),
        zun.as_ref().map(|t| t.cells.as_slice()),
    );

    Ok(NumaTopologiesView {
        uuid: record.uuid,
        numa_topologies,
    })
}

/// Upsert one or both producer payloads for `uuid`.
///
/// When no record exists one is created holding exactly the supplied fields;
/// otherwise only the supplied fields are written, leaving the other
/// producer's stored payload untouched. Callers guarantee at least one field
/// is present (enforced at the validation boundary).
pub async fn update_topologies(
    store: &TopologyStore,
    auth: &AuthContext,
    uuid: &str,
    nova: Option<&[CellMeasurement]>,
    zun: Option<&[CellMeasurement]>,
) -> Result<NumaTopologyRow, TopologyError> {
    auth.can(Permission::Update)?;

    let nova_doc = nova.map(encode_producer).transpose()?;
    let zun_doc = zun.map(encode_producer).transpose()?;

    match store.get(uuid).await {
        Ok(_) => {
            if let Some(ref payload) = nova_doc {
                store.update_nova(uuid, payload).await?;
            }
            if let Some(ref payload) = zun_doc {
                store.update_zun(uuid, payload).await?;
            }
            Ok(store.get(uuid).await?)
        }
        Err(StoreError::NotFound { .. }) => Ok(store
            .create(uuid, nova_doc.as_deref(), zun_doc.as_deref())
            .await?),
        Err(e) => Err(e.into()),
    }
}

/// Delete the record for `uuid`.
///
/// The record is loaded first; the delete only matches the loaded
/// `updated_at`, so a write that lands in between surfaces as `Conflict`
/// instead of silently discarding the updater's data.
pub async fn delete_topologies(
    store: &TopologyStore,
    auth: &AuthContext,
    uuid: &str,
) -> Result<(), TopologyError> {
    auth.can(Permission::Delete)?;

    let record = store.get(uuid).await?;
    store.delete(uuid, &record.updated_at).await?;
    Ok(())
}

// ─── Codec helpers ────────────────────────────────────────────────────────────

fn encode_producer(cells: &[CellMeasurement]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ProducerTopology::new(cells.to_vec()))
}

fn decode_producer(
    uuid: &str,
    column: Option<&str>,
) -> Result<Option<ProducerTopology>, TopologyError> {
    column
        .map(|raw| {
            serde_json::from_str(raw).map_err(|source| TopologyError::CorruptPayload {
                uuid: uuid.to_string(),
                source,
            })
        })
        .transpose()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
