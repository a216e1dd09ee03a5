//! Versioned world state, key history and the transaction simulator that
//! chaincode runs against during endorsement.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use boxoffice_core::ValidationCode;

/// Height at which a key was last written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub block: u64,
    pub tx: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRead {
    pub key: String,
    /// `None` when the key did not exist at simulation time.
    pub version: Option<Version>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWrite {
    pub key: String,
    /// `None` deletes the key.
    pub value: Option<Vec<u8>>,
}

/// Simulation results carried from endorsement to commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWriteSet {
    pub reads: Vec<KeyRead>,
    pub writes: Vec<KeyWrite>,
}

impl ReadWriteSet {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// One committed change to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub value: Option<Vec<u8>>,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
}

#[derive(Debug, Clone)]
struct VersionedValue {
    value: Vec<u8>,
    version: Version,
}

#[derive(Debug, Default)]
pub struct WorldState {
    entries: BTreeMap<String, VersionedValue>,
    history: HashMap<String, Vec<KeyModification>>,
    seen_tx: HashSet<String>,
    height: u64,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(|v| v.value.as_slice())
    }

    pub fn version(&self, key: &str) -> Option<Version> {
        self.entries.get(key).map(|v| v.version)
    }

    /// Keys in `[start, end)`; an empty bound is open.
    pub fn range<'a>(
        &'a self,
        start: &'a str,
        end: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [u8], Version)> + 'a {
        self.entries
            .range::<str, _>((
                if start.is_empty() {
                    std::ops::Bound::Unbounded
                } else {
                    std::ops::Bound::Included(start)
                },
                if end.is_empty() {
                    std::ops::Bound::Unbounded
                } else {
                    std::ops::Bound::Excluded(end)
                },
            ))
            .map(|(k, v)| (k.as_str(), v.value.as_slice(), v.version))
    }

    pub fn history(&self, key: &str) -> &[KeyModification] {
        self.history.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of blocks committed so far.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn has_seen(&self, tx_id: &str) -> bool {
        self.seen_tx.contains(tx_id)
    }

    /// MVCC check: every key read during simulation must still be at the
    /// version it was read at.
    pub fn validate(&self, rwset: &ReadWriteSet) -> ValidationCode {
        let stale = rwset
            .reads
            .iter()
            .any(|read| self.version(&read.key) != read.version);
        if stale {
            ValidationCode::MvccReadConflict
        } else {
            ValidationCode::Valid
        }
    }

    /// Append a single-transaction block. Writes are applied only when `code`
    /// is VALID; the block is cut and the tx id recorded either way.
    pub fn commit_block(
        &mut self,
        tx_id: &str,
        rwset: &ReadWriteSet,
        code: &ValidationCode,
        timestamp: DateTime<Utc>,
    ) -> u64 {
        let block = self.height;
        self.height += 1;
        self.seen_tx.insert(tx_id.to_string());
        if !code.is_valid() {
            return block;
        }

        let version = Version { block, tx: 0 };
        for write in &rwset.writes {
            match &write.value {
                Some(value) => {
                    self.entries.insert(
                        write.key.clone(),
                        VersionedValue {
                            value: value.clone(),
                            version,
                        },
                    );
                }
                None => {
                    self.entries.remove(&write.key);
                }
            }
            self.history
                .entry(write.key.clone())
                .or_default()
                .push(KeyModification {
                    tx_id: tx_id.to_string(),
                    value: write.value.clone(),
                    timestamp,
                    is_delete: write.value.is_none(),
                });
        }
        block
    }
}

// ── Simulator ─────────────────────────────────────────────────────────────────

/// Chaincode's view of world state during endorsement.
///
/// Reads see committed state only (no read-your-writes). Point and range
/// reads are recorded for MVCC validation; rich queries are not.
pub struct TxSimulator<'a> {
    state: &'a WorldState,
    reads: BTreeMap<String, Option<Version>>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl<'a> TxSimulator<'a> {
    pub fn new(state: &'a WorldState) -> Self {
        Self {
            state,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    pub fn get_state(&mut self, key: &str) -> Option<Vec<u8>> {
        self.reads
            .entry(key.to_string())
            .or_insert_with(|| self.state.version(key));
        self.state.get(key).map(<[u8]>::to_vec)
    }

    pub fn put_state(&mut self, key: &str, value: Vec<u8>) {
        self.writes.insert(key.to_string(), Some(value));
    }

    pub fn del_state(&mut self, key: &str) {
        self.writes.insert(key.to_string(), None);
    }

    pub fn get_state_by_range(&mut self, start: &str, end: &str) -> Vec<(String, Vec<u8>)> {
        let rows: Vec<(String, Vec<u8>, Version)> = self
            .state
            .range(start, end)
            .map(|(k, v, ver)| (k.to_string(), v.to_vec(), ver))
            .collect();
        rows.into_iter()
            .map(|(key, value, version)| {
                self.reads.entry(key.clone()).or_insert(Some(version));
                (key, value)
            })
            .collect()
    }

    /// Rich query over JSON values: `{"selector": {"field": value, ...}}`
    /// matches values whose top-level fields equal every selector field.
    pub fn get_query_result(&self, query: &str) -> Result<Vec<(String, Vec<u8>)>, String> {
        let query: Value =
            serde_json::from_str(query).map_err(|e| format!("invalid query: {e}"))?;
        let selector = query
            .get("selector")
            .and_then(Value::as_object)
            .ok_or_else(|| "query has no selector object".to_string())?;

        let rows = self
            .state
            .range("", "")
            .filter(|(_, value, _)| {
                let Ok(Value::Object(doc)) = serde_json::from_slice::<Value>(value) else {
                    return false;
                };
                selector.iter().all(|(field, want)| doc.get(field) == Some(want))
            })
            .map(|(key, value, _)| (key.to_string(), value.to_vec()))
            .collect();
        Ok(rows)
    }

    pub fn get_history_for_key(&self, key: &str) -> Vec<KeyModification> {
        self.state.history(key).to_vec()
    }

    pub fn into_rwset(self) -> ReadWriteSet {
        ReadWriteSet {
            reads: self
                .reads
                .into_iter()
                .map(|(key, version)| KeyRead { key, version })
                .collect(),
            writes: self
                .writes
                .into_iter()
                .map(|(key, value)| KeyWrite { key, value })
                .collect(),
        }
    }
}
