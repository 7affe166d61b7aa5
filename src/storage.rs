//! Local store for scouting records: one drawing snapshot and one block of
//! notes per team, keyed by team number. Last write wins.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub type TeamNumber = u32;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Errors that can occur while reading or writing scouting records
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to serialize scouting data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid drawing data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Stored scouting data for one team, in the same JSON shape the web tool used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutingData {
    pub team_number: TeamNumber,
    #[serde(rename = "drawingDataURL", default, skip_serializing_if = "Option::is_none")]
    pub drawing_data_url: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub last_modified: DateTime<Utc>,
}

/// What the canvas gets back when it asks for a team's saved state
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    /// Encoded raster of the whole canvas, if one was ever saved
    pub raster: Option<Vec<u8>>,
    pub notes: String,
    pub last_modified: DateTime<Utc>,
}

/// The storage collaborator consumed by canvas sessions
pub trait SnapshotStore {
    fn load_snapshot(&self, team: TeamNumber) -> StorageResult<Option<SnapshotRecord>>;

    fn save_snapshot(
        &mut self,
        team: TeamNumber,
        raster: &[u8],
        notes: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<()>;
}

/// Encode PNG bytes as a `data:` URL
pub fn to_data_url(png: &[u8]) -> String {
    let mut url = String::from(PNG_DATA_URL_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(png, &mut url);
    url
}

/// Decode the payload of a base64 `data:` URL. An empty string means no drawing.
pub fn from_data_url(url: &str) -> StorageResult<Option<Vec<u8>>> {
    if url.is_empty() {
        return Ok(None);
    }
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_mime, payload)| payload)
        .ok_or_else(|| StorageError::InvalidDataUrl("missing base64 header".to_owned()))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map(Some)
        .map_err(|err| StorageError::InvalidDataUrl(err.to_string()))
}

/// All scouting records, persisted with the app state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutingStore {
    records: BTreeMap<TeamNumber, ScoutingData>,
    #[serde(skip)]
    quota_bytes: Option<usize>,
}

impl ScoutingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once the serialized records would exceed `quota` bytes
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota_bytes = quota;
        self
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota_bytes = quota;
    }

    pub fn get(&self, team: TeamNumber) -> Option<&ScoutingData> {
        self.records.get(&team)
    }

    pub fn records(&self) -> &BTreeMap<TeamNumber, ScoutingData> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store a record, replacing the team's previous one.
    ///
    /// If the quota would be exceeded the store is left unchanged.
    pub fn put(&mut self, data: ScoutingData) -> StorageResult<()> {
        let team = data.team_number;
        let previous = self.records.insert(team, data);

        if let Some(quota) = self.quota_bytes {
            let needed = serde_json::to_vec(&self.records)?.len();
            if needed > quota {
                match previous {
                    Some(previous) => self.records.insert(team, previous),
                    None => self.records.remove(&team),
                };
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        Ok(())
    }

    /// Update a team's notes, keeping its drawing
    pub fn save_notes(&mut self, team: TeamNumber, notes: &str, timestamp: DateTime<Utc>) -> StorageResult<()> {
        let drawing_data_url = self.get(team).and_then(|data| data.drawing_data_url.clone());
        self.put(ScoutingData {
            team_number: team,
            drawing_data_url,
            notes: notes.to_owned(),
            last_modified: timestamp,
        })
    }

    pub fn delete_team(&mut self, team: TeamNumber) -> Option<ScoutingData> {
        self.records.remove(&team)
    }

    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    /// All records as pretty-printed JSON, keyed by team number
    pub fn export_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Replace every record with the ones in `json`.
    ///
    /// Invalid input, or records over the quota, leave the store untouched.
    pub fn import_json(&mut self, json: &str) -> StorageResult<usize> {
        let records: BTreeMap<TeamNumber, ScoutingData> = serde_json::from_str(json)?;
        if let Some(quota) = self.quota_bytes {
            let needed = serde_json::to_vec(&records)?.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        let count = records.len();
        self.records = records;
        Ok(count)
    }
}

impl SnapshotStore for ScoutingStore {
    fn load_snapshot(&self, team: TeamNumber) -> StorageResult<Option<SnapshotRecord>> {
        let Some(data) = self.get(team) else {
            return Ok(None);
        };
        let raster = match &data.drawing_data_url {
            Some(url) => from_data_url(url)?,
            None => None,
        };
        Ok(Some(SnapshotRecord {
            raster,
            notes: data.notes.clone(),
            last_modified: data.last_modified,
        }))
    }

    fn save_snapshot(
        &mut self,
        team: TeamNumber,
        raster: &[u8],
        notes: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.put(ScoutingData {
            team_number: team,
            drawing_data_url: Some(to_data_url(raster)),
            notes: notes.to_owned(),
            last_modified: timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_round_trip() {
        let bytes = [0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        let url = to_data_url(&bytes);
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(from_data_url(&url).unwrap(), Some(bytes.to_vec()));
    }

    #[test]
    fn test_empty_data_url_means_no_drawing() {
        assert_eq!(from_data_url("").unwrap(), None);
    }

    #[test]
    fn test_malformed_data_url_is_rejected() {
        assert!(matches!(
            from_data_url("not a url"),
            Err(StorageError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            from_data_url("data:image/png;base64,@@@"),
            Err(StorageError::InvalidDataUrl(_))
        ));
    }

    #[test]
    fn test_save_notes_keeps_drawing() {
        let mut store = ScoutingStore::new();
        let t0 = Utc::now();
        store.save_snapshot(7244, &[1, 2, 3], "", t0).unwrap();
        store.save_notes(7244, "fast intake", t0).unwrap();

        let record = store.load_snapshot(7244).unwrap().unwrap();
        assert_eq!(record.raster, Some(vec![1, 2, 3]));
        assert_eq!(record.notes, "fast intake");
    }

    #[test]
    fn test_json_uses_web_field_names() {
        let mut store = ScoutingStore::new();
        store.save_snapshot(42, &[9], "notes", Utc::now()).unwrap();
        let json = store.export_json().unwrap();
        assert!(json.contains("\"42\""));
        assert!(json.contains("\"teamNumber\": 42"));
        assert!(json.contains("\"drawingDataURL\""));
        assert!(json.contains("\"lastModified\""));
    }
}
