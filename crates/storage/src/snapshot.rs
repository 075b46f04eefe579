//! Whole-store snapshots
//!
//! A snapshot is a flat id → node mapping plus the root id and the commit
//! version. It is used for save/load by callers and for cloning a store
//! (undo systems, test fixtures). This crate does not persist anything.
//!
//! ## Binary Envelope
//!
//! ```text
//! +-------+--------+-------------+----------+-------------------+
//! | magic | format | payload_len | checksum | payload (msgpack) |
//! | 4B    | u16 LE | u32 LE      | u64 LE   | payload_len bytes |
//! +-------+--------+-------------+----------+-------------------+
//! ```
//!
//! The checksum is xxh3-64 of the payload. Any mismatch is reported as
//! [`Error::Corruption`].

use crate::table::NodeTable;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::Utc;
use folio_core::{Error, Node, NodeId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use xxhash_rust::xxh3::xxh3_64;

/// Envelope magic bytes
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"FOLS";

/// Current envelope format
pub const SNAPSHOT_FORMAT: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 4 + 8;

/// Point-in-time copy of a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every committed node, keyed by id
    pub nodes: BTreeMap<NodeId, Node>,
    /// Root node id
    pub root_id: NodeId,
    /// Commit version at export time
    pub version: u64,
    /// Export time (millis since epoch)
    pub exported_at: i64,
}

impl Snapshot {
    /// Build a snapshot from loose parts
    pub fn new<I>(nodes: I, root_id: impl Into<NodeId>, version: u64) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Snapshot {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            root_id: root_id.into(),
            version,
            exported_at: Utc::now().timestamp_millis(),
        }
    }

    /// Copy a table
    pub fn from_table(table: &NodeTable, root_id: &NodeId) -> Self {
        Snapshot {
            nodes: table.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            root_id: root_id.clone(),
            version: table.version(),
            exported_at: Utc::now().timestamp_millis(),
        }
    }

    /// Check internal consistency
    ///
    /// Every key must match its node's id and the root must be present.
    /// Dangling child or parent references are not checked.
    pub fn validate(&self) -> Result<()> {
        for (key, node) in &self.nodes {
            if *key != node.id {
                return Err(Error::Corruption(format!(
                    "snapshot key {} holds node {}",
                    key, node.id
                )));
            }
        }
        if !self.nodes.contains_key(&self.root_id) {
            return Err(Error::Corruption(format!(
                "snapshot root {} is missing",
                self.root_id
            )));
        }
        Ok(())
    }

    /// Turn the snapshot into a table carrying its version
    pub fn into_table(self) -> NodeTable {
        let version = self.version;
        let mut table: NodeTable = self.nodes.into_values().collect();
        table.set_version(version);
        table
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the snapshot holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Encode into the checksummed binary envelope
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = rmp_serde::to_vec_named(self)?;
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| Error::Serialization("snapshot exceeds 4 GiB".into()))?;

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&SNAPSHOT_MAGIC);
        out.write_u16::<LittleEndian>(SNAPSHOT_FORMAT)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        out.write_u32::<LittleEndian>(payload_len)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        out.write_u64::<LittleEndian>(xxh3_64(&payload))
            .map_err(|e| Error::Serialization(e.to_string()))?;
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Decode and verify a binary envelope
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Corruption(format!(
                "snapshot truncated: {} bytes, header needs {}",
                bytes.len(),
                HEADER_LEN
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        cursor
            .read_exact(&mut magic)
            .map_err(|e| Error::Corruption(e.to_string()))?;
        if magic != SNAPSHOT_MAGIC {
            return Err(Error::Corruption("bad snapshot magic".into()));
        }

        let format = read_header(cursor.read_u16::<LittleEndian>())?;
        if format != SNAPSHOT_FORMAT {
            return Err(Error::Corruption(format!(
                "unsupported snapshot format {}",
                format
            )));
        }

        let payload_len = read_header(cursor.read_u32::<LittleEndian>())? as usize;
        let checksum = read_header(cursor.read_u64::<LittleEndian>())?;

        let payload = &bytes[HEADER_LEN..];
        if payload.len() != payload_len {
            return Err(Error::Corruption(format!(
                "payload length {} does not match header {}",
                payload.len(),
                payload_len
            )));
        }
        if xxh3_64(payload) != checksum {
            return Err(Error::Corruption("snapshot checksum mismatch".into()));
        }

        let snapshot: Snapshot = rmp_serde::from_slice(payload)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Pretty JSON, for fixtures and debugging
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON produced by [`Snapshot::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

fn read_header<T>(r: std::io::Result<T>) -> Result<T> {
    r.map_err(|e| Error::Corruption(format!("snapshot header: {}", e)))
}
