//! Chain persistence: load, save, and rotate the on-disk chain file.
//!
//! Unlike [`crate::consensus`](in the teacher crate this was adapted
//! from)'s pluggable `BlockStore` trait, a single node only ever talks
//! to one chain file for its whole lifetime, so `ChainStore` is a
//! concrete struct rather than a trait object — there is nothing here
//! that benefits from being swapped out at runtime.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use sha2::{Digest, Sha256};

use crate::config::{ChainFormat, NodeConfig};
use crate::errors::StoreError;
use crate::types::Block;
use crate::validator;

/// Owns the in-memory chain and knows how to load, save, and rotate its
/// on-disk representation.
pub struct ChainStore {
    chain: Vec<Block>,
    path: PathBuf,
    format: ChainFormat,
    difficulty: u32,
}

impl ChainStore {
    /// Opens the chain file named in `config`.
    ///
    /// If `config.force_new_chain` is set, any existing file is rotated
    /// aside (never deleted) and the node starts from a fresh
    /// genesis-only chain. Otherwise an existing file is loaded, and a
    /// missing one is treated as the same fresh-start case — this is
    /// the only situation in which [`StoreError::ChainNotFound`] is
    /// caught rather than propagated.
    pub fn open(config: &NodeConfig) -> Result<Self, StoreError> {
        let exists = config.chain_path.exists();

        if config.force_new_chain && exists {
            rotate_aside(&config.chain_path)?;
        }

        let chain = if !config.force_new_chain && exists {
            let loaded = load(&config.chain_path, config.format)?;
            if !validator::is_chain_valid(&loaded, config.difficulty) {
                return Err(StoreError::ChainInvariantViolation);
            }
            loaded
        } else {
            vec![Block::genesis()]
        };

        Ok(Self {
            chain,
            path: config.chain_path.clone(),
            format: config.format,
            difficulty: config.difficulty,
        })
    }

    pub fn tip(&self) -> &Block {
        self.chain.last().expect("chain always has at least a genesis block")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn snapshot(&self) -> Vec<Block> {
        self.chain.clone()
    }

    /// Appends `block` if doing so keeps the chain valid. Discards it
    /// silently (returning `Ok(false)`) if the current tip has moved
    /// on from under it — the caller (the mining loop) is expected to
    /// treat that as "someone else got there first" rather than an
    /// error.
    pub fn try_append(&mut self, block: Block) -> Result<bool, StoreError> {
        if block.index != self.tip().index + 1 || block.previous_hash != validator::hash(self.tip()) {
            return Ok(false);
        }

        let mut candidate = self.chain.clone();
        candidate.push(block);
        if !validator::is_chain_valid(&candidate, self.difficulty) {
            return Ok(false);
        }

        self.chain = candidate;
        Ok(true)
    }

    /// Replaces the whole chain, e.g. after consensus adopts a longer
    /// valid chain from a peer. Returns the blocks that were on the old
    /// chain but are not on `new_chain`, so the mempool can replay their
    /// messages. The caller must have already validated `new_chain`.
    pub fn replace(&mut self, new_chain: Vec<Block>) -> Vec<Block> {
        let new_ids: std::collections::HashSet<&str> =
            new_chain.iter().map(|b| b.data.id()).collect();

        let orphaned: Vec<Block> = self
            .chain
            .drain(..)
            .filter(|b| !b.is_genesis() && !new_ids.contains(b.data.id()))
            .collect();

        self.chain = new_chain;
        orphaned
    }

    /// Reports whether persisting now would actually change anything on
    /// disk: true if the hash file is missing, or if it disagrees with
    /// the hash of the chain as it would serialize today. Lets the
    /// backup task skip rewriting (and rotating aside) an unchanged
    /// chain file on every tick.
    pub fn needs_backup(&self) -> Result<bool, StoreError> {
        let hash_path = hash_path_for(&self.path);
        if !hash_path.exists() {
            return Ok(true);
        }
        let on_disk = fs::read_to_string(&hash_path)?;
        let current = serialize(&self.chain, self.format).map(|bytes| {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            hex::encode(hasher.finalize())
        })?;
        Ok(on_disk.trim() != current)
    }

    /// Serializes the current chain to `path` in the configured format,
    /// rotating any existing file aside first and writing a `.hash`
    /// companion of the new file's SHA-256 digest.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if self.path.exists() {
            rotate_aside(&self.path)?;
        }

        let bytes = serialize(&self.chain, self.format)?;
        fs::write(&self.path, &bytes)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        fs::write(hash_path_for(&self.path), hex::encode(hasher.finalize()))?;

        Ok(())
    }
}

fn serialize(chain: &[Block], format: ChainFormat) -> Result<Vec<u8>, StoreError> {
    match format {
        ChainFormat::Json => serde_json::to_vec_pretty(chain)
            .map_err(|e| StoreError::ChainCorrupt(e.to_string())),
        ChainFormat::Binary => {
            bincode::serde::encode_to_vec(chain, bincode::config::standard())
                .map_err(|e| StoreError::ChainCorrupt(e.to_string()))
        }
    }
}

fn load(path: &Path, format: ChainFormat) -> Result<Vec<Block>, StoreError> {
    let bytes = fs::read(path).map_err(|error| {
        if error.kind() == std::io::ErrorKind::NotFound {
            StoreError::ChainNotFound
        } else {
            StoreError::Io(error)
        }
    })?;

    let hash_path = hash_path_for(path);
    if hash_path.exists() {
        let expected = fs::read_to_string(&hash_path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let actual = hex::encode(hasher.finalize());
        if expected.trim() != actual {
            return Err(StoreError::ChainCorrupt(
                "on-disk hash file does not match the chain file's contents".to_string(),
            ));
        }
    }

    match format {
        ChainFormat::Json => {
            serde_json::from_slice(&bytes).map_err(|e| StoreError::ChainCorrupt(e.to_string()))
        }
        ChainFormat::Binary => bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map(|(chain, _)| chain)
            .map_err(|e| StoreError::ChainCorrupt(e.to_string())),
    }
}

/// `<chain_path_without_extension>.hash`, e.g. `chain.json` ->
/// `chain.hash`. Matches the original implementation's
/// `os.path.splitext(path_to_chain)[0] + ".hash"`, which drops the
/// extension entirely rather than appending to it.
fn hash_path_for(path: &Path) -> PathBuf {
    path.with_extension("hash")
}

/// Renames an existing chain file (and its `.hash` companion, if any)
/// out of the way with a local-time timestamp suffix, so `save` never
/// clobbers a previous chain snapshot.
fn rotate_aside(path: &Path) -> Result<(), StoreError> {
    let suffix = Local::now().format("%d-%m-%Y_%H:%M:%S");
    let rotated = append_suffix(path, &suffix.to_string());
    fs::rename(path, rotated)?;

    let hash_path = hash_path_for(path);
    if hash_path.exists() {
        let rotated_hash = append_suffix(&hash_path, &suffix.to_string());
        fs::rename(hash_path, rotated_hash)?;
    }

    Ok(())
}

/// `<stem>_<suffix><ext>`, e.g. `chain.json` with suffix
/// `28-07-2026_09:15:00` becomes `chain_28-07-2026_09:15:00.json`.
/// Matches the original implementation's rotation naming
/// (`filename + "_" + timestamp + file_extension`): the timestamp sits
/// between the stem and the extension, not appended after it.
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .expect("chain path has a file stem")
        .to_string_lossy();
    let mut name = format!("{stem}_{suffix}");
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Envelope, ProofValue};

    fn config_in(dir: &Path) -> NodeConfig {
        NodeConfig {
            chain_path: dir.join("chain.json"),
            format: ChainFormat::Json,
            difficulty: 1,
            ..NodeConfig::default()
        }
    }

    #[test]
    fn open_with_no_file_starts_from_genesis_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChainStore::open(&config_in(dir.path())).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.tip().is_genesis());
    }

    #[test]
    fn hash_path_strips_the_extension_rather_than_appending_to_it() {
        let hash_path = hash_path_for(Path::new("/data/chain.json"));
        assert_eq!(hash_path, Path::new("/data/chain.hash"));
    }

    #[test]
    fn rotated_suffix_sits_between_stem_and_extension() {
        let rotated = append_suffix(Path::new("/data/chain.json"), "28-07-2026_09:15:00");
        assert_eq!(rotated, Path::new("/data/chain_28-07-2026_09:15:00.json"));
    }

    #[test]
    fn save_then_open_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut store = ChainStore::open(&config).unwrap();

        let child = Block {
            index: 1,
            timestamp: store.tip().timestamp + chrono::Duration::seconds(1),
            data: Envelope::new("hello").unwrap(),
            proof: ProofValue::Value(1),
            previous_hash: validator::hash(store.tip()),
        };
        assert!(store.try_append(child).unwrap());
        store.save().unwrap();

        let reopened = ChainStore::open(&config).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn force_new_chain_rotates_existing_file_aside() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        let store = ChainStore::open(&config).unwrap();
        store.save().unwrap();

        config.force_new_chain = true;
        let restarted = ChainStore::open(&config).unwrap();
        assert_eq!(restarted.len(), 1);

        let rotated_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.starts_with("chain_") && name.ends_with(".json")
            })
            .collect();
        assert!(!rotated_files.is_empty());
    }

    #[test]
    fn load_missing_file_reports_chain_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.json"), ChainFormat::Json).unwrap_err();
        assert!(matches!(err, StoreError::ChainNotFound));
    }

    #[test]
    fn try_append_rejects_stale_parent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ChainStore::open(&config_in(dir.path())).unwrap();

        let stale = Block {
            index: 1,
            timestamp: store.tip().timestamp,
            data: Envelope::new("hello").unwrap(),
            proof: ProofValue::Value(1),
            previous_hash: "not the real previous hash".repeat(3),
        };
        assert!(!store.try_append(stale).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn needs_backup_is_false_immediately_after_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChainStore::open(&config_in(dir.path())).unwrap();
        assert!(store.needs_backup().unwrap());
        store.save().unwrap();
        assert!(!store.needs_backup().unwrap());
    }

    #[test]
    fn needs_backup_is_true_after_appending_a_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ChainStore::open(&config_in(dir.path())).unwrap();
        store.save().unwrap();
        assert!(!store.needs_backup().unwrap());

        let child = Block {
            index: 1,
            timestamp: store.tip().timestamp + chrono::Duration::seconds(1),
            data: Envelope::new("hello").unwrap(),
            proof: ProofValue::Value(1),
            previous_hash: validator::hash(store.tip()),
        };
        assert!(store.try_append(child).unwrap());
        assert!(store.needs_backup().unwrap());
    }

    #[test]
    fn corrupt_hash_file_is_reported_as_chain_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let store = ChainStore::open(&config).unwrap();
        store.save().unwrap();

        fs::write(hash_path_for(&config.chain_path), "0".repeat(64)).unwrap();

        let err = ChainStore::open(&config).unwrap_err();
        assert!(matches!(err, StoreError::ChainCorrupt(_)));
    }
}
