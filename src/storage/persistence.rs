//! Vault persistence layer
//!
//! Provides save/load functionality for wallet and transaction records.
//! Snapshots are re-validated on load; one that breaks an ownership,
//! threshold or approval invariant is refused.

use crate::multisig::MultisigManager;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub vault_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".vault_data"),
            vault_file: "vault.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Vault storage manager
#[derive(Debug)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    fn vault_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.vault_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.vault_file, index))
    }

    /// Save the vault to disk
    pub fn save(&self, manager: &MultisigManager) -> Result<(), StorageError> {
        let path = self.vault_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("vault.tmp");
        {
            let file = fs::File::create(&temp_path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, manager)?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!(
            "Vault saved: {} wallets, {} transactions",
            manager.wallet_count(),
            manager.transaction_count()
        );
        Ok(())
    }

    /// Load the vault from disk
    pub fn load(&self) -> Result<MultisigManager, StorageError> {
        let path = self.vault_path();

        if !path.exists() {
            return Err(StorageError::InvalidData("Vault file not found".to_string()));
        }

        read_verified(&path)
    }

    /// Load the vault, or start an empty one if nothing was saved yet
    pub fn load_or_default(&self) -> Result<MultisigManager, StorageError> {
        if self.exists() {
            self.load()
        } else {
            Ok(MultisigManager::new())
        }
    }

    /// Check if a saved vault exists
    pub fn exists(&self) -> bool {
        self.vault_path().exists()
    }

    /// Delete the saved vault
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.vault_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<MultisigManager, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_verified(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.vault_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

fn read_verified(path: &Path) -> Result<MultisigManager, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let manager: MultisigManager = serde_json::from_reader(reader)?;

    manager.verify_integrity().map_err(|e| {
        log::warn!("Refusing vault snapshot {:?}: {}", path, e);
        StorageError::InvalidData(e.to_string())
    })?;

    Ok(manager)
}

/// Save the vault to a specific file path
pub fn save_to_file(manager: &MultisigManager, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, manager)?;
    Ok(())
}

/// Load the vault from a specific file path
pub fn load_from_file(path: &Path) -> Result<MultisigManager, StorageError> {
    read_verified(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::TransactionStatus;
    use rust_decimal::Decimal;

    fn sample_manager() -> (MultisigManager, String) {
        let mut manager = MultisigManager::new();
        let wallet = manager
            .create_wallet(
                "Treasury",
                vec!["A".to_string(), "B".to_string(), "C".to_string()],
                2,
            )
            .unwrap();
        let tx = manager
            .propose_transaction(&wallet.id, "A", "0xrecipient", Decimal::new(5, 0), "Audit")
            .unwrap();
        manager.approve(&tx.id, "B").unwrap();
        (manager, tx.id)
    }

    fn temp_storage(dir: &tempfile::TempDir, max_backups: usize) -> Storage {
        Storage::new(StorageConfig {
            data_dir: dir.path().to_path_buf(),
            max_backups,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_save_load_vault() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&temp_dir, 5);
        let (manager, tx_id) = sample_manager();

        storage.save(&manager).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.wallet_count(), 1);
        assert_eq!(loaded.transaction_count(), 1);
        assert_eq!(
            loaded.get_transaction(&tx_id).unwrap().status,
            TransactionStatus::Approved
        );
    }

    #[test]
    fn test_ids_continue_after_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&temp_dir, 5);
        let (manager, _) = sample_manager();
        storage.save(&manager).unwrap();

        let mut loaded = storage.load().unwrap();
        let wallet = loaded
            .create_wallet("Second", vec!["D".to_string()], 1)
            .unwrap();
        assert_eq!(wallet.id, "wallet-2");
    }

    #[test]
    fn test_load_missing_and_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&temp_dir, 5);

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
        assert_eq!(storage.load_or_default().unwrap().wallet_count(), 0);

        let (manager, _) = sample_manager();
        storage.save(&manager).unwrap();
        assert!(storage.stats().unwrap().file_size > 0);
        storage.delete().unwrap();
        assert!(!storage.exists());
    }

    #[test]
    fn test_rejects_snapshot_with_broken_threshold() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&temp_dir, 5);
        let (manager, _) = sample_manager();
        storage.save(&manager).unwrap();

        // Tamper: threshold above owner count
        let path = temp_dir.path().join("vault.json");
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["registry"]["wallets"]["wallet-1"]["threshold"] = serde_json::json!(7);
        fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_rejects_snapshot_with_overlapping_actions() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&temp_dir, 5);
        let (manager, tx_id) = sample_manager();
        storage.save(&manager).unwrap();

        let path = temp_dir.path().join("vault.json");
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["ledger"]["transactions"][&tx_id]["rejections"] = serde_json::json!(["B"]);
        fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_rejects_snapshot_with_rewound_counters() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&temp_dir, 5);
        let (manager, _) = sample_manager();
        storage.save(&manager).unwrap();

        let path = temp_dir.path().join("vault.json");
        let original = fs::read_to_string(&path).unwrap();
        for counter in ["registry", "ledger"] {
            let mut json: serde_json::Value = serde_json::from_str(&original).unwrap();
            json[counter]["nonce"] = serde_json::json!(0);
            fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

            assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
        }
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&temp_dir, 3);
        let (mut manager, _) = sample_manager();

        for i in 0..5 {
            storage.save(&manager).unwrap();
            manager
                .create_wallet(&format!("Wallet {}", i), vec!["A".to_string()], 1)
                .unwrap();
        }

        let backups = storage.list_backups();
        assert_eq!(backups, vec![0, 1, 2]);

        // Newest backup is the save before last
        let restored = storage.restore_backup(0).unwrap();
        assert_eq!(restored.wallet_count(), 4);
        assert!(storage.restore_backup(7).is_err());
        assert_eq!(storage.stats().unwrap().backup_count, 3);
    }

    #[test]
    fn test_export_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (manager, _) = sample_manager();
        let path = temp_dir.path().join("export.json");

        save_to_file(&manager, &path).unwrap();
        let imported = load_from_file(&path).unwrap();
        assert_eq!(imported.wallet_count(), manager.wallet_count());
    }
}
