use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Custom error type that implements Send
#[derive(Debug, Clone)]
pub struct StorageError(String);

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StorageError {}

impl From<String> for StorageError {
    fn from(s: String) -> Self {
        StorageError(s)
    }
}

impl From<&str> for StorageError {
    fn from(s: &str) -> Self {
        StorageError(s.to_string())
    }
}

/// A wallet address the app tracks, as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedWallet {
    pub name: String,
    pub address: String,
}

fn get_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn watchlist_path(dir: &Path) -> PathBuf {
    dir.join("watchlist.json")
}

fn rpc_path(dir: &Path) -> PathBuf {
    dir.join("rpc.txt")
}

fn load_watchlist_from(dir: &Path) -> Vec<WatchedWallet> {
    let path = watchlist_path(dir);
    match std::fs::read_to_string(&path) {
        Ok(data) => match serde_json::from_str::<Vec<WatchedWallet>>(&data) {
            Ok(wallets) => {
                log::info!("Loaded {} watched wallets from {:?}", wallets.len(), path);
                wallets
            }
            Err(e) => {
                log::error!("Failed to parse watchlist {:?}: {}", path, e);
                Vec::new()
            }
        },
        Err(_) => {
            log::info!("No watchlist at {:?}, starting empty", path);
            Vec::new()
        }
    }
}

fn save_watchlist_to(dir: &Path, wallets: &[WatchedWallet]) -> Result<(), StorageError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| StorageError(format!("Failed to create storage dir: {}", e)))?;

    let json = serde_json::to_string_pretty(wallets)
        .map_err(|e| StorageError(format!("Failed to serialize watchlist: {}", e)))?;

    let path = watchlist_path(dir);
    std::fs::write(&path, json)
        .map_err(|e| StorageError(format!("Failed to write {:?}: {}", path, e)))?;

    log::info!("Saved {} watched wallets to {:?}", wallets.len(), path);
    Ok(())
}

/// Load the watched-wallet list. Missing or unreadable files yield an
/// empty list so the app starts with the empty state instead of failing.
pub fn load_watchlist() -> Vec<WatchedWallet> {
    load_watchlist_from(&get_storage_dir())
}

/// Write an empty watchlist file on first launch so users have a file to
/// put addresses into. Existing files are left alone.
pub fn ensure_watchlist_file() -> Result<(), StorageError> {
    let dir = get_storage_dir();
    if watchlist_path(&dir).exists() {
        return Ok(());
    }
    save_watchlist_to(&dir, &[])
}

/// Load the custom RPC endpoint, if one was saved.
pub fn load_rpc_from_storage() -> Option<String> {
    let path = rpc_path(&get_storage_dir());
    match std::fs::read_to_string(&path) {
        Ok(data) => {
            let trimmed = data.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("solfolio-storage-tests")
            .join(format!("{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_watchlist_round_trip() {
        let dir = temp_dir("round-trip");
        let wallets = vec![
            WatchedWallet {
                name: "Main".to_string(),
                address: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string(),
            },
            WatchedWallet {
                name: "Cold".to_string(),
                address: "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".to_string(),
            },
        ];

        save_watchlist_to(&dir, &wallets).unwrap();
        assert_eq!(load_watchlist_from(&dir), wallets);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_watchlist_is_empty() {
        let dir = temp_dir("missing");
        assert!(load_watchlist_from(&dir).is_empty());
    }

    #[test]
    fn test_corrupt_watchlist_is_empty() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(watchlist_path(&dir), "{ not valid json").unwrap();
        assert!(load_watchlist_from(&dir).is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
