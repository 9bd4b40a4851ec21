use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);
        match fs::remove_file(full_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_read_remove() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested").display().to_string());

        storage.write_file("session.json", b"{}").await.unwrap();
        assert_eq!(storage.read_file("session.json").await.unwrap(), b"{}");

        storage.remove_file("session.json").await.unwrap();
        assert!(storage.read_file("session.json").await.is_err());

        // removing twice is fine
        tokio_test::assert_ok!(storage.remove_file("session.json").await);
    }
}
