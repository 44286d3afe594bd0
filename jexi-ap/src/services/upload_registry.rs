//! Uploaded-file registry
//!
//! Holds files between upload and confirmation. Confirming a file takes
//! its record out of the registry; the job owns the stored path from then
//! on.

use crate::models::UploadedFile;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct UploadRegistry {
    files: RwLock<HashMap<String, UploadedFile>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, UploadedFile>> {
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, UploadedFile>> {
        self.files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, file: UploadedFile) {
        self.write().insert(file.file_id.clone(), file);
    }

    pub fn get(&self, file_id: &str) -> Option<UploadedFile> {
        self.read().get(file_id).cloned()
    }

    /// Consume the record; a file id confirms at most once
    pub fn take(&self, file_id: &str) -> Option<UploadedFile> {
        self.write().remove(file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn take_consumes_the_record() {
        let registry = UploadRegistry::new();
        let file = UploadedFile::new("a.mp3".into(), PathBuf::from("/tmp/a.mp3"), None);
        let file_id = file.file_id.clone();
        registry.insert(file);

        assert!(registry.get(&file_id).is_some());
        assert!(registry.take(&file_id).is_some());
        // Second confirmation attempt finds nothing
        assert!(registry.take(&file_id).is_none());
    }
}
