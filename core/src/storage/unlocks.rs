use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};

/// Record of locked cases the learner has unlocked, stored as JSON in the
/// workspace root. Keys come from [`crate::grading::case_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnlockRecord {
    pub keys: BTreeSet<String>,
}

impl UnlockRecord {
    pub const FILENAME: &str = ".qgrade-unlocked.json";

    /// Missing record file just means nothing is unlocked yet.
    pub fn load_or_default(filepath: impl AsRef<Path>) -> fsutil::Result<Self> {
        let filepath = filepath.as_ref();
        if !filepath.is_file() {
            return Ok(Self::default());
        }
        fsutil::read_json_with_deserialize(filepath)
    }

    pub fn save(&self, filepath: impl AsRef<Path>) -> fsutil::Result<()> {
        fsutil::write_json_with_mkdir(filepath, self)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Returns false if the key was already recorded.
    pub fn insert(&mut self, key: String) -> bool {
        self.keys.insert(key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_roundtrips_through_json() {
        let mut record = UnlockRecord::default();
        assert!(record.insert("abc123".to_owned()));
        assert!(!record.insert("abc123".to_owned()));

        let json = serde_json::to_string(&record).unwrap();
        let loaded: UnlockRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, record);
        assert!(loaded.contains("abc123"));
        assert!(!loaded.contains("zzz"));
    }
}
