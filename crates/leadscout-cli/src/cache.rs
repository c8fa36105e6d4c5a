use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::record::PlaceRecord;

/// Read-through store of completed place records, one JSON file per
/// business category so runs over different categories don't collide.
///
/// Loaded in full at the start of a run, mutated in memory, written in full
/// on save. Not safe for concurrent multi-process writers.
#[derive(Debug)]
pub struct Cache {
    path: PathBuf,
    records: HashMap<String, PlaceRecord>,
}

impl Cache {
    pub fn file_name(category: &str) -> String {
        format!("places_cache.{category}.json")
    }

    /// Loads the cache. A missing file is an empty cache; a corrupt one is a
    /// hard error since crawling on unknown cache state would redo or
    /// clobber previous runs.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("Couldn't open cache {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Corrupt cache {}", path.display()))?
        } else {
            HashMap::new()
        };
        Ok(Self { path, records })
    }

    pub fn get(&self, place_id: &str) -> Option<&PlaceRecord> {
        self.records.get(place_id)
    }

    pub fn put(&mut self, place_id: String, record: PlaceRecord) {
        self.records.insert(place_id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &PlaceRecord)> {
        self.records.iter()
    }

    /// Writes the full map. Also used as a per-record checkpoint, so an
    /// interrupted run keeps every record completed before the interruption.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let file = File::create(&self.path)
            .with_context(|| format!("Couldn't write cache {}", self.path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.records)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> PlaceRecord {
        PlaceRecord {
            name: Some("Acme Bistro".into()),
            address: Some("1 Main St".into()),
            phone: None,
            website: Some("https://acmebistro.com".into()),
            hours: None,
            emails: vec!["info@acmebistro.com".into()],
        }
    }

    #[test]
    fn missing_file_is_an_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::load(dir.path().join("nope.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn round_trip_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Cache::file_name("restaurant"));

        let empty = Cache::load(&path).unwrap();
        empty.save().unwrap();
        assert!(Cache::load(&path).unwrap().is_empty());

        let mut cache = Cache::load(&path).unwrap();
        cache.put("place-1".into(), sample_record());
        cache.put("place-2".into(), PlaceRecord::default());
        cache.save().unwrap();

        let reloaded = Cache::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("place-1"), Some(&sample_record()));
        assert_eq!(reloaded.get("place-2"), Some(&PlaceRecord::default()));
    }

    #[test]
    fn corrupt_cache_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places_cache.retail.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Cache::load(&path).is_err());
    }
}
