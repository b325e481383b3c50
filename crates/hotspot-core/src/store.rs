//! On-disk feature/label store.
//!
//! A store is a directory holding `features.json` and `labels.json`, each a
//! JSON array of row objects keyed by `(week, lat, lon)`. Missing numeric
//! values are written as `null`. Writes go through a temporary file in the
//! same directory and are renamed into place, so a reader sees either the old
//! file or the new one.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{HotspotError, Result};
use crate::features::WeeklyFeatureRow;
use crate::labels::LabelRow;

pub const FEATURES_FILE: &str = "features.json";
pub const LABELS_FILE: &str = "labels.json";

/// Serialize `value` to `path` atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| HotspotError::io(dir, e))?;

    let tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".json")
        .tempfile_in(dir)
        .map_err(|e| HotspotError::io(dir, e))?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        serde_json::to_writer(&mut w, value)?;
        w.flush().map_err(|e| HotspotError::io(tmp.path(), e))?;
    }
    tmp.as_file().sync_all().map_err(|e| HotspotError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| HotspotError::io(path, e.error))?;
    Ok(())
}

/// Read a JSON document from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path).map_err(|e| HotspotError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Feature/label tables under one directory.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    dir: PathBuf,
}

impl FeatureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn features_path(&self) -> PathBuf {
        self.dir.join(FEATURES_FILE)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.dir.join(LABELS_FILE)
    }

    pub fn save_features(&self, rows: &[WeeklyFeatureRow]) -> Result<()> {
        let path = self.features_path();
        write_json_atomic(&path, rows)?;
        tracing::info!(path = %path.display(), rows = rows.len(), "wrote feature table");
        Ok(())
    }

    pub fn save_labels(&self, rows: &[LabelRow]) -> Result<()> {
        let path = self.labels_path();
        write_json_atomic(&path, rows)?;
        tracing::info!(path = %path.display(), rows = rows.len(), "wrote label table");
        Ok(())
    }

    pub fn load_features(&self) -> Result<Vec<WeeklyFeatureRow>> {
        read_json(&self.features_path())
    }

    pub fn load_labels(&self) -> Result<Vec<LabelRow>> {
        read_json(&self.labels_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::week::IsoWeek;

    fn feature(week: &str, lat: f64, sst: f64) -> WeeklyFeatureRow {
        WeeklyFeatureRow {
            week: week.parse::<IsoWeek>().unwrap(),
            lat,
            lon: -80.0,
            sst,
            chl: 1.1,
            sst_anom: 0.25,
            month: 7,
        }
    }

    #[test]
    fn features_and_labels_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeatureStore::new(dir.path().join("nested/out"));
        let features = vec![feature("2024-W29", -12.0, 18.5), feature("2024-W30", -11.5, 18.7)];
        let labels: Vec<LabelRow> = features
            .iter()
            .map(|f| LabelRow { week: f.week, lat: f.lat, lon: f.lon, hotspot: 1 })
            .collect();

        store.save_features(&features).unwrap();
        store.save_labels(&labels).unwrap();

        assert_eq!(store.load_features().unwrap(), features);
        assert_eq!(store.load_labels().unwrap(), labels);
    }

    #[test]
    fn columns_have_stable_names_and_missing_is_null() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeatureStore::new(dir.path());
        store.save_features(&[feature("2024-W30", -12.0, f64::NAN)]).unwrap();

        let raw: serde_json::Value = read_json(&store.features_path()).unwrap();
        let obj = raw[0].as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["chl", "lat", "lon", "month", "sst", "sst_anom", "week"]);
        assert!(obj["sst"].is_null());
        assert_eq!(obj["week"], "2024-W30");

        let back = store.load_features().unwrap();
        assert!(back[0].sst.is_nan());
        assert!(!back[0].is_complete());
    }

    #[test]
    fn rewrite_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeatureStore::new(dir.path());
        store.save_features(&[feature("2024-W30", -12.0, 18.0)]).unwrap();
        store.save_features(&[feature("2024-W31", -12.0, 19.0), feature("2024-W31", -11.0, 19.5)]).unwrap();

        assert_eq!(store.load_features().unwrap().len(), 2);
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![FEATURES_FILE.to_string()]);
    }

    #[test]
    fn missing_store_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeatureStore::new(dir.path().join("absent"));
        assert!(matches!(store.load_labels(), Err(HotspotError::Io { .. })));
    }
}
