// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static crop-disease knowledge base.
//!
//! The built-in data set (`data/diseases.json`) is compiled into the binary
//! and checked on load: every disease listed under a crop must exist, and a
//! `healthy` record must be present.

use std::collections::BTreeMap;

use fasal_core::{CropInfo, DiseaseRecord, FasalError, KnowledgeBase, HEALTHY_KEY};
use serde::Deserialize;
use tracing::debug;

const BUILTIN: &str = include_str!("../data/diseases.json");

/// On-disk layout of a knowledge base file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DataFile {
    crops: Vec<CropInfo>,
    diseases: BTreeMap<String, DiseaseRecord>,
}

/// Knowledge base backed by an immutable in-memory data set.
#[derive(Debug, Clone)]
pub struct StaticKnowledgeBase {
    records: BTreeMap<String, DiseaseRecord>,
    crops: Vec<CropInfo>,
    healthy: DiseaseRecord,
}

impl StaticKnowledgeBase {
    /// Loads the data set shipped with the crate.
    pub fn builtin() -> Result<Self, FasalError> {
        Self::from_json(BUILTIN)
    }

    /// Parses and checks a knowledge base in the `diseases.json` layout.
    pub fn from_json(json: &str) -> Result<Self, FasalError> {
        let data: DataFile = serde_json::from_str(json)
            .map_err(|e| FasalError::Config(format!("invalid knowledge base: {e}")))?;

        let records: BTreeMap<String, DiseaseRecord> = data
            .diseases
            .into_iter()
            .map(|(key, mut record)| {
                record.key.clone_from(&key);
                (key, record)
            })
            .collect();

        let healthy = records
            .get(HEALTHY_KEY)
            .cloned()
            .ok_or_else(|| FasalError::Config("knowledge base has no `healthy` record".into()))?;

        for crop in &data.crops {
            if crop.key != crop.key.to_lowercase() {
                return Err(FasalError::Config(format!(
                    "crop key `{}` must be lowercase",
                    crop.key
                )));
            }
            if let Some(missing) = crop.diseases.iter().find(|k| !records.contains_key(*k)) {
                return Err(FasalError::Config(format!(
                    "crop `{}` lists unknown disease `{missing}`",
                    crop.key
                )));
            }
        }

        debug!(
            diseases = records.len(),
            crops = data.crops.len(),
            "knowledge base loaded"
        );

        Ok(Self {
            records,
            crops: data.crops,
            healthy,
        })
    }
}

impl KnowledgeBase for StaticKnowledgeBase {
    fn get(&self, key: &str) -> Option<&DiseaseRecord> {
        self.records.get(key)
    }

    fn crop(&self, crop: &str) -> Option<&CropInfo> {
        let crop = crop.trim();
        self.crops
            .iter()
            .find(|c| c.key.eq_ignore_ascii_case(crop) || c.name.eq_ignore_ascii_case(crop))
    }

    fn crops(&self) -> &[CropInfo] {
        &self.crops
    }

    fn records(&self) -> Vec<&DiseaseRecord> {
        self.records.values().collect()
    }

    fn healthy(&self) -> &DiseaseRecord {
        &self.healthy
    }
}
