// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only disease knowledge base.

use crate::types::{CropInfo, DiseaseRecord};

/// Key to record lookup over static reference data.
///
/// Implementations must always contain a record under
/// [`HEALTHY_KEY`](crate::types::HEALTHY_KEY).
pub trait KnowledgeBase: Send + Sync + 'static {
    /// Looks up a disease record by key.
    fn get(&self, key: &str) -> Option<&DiseaseRecord>;

    /// Looks up a crop by key (lowercase, e.g. `rice`).
    fn crop(&self, crop: &str) -> Option<&CropInfo>;

    /// All crops in display order.
    fn crops(&self) -> &[CropInfo];

    /// All records, ordered by key.
    fn records(&self) -> Vec<&DiseaseRecord>;

    /// The canonical healthy-plant record.
    fn healthy(&self) -> &DiseaseRecord;

    /// Disease keys for `crop` in priority order. Empty for unknown crops.
    fn crop_diseases(&self, crop: &str) -> &[String] {
        self.crop(crop).map(|c| c.diseases.as_slice()).unwrap_or(&[])
    }
}
