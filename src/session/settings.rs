// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! User-tunable search and chunking parameters

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const K_RESULTS_RANGE: RangeInclusive<usize> = 1..=5;
pub const MIN_RELEVANCE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const CHUNK_SIZE_RANGE: RangeInclusive<usize> = 100..=500;
pub const CHUNK_OVERLAP_RANGE: RangeInclusive<usize> = 0..=100;

pub const DEFAULT_K_RESULTS: usize = 3;
pub const DEFAULT_MIN_RELEVANCE: f32 = 0.2;
pub const DEFAULT_CHUNK_SIZE: usize = 250;
pub const DEFAULT_CHUNK_OVERLAP: usize = 30;
pub const DEFAULT_MAX_CHUNKS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Results requested from the index per question
    pub k_results: usize,
    /// Results scoring below this are hidden
    pub min_relevance: f32,
    /// Fragment length in characters (applies to the next upload)
    pub chunk_size: usize,
    /// Characters shared between neighbouring fragments (next upload)
    pub chunk_overlap: usize,
    /// Fragments beyond this count are dropped before embedding
    pub max_chunks: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            k_results: DEFAULT_K_RESULTS,
            min_relevance: DEFAULT_MIN_RELEVANCE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

/// Partial update, as submitted by the settings form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub k_results: Option<usize>,
    pub min_relevance: Option<f32>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub max_chunks: Option<usize>,
}

fn clamp_range<T: PartialOrd + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    if value < *range.start() {
        *range.start()
    } else if value > *range.end() {
        *range.end()
    } else {
        value
    }
}

impl SearchSettings {
    /// Apply an update, clamping every value into its allowed range
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(k) = update.k_results {
            self.k_results = clamp_range(k, &K_RESULTS_RANGE);
        }
        if let Some(min) = update.min_relevance {
            self.min_relevance = if min.is_finite() {
                clamp_range(min, &MIN_RELEVANCE_RANGE)
            } else {
                DEFAULT_MIN_RELEVANCE
            };
        }
        if let Some(size) = update.chunk_size {
            self.chunk_size = clamp_range(size, &CHUNK_SIZE_RANGE);
        }
        if let Some(overlap) = update.chunk_overlap {
            self.chunk_overlap = clamp_range(overlap, &CHUNK_OVERLAP_RANGE);
        }
        if let Some(max) = update.max_chunks {
            self.max_chunks = max.max(1);
        }
    }
}
