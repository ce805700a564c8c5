// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Vector index: embedding math and the per-upload persisted store

pub mod embeddings;
pub mod index;

pub use embeddings::{DistanceMetric, Embedding};
pub use index::{
    IndexError, IndexManifest, ScoredFragment, VectorIndex, INDEX_FORMAT_VERSION, MANIFEST_FILE,
    VECTORS_FILE,
};
