// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Vector math for stored embeddings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance used to rank fragments and derive relevance scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance over unit vectors; relevance = `1 - d² / sqrt(2)`
    #[default]
    L2,
    /// Cosine similarity used directly as relevance
    Cosine,
}

impl DistanceMetric {
    /// Relevance in `[0, 1]`, higher is better
    pub fn relevance(&self, query: &Embedding, candidate: &Embedding) -> f32 {
        let score = match self {
            DistanceMetric::L2 => {
                1.0 - query.squared_euclidean_distance(candidate) / std::f32::consts::SQRT_2
            }
            DistanceMetric::Cosine => query.cosine_similarity(candidate),
        };

        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::L2 => write!(f, "l2"),
            DistanceMetric::Cosine => write!(f, "cosine"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l2" => Ok(DistanceMetric::L2),
            "cosine" => Ok(DistanceMetric::Cosine),
            other => Err(format!("unknown distance metric '{}' (expected l2 or cosine)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Embedding {
    data: Vec<f32>,
    dimension: usize,
}

impl Embedding {
    pub fn new(data: Vec<f32>) -> Self {
        let dimension = data.len();
        Self { data, dimension }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn magnitude(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimension != other.dimension {
            return 0.0;
        }

        let magnitude_self = self.magnitude();
        let magnitude_other = other.magnitude();

        if magnitude_self == 0.0 || magnitude_other == 0.0 {
            0.0
        } else {
            self.dot_product(other) / (magnitude_self * magnitude_other)
        }
    }

    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.squared_euclidean_distance(other).sqrt()
    }

    pub fn squared_euclidean_distance(&self, other: &Embedding) -> f32 {
        if self.dimension != other.dimension {
            return f32::INFINITY;
        }

        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum()
    }

    pub fn dot_product(&self, other: &Embedding) -> f32 {
        if self.dimension != other.dimension {
            return 0.0;
        }

        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}
