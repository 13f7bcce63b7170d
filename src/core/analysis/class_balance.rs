use tracing::info;

use crate::core::label::{ClassScheme, ClassifiedLabel};

/// Number of samples per class bin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDistribution {
    pub counts: Vec<usize>,
    pub total: usize,
}

impl ClassDistribution {
    pub fn new(num_classes: usize) -> Self {
        Self {
            counts: vec![0; num_classes],
            total: 0,
        }
    }

    /// Get count for a specific class
    pub fn get_count(&self, class_id: u8) -> usize {
        self.counts.get(class_id as usize).copied().unwrap_or(0)
    }

    /// Get percentage for a specific class
    pub fn get_percentage(&self, class_id: u8) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.get_count(class_id) as f32 / self.total as f32) * 100.0
    }

    /// Classes that no sample falls into
    pub fn empty_classes(&self) -> Vec<u8> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count == 0)
            .map(|(class_id, _)| class_id as u8)
            .collect()
    }
}

/// Count how many samples fall into each class
pub fn analyze_labels(labels: &[ClassifiedLabel], scheme: ClassScheme) -> ClassDistribution {
    let mut dist = ClassDistribution::new(scheme.num_classes());
    for label in labels {
        if let Some(slot) = dist.counts.get_mut(label.class_id() as usize) {
            *slot += 1;
            dist.total += 1;
        }
    }
    info!(
        "Class distribution over {} samples: {:?}",
        dist.total, dist.counts
    );
    dist
}
