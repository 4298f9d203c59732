/// Default maximum number of rows in one destination partition.
pub const DEFAULT_THRESHOLD: u64 = 1_000_000;

/// Tunables for [`generate_alignment`](super::generate_alignment).
///
/// ```
/// use celestial_partition::partition::PartitionConfig;
///
/// let config = PartitionConfig::default()
///     .with_threshold(250)
///     .with_drop_empty_siblings(true);
/// assert_eq!(config.lowest_order, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PartitionConfig {
    /// Maximum aggregate count a destination may hold.
    pub threshold: u64,
    /// Coarsest order a destination may have.
    pub lowest_order: u8,
    /// Keep a cell at its finer order when all of its parent's mass sits in it.
    pub drop_empty_siblings: bool,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            lowest_order: 0,
            drop_empty_siblings: false,
        }
    }
}

impl PartitionConfig {
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_lowest_order(mut self, lowest_order: u8) -> Self {
        self.lowest_order = lowest_order;
        self
    }

    pub fn with_drop_empty_siblings(mut self, drop_empty_siblings: bool) -> Self {
        self.drop_empty_siblings = drop_empty_siblings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PartitionConfig::default();
        assert_eq!(config.threshold, 1_000_000);
        assert_eq!(config.lowest_order, 0);
        assert!(!config.drop_empty_siblings);
    }

    #[test]
    fn test_builders() {
        let config = PartitionConfig::default()
            .with_threshold(10)
            .with_lowest_order(3)
            .with_drop_empty_siblings(true);
        assert_eq!(
            config,
            PartitionConfig {
                threshold: 10,
                lowest_order: 3,
                drop_empty_siblings: true,
            }
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_fills_missing_fields() {
        let config: PartitionConfig = serde_json::from_str(r#"{"threshold": 500}"#).unwrap();
        assert_eq!(config, PartitionConfig::default().with_threshold(500));
    }
}
