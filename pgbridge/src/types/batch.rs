use std::sync::Arc;

/// An immutable, ordered group of raw record payloads submitted as one unit
/// of work.
///
/// A [`Batch`] is consumed by exactly one worker, which may hand it to
/// several sequential write attempts. Clones share the underlying records,
/// so retrying never copies payload data.
#[derive(Debug, Clone)]
pub struct Batch {
    records: Arc<Vec<String>>,
}

impl Batch {
    /// Creates a batch from the given records.
    pub fn new(records: Vec<String>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// Returns the records in submission order.
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Returns the number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the batch holds no records.
    ///
    /// The producer never dispatches an empty batch.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_records() {
        let batch = Batch::new(vec!["a".to_string(), "b".to_string()]);
        let clone = batch.clone();

        assert_eq!(batch.len(), 2);
        assert_eq!(clone.records(), batch.records());
        assert!(Arc::ptr_eq(&batch.records, &clone.records));
    }

    #[test]
    fn empty_batch_is_detectable() {
        assert!(Batch::new(Vec::new()).is_empty());
        assert!(!Batch::new(vec!["x".to_string()]).is_empty());
    }
}
