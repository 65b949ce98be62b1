use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::ConversionSettings;

/// One finished conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: Uuid,
    pub original_filename: String,
    pub converted_filename: String,
    /// RFC 3339
    pub timestamp: String,
    pub processing_time_ms: u64,
    pub file_size: u64,
    pub quality: String,
    pub is_valid: bool,
    pub tokens_used: u64,
    pub model_used: String,
    pub settings: ConversionSettings,
}

/// Append-only log of conversions
pub trait HistoryStore: Send + Sync {
    fn append(&self, record: ConversionRecord);

    /// Last `n` records, oldest first
    fn recent(&self, n: usize) -> Vec<ConversionRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local history, lost on restart
#[derive(Default)]
pub struct InMemoryHistory {
    records: RwLock<Vec<ConversionRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistory {
    fn append(&self, record: ConversionRecord) {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    fn recent(&self, n: usize) -> Vec<ConversionRecord> {
        let records = self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }

    fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ConversionRecord {
        ConversionRecord {
            id: Uuid::new_v4(),
            original_filename: name.to_string(),
            converted_filename: format!("converted_{}.dxf", name),
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            processing_time_ms: 10,
            file_size: 100,
            quality: "balanced".to_string(),
            is_valid: true,
            tokens_used: 42,
            model_used: "test/model".to_string(),
            settings: ConversionSettings::default(),
        }
    }

    #[test]
    fn test_empty_store() {
        let store = InMemoryHistory::new();
        assert!(store.is_empty());
        assert!(store.recent(5).is_empty());
    }

    #[test]
    fn test_recent_keeps_order_and_limit() {
        let store = InMemoryHistory::new();
        for i in 0..7 {
            store.append(record(&format!("plan{}.png", i)));
        }

        assert_eq!(store.len(), 7);
        let recent = store.recent(5);
        let names: Vec<_> = recent.iter().map(|r| r.original_filename.as_str()).collect();
        assert_eq!(names, vec!["plan2.png", "plan3.png", "plan4.png", "plan5.png", "plan6.png"]);
    }

    #[test]
    fn test_recent_larger_than_len() {
        let store = InMemoryHistory::new();
        store.append(record("only.png"));
        assert_eq!(store.recent(5).len(), 1);
    }

    #[test]
    fn test_stores_are_isolated() {
        let a = InMemoryHistory::new();
        let b = InMemoryHistory::new();
        a.append(record("a.png"));
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
