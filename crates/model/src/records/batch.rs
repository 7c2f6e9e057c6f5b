use crate::records::record::Record;
use serde::{Serialize, Serializer, ser::SerializeStruct};

/// One page of extracted records. An empty batch means the window is exhausted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub records: Vec<Record>,
}

impl Batch {
    pub fn new(records: Vec<Record>) -> Self {
        Batch { records }
    }

    pub fn empty() -> Self {
        Batch::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Body accepted by the collector's delivery endpoint: `{"data": [...]}`.
    pub fn to_envelope_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&Envelope { data: self })
    }

    /// Bare JSON array, as returned to pull clients.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.records)
    }
}

struct Envelope<'a> {
    data: &'a Batch,
}

impl Serialize for Envelope<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Envelope", 1)?;
        s.serialize_field("data", &self.data.records)?;
        s.end()
    }
}
