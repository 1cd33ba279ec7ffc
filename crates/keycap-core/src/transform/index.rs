// Keycap Dispatch Index
// One bucket per virtual-key code, chained records in file order

use smallvec::SmallVec;

use crate::record::{RecordId, RecordSet};
use crate::{ModifierFlags, VirtualKey};

/// Number of buckets: one per possible virtual-key code
pub const BUCKET_COUNT: usize = 0x100;

/// One chained record in a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub modifiers: ModifierFlags,
    pub record: RecordId,
}

/// Lookup table from trigger key to the records sharing it.
///
/// Built once per load and never patched; entries hold record ids, not
/// references, so the index can live beside the [`RecordSet`] it indexes.
#[derive(Debug, Clone)]
pub struct DispatchIndex {
    buckets: Box<[SmallVec<[IndexEntry; 2]>]>,
    len: usize,
}

impl DispatchIndex {
    /// An index with no entries
    pub fn empty() -> Self {
        Self {
            buckets: (0..BUCKET_COUNT).map(|_| SmallVec::new()).collect(),
            len: 0,
        }
    }

    /// Chain every record under its trigger key, keeping file order
    pub fn build(records: &RecordSet) -> Self {
        let mut index = Self::empty();
        for record in records.iter() {
            index.buckets[record.trigger.key.code() as usize].push(IndexEntry {
                modifiers: record.trigger.modifiers,
                record: record.id,
            });
            index.len += 1;
        }
        index
    }

    /// First record on `key` whose chord equals `modifiers` exactly
    pub fn find(&self, key: VirtualKey, modifiers: ModifierFlags) -> Option<RecordId> {
        self.bucket(key)
            .iter()
            .find(|entry| entry.modifiers == modifiers)
            .map(|entry| entry.record)
    }

    /// All records chained under `key`, in file order
    pub fn bucket(&self, key: VirtualKey) -> &[IndexEntry] {
        &self.buckets[key.code() as usize]
    }

    /// Whether any record uses `key` as its trigger
    pub fn contains_key(&self, key: VirtualKey) -> bool {
        !self.bucket(key).is_empty()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for DispatchIndex {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{decode, encode_record};
    use crate::record::{OutputAction, TriggerChord};

    fn build(chords: &[(u8, ModifierFlags)]) -> DispatchIndex {
        let mut bytes = Vec::new();
        for &(code, modifiers) in chords {
            encode_record(
                &mut bytes,
                TriggerChord::new(VirtualKey(code), modifiers),
                &[OutputAction::Nothing],
            );
        }
        DispatchIndex::build(&decode(bytes).unwrap())
    }

    #[test]
    fn test_empty_index() {
        let index = DispatchIndex::empty();
        assert!(index.is_empty());
        assert_eq!(index.find(VirtualKey(0x41), ModifierFlags::empty()), None);
        assert!(!index.contains_key(VirtualKey(0xFF)));
    }

    #[test]
    fn test_disambiguation_by_modifiers() {
        let index = build(&[
            (0x41, ModifierFlags::ALT),
            (0x5A, ModifierFlags::empty()),
            (0x41, ModifierFlags::empty()),
        ]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.bucket(VirtualKey(0x41)).len(), 2);
        assert_eq!(index.find(VirtualKey(0x41), ModifierFlags::ALT), Some(RecordId(0)));
        assert_eq!(index.find(VirtualKey(0x41), ModifierFlags::empty()), Some(RecordId(2)));
        assert_eq!(index.find(VirtualKey(0x5A), ModifierFlags::empty()), Some(RecordId(1)));
    }

    #[test]
    fn test_exact_match_only() {
        let index = build(&[(0x41, ModifierFlags::CONTROL)]);
        assert_eq!(
            index.find(VirtualKey(0x41), ModifierFlags::CONTROL | ModifierFlags::SHIFT),
            None
        );
        assert_eq!(index.find(VirtualKey(0x41), ModifierFlags::empty()), None);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let index = build(&[
            (0x41, ModifierFlags::SHIFT),
            (0x41, ModifierFlags::SHIFT),
        ]);
        assert_eq!(index.find(VirtualKey(0x41), ModifierFlags::SHIFT), Some(RecordId(0)));
        let order: Vec<_> = index
            .bucket(VirtualKey(0x41))
            .iter()
            .map(|entry| entry.record)
            .collect();
        assert_eq!(order, vec![RecordId(0), RecordId(1)]);
    }
}
