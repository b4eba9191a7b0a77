use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::model::batch::DatasetKind;

/// How a dataset spells its record identifiers.
pub trait IdentifierScheme: Sync {
    /// Numeric value carried by `id`, or `None` if it doesn't follow the scheme.
    fn extract(&self, id: &str) -> Option<u64>;

    fn render(&self, n: u64) -> String;

    fn describe(&self) -> String;
}

/// Plain decimal ids: `"1"`, `"2"`, ...
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericIds;

impl IdentifierScheme for NumericIds {
    fn extract(&self, id: &str) -> Option<u64> {
        let id = id.trim();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        id.parse().ok()
    }

    fn render(&self, n: u64) -> String {
        n.to_string()
    }

    fn describe(&self) -> String {
        "numeric".to_string()
    }
}

/// Fixed prefix plus a zero-padded number: `reading_011`.
#[derive(Debug, Clone, Copy)]
pub struct PrefixedIds {
    pub prefix: &'static str,
    pub width: usize,
}

impl IdentifierScheme for PrefixedIds {
    fn extract(&self, id: &str) -> Option<u64> {
        let digits = id.trim().strip_prefix(self.prefix)?;
        NumericIds.extract(digits)
    }

    fn render(&self, n: u64) -> String {
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }

    fn describe(&self) -> String {
        format!("{}<{} digits>", self.prefix, self.width)
    }
}

pub static VOCABULARY_IDS: NumericIds = NumericIds;

pub static PASSAGE_IDS: PrefixedIds = PrefixedIds {
    prefix: "reading_",
    width: 3,
};

pub fn scheme_for(kind: DatasetKind) -> &'static dyn IdentifierScheme {
    match kind {
        DatasetKind::Vocabulary => &VOCABULARY_IDS,
        DatasetKind::Passages => &PASSAGE_IDS,
    }
}

/// Reads the identifier of a loaded record. Integer JSON ids are accepted
/// because older files were not always consistent about quoting.
fn raw_id(index: usize, record: &Value) -> Result<String> {
    match record.get("id") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) if n.is_u64() => Ok(n.to_string()),
        Some(other) => Err(CoreError::InvalidId {
            index,
            id: other.to_string(),
            reason: "id must be a string".to_string(),
        }),
        None => Err(CoreError::InvalidId {
            index,
            id: String::new(),
            reason: "record has no id".to_string(),
        }),
    }
}

fn exhausted(index: usize, id: String) -> CoreError {
    CoreError::InvalidId {
        index,
        id,
        reason: "id space exhausted".to_string(),
    }
}

/// Position, id and numeric value of the record holding the largest id.
fn max_entry(
    records: &[Value],
    scheme: &dyn IdentifierScheme,
) -> Result<Option<(usize, String, u64)>> {
    let mut max: Option<(usize, String, u64)> = None;

    for (index, record) in records.iter().enumerate() {
        let id = raw_id(index, record)?;
        let n = scheme.extract(&id).ok_or_else(|| CoreError::InvalidId {
            index,
            id: id.clone(),
            reason: format!("does not match the {} scheme", scheme.describe()),
        })?;
        if max.as_ref().map_or(true, |(_, _, m)| n > *m) {
            max = Some((index, id, n));
        }
    }

    Ok(max)
}

/// Largest numeric id in `records`, `None` for an empty dataset.
pub fn max_id(records: &[Value], scheme: &dyn IdentifierScheme) -> Result<Option<u64>> {
    Ok(max_entry(records, scheme)?.map(|(_, _, n)| n))
}

/// Next identifier after the existing maximum; the first one for an empty dataset.
pub fn next_id(records: &[Value], scheme: &dyn IdentifierScheme) -> Result<String> {
    let mut allocator = IdAllocator::after(records, scheme)?;
    allocator.allocate()
}

/// Hands out consecutive identifiers for the records of one batch.
pub struct IdAllocator<'a> {
    scheme: &'a dyn IdentifierScheme,
    /// `None` once `u64::MAX` has been handed out.
    next: Option<u64>,
    /// Dataset position the next record will take.
    position: usize,
}

impl<'a> IdAllocator<'a> {
    pub fn after(records: &[Value], scheme: &'a dyn IdentifierScheme) -> Result<Self> {
        let next = match max_entry(records, scheme)? {
            None => 1,
            Some((index, id, n)) => n.checked_add(1).ok_or_else(|| exhausted(index, id))?,
        };
        Ok(Self {
            scheme,
            next: Some(next),
            position: records.len(),
        })
    }

    pub fn peek(&self) -> Option<String> {
        self.next.map(|n| self.scheme.render(n))
    }

    pub fn allocate(&mut self) -> Result<String> {
        let n = self
            .next
            .ok_or_else(|| exhausted(self.position, self.scheme.render(u64::MAX)))?;
        self.next = n.checked_add(1);
        self.position += 1;
        Ok(self.scheme.render(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_ids(ids: &[&str]) -> Vec<Value> {
        ids.iter().map(|id| json!({ "id": id })).collect()
    }

    #[test]
    fn empty_dataset_starts_at_one() {
        assert_eq!(next_id(&[], &NumericIds).unwrap(), "1");
        assert_eq!(next_id(&[], &PASSAGE_IDS).unwrap(), "reading_001");
    }

    #[test]
    fn next_after_unordered_ids() {
        let records = with_ids(&["3", "1", "5", "2", "4"]);
        assert_eq!(next_id(&records, &NumericIds).unwrap(), "6");
    }

    #[test]
    fn gaps_do_not_get_filled() {
        let records = with_ids(&["1", "2", "40"]);
        assert_eq!(next_id(&records, &NumericIds).unwrap(), "41");
    }

    #[test]
    fn integer_json_ids_are_tolerated() {
        let records = vec![json!({ "id": 7 }), json!({ "id": "2" })];
        assert_eq!(next_id(&records, &NumericIds).unwrap(), "8");
    }

    #[test]
    fn non_numeric_id_is_invalid() {
        let records = with_ids(&["1", "abc", "3"]);
        match next_id(&records, &NumericIds) {
            Err(CoreError::InvalidId { index, id, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(id, "abc");
            }
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn largest_possible_id_is_invalid() {
        let records = with_ids(&["1", "18446744073709551615"]);
        match next_id(&records, &NumericIds) {
            Err(CoreError::InvalidId { index, id, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(id, "18446744073709551615");
                assert_eq!(reason, "id space exhausted");
            }
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn allocator_stops_at_the_top_of_the_id_space() {
        let records = with_ids(&["18446744073709551614"]);
        let mut alloc = IdAllocator::after(&records, &NumericIds).unwrap();
        assert_eq!(alloc.allocate().unwrap(), "18446744073709551615");
        assert!(alloc.peek().is_none());
        assert!(matches!(alloc.allocate(), Err(CoreError::InvalidId { index: 2, .. })));
    }

    #[test]
    fn missing_id_is_invalid() {
        let records = vec![json!({ "id": "1" }), json!({ "title": "no id" })];
        assert!(matches!(
            next_id(&records, &NumericIds),
            Err(CoreError::InvalidId { index: 1, .. })
        ));
    }

    #[test]
    fn schemes_are_not_mixed() {
        let passages = with_ids(&["reading_001", "reading_010"]);
        assert!(next_id(&passages, &NumericIds).is_err());
        assert_eq!(next_id(&passages, &PASSAGE_IDS).unwrap(), "reading_011");

        let words = with_ids(&["1", "2"]);
        assert!(next_id(&words, &PASSAGE_IDS).is_err());
    }

    #[test]
    fn allocator_hands_out_consecutive_ids() {
        let records = with_ids(&["1", "2"]);
        let mut alloc = IdAllocator::after(&records, &NumericIds).unwrap();
        assert_eq!(alloc.peek().as_deref(), Some("3"));
        assert_eq!(alloc.allocate().unwrap(), "3");
        assert_eq!(alloc.allocate().unwrap(), "4");
        assert_eq!(alloc.peek().as_deref(), Some("5"));
    }

    #[test]
    fn prefixed_render_grows_past_width() {
        assert_eq!(PASSAGE_IDS.render(7), "reading_007");
        assert_eq!(PASSAGE_IDS.render(1234), "reading_1234");
        assert_eq!(PASSAGE_IDS.extract("reading_1234"), Some(1234));
        assert_eq!(PASSAGE_IDS.extract("reading_"), None);
    }
}
