use crate::data::datatable::DataValue;
use crate::data::query_state::SortDirection;
use std::cmp::Ordering;

/// Rank used when two values of different, non-numeric types meet.
/// Order: Null < Boolean < Integer/Float < String < DateTime
fn type_rank(value: &DataValue) -> u8 {
    match value {
        DataValue::Null => 0,
        DataValue::Boolean(_) => 1,
        DataValue::Integer(_) | DataValue::Float(_) => 2,
        DataValue::String(_) => 3,
        DataValue::DateTime(_) => 4,
    }
}

/// Compare two values by their natural order: numeric for numbers
/// (Integer and Float mix), lexicographic for strings, chronological for dates.
/// Null compares lowest; callers that need nulls last use `compare_for_sort`.
pub fn compare_datavalues(a: &DataValue, b: &DataValue) -> Ordering {
    match (a, b) {
        (DataValue::Integer(a), DataValue::Integer(b)) => a.cmp(b),
        (DataValue::Float(a), DataValue::Float(b)) => a.total_cmp(b),
        // Compare actual numeric values, not types
        (DataValue::Integer(i), DataValue::Float(f)) => (*i as f64).total_cmp(f),
        (DataValue::Float(f), DataValue::Integer(i)) => f.total_cmp(&(*i as f64)),
        (DataValue::String(a), DataValue::String(b)) => a.cmp(b),
        (DataValue::Boolean(a), DataValue::Boolean(b)) => a.cmp(b),
        (DataValue::DateTime(a), DataValue::DateTime(b)) => a.cmp(b),
        (DataValue::Null, DataValue::Null) => Ordering::Equal,
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Comparator for table sorting.
///
/// Nulls go after every non-null value in both directions; only the
/// non-null comparison is reversed for descending order.
pub fn compare_for_sort(a: &DataValue, b: &DataValue, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let cmp = compare_datavalues(a, b);
            match direction {
                SortDirection::Ascending => cmp,
                SortDirection::Descending => cmp.reverse(),
            }
        }
    }
}
