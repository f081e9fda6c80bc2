//! Attribute bags: unordered, duplicate-preserving multisets of a single
//! datatype (`spec.md` §3, invariant 1).

use serde::{Deserialize, Serialize};

use super::{Datatype, Value};

/// A homogeneous multiset of values. Every designator/selector lookup and
/// every bag-valued function operates on this type, never on a bare `Vec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bag {
    datatype: Datatype,
    values: Vec<Value>,
}

impl Bag {
    /// An empty bag of the given datatype.
    pub fn empty(datatype: Datatype) -> Self {
        Bag { datatype, values: Vec::new() }
    }

    /// Build a bag from values, rejecting any whose datatype disagrees with
    /// the bag's declared datatype.
    pub fn new(datatype: Datatype, values: Vec<Value>) -> Option<Self> {
        if values.iter().any(|v| v.datatype() != datatype) {
            return None;
        }
        Some(Bag { datatype, values })
    }

    /// A bag containing exactly one value, tagged with that value's datatype.
    pub fn singleton(value: Value) -> Self {
        let datatype = value.datatype();
        Bag { datatype, values: vec![value] }
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// The single value in a singleton bag, or `None` if the bag is empty or
    /// has more than one member (callers needing `Indeterminate` on
    /// cardinality violations check `len()` themselves; this is the plain
    /// accessor the `bag-size`/`one-and-only` functions build on).
    pub fn one_and_only(&self) -> Option<&Value> {
        match self.values.as_slice() {
            [v] => Some(v),
            _ => None,
        }
    }

    /// Set union: every distinct value (by datatype-specific equality)
    /// present in either bag, per `*-bag` union semantics in §4.D.
    pub fn union(&self, other: &Bag) -> Option<Bag> {
        if self.datatype != other.datatype {
            return None;
        }
        let mut values: Vec<Value> = Vec::new();
        for v in self.values.iter().chain(other.values.iter()) {
            if !values.iter().any(|existing| existing == v) {
                values.push(v.clone());
            }
        }
        Some(Bag { datatype: self.datatype, values })
    }

    /// Set intersection: distinct values present in both bags.
    pub fn intersection(&self, other: &Bag) -> Option<Bag> {
        if self.datatype != other.datatype {
            return None;
        }
        let mut values: Vec<Value> = Vec::new();
        for v in &self.values {
            if other.contains(v) && !values.iter().any(|existing| existing == v) {
                values.push(v.clone());
            }
        }
        Some(Bag { datatype: self.datatype, values })
    }

    /// Values in `self` that are not present in `other`.
    pub fn subtract(&self, other: &Bag) -> Option<Bag> {
        if self.datatype != other.datatype {
            return None;
        }
        let values = self.values.iter().filter(|v| !other.contains(v)).cloned().collect();
        Some(Bag { datatype: self.datatype, values })
    }

    /// Whether every distinct value of `self` occurs in `other`.
    pub fn is_subset(&self, other: &Bag) -> Option<bool> {
        if self.datatype != other.datatype {
            return None;
        }
        Some(self.values.iter().all(|v| other.contains(v)))
    }

    /// Set equality: same distinct members, ignoring multiplicity and order.
    pub fn set_equals(&self, other: &Bag) -> Option<bool> {
        if self.datatype != other.datatype {
            return None;
        }
        Some(self.is_subset(other)? && other.is_subset(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_heterogeneous_construction() {
        let values = vec![Value::Boolean(true), Value::String("x".into())];
        assert!(Bag::new(Datatype::Boolean, values).is_none());
    }

    #[test]
    fn union_deduplicates_by_value_equality() {
        let a = Bag::new(
            Datatype::String,
            vec![Value::String("a".into()), Value::String("b".into())],
        )
        .unwrap();
        let b = Bag::new(Datatype::String, vec![Value::String("b".into())]).unwrap();
        let u = a.union(&b).unwrap();
        assert_eq!(u.len(), 2);
    }

    #[test]
    fn one_and_only_rejects_multi_member_bags() {
        let bag = Bag::new(
            Datatype::Integer,
            vec![
                Value::Integer(1.into()),
                Value::Integer(2.into()),
            ],
        )
        .unwrap();
        assert!(bag.one_and_only().is_none());
    }

    #[test]
    fn set_equals_ignores_duplicates() {
        let a = Bag::new(
            Datatype::Integer,
            vec![Value::Integer(1.into()), Value::Integer(1.into())],
        )
        .unwrap();
        let b = Bag::new(Datatype::Integer, vec![Value::Integer(1.into())]).unwrap();
        assert_eq!(a.set_equals(&b), Some(true));
    }
}
