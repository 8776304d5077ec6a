use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::structure::Structure;
use crate::value::{Value, ValueMap};

/// Total order over values: kind rank first, then contents.
pub fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match a.kind().cmp(&b.kind()) {
        Ordering::Equal => {}
        other => return other,
    }
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => cmp_slices(x, y),
        (Value::Map(x), Value::Map(y)) => cmp_maps(x, y),
        _ => cmp_structures(a, b),
    }
}

fn cmp_slices(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match cmp_values(x, y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

fn cmp_maps(a: &ValueMap, b: &ValueMap) -> Ordering {
    for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
        match cmp_values(ka, kb).then_with(|| cmp_values(va, vb)) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

fn as_structure(v: &Value) -> Option<&dyn Structure> {
    match v {
        Value::Struct(s) => Some(s),
        Value::Domain(d) => Some(d),
        _ => None,
    }
}

fn cmp_structures(a: &Value, b: &Value) -> Ordering {
    match (as_structure(a), as_structure(b)) {
        (Some(x), Some(y)) => x
            .signature()
            .cmp(&y.signature())
            .then_with(|| cmp_slices(&x.fields(), &y.fields())),
        _ => Ordering::Equal,
    }
}

/// Collapse duplicate keys in place: the surviving entry keeps the position of the first
/// occurrence and the value of the last.
pub fn dedup_last_wins(entries: &mut Vec<(Value, Value)>) {
    let n = entries.len();
    if n < 2 {
        return;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by(|&a, &b| cmp_values(&entries[a].0, &entries[b].0).then(a.cmp(&b)));

    let mut dropped = vec![false; n];
    let mut any = false;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && cmp_values(&entries[order[i]].0, &entries[order[j]].0) == Ordering::Equal {
            j += 1;
        }
        if j - i > 1 {
            any = true;
            let last = core::mem::replace(&mut entries[order[j - 1]].1, Value::Null);
            entries[order[i]].1 = last;
            for &k in &order[i + 1..j] {
                dropped[k] = true;
            }
        }
        i = j;
    }

    if any {
        let mut idx = 0;
        entries.retain(|_| {
            let keep = !dropped[idx];
            idx += 1;
            keep
        });
    }
}
