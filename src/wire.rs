//! Batch encoder for the aggregator's compact wire format.
//!
//! Each batch becomes one top-level JSON array: a string table header
//! (`[count, str_0, .., str_{count-1}]`, distinct strings sorted ascending so
//! a string's index is its sorted rank) followed by one op-coded record per
//! publishable measurement. A record is
//! `[tagCount, (keyIdx, valIdx)..., nameKeyIdx, nameValIdx, opCode, value]`
//! with `tagCount = |identity tags| + 1 + |common tags|`.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::measurement::Measurement;

/// Backend aggregation operator implied by a measurement's statistic tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Add,
    Max,
}

impl Op {
    fn code(self) -> i64 {
        match self {
            Op::Add => 0,
            Op::Max => 10,
        }
    }
}

fn op_for_statistic(stat: &str) -> Option<Op> {
    match stat {
        "count" | "totalAmount" | "totalTime" | "totalOfSquares" | "percentile" => Some(Op::Add),
        "max" | "gauge" | "activeTasks" | "duration" => Some(Op::Max),
        _ => None,
    }
}

fn op_for(measurement: &Measurement) -> Option<Op> {
    measurement
        .id
        .tags()
        .get("statistic")
        .and_then(op_for_statistic)
}

/// Encode one batch. Measurements with a missing or unrecognized statistic
/// tag contribute neither records nor strings.
pub(crate) fn encode_batch(
    common_tags: &HashMap<String, String>,
    batch: &[Measurement],
) -> Result<String, serde_json::Error> {
    let entries: Vec<(&Measurement, Op)> = batch
        .iter()
        .filter_map(|m| op_for(m).map(|op| (m, op)))
        .collect();

    // Common tags repeat in every record; fix their order up front so
    // payloads for equal inputs are byte identical.
    let mut common: Vec<(&str, &str)> = common_tags
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    common.sort_unstable();

    let mut strings: BTreeSet<&str> = BTreeSet::new();
    strings.insert("name");
    for &(key, value) in &common {
        strings.insert(key);
        strings.insert(value);
    }
    for (measurement, _) in &entries {
        strings.insert(measurement.id.name());
        for (key, value) in measurement.id.tags().iter() {
            strings.insert(key);
            strings.insert(value);
        }
    }
    let index: HashMap<&str, usize> = strings
        .iter()
        .enumerate()
        .map(|(rank, s)| (*s, rank))
        .collect();

    let mut payload: Vec<Value> = Vec::with_capacity(1 + strings.len() + entries.len() * 8);
    payload.push(Value::from(strings.len()));
    payload.extend(strings.iter().map(|s| Value::from(*s)));

    for (measurement, op) in entries {
        let id = &measurement.id;
        payload.push(Value::from(id.tags().len() + 1 + common.len()));
        for &(key, value) in &common {
            payload.push(Value::from(index[key]));
            payload.push(Value::from(index[value]));
        }
        for (key, value) in id.tags().iter() {
            payload.push(Value::from(index[key]));
            payload.push(Value::from(index[value]));
        }
        payload.push(Value::from(index["name"]));
        payload.push(Value::from(index[id.name()]));
        payload.push(Value::from(op.code()));
        payload.push(Value::from(measurement.value));
    }
    serde_json::to_string(&payload)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::id::{Id, Tags};

    use super::*;

    /// A record reconstructed from an encoded payload.
    #[derive(Debug, PartialEq)]
    struct Decoded {
        tags: HashMap<String, String>,
        name: String,
        op: i64,
        value: f64,
    }

    /// Reverse the encoding: read the string table, then walk the records.
    fn decode(payload: &str) -> (Vec<String>, Vec<Decoded>) {
        let values: Vec<Value> = serde_json::from_str(payload).unwrap();
        let count = values[0].as_u64().unwrap() as usize;
        let strings: Vec<String> = values[1..=count]
            .iter()
            .map(|v| v.as_str().unwrap().to_owned())
            .collect();

        let mut records = Vec::new();
        let mut pos = count + 1;
        while pos < values.len() {
            let tag_count = values[pos].as_u64().unwrap() as usize;
            pos += 1;
            let mut tags = HashMap::new();
            let mut name = None;
            for _ in 0..tag_count {
                let key = &strings[values[pos].as_u64().unwrap() as usize];
                let value = &strings[values[pos + 1].as_u64().unwrap() as usize];
                pos += 2;
                if key == "name" {
                    name = Some(value.clone());
                } else {
                    tags.insert(key.clone(), value.clone());
                }
            }
            let op = values[pos].as_i64().unwrap();
            let value = values[pos + 1].as_f64().unwrap();
            pos += 2;
            records.push(Decoded {
                tags,
                name: name.unwrap(),
                op,
                value,
            });
        }
        (strings, records)
    }

    fn common_tags() -> HashMap<String, String> {
        [("nf.app", "www"), ("nf.cluster", "www-main")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    fn measurement(name: &str, stat: &str, value: f64) -> Measurement {
        Measurement::new(Id::new(name, Tags::new()).with_stat(stat), value)
    }

    #[test]
    fn string_table_is_sorted_and_distinct() {
        let batch = vec![
            measurement("requests", "count", 3.0),
            measurement("queueSize", "max", 9.0),
        ];
        let payload = encode_batch(&common_tags(), &batch).unwrap();
        let (strings, _) = decode(&payload);

        let mut expected: Vec<String> = [
            "name",
            "nf.app",
            "www",
            "nf.cluster",
            "www-main",
            "requests",
            "statistic",
            "count",
            "queueSize",
            "max",
        ]
        .into_iter()
        .map(str::to_owned)
        .collect();
        expected.sort();
        expected.dedup();
        assert_eq!(strings, expected);
    }

    #[test]
    fn round_trip_reconstructs_every_record() {
        let common = common_tags();
        let batch = vec![
            measurement("requests", "count", 3.0),
            measurement("queueSize", "max", 9.0),
        ];
        let payload = encode_batch(&common, &batch).unwrap();
        let (_, records) = decode(&payload);

        assert_eq!(records.len(), 2);
        let requests = &records[0];
        assert_eq!(requests.name, "requests");
        assert_eq!(requests.op, 0);
        assert_eq!(requests.value, 3.0);
        assert_eq!(requests.tags.get("statistic").unwrap(), "count");
        assert_eq!(requests.tags.get("nf.app").unwrap(), "www");
        assert_eq!(requests.tags.get("nf.cluster").unwrap(), "www-main");
        // identity tags + name + common tags
        assert_eq!(requests.tags.len() + 1, 1 + 1 + common.len());

        let queue = &records[1];
        assert_eq!(queue.name, "queueSize");
        assert_eq!(queue.op, 10);
        assert_eq!(queue.value, 9.0);
    }

    #[test]
    fn statistic_to_op_mapping() {
        for stat in ["count", "totalAmount", "totalTime", "totalOfSquares", "percentile"] {
            assert_eq!(op_for_statistic(stat), Some(Op::Add), "{stat}");
        }
        for stat in ["max", "gauge", "activeTasks", "duration"] {
            assert_eq!(op_for_statistic(stat), Some(Op::Max), "{stat}");
        }
        assert_eq!(op_for_statistic("p99"), None);
    }

    #[test]
    fn unknown_statistics_contribute_nothing() {
        let batch = vec![
            measurement("requests", "count", 3.0),
            measurement("dropped", "bogus", 1.0),
            Measurement::new(Arc::new(Id::new("untagged", Tags::new())), 2.0),
        ];
        let payload = encode_batch(&HashMap::new(), &batch).unwrap();
        let (strings, records) = decode(&payload);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "requests");
        // the dropped measurements leave no strings behind either
        assert!(!strings.iter().any(|s| s == "dropped" || s == "bogus"));
        assert!(!strings.iter().any(|s| s == "untagged"));
    }

    #[test]
    fn empty_batch_still_carries_common_strings() {
        let payload = encode_batch(&common_tags(), &[]).unwrap();
        let (strings, records) = decode(&payload);
        assert!(records.is_empty());
        assert_eq!(strings.len(), 5); // name + two common tag pairs
    }

    #[test]
    fn equal_inputs_encode_identically() {
        let batch = vec![measurement("requests", "count", 3.0)];
        let first = encode_batch(&common_tags(), &batch).unwrap();
        let second = encode_batch(&common_tags(), &batch).unwrap();
        assert_eq!(first, second);
    }
}
