//! Bounded serialization of captured values into JSON-safe output.
//!
//! Termination is bounded by `max_depth × max_array × max_props` for any
//! input shape, including self-referential graphs: a container already on
//! the recursion path collapses to a cycle marker instead of recursing.

use serde_json::{Map as JsonMap, Number, Value};
use wire::CaptureOptions;

use super::captured::{addr, classify, Captured, ValueKind};

pub const CYCLE_MARKER: &str = "[Circular]";
pub const TRUNCATION_SUFFIX: &str = "…";

const ANONYMOUS: &str = "anonymous";

/// Serialize a captured value under the given bounds.
pub fn serialize(value: &Captured, opts: &CaptureOptions) -> Value {
    let mut visiting = Vec::new();
    serialize_at(value, opts, 0, &mut visiting)
}

fn serialize_at(
    value: &Captured,
    opts: &CaptureOptions,
    depth: usize,
    visiting: &mut Vec<usize>,
) -> Value {
    match classify(value, visiting) {
        ValueKind::CyclicRef => Value::String(CYCLE_MARKER.to_string()),
        ValueKind::Primitive => primitive(value),
        ValueKind::Str => {
            let Captured::Str(s) = value else {
                unreachable!()
            };
            Value::String(clip(s, opts.max_string_length))
        }
        ValueKind::Callable => {
            let Captured::Callable(name) = value else {
                unreachable!()
            };
            Value::String(format!(
                "[Function: {}]",
                name.as_deref().unwrap_or(ANONYMOUS)
            ))
        }
        ValueKind::Error => {
            // Error-likes serialize shallowly, never recursed into.
            let Captured::Error {
                name,
                message,
                stack,
            } = value
            else {
                unreachable!()
            };
            let mut out = JsonMap::new();
            out.insert("name".to_string(), Value::String(name.clone()));
            out.insert("message".to_string(), Value::String(message.clone()));
            out.insert(
                "stack".to_string(),
                stack
                    .as_ref()
                    .map(|s| Value::String(s.clone()))
                    .unwrap_or(Value::Null),
            );
            Value::Object(out)
        }
        ValueKind::Date => {
            let Captured::Date(dt) = value else {
                unreachable!()
            };
            Value::String(dt.to_rfc3339())
        }
        ValueKind::Handle => {
            let Captured::Handle { tag, id } = value else {
                unreachable!()
            };
            Value::String(match id {
                Some(id) => format!("<{}#{}>", tag, id),
                None => format!("<{}>", tag),
            })
        }
        ValueKind::ArrayLike => {
            let Captured::Array(cell) = value else {
                unreachable!()
            };
            let items = cell.borrow();
            if depth >= opts.max_depth {
                return Value::String(format!("[Array({})]", items.len()));
            }
            visiting.push(addr(cell));
            let mut out = Vec::with_capacity(items.len().min(opts.max_array) + 1);
            for item in items.iter().take(opts.max_array) {
                out.push(serialize_at(item, opts, depth + 1, visiting));
            }
            if items.len() > opts.max_array {
                out.push(Value::String(format!(
                    "{} {} more",
                    TRUNCATION_SUFFIX,
                    items.len() - opts.max_array
                )));
            }
            visiting.pop();
            Value::Array(out)
        }
        ValueKind::MapLike => {
            let Captured::Map(cell) = value else {
                unreachable!()
            };
            let entries = cell.borrow();
            if depth >= opts.max_depth {
                return Value::String("[Object]".to_string());
            }
            visiting.push(addr(cell));
            let mut out = JsonMap::new();
            for (key, item) in entries.iter().take(opts.max_props) {
                out.insert(key.clone(), serialize_at(item, opts, depth + 1, visiting));
            }
            if entries.len() > opts.max_props {
                out.insert(
                    TRUNCATION_SUFFIX.to_string(),
                    Value::String(format!("{} more", entries.len() - opts.max_props)),
                );
            }
            visiting.pop();
            Value::Object(out)
        }
    }
}

fn primitive(value: &Captured) -> Value {
    match value {
        Captured::Null => Value::Null,
        Captured::Bool(b) => Value::Bool(*b),
        Captured::Int(n) => Value::Number(Number::from(*n)),
        // JSON has no encoding for NaN/infinity; stringify those.
        Captured::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        Captured::BigInt(s) => Value::String(s.clone()),
        Captured::Symbol(desc) => Value::String(format!("Symbol({})", desc)),
        _ => unreachable!("non-primitive passed to primitive()"),
    }
}

/// Truncate a string to `max` characters with the truncation suffix.
pub(crate) fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str(TRUNCATION_SUFFIX);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::rc::Rc;

    fn opts() -> CaptureOptions {
        CaptureOptions::default()
    }

    // ── Scalars ──────────────────────────────────────────────────

    #[test]
    fn primitives_pass_through() {
        assert_eq!(serialize(&Captured::Null, &opts()), Value::Null);
        assert_eq!(serialize(&Captured::Bool(true), &opts()), Value::Bool(true));
        assert_eq!(serialize(&Captured::Int(-7), &opts()), Value::from(-7));
        assert_eq!(serialize(&Captured::Float(1.5), &opts()), Value::from(1.5));
    }

    #[test]
    fn non_finite_floats_stringify() {
        assert_eq!(
            serialize(&Captured::Float(f64::NAN), &opts()),
            Value::String("NaN".to_string())
        );
        assert_eq!(
            serialize(&Captured::Float(f64::INFINITY), &opts()),
            Value::String("inf".to_string())
        );
    }

    #[test]
    fn bigint_and_symbol_become_strings() {
        let big = "123456789012345678901234567890";
        assert_eq!(
            serialize(&Captured::BigInt(big.to_string()), &opts()),
            Value::String(big.to_string())
        );
        assert_eq!(
            serialize(&Captured::Symbol("token".to_string()), &opts()),
            Value::String("Symbol(token)".to_string())
        );
    }

    #[test]
    fn string_truncates_to_exact_length_plus_suffix() {
        let bounded = CaptureOptions {
            max_string_length: 5,
            ..opts()
        };
        let out = serialize(&Captured::str("abcdefghij"), &bounded);
        assert_eq!(out, Value::String(format!("abcde{}", TRUNCATION_SUFFIX)));

        // exactly at the limit: untouched
        let out = serialize(&Captured::str("abcde"), &bounded);
        assert_eq!(out, Value::String("abcde".to_string()));
    }

    #[test]
    fn string_truncation_counts_characters_not_bytes() {
        let bounded = CaptureOptions {
            max_string_length: 3,
            ..opts()
        };
        let out = serialize(&Captured::str("héllo"), &bounded);
        assert_eq!(out, Value::String(format!("hél{}", TRUNCATION_SUFFIX)));
    }

    #[test]
    fn callable_markers() {
        assert_eq!(
            serialize(&Captured::Callable(Some("fetchUser".to_string())), &opts()),
            Value::String("[Function: fetchUser]".to_string())
        );
        assert_eq!(
            serialize(&Captured::Callable(None), &opts()),
            Value::String("[Function: anonymous]".to_string())
        );
    }

    #[test]
    fn error_serializes_shallowly() {
        let err = Captured::Error {
            name: "TypeError".to_string(),
            message: "x is not a function".to_string(),
            stack: Some("at main".to_string()),
        };
        let out = serialize(&err, &opts());
        assert_eq!(out["name"], "TypeError");
        assert_eq!(out["message"], "x is not a function");
        assert_eq!(out["stack"], "at main");
    }

    #[test]
    fn date_serializes_to_rfc3339() {
        let dt = chrono::Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let out = serialize(&Captured::Date(dt), &opts());
        assert_eq!(out, Value::String("2026-01-02T03:04:05+00:00".to_string()));
    }

    #[test]
    fn handle_serializes_to_short_tag() {
        let with_id = Captured::Handle {
            tag: "div".to_string(),
            id: Some("root".to_string()),
        };
        assert_eq!(
            serialize(&with_id, &opts()),
            Value::String("<div#root>".to_string())
        );
        let bare = Captured::Handle {
            tag: "canvas".to_string(),
            id: None,
        };
        assert_eq!(
            serialize(&bare, &opts()),
            Value::String("<canvas>".to_string())
        );
    }

    // ── Cycles ───────────────────────────────────────────────────

    #[test]
    fn direct_cycle_replaced_by_marker() {
        // { a: 1, self: <itself> } with default depth
        let obj = Captured::map(vec![("a", Captured::Int(1))]);
        let Captured::Map(cell) = &obj else {
            unreachable!()
        };
        cell.borrow_mut()
            .push(("self".to_string(), Captured::Map(Rc::clone(cell))));

        let bounded = CaptureOptions {
            max_depth: 4,
            ..opts()
        };
        let out = serialize(&obj, &bounded);
        assert_eq!(out["a"], 1);
        assert_eq!(out["self"], CYCLE_MARKER);
    }

    #[test]
    fn indirect_cycle_through_chain_replaced_by_marker() {
        // a -> b -> a
        let a = Captured::map::<String>(vec![]);
        let b = Captured::map::<String>(vec![]);
        let (Captured::Map(ca), Captured::Map(cb)) = (&a, &b) else {
            unreachable!()
        };
        ca.borrow_mut()
            .push(("b".to_string(), Captured::Map(Rc::clone(cb))));
        cb.borrow_mut()
            .push(("a".to_string(), Captured::Map(Rc::clone(ca))));

        let out = serialize(&a, &opts());
        assert_eq!(out["b"]["a"], CYCLE_MARKER);
    }

    #[test]
    fn shared_sibling_is_not_a_cycle() {
        // { x: shared, y: shared } — same node reachable twice, but never
        // through itself; must serialize fully both times.
        let shared = Captured::array(vec![Captured::Int(1)]);
        let obj = Captured::map(vec![("x", shared.clone()), ("y", shared)]);
        let out = serialize(&obj, &opts());
        assert_eq!(out["x"], serde_json::json!([1]));
        assert_eq!(out["y"], serde_json::json!([1]));
    }

    #[test]
    fn self_referential_array_terminates() {
        let arr = Captured::array(vec![Captured::Int(0)]);
        let Captured::Array(cell) = &arr else {
            unreachable!()
        };
        cell.borrow_mut().push(Captured::Array(Rc::clone(cell)));
        let out = serialize(&arr, &opts());
        assert_eq!(out[0], 0);
        assert_eq!(out[1], CYCLE_MARKER);
    }

    // ── Depth and width bounds ───────────────────────────────────

    #[test]
    fn depth_bound_collapses_to_shallow_marker() {
        let inner = Captured::array(vec![Captured::Int(1), Captured::Int(2)]);
        let mid = Captured::map(vec![("inner", inner)]);
        let outer = Captured::map(vec![("mid", mid)]);

        let bounded = CaptureOptions {
            max_depth: 2,
            ..opts()
        };
        let out = serialize(&outer, &bounded);
        // depth 0 = outer, depth 1 = mid, depth 2 = inner collapses
        assert_eq!(out["mid"]["inner"], "[Array(2)]");
    }

    #[test]
    fn depth_bound_object_marker() {
        let inner = Captured::map(vec![("k", Captured::Int(1))]);
        let outer = Captured::array(vec![inner]);
        let bounded = CaptureOptions {
            max_depth: 1,
            ..opts()
        };
        let out = serialize(&outer, &bounded);
        assert_eq!(out[0], "[Object]");
    }

    #[test]
    fn no_output_nests_deeper_than_max_depth() {
        fn depth_of(v: &Value) -> usize {
            match v {
                Value::Array(items) => 1 + items.iter().map(depth_of).max().unwrap_or(0),
                Value::Object(map) => 1 + map.values().map(depth_of).max().unwrap_or(0),
                _ => 0,
            }
        }
        // 10 levels of nesting, bound at 3
        let mut node = Captured::array(vec![Captured::Int(1)]);
        for _ in 0..10 {
            node = Captured::array(vec![node]);
        }
        let bounded = CaptureOptions {
            max_depth: 3,
            ..opts()
        };
        let out = serialize(&node, &bounded);
        assert!(depth_of(&out) <= 3, "output too deep: {}", depth_of(&out));
    }

    #[test]
    fn array_truncates_with_more_marker() {
        let items: Vec<Captured> = (0..7).map(Captured::Int).collect();
        let arr = Captured::array(items);
        let bounded = CaptureOptions {
            max_array: 5,
            ..opts()
        };
        let out = serialize(&arr, &bounded);
        let Value::Array(elements) = out else {
            panic!("expected array")
        };
        assert_eq!(elements.len(), 6, "5 items + 1 marker");
        assert_eq!(elements[4], 4);
        assert_eq!(
            elements[5],
            Value::String(format!("{} 2 more", TRUNCATION_SUFFIX))
        );
    }

    #[test]
    fn map_truncates_keys_in_original_order() {
        let obj = Captured::map(vec![
            ("first", Captured::Int(1)),
            ("second", Captured::Int(2)),
            ("third", Captured::Int(3)),
            ("fourth", Captured::Int(4)),
        ]);
        let bounded = CaptureOptions {
            max_props: 2,
            ..opts()
        };
        let out = serialize(&obj, &bounded);
        let Value::Object(map) = out else {
            panic!("expected object")
        };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["first", "second", TRUNCATION_SUFFIX]);
        assert_eq!(map[TRUNCATION_SUFFIX], "2 more");
    }

    #[test]
    fn ancestor_set_does_not_leak_across_siblings() {
        // The same node as two children of one parent: the second branch
        // must not see the first branch's membership.
        let child = Captured::map(vec![("v", Captured::Int(9))]);
        let parent = Captured::array(vec![child.clone(), child]);
        let out = serialize(&parent, &opts());
        assert_eq!(out[0]["v"], 9);
        assert_eq!(out[1]["v"], 9);
    }
}
