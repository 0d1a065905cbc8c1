//! JSON wire codec for condition trees
//!
//! Every node is a single-key object keyed by its [`Tag`]:
//!
//! ```json
//! {"CondAllOf": [{"CondIPv4": {"MatchSource": {"Net": "10.0.0.0/8"}}},
//!                {"CondNot": {"CondClass": {"TrafficClass": 2}}}]}
//! ```
//!
//! Decoding also accepts the field-wrapped forms (`{"Conds": [...]}`,
//! `{"Operand": {...}}`, `{"Predicate": {...}}`) and bare predicates at
//! condition level. Encoding always emits the bare forms above.

use crate::condition::ast::{ClassId, Condition, Ipv4Predicate, Tag};
use crate::condition::validate::{check_dscp_range, parse_dscp};
use crate::error::{ClassError, Result};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

const FIELD_CONDS: &str = "Conds";
const FIELD_OPERAND: &str = "Operand";
const FIELD_PREDICATE: &str = "Predicate";
const FIELD_TRAFFIC_CLASS: &str = "TrafficClass";
const FIELD_NET: &str = "Net";
const FIELD_DSCP: &str = "DSCP";

/// Decode a wire value into a condition tree
pub fn decode(value: &Value) -> Result<Condition> {
    let (tag, body) = split_tagged(value)?;
    match tag {
        Tag::CondAllOf => Ok(Condition::AllOf(decode_children(body)?)),
        Tag::CondAnyOf => Ok(Condition::AnyOf(decode_children(body)?)),
        Tag::CondNot => {
            let operand = unwrap_field(body, FIELD_OPERAND);
            Ok(Condition::not(decode(operand)?))
        }
        Tag::CondBool => body
            .as_bool()
            .map(Condition::Bool)
            .ok_or_else(|| decode_error("CondBool expects a boolean", body)),
        Tag::CondIpv4 => {
            let predicate = unwrap_field(body, FIELD_PREDICATE);
            Ok(Condition::Ipv4Match(decode_predicate(predicate)?))
        }
        Tag::CondClass => Ok(Condition::ClassMatch(decode_class_ref(body)?)),
        Tag::MatchSource | Tag::MatchDestination | Tag::MatchDscp => {
            Ok(Condition::Ipv4Match(predicate_body(tag, body)?))
        }
    }
}

/// Decode a JSON string
pub fn decode_str(json: &str) -> Result<Condition> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ClassError::Decode(e.to_string()))?;
    decode(&value)
}

/// Decode a predicate object, restricted to the three predicate tags
pub fn decode_predicate(value: &Value) -> Result<Ipv4Predicate> {
    let (tag, body) = split_tagged(value)?;
    if !tag.is_predicate() {
        return Err(decode_error("expected an IPv4 predicate", value));
    }
    predicate_body(tag, body)
}

/// Encode a condition tree. Fails on a `Not` without operand.
pub fn encode(cond: &Condition) -> Result<Value> {
    encode_at(cond, &mut String::from("$"))
}

/// Encode a predicate as its single-key wire object
pub fn encode_predicate(predicate: &Ipv4Predicate) -> Value {
    let body = match predicate {
        Ipv4Predicate::MatchSource(net) | Ipv4Predicate::MatchDestination(net) => {
            json!({ FIELD_NET: net })
        }
        Ipv4Predicate::MatchDscp(Some(dscp)) => json!({ FIELD_DSCP: format!("{:#x}", dscp) }),
        Ipv4Predicate::MatchDscp(None) => json!({}),
    };
    tagged(predicate.tag(), body)
}

fn encode_at(cond: &Condition, at: &mut String) -> Result<Value> {
    let body = match cond {
        Condition::AllOf(conds) | Condition::AnyOf(conds) => {
            let mut out = Vec::with_capacity(conds.len());
            for (i, child) in conds.iter().enumerate() {
                let len = at.len();
                at.push_str(&format!("/{}", i));
                out.push(encode_at(child, at)?);
                at.truncate(len);
            }
            Value::Array(out)
        }
        Condition::Not(Some(operand)) => {
            at.push_str("/0");
            encode_at(operand, at)?
        }
        Condition::Not(None) => return Err(ClassError::IncompleteCondition(at.clone())),
        Condition::Bool(value) => Value::Bool(*value),
        Condition::Ipv4Match(predicate) => encode_predicate(predicate),
        Condition::ClassMatch(Some(id)) => json!({ FIELD_TRAFFIC_CLASS: id }),
        Condition::ClassMatch(None) => json!({}),
    };
    Ok(tagged(cond.tag(), body))
}

fn tagged(tag: Tag, body: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(tag.as_str().to_string(), body);
    Value::Object(map)
}

/// Split `{"<Tag>": body}` into its tag and body
fn split_tagged(value: &Value) -> Result<(Tag, &Value)> {
    let map = value
        .as_object()
        .ok_or_else(|| decode_error("expected a single-key object", value))?;
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((key, body)), None) => match Tag::from_key(key) {
            Some(tag) => Ok((tag, body)),
            None => Err(decode_error("unrecognized condition tag", value)),
        },
        _ => Err(decode_error("expected exactly one key", value)),
    }
}

/// Accept `{"<field>": inner}` as well as `inner`
fn unwrap_field<'a>(body: &'a Value, field: &str) -> &'a Value {
    match body.as_object() {
        Some(map) if map.len() == 1 => map.get(field).unwrap_or(body),
        _ => body,
    }
}

fn decode_children(body: &Value) -> Result<Vec<Condition>> {
    let items = unwrap_field(body, FIELD_CONDS)
        .as_array()
        .ok_or_else(|| decode_error("combinator expects an array", body))?;
    items.iter().map(decode).collect()
}

fn predicate_body(tag: Tag, body: &Value) -> Result<Ipv4Predicate> {
    match tag {
        Tag::MatchSource => Ok(Ipv4Predicate::MatchSource(decode_net(body)?)),
        Tag::MatchDestination => Ok(Ipv4Predicate::MatchDestination(decode_net(body)?)),
        Tag::MatchDscp => Ok(Ipv4Predicate::MatchDscp(decode_dscp(body)?)),
        _ => Err(decode_error("expected an IPv4 predicate", body)),
    }
}

fn decode_net(body: &Value) -> Result<String> {
    match body.get(FIELD_NET) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(net)) => Ok(net.clone()),
        Some(other) => Err(decode_error("Net expects a string", other)),
    }
}

fn decode_dscp(body: &Value) -> Result<Option<u8>> {
    match body.get(FIELD_DSCP) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(parse_dscp(text)?)),
        Some(Value::Number(n)) => {
            let raw = n
                .as_u64()
                .ok_or_else(|| decode_error("DSCP expects a non-negative integer", body))?;
            Ok(Some(check_dscp_range(raw)?))
        }
        Some(other) => Err(decode_error("DSCP expects a hex string or integer", other)),
    }
}

fn decode_class_ref(body: &Value) -> Result<Option<ClassId>> {
    let raw = match body.get(FIELD_TRAFFIC_CLASS) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    raw.and_then(|id| ClassId::try_from(id).ok())
        .map(Some)
        .ok_or_else(|| decode_error("TrafficClass expects an integer id", body))
}

fn decode_error(reason: &str, payload: &Value) -> ClassError {
    tracing::warn!(%payload, reason, "failed to decode condition");
    ClassError::Decode(format!("{}: {}", reason, payload))
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        encode(self)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode(&value).map_err(D::Error::custom)
    }
}
