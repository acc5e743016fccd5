//! The event source adapter: turns a live `serde::Deserializer` (a chunk of
//! wire bytes) or an already-materialized `serde_json::Value` into calls
//! against a [`Validator`]'s handler methods.
//!
//! Built around a `pub fn walk` / `struct Visitor` /
//! `DeserializeSeed`-driven recursive descent, without any content-hash
//! `Span` bookkeeping: that exists for document diffing and has no bearing
//! on streaming validation.

use crate::event::EventSink;
use crate::validator::Validator;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess};

fn canceled<E: de::Error>() -> E {
    de::Error::custom("validation canceled")
}

struct Walk<'a, 's, S: EventSink> {
    validator: &'a mut Validator<'s>,
    sink: &'a mut S,
}

impl<'de, 'a, 's, S: EventSink> de::Visitor<'de> for Walk<'a, 's, S> {
    type Value = bool;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
        Ok(self.validator.handle_boolean(v, self.sink))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
        Ok(self.validator.handle_integer(v, self.sink))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
        let v = i64::try_from(v).unwrap_or(i64::MAX);
        Ok(self.validator.handle_integer(v, self.sink))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
        Ok(self.validator.handle_double(v, self.sink))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
        Ok(self.validator.handle_string(v, self.sink))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<bool, E> {
        Ok(self.validator.handle_string(&v, self.sink))
    }

    fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
        Ok(self.validator.handle_null(self.sink))
    }

    fn visit_none<E: de::Error>(self) -> Result<bool, E> {
        Ok(self.validator.handle_null(self.sink))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<bool, A::Error>
    where
        A: SeqAccess<'de>,
    {
        if !self.validator.handle_start_array(self.sink) {
            return Err(canceled());
        }
        while let Some(cont) = seq.next_element_seed(ValueSeed {
            validator: self.validator,
            sink: self.sink,
        })? {
            if !cont {
                return Err(canceled());
            }
        }
        if !self.validator.handle_end_array(self.sink) {
            return Err(canceled());
        }
        Ok(true)
    }

    fn visit_map<A>(self, mut map: A) -> Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        if !self.validator.handle_start_object(self.sink) {
            return Err(canceled());
        }
        while let Some(key) = map.next_key::<String>()? {
            if !self.validator.handle_map_key(&key, self.sink) {
                return Err(canceled());
            }
            let cont = map.next_value_seed(ValueSeed {
                validator: self.validator,
                sink: self.sink,
            })?;
            if !cont {
                return Err(canceled());
            }
        }
        if !self.validator.handle_end_object(self.sink) {
            return Err(canceled());
        }
        Ok(true)
    }
}

struct ValueSeed<'a, 's, S: EventSink> {
    validator: &'a mut Validator<'s>,
    sink: &'a mut S,
}

impl<'de, 'a, 's, S: EventSink> DeserializeSeed<'de> for ValueSeed<'a, 's, S> {
    type Value = bool;

    fn deserialize<D>(self, deserializer: D) -> Result<bool, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(Walk {
            validator: self.validator,
            sink: self.sink,
        })
    }
}

/// Drive `validator`'s handlers from a single document produced by
/// `deserializer`, forwarding accepted events to `sink`.
pub fn walk<'de, D, S>(
    deserializer: D,
    validator: &mut Validator<'_>,
    sink: &mut S,
) -> Result<bool, D::Error>
where
    D: de::Deserializer<'de>,
    S: EventSink,
{
    deserializer.deserialize_any(Walk { validator, sink })
}

/// Emit the event sequence a parser would produce for an already-built
/// `serde_json::Value`, driving the same handler methods `walk` uses. This
/// is the one routine shared by default-value replay (`Validator`'s
/// container-close handlers) and the in-memory `Validator::validate` API.
pub(crate) fn synthesize<S: EventSink>(
    validator: &mut Validator<'_>,
    value: &serde_json::Value,
    sink: &mut S,
) -> bool {
    match value {
        serde_json::Value::Null => validator.handle_null(sink),
        serde_json::Value::Bool(b) => validator.handle_boolean(*b, sink),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                validator.handle_integer(i, sink)
            } else {
                validator.handle_double(n.as_f64().unwrap_or(0.0), sink)
            }
        }
        serde_json::Value::String(s) => validator.handle_string(s, sink),
        serde_json::Value::Array(items) => {
            if !validator.handle_start_array(sink) {
                return false;
            }
            for item in items {
                if !synthesize(validator, item, sink) {
                    return false;
                }
            }
            validator.handle_end_array(sink)
        }
        serde_json::Value::Object(map) => {
            if !validator.handle_start_object(sink) {
                return false;
            }
            for (k, v) in map {
                if !validator.handle_map_key(k, sink) {
                    return false;
                }
                if !synthesize(validator, v, sink) {
                    return false;
                }
            }
            validator.handle_end_object(sink)
        }
    }
}
