use crate::batch::dataset::InMemoryDataset;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// batch kwargs에 들어가는 값
#[derive(Debug, Clone, PartialEq)]
pub enum KwargValue {
    /// YAML/JSON으로 표현 가능한 값
    Value(Value),
    /// 인메모리 프레임 (`dataset` 키)
    Dataset(InMemoryDataset),
}

impl KwargValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            KwargValue::Value(v) => Some(v),
            KwargValue::Dataset(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_dataset(&self) -> Option<&InMemoryDataset> {
        match self {
            KwargValue::Dataset(d) => Some(d),
            KwargValue::Value(_) => None,
        }
    }

    /// fingerprint 입력: 타입 태그 + 길이 접두 바이트열
    ///
    /// 태그가 있으므로 어떤 JSON 값도 데이터셋과 같은 입력을 만들 수 없습니다.
    fn hash_into(&self, hasher: &mut Sha256) {
        match self {
            KwargValue::Value(v) => {
                hasher.update([VALUE_TAG]);
                update_framed(hasher, canonicalize(v).to_string().as_bytes());
            }
            KwargValue::Dataset(d) => {
                hasher.update([DATASET_TAG]);
                update_framed(hasher, d.kind.as_str().as_bytes());
                update_framed(hasher, canonicalize(&d.content_value()).to_string().as_bytes());
            }
        }
    }
}

const VALUE_TAG: u8 = 0x01;
const DATASET_TAG: u8 = 0x02;

fn update_framed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

impl From<Value> for KwargValue {
    fn from(value: Value) -> Self {
        KwargValue::Value(value)
    }
}

impl From<&str> for KwargValue {
    fn from(value: &str) -> Self {
        KwargValue::Value(Value::String(value.to_string()))
    }
}

impl From<String> for KwargValue {
    fn from(value: String) -> Self {
        KwargValue::Value(Value::String(value))
    }
}

impl From<InMemoryDataset> for KwargValue {
    fn from(value: InMemoryDataset) -> Self {
        KwargValue::Dataset(value)
    }
}

/// "배치를 어떻게 가져올지"를 나타내는 순서 있는 키-값 묶음
///
/// 삽입 순서를 유지하지만 비교와 fingerprint는 순서와 무관합니다.
#[derive(Debug, Clone, Default)]
pub struct BatchKwargs {
    entries: Vec<(String, KwargValue)>,
}

impl BatchKwargs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 값 추가 (같은 키가 있으면 그 자리에서 교체)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<KwargValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<KwargValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&KwargValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(KwargValue::as_value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(KwargValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KwargValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// 내용 기반 fingerprint (SHA256 hex)
    ///
    /// 같은 키/값이면 삽입 순서와 관계없이 같은 값을 반환합니다.
    pub fn to_id(&self) -> String {
        let mut sorted: Vec<&(String, KwargValue)> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        for (key, value) in sorted {
            update_framed(&mut hasher, key.as_bytes());
            value.hash_into(&mut hasher);
        }
        format!("{:x}", hasher.finalize())
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

impl PartialEq for BatchKwargs {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl From<Map<String, Value>> for BatchKwargs {
    fn from(map: Map<String, Value>) -> Self {
        let mut kwargs = BatchKwargs::new();
        for (key, value) in map {
            kwargs.insert(key, value);
        }
        kwargs
    }
}

impl<K: Into<String>, V: Into<KwargValue>> FromIterator<(K, V)> for BatchKwargs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut kwargs = BatchKwargs::new();
        for (key, value) in iter {
            kwargs.insert(key, value);
        }
        kwargs
    }
}

/// 매핑 리터럴 형태로 출력: `{'path': '/data/a.csv', 'limit': 10}`
impl fmt::Display for BatchKwargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (key, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, key)?;
            f.write_str(": ")?;
            match value {
                KwargValue::Value(v) => write_literal(f, v)?,
                KwargValue::Dataset(d) => write!(
                    f,
                    "<{} dataset: {} rows x {} columns>",
                    d.kind.as_str(),
                    d.row_count(),
                    d.columns.len()
                )?,
            }
        }
        f.write_str("}")
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for ch in s.chars() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            _ => write!(f, "{}", ch)?,
        }
    }
    f.write_str("'")
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write_quoted(f, s),
        Value::Array(items) => {
            f.write_str("[")?;
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write_literal(f, item)?;
            }
            f.write_str("]")
        }
        Value::Object(map) => {
            f.write_str("{")?;
            for (idx, (key, item)) in map.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write_quoted(f, key)?;
                f.write_str(": ")?;
                write_literal(f, item)?;
            }
            f.write_str("}")
        }
        Value::Bool(true) => f.write_str("True"),
        Value::Bool(false) => f.write_str("False"),
        Value::Null => f.write_str("None"),
        Value::Number(n) => write!(f, "{}", n),
    }
}

impl Serialize for BatchKwargs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            match value {
                KwargValue::Value(v) => map.serialize_entry(key, v)?,
                KwargValue::Dataset(d) => map.serialize_entry(key, d)?,
            }
        }
        map.end()
    }
}

struct BatchKwargsVisitor;

impl<'de> Visitor<'de> for BatchKwargsVisitor {
    type Value = BatchKwargs;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping of batch kwargs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut kwargs = BatchKwargs::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            kwargs.insert(key, value);
        }
        Ok(kwargs)
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(BatchKwargs::new())
    }
}

// `dataset` 값은 역직렬화되지 않음: 파일에서 읽은 kwargs는 항상 JSON 값만 가짐
impl<'de> Deserialize<'de> for BatchKwargs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BatchKwargsVisitor)
    }
}
