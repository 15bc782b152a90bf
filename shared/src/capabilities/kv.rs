use crux_kv::KeyValue;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use thiserror::Error;

use crate::event::Event;

pub const MAX_KEY_LENGTH: usize = 128;
pub const MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Key into the host's client-local storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KvKey(String);

impl KvKey {
    pub fn new(key: impl Into<String>) -> Result<Self, KvError> {
        let key = key.into();
        Self::validate_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate_key(key: &str) -> Result<(), KvError> {
        if key.trim().is_empty() {
            return Err(KvError::InvalidKey {
                key: key.to_string(),
                reason: "key cannot be empty".to_string(),
            });
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(KvError::InvalidKey {
                key: key.chars().take(50).collect::<String>() + "...",
                reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
            });
        }

        if key.chars().any(char::is_control) {
            return Err(KvError::InvalidKey {
                key: key.escape_default().to_string(),
                reason: "key contains control characters".to_string(),
            });
        }

        Ok(())
    }
}

impl std::fmt::Display for KvKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvOperation {
    Get { key: KvKey },
    Set { key: KvKey, value: Vec<u8> },
    Delete { key: KvKey },
}

impl KvOperation {
    pub fn get(key: impl Into<String>) -> Result<Self, KvError> {
        Ok(Self::Get {
            key: KvKey::new(key)?,
        })
    }

    pub fn set(key: impl Into<String>, value: Vec<u8>) -> Result<Self, KvError> {
        if value.len() > MAX_VALUE_SIZE {
            return Err(KvError::ValueTooLarge {
                size: value.len(),
                max: MAX_VALUE_SIZE,
            });
        }
        Ok(Self::Set {
            key: KvKey::new(key)?,
            value,
        })
    }

    pub fn delete(key: impl Into<String>) -> Result<Self, KvError> {
        Ok(Self::Delete {
            key: KvKey::new(key)?,
        })
    }

    pub fn key(&self) -> &KvKey {
        match self {
            Self::Get { key } | Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("unexpected output for {operation}")]
    UnexpectedOutput { operation: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvOutput {
    Value(Option<Vec<u8>>),
    Written,
    Deleted { existed: bool },
}

pub type KvResult = Result<KvOutput, KvError>;

fn storage_error<E: std::fmt::Debug>(e: E) -> KvError {
    KvError::Storage {
        message: format!("{e:?}"),
    }
}

/// Runs a validated operation through the `crux_kv` capability.
pub fn dispatch(kv: &KeyValue<Event>, operation: KvOperation, make_event: fn(KvResult) -> Event) {
    match operation {
        KvOperation::Get { key } => kv.get(key.0, move |result| {
            make_event(result.map(KvOutput::Value).map_err(storage_error))
        }),
        KvOperation::Set { key, value } => kv.set(key.0, value, move |result| {
            make_event(result.map(|_| KvOutput::Written).map_err(storage_error))
        }),
        KvOperation::Delete { key } => kv.delete(key.0, move |result| {
            make_event(
                result
                    .map(|previous| KvOutput::Deleted {
                        existed: previous.is_some(),
                    })
                    .map_err(storage_error),
            )
        }),
    }
}

/// JSON-encoded view over a single storage key.
pub struct TypedKvStore<T> {
    key: &'static str,
    _phantom: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> TypedKvStore<T> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn get_op(&self) -> Result<KvOperation, KvError> {
        KvOperation::get(self.key)
    }

    pub fn set_op(&self, value: &T) -> Result<KvOperation, KvError> {
        let data = serde_json::to_vec(value).map_err(|e| KvError::Serialization {
            message: e.to_string(),
        })?;
        KvOperation::set(self.key, data)
    }

    pub fn delete_op(&self) -> Result<KvOperation, KvError> {
        KvOperation::delete(self.key)
    }

    pub fn parse_value(&self, output: KvOutput) -> Result<Option<T>, KvError> {
        match output {
            KvOutput::Value(Some(bytes)) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| KvError::Serialization {
                    message: e.to_string(),
                }),
            KvOutput::Value(None) => Ok(None),
            _ => Err(KvError::UnexpectedOutput {
                operation: "get".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(matches!(KvKey::new(""), Err(KvError::InvalidKey { .. })));
        assert!(KvKey::new("   ").is_err());
        assert!(KvKey::new("key\0value").is_err());
        assert!(KvKey::new("a".repeat(MAX_KEY_LENGTH + 1)).is_err());
        assert_eq!(KvKey::new("carFormData").unwrap().as_str(), "carFormData");
    }

    #[test]
    fn test_value_size_limit() {
        let result = KvOperation::set("carFormData", vec![0u8; MAX_VALUE_SIZE + 1]);
        assert!(matches!(result, Err(KvError::ValueTooLarge { .. })));
    }

    #[test]
    fn test_operation_key() {
        let op = KvOperation::delete("carFormData").unwrap();
        assert_eq!(op.key().as_str(), "carFormData");
    }

    mod typed_store {
        use super::*;

        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Draft {
            brand: String,
        }

        const STORE: TypedKvStore<Draft> = TypedKvStore::new("draft");

        #[test]
        fn test_set_op_encodes_json() {
            let op = STORE.set_op(&Draft { brand: "Lada".into() }).unwrap();
            match op {
                KvOperation::Set { key, value } => {
                    assert_eq!(key.as_str(), "draft");
                    assert_eq!(value, br#"{"brand":"Lada"}"#.to_vec());
                }
                other => panic!("expected Set, got {other:?}"),
            }
        }

        #[test]
        fn test_parse_value_variants() {
            let stored = KvOutput::Value(Some(br#"{"brand":"Lada"}"#.to_vec()));
            assert_eq!(
                STORE.parse_value(stored).unwrap(),
                Some(Draft { brand: "Lada".into() })
            );
            assert_eq!(STORE.parse_value(KvOutput::Value(None)).unwrap(), None);
            assert!(matches!(
                STORE.parse_value(KvOutput::Value(Some(b"not json".to_vec()))),
                Err(KvError::Serialization { .. })
            ));
            assert!(matches!(
                STORE.parse_value(KvOutput::Written),
                Err(KvError::UnexpectedOutput { .. })
            ));
        }
    }
}
