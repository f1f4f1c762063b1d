use serde::Deserialize;

/// Backend ids arrive either as JSON strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl RawId {
    pub(crate) fn into_string(self) -> String {
        match self {
            RawId::Text(value) => value,
            RawId::Signed(value) => value.to_string(),
            RawId::Unsigned(value) => value.to_string(),
        }
    }
}

pub(crate) fn wire_value(value: &str) -> serde_json::Value {
    let numeric = !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit());
    match value.parse::<u64>() {
        Ok(number) if numeric => serde_json::Value::from(number),
        _ => serde_json::Value::String(value.to_string()),
    }
}

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Numeric-looking ids are written back as integers.
            pub fn to_wire(&self) -> serde_json::Value {
                wire_value(&self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&self.to_wire(), serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
            }
        }
    };
}

opaque_id!(JobId);
opaque_id!(UserId);
opaque_id!(PromptId);
opaque_id!(ErrorLogId);
