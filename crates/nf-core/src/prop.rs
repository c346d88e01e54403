//! Typed property values.
//!
//! A `Prop` is a named, typed value backing one row of the property grid.
//! Props tokenize to JSON for persistence and for shipping to the REST
//! backend; `deTokenize(tokenize(p, slim = false))` reconstructs an
//! equivalent prop. Resource references (assets, groups, files) tokenize
//! as shallow ids — the live object graph is never serialized.

use crate::id::Name;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors produced while decoding tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has the wrong shape: {detail}")]
    BadField {
        field: &'static str,
        detail: String,
    },
    #[error("unknown property type tag `{0}`")]
    UnknownTag(String),
    #[error("unknown item type tag `{0}`")]
    UnknownItemTag(String),
}

// ─── Data types ──────────────────────────────────────────────────────────

/// The wire discriminator of a property's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Asset,
    AssetList,
    Number,
    Color,
    Group,
    File,
    String,
    Object,
    Bool,
    Enum,
    Hidden,
    HiddenFile,
    Options,
}

impl DataType {
    pub fn tag(&self) -> &'static str {
        match self {
            DataType::Asset => "ASSET",
            DataType::AssetList => "ASSET_LIST",
            DataType::Number => "NUMBER",
            DataType::Color => "COLOR",
            DataType::Group => "GROUP",
            DataType::File => "FILE",
            DataType::String => "STRING",
            DataType::Object => "OBJECT",
            DataType::Bool => "BOOL",
            DataType::Enum => "ENUM",
            DataType::Hidden => "HIDDEN",
            DataType::HiddenFile => "HIDDEN_FILE",
            DataType::Options => "OPTIONS",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, TokenError> {
        Ok(match tag {
            "ASSET" => DataType::Asset,
            "ASSET_LIST" => DataType::AssetList,
            "NUMBER" => DataType::Number,
            "COLOR" => DataType::Color,
            "GROUP" => DataType::Group,
            "FILE" => DataType::File,
            "STRING" => DataType::String,
            "OBJECT" => DataType::Object,
            "BOOL" => DataType::Bool,
            "ENUM" => DataType::Enum,
            "HIDDEN" => DataType::Hidden,
            "HIDDEN_FILE" => DataType::HiddenFile,
            "OPTIONS" => DataType::Options,
            other => return Err(TokenError::UnknownTag(other.to_string())),
        })
    }
}

// ─── Color ───────────────────────────────────────────────────────────────

/// RGB color, stored as 3 × u8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string: `#RGB` or `#RRGGBB`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                Some(Self::rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// ─── Values ──────────────────────────────────────────────────────────────

/// The typed payload of a property, one variant per [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Resource reference by shallow id, constrained to asset classes.
    Asset {
        shallow_id: Option<u32>,
        class_names: Vec<String>,
    },
    AssetList {
        shallow_ids: Vec<u32>,
        class_names: Vec<String>,
    },
    Num {
        value: f64,
        min: f64,
        max: f64,
        decimals: u8,
        interval: f64,
    },
    Color {
        color: Color,
        alpha: f64,
    },
    Group {
        group_id: Option<u32>,
    },
    File {
        id: Option<String>,
        extensions: Vec<String>,
    },
    Str(String),
    Object(Value),
    Bool(bool),
    Enum {
        value: String,
        choices: Vec<String>,
    },
    Hidden(String),
    HiddenFile {
        id: Option<String>,
    },
    Options {
        value: String,
        options: Vec<String>,
    },
}

impl PropValue {
    pub fn data_type(&self) -> DataType {
        match self {
            PropValue::Asset { .. } => DataType::Asset,
            PropValue::AssetList { .. } => DataType::AssetList,
            PropValue::Num { .. } => DataType::Number,
            PropValue::Color { .. } => DataType::Color,
            PropValue::Group { .. } => DataType::Group,
            PropValue::File { .. } => DataType::File,
            PropValue::Str(_) => DataType::String,
            PropValue::Object(_) => DataType::Object,
            PropValue::Bool(_) => DataType::Bool,
            PropValue::Enum { .. } => DataType::Enum,
            PropValue::Hidden(_) => DataType::Hidden,
            PropValue::HiddenFile { .. } => DataType::HiddenFile,
            PropValue::Options { .. } => DataType::Options,
        }
    }

    /// The bare `value` field of the token — what a slim tokenize carries.
    fn value_json(&self) -> Value {
        match self {
            PropValue::Asset { shallow_id, .. } => json!(shallow_id),
            PropValue::AssetList { shallow_ids, .. } => json!(shallow_ids),
            PropValue::Num { value, .. } => json!(value),
            PropValue::Color { color, .. } => json!(color.to_hex()),
            PropValue::Group { group_id } => json!(group_id),
            PropValue::File { id, .. } => json!(id),
            PropValue::Str(s) => json!(s),
            PropValue::Object(v) => v.clone(),
            PropValue::Bool(b) => json!(b),
            PropValue::Enum { value, .. } => json!(value),
            PropValue::Hidden(s) => json!(s),
            PropValue::HiddenFile { id } => json!(id),
            PropValue::Options { value, .. } => json!(value),
        }
    }
}

// ─── Prop ────────────────────────────────────────────────────────────────

/// A named, typed, serializable property.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    /// Unique within the owning `EditableSet`.
    pub name: Name,
    pub value: PropValue,
    /// Optional grouping label for the property grid.
    pub category: Option<String>,
    /// Opaque side-channel data carried through tokenization untouched.
    pub options: Option<Value>,
}

impl Prop {
    pub fn new(name: &str, value: PropValue) -> Self {
        Self {
            name: Name::intern(name),
            value,
            category: None,
            options: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    // Constructors for the common subtypes.

    pub fn num(name: &str, value: f64, min: f64, max: f64, decimals: u8, interval: f64) -> Self {
        Self::new(
            name,
            PropValue::Num {
                value,
                min,
                max,
                decimals,
                interval,
            },
        )
    }

    pub fn string(name: &str, value: &str) -> Self {
        Self::new(name, PropValue::Str(value.to_string()))
    }

    pub fn boolean(name: &str, value: bool) -> Self {
        Self::new(name, PropValue::Bool(value))
    }

    pub fn enumeration(name: &str, value: &str, choices: &[&str]) -> Self {
        Self::new(
            name,
            PropValue::Enum {
                value: value.to_string(),
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
        )
    }

    pub fn asset(name: &str, shallow_id: Option<u32>, class_names: &[&str]) -> Self {
        Self::new(
            name,
            PropValue::Asset {
                shallow_id,
                class_names: class_names.iter().map(|c| c.to_string()).collect(),
            },
        )
    }

    pub fn color(name: &str, color: Color, alpha: f64) -> Self {
        Self::new(name, PropValue::Color { color, alpha })
    }

    /// The data type this prop carries on the wire.
    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }

    /// Read a numeric value, clamped to `[min, max]` and rounded to
    /// `decimals` digits. Clamping happens on every read — stored values
    /// are left untouched so later widening of the range restores them.
    pub fn num_value(&self) -> Option<f64> {
        match &self.value {
            PropValue::Num {
                value,
                min,
                max,
                decimals,
                ..
            } => {
                let clamped = value.clamp(*min, *max);
                let factor = 10f64.powi(*decimals as i32);
                Some((clamped * factor).round() / factor)
            }
            _ => None,
        }
    }

    // ─── Tokenize / deTokenize ───────────────────────────────────────────

    /// Serialize to a JSON token.
    ///
    /// `slim` carries only `{name, value}` — enough for a live update to a
    /// set whose shape is already known. The full form carries everything
    /// needed to reconstruct the prop.
    pub fn tokenize(&self, slim: bool) -> Value {
        let mut token = json!({
            "name": self.name.as_str(),
            "value": self.value.value_json(),
        });
        if slim {
            return token;
        }

        let obj = token.as_object_mut().unwrap();
        obj.insert("type".into(), json!(self.data_type().tag()));
        if let Some(category) = &self.category {
            obj.insert("category".into(), json!(category));
        }
        if let Some(options) = &self.options {
            obj.insert("options".into(), options.clone());
        }

        match &self.value {
            PropValue::Num {
                min,
                max,
                decimals,
                interval,
                ..
            } => {
                obj.insert("min".into(), json!(min));
                obj.insert("max".into(), json!(max));
                obj.insert("decimals".into(), json!(decimals));
                obj.insert("interval".into(), json!(interval));
            }
            PropValue::Enum { choices, .. } => {
                obj.insert("choices".into(), json!(choices));
            }
            PropValue::Options { options, .. } => {
                obj.insert("choices".into(), json!(options));
            }
            PropValue::Asset { class_names, .. } | PropValue::AssetList { class_names, .. } => {
                obj.insert("classNames".into(), json!(class_names));
            }
            PropValue::Color { alpha, .. } => {
                obj.insert("alpha".into(), json!(alpha));
            }
            PropValue::File { extensions, .. } => {
                obj.insert("extensions".into(), json!(extensions));
            }
            _ => {}
        }
        token
    }

    /// Decode a full token back into a prop.
    ///
    /// Subtype fields absent from the token get their documented defaults
    /// (`min`/`max` default to the widest representable range).
    pub fn de_tokenize(token: &Value) -> Result<Self, TokenError> {
        let name = token
            .get("name")
            .and_then(Value::as_str)
            .ok_or(TokenError::MissingField("name"))?;
        let tag = token
            .get("type")
            .and_then(Value::as_str)
            .ok_or(TokenError::MissingField("type"))?;
        let data_type = DataType::from_tag(tag)?;
        let value = token.get("value").cloned().unwrap_or(Value::Null);

        let prop_value = match data_type {
            DataType::Asset => PropValue::Asset {
                shallow_id: value.as_u64().map(|v| v as u32),
                class_names: string_list(token.get("classNames")),
            },
            DataType::AssetList => PropValue::AssetList {
                shallow_ids: value
                    .as_array()
                    .map(|a| a.iter().filter_map(|v| v.as_u64().map(|v| v as u32)).collect())
                    .unwrap_or_default(),
                class_names: string_list(token.get("classNames")),
            },
            DataType::Number => PropValue::Num {
                value: value.as_f64().unwrap_or(0.0),
                min: token.get("min").and_then(Value::as_f64).unwrap_or(-f64::MAX),
                max: token.get("max").and_then(Value::as_f64).unwrap_or(f64::MAX),
                decimals: token.get("decimals").and_then(Value::as_u64).unwrap_or(0) as u8,
                interval: token.get("interval").and_then(Value::as_f64).unwrap_or(1.0),
            },
            DataType::Color => PropValue::Color {
                color: value
                    .as_str()
                    .and_then(Color::from_hex)
                    .ok_or(TokenError::BadField {
                        field: "value",
                        detail: "expected a hex color string".into(),
                    })?,
                alpha: token.get("alpha").and_then(Value::as_f64).unwrap_or(1.0),
            },
            DataType::Group => PropValue::Group {
                group_id: value.as_u64().map(|v| v as u32),
            },
            DataType::File => PropValue::File {
                id: value.as_str().map(str::to_string),
                extensions: string_list(token.get("extensions")),
            },
            DataType::String => PropValue::Str(value.as_str().unwrap_or_default().to_string()),
            DataType::Object => PropValue::Object(value),
            DataType::Bool => PropValue::Bool(value.as_bool().unwrap_or(false)),
            DataType::Enum => PropValue::Enum {
                value: value.as_str().unwrap_or_default().to_string(),
                choices: string_list(token.get("choices")),
            },
            DataType::Hidden => PropValue::Hidden(value.as_str().unwrap_or_default().to_string()),
            DataType::HiddenFile => PropValue::HiddenFile {
                id: value.as_str().map(str::to_string),
            },
            DataType::Options => PropValue::Options {
                value: value.as_str().unwrap_or_default().to_string(),
                options: string_list(token.get("choices")),
            },
        };

        Ok(Self {
            name: Name::intern(name),
            value: prop_value,
            category: token
                .get("category")
                .and_then(Value::as_str)
                .map(str::to_string),
            options: token.get("options").cloned(),
        })
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
