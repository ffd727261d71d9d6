//! Control inference from value names
//!
//! Configuration values follow a naming convention: one lowercase letter that
//! encodes the value type, followed by capitalised words, e.g. `iFrameCount`
//! or `bUseDenoiser`. The prefix selects a default control, the words form
//! the display label.

use serde::{Deserialize, Serialize};

/// Numeric flavour of a number or select control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    #[default]
    Float,
    Str,
}

/// Input control families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Number,
    Switch,
    Select,
    Input,
}

impl ControlKind {
    /// Parse the control family component of a control type tag
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "number" => Some(Self::Number),
            "switch" => Some(Self::Switch),
            "select" => Some(Self::Select),
            "input" => Some(Self::Input),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Switch => "switch",
            Self::Select => "select",
            Self::Input => "input",
        }
    }
}

/// Type letter at the start of a value name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePrefix {
    /// `i` - integer number
    Int,
    /// `f` - float number
    Float,
    /// `b` - boolean switch
    Bool,
    /// `s` - free text
    Str,
}

impl NamePrefix {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(Self::Int),
            'f' => Some(Self::Float),
            'b' => Some(Self::Bool),
            's' => Some(Self::Str),
            _ => None,
        }
    }

    /// Control family and value flavour selected by this prefix
    pub fn control(&self) -> (ControlKind, ValueKind) {
        match self {
            Self::Int => (ControlKind::Number, ValueKind::Int),
            Self::Float => (ControlKind::Number, ValueKind::Float),
            Self::Bool => (ControlKind::Switch, ValueKind::Str),
            Self::Str => (ControlKind::Input, ValueKind::Str),
        }
    }

    /// Control type tag written into inferred declarations
    pub fn dti(&self) -> &'static str {
        match self {
            Self::Int => "/catharsys/gui/control/number/int:1.0",
            Self::Float => "/catharsys/gui/control/number/float:1.0",
            Self::Bool => "/catharsys/gui/control/switch:1.0",
            Self::Str => "/catharsys/gui/control/input:1.0",
        }
    }
}

/// Result of parsing a conventional value name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub prefix: NamePrefix,
    pub label: String,
}

/// Parse a conventional name such as `iFrameCount`.
///
/// Returns `None` when the name does not start with a known lowercase type
/// letter directly followed by an uppercase letter.
pub fn parse_value_name(name: &str) -> Option<ParsedName> {
    let mut chars = name.chars();
    let first = chars.next()?;
    let second = chars.next()?;
    if !first.is_ascii_lowercase() || !second.is_ascii_uppercase() {
        return None;
    }
    let prefix = NamePrefix::from_char(first)?;
    Some(ParsedName {
        prefix,
        label: label_from_words(&name[first.len_utf8()..]),
    })
}

/// Split on capitalisation boundaries and join the words with spaces.
///
/// A word is an uppercase letter followed by at least one lowercase letter,
/// digit, `_` or `-`. Isolated capitals (acronym fragments) are dropped.
pub fn label_from_words(text: &str) -> String {
    split_words(text).join(" ")
}

/// Words of a camel-case identifier, see [`label_from_words`]
pub fn split_words(text: &str) -> Vec<&str> {
    let is_tail = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-';
    let mut words = Vec::new();
    let mut iter = text.char_indices().peekable();

    while let Some((start, c)) = iter.next() {
        if !c.is_ascii_uppercase() {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = iter.peek() {
            if !is_tail(next) {
                break;
            }
            end = idx + next.len_utf8();
            iter.next();
        }
        if end > start + c.len_utf8() {
            words.push(&text[start..end]);
        }
    }
    words
}
