//! Value control factory
//!
//! Decides which control edits a named value. Explicit metadata with a
//! control type tag wins; otherwise the control is inferred from the name
//! (`iFrameCount` -> integer number labelled "Frame Count").
//!
//! | tag | control |
//! |-----|---------|
//! | `/catharsys/gui/control/number[/int\|/float]:1.0` | number, float by default |
//! | `/catharsys/gui/control/switch:1.0` | switch |
//! | `/catharsys/gui/control/select[/int\|/float\|/str]:1.0` | select, needs `lOptions` |
//! | `/catharsys/gui/control/input:1.0` | text input |

use serde_json::{Map, Value};

use artdeck_core::dti::{self, DTI_KEY};
use artdeck_core::prelude::*;
use artdeck_core::{parse_value_name, ControlKind, ValueKind};

/// Matches every control type tag
pub const CONTROL_DTI_PATTERN: &str = "/catharsys/gui/control/*:*";

/// Components of a control tag before the control family
const CONTROL_DTI_PREFIX_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlSpec {
    Number {
        kind: ValueKind,
    },
    Switch,
    Select {
        kind: ValueKind,
        options: Vec<Value>,
        multiple: bool,
    },
    Input {
        password: bool,
        toggle_password_view: bool,
    },
}

/// A control bound to one value name
#[derive(Debug, Clone, PartialEq)]
pub struct ControlDef {
    pub name: String,
    pub dti: String,
    pub label: String,
    pub tooltip: String,
    pub spec: ControlSpec,
}

/// Control metadata inferred from a value name, `None` if the name does not
/// follow the convention
pub fn config_from_name(name: &str) -> Option<Map<String, Value>> {
    let parsed = parse_value_name(name)?;
    let mut ctrl = Map::new();
    ctrl.insert(DTI_KEY.into(), Value::String(parsed.prefix.dti().into()));
    ctrl.insert("sLabel".into(), Value::String(parsed.label.clone()));
    ctrl.insert("sTooltip".into(), Value::String(parsed.label));
    Some(ctrl)
}

/// Control inferred from the name alone
pub fn from_name(name: &str) -> Result<Option<ControlDef>> {
    match config_from_name(name) {
        Some(ctrl) => from_dict(name, &ctrl),
        None => Ok(None),
    }
}

/// Control from metadata. Metadata without a control tag falls back to
/// [`from_name`]; an unknown control family gives `None`.
pub fn from_dict(name: &str, ctrl: &Map<String, Value>) -> Result<Option<ControlDef>> {
    let value = Value::Object(ctrl.clone());
    let Some(tag) = dti::check(&value, CONTROL_DTI_PATTERN) else {
        return from_name(name);
    };

    let ctrl_type = tag.sub_type(CONTROL_DTI_PREFIX_LEN);
    let Some(family) = ctrl_type.first().and_then(|f| ControlKind::from_type_name(f)) else {
        return Ok(None);
    };
    let data_type = ctrl_type.get(1).map(String::as_str);

    let spec = match family {
        ControlKind::Number => ControlSpec::Number {
            kind: value_kind(name, data_type, ValueKind::Float, false)?,
        },
        ControlKind::Switch => ControlSpec::Switch,
        ControlKind::Select => {
            let kind = value_kind(name, data_type, ValueKind::Str, true)?;
            let raw = ctrl
                .get("lOptions")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    Error::control(name, "Select control definition misses 'lOptions' argument")
                })?;
            ControlSpec::Select {
                kind,
                options: raw.iter().map(|o| convert_scalar(kind, o)).collect(),
                multiple: ctrl.get("bMultiple").map(to_bool).unwrap_or(false),
            }
        }
        ControlKind::Input => ControlSpec::Input {
            password: ctrl.get("bIsPassword").map(to_bool).unwrap_or(false),
            toggle_password_view: ctrl.get("bTogglePasswordView").map(to_bool).unwrap_or(false),
        },
    };

    let label = ctrl
        .get("sLabel")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| parse_value_name(name).map(|p| p.label))
        .unwrap_or_else(|| name.to_string());
    let tooltip = ctrl
        .get("sTooltip")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| label.clone());

    Ok(Some(ControlDef {
        name: name.to_string(),
        dti: tag.to_string(),
        label,
        tooltip,
        spec,
    }))
}

fn value_kind(name: &str, data_type: Option<&str>, default: ValueKind, allow_str: bool) -> Result<ValueKind> {
    match data_type {
        None => Ok(default),
        Some("int") => Ok(ValueKind::Int),
        Some("float") => Ok(ValueKind::Float),
        Some("str") if allow_str => Ok(ValueKind::Str),
        Some(other) => Err(Error::control(
            name,
            format!("Unsupported control number type '{}'", other),
        )),
    }
}

impl ControlDef {
    pub fn kind(&self) -> ControlKind {
        match self.spec {
            ControlSpec::Number { .. } => ControlKind::Number,
            ControlSpec::Switch => ControlKind::Switch,
            ControlSpec::Select { .. } => ControlKind::Select,
            ControlSpec::Input { .. } => ControlKind::Input,
        }
    }

    /// Convert an edited value to the control's value type
    pub fn convert(&self, input: &Value) -> Value {
        match &self.spec {
            ControlSpec::Number { kind } => convert_scalar(*kind, input),
            ControlSpec::Switch => Value::Bool(to_bool(input)),
            ControlSpec::Select { kind, multiple, .. } => {
                if *multiple {
                    match input {
                        Value::Array(items) => {
                            Value::Array(items.iter().map(|i| convert_scalar(*kind, i)).collect())
                        }
                        Value::Null => Value::Array(Vec::new()),
                        other => Value::Array(vec![convert_scalar(*kind, other)]),
                    }
                } else {
                    convert_scalar(*kind, input)
                }
            }
            ControlSpec::Input { .. } => Value::String(to_text(input)),
        }
    }

    /// Current value of this control in `values`, converted
    pub fn read(&self, values: &Map<String, Value>) -> Value {
        self.convert(values.get(&self.name).unwrap_or(&Value::Null))
    }

    /// Value after a "next" action: switches toggle, single selects cycle
    /// through their options. `None` for controls edited as text.
    pub fn next_value(&self, current: &Value) -> Option<Value> {
        match &self.spec {
            ControlSpec::Switch => Some(Value::Bool(!to_bool(current))),
            ControlSpec::Select {
                options,
                multiple: false,
                kind,
            } if !options.is_empty() => {
                let current = convert_scalar(*kind, current);
                let idx = options.iter().position(|o| *o == current);
                let next = idx.map(|i| (i + 1) % options.len()).unwrap_or(0);
                Some(options[next].clone())
            }
            _ => None,
        }
    }

    /// Text shown for `value`; passwords are masked
    pub fn display(&self, value: &Value) -> String {
        match (&self.spec, value) {
            (ControlSpec::Input { password: true, .. }, v) => "*".repeat(to_text(v).chars().count()),
            (ControlSpec::Switch, v) => (if to_bool(v) { "on" } else { "off" }).to_string(),
            (_, Value::Array(items)) => items.iter().map(to_text).collect::<Vec<_>>().join(", "),
            (_, v) => to_text(v),
        }
    }
}

fn convert_scalar(kind: ValueKind, value: &Value) -> Value {
    match kind {
        ValueKind::Int => Value::from(to_int(value)),
        ValueKind::Float => Value::from(to_float(value)),
        ValueKind::Str => Value::String(to_text(value)),
    }
}

pub fn to_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

pub fn to_float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_frame_count_infers_integer() {
        let ctrl = from_name("iFrameCount").unwrap().unwrap();
        assert_eq!(ctrl.spec, ControlSpec::Number { kind: ValueKind::Int });
        assert_eq!(ctrl.label, "Frame Count");
        assert_eq!(ctrl.tooltip, "Frame Count");
        assert_eq!(ctrl.dti, "/catharsys/gui/control/number/int:1.0");
    }

    #[test]
    fn test_prefix_inference() {
        assert_eq!(
            from_name("fExposure").unwrap().unwrap().spec,
            ControlSpec::Number { kind: ValueKind::Float }
        );
        assert_eq!(from_name("bDenoise").unwrap().unwrap().spec, ControlSpec::Switch);
        assert!(matches!(
            from_name("sCamera").unwrap().unwrap().spec,
            ControlSpec::Input { password: false, .. }
        ));
        assert!(from_name("xValue").unwrap().is_none());
        assert!(from_name("frame").unwrap().is_none());
    }

    #[test]
    fn test_explicit_select() {
        let ctrl = from_dict(
            "sQuality",
            &map(json!({
                "sDTI": "/catharsys/gui/control/select/int:1.0",
                "lOptions": ["1", 2, 3.7],
                "bMultiple": true,
                "sLabel": "Quality level"
            })),
        )
        .unwrap()
        .unwrap();
        assert_eq!(ctrl.label, "Quality level");
        assert_eq!(ctrl.tooltip, "Quality level");
        assert_eq!(
            ctrl.spec,
            ControlSpec::Select {
                kind: ValueKind::Int,
                options: vec![json!(1), json!(2), json!(3)],
                multiple: true,
            }
        );
    }

    #[test]
    fn test_select_defaults_to_str() {
        let ctrl = from_dict(
            "sMode",
            &map(json!({"sDTI": "/catharsys/gui/control/select:1.0", "lOptions": ["a", "b"]})),
        )
        .unwrap()
        .unwrap();
        assert!(matches!(
            ctrl.spec,
            ControlSpec::Select { kind: ValueKind::Str, multiple: false, .. }
        ));
    }

    #[test]
    fn test_select_without_options_fails() {
        let err = from_dict(
            "sMode",
            &map(json!({"sDTI": "/catharsys/gui/control/select:1.0"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("lOptions"));
    }

    #[test]
    fn test_unsupported_number_type_fails() {
        assert!(from_dict(
            "iCount",
            &map(json!({"sDTI": "/catharsys/gui/control/number/str:1.0"}))
        )
        .is_err());
    }

    #[test]
    fn test_unknown_family_gives_none() {
        let ctrl = from_dict(
            "iCount",
            &map(json!({"sDTI": "/catharsys/gui/control/slider:1.0"})),
        )
        .unwrap();
        assert!(ctrl.is_none());
    }

    #[test]
    fn test_dict_without_tag_uses_name() {
        let ctrl = from_dict("bUseGpu", &map(json!({"sLabel": "ignored"}))).unwrap().unwrap();
        assert_eq!(ctrl.spec, ControlSpec::Switch);
        assert_eq!(ctrl.label, "Use Gpu");
    }

    #[test]
    fn test_password_input() {
        let ctrl = from_dict(
            "sToken",
            &map(json!({
                "sDTI": "/catharsys/gui/control/input:1.0",
                "bIsPassword": true,
                "bTogglePasswordView": true
            })),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            ctrl.spec,
            ControlSpec::Input {
                password: true,
                toggle_password_view: true
            }
        );
        assert_eq!(ctrl.display(&json!("abc")), "***");
    }

    #[test]
    fn test_convert_and_read() {
        let int = from_name("iCount").unwrap().unwrap();
        assert_eq!(int.convert(&json!("12")), json!(12));
        assert_eq!(int.convert(&json!("x")), json!(0));
        assert_eq!(int.read(&map(json!({"iCount": 4.9}))), json!(4));

        let float = from_name("fScale").unwrap().unwrap();
        assert_eq!(float.convert(&json!("1.5")), json!(1.5));

        let switch = from_name("bOn").unwrap().unwrap();
        assert_eq!(switch.convert(&json!("yes")), json!(true));
        assert_eq!(switch.read(&Map::new()), json!(false));
    }

    #[test]
    fn test_next_value() {
        let switch = from_name("bOn").unwrap().unwrap();
        assert_eq!(switch.next_value(&json!(true)), Some(json!(false)));

        let select = from_dict(
            "sMode",
            &map(json!({"sDTI": "/catharsys/gui/control/select:1.0", "lOptions": ["a", "b"]})),
        )
        .unwrap()
        .unwrap();
        assert_eq!(select.next_value(&json!("a")), Some(json!("b")));
        assert_eq!(select.next_value(&json!("b")), Some(json!("a")));
        assert_eq!(select.next_value(&json!("zzz")), Some(json!("a")));

        assert_eq!(from_name("iCount").unwrap().unwrap().next_value(&json!(1)), None);
    }
}
