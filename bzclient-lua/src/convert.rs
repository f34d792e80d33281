//! Conversions between Lua values and the event core's argument types.

use bzclient_core::gfx::{id_code, BlockType};
use bzclient_core::KeyModifiers;
use mlua::Value;

/// Only an explicit `true` counts as a yes from a script.
pub fn returned_true(value: &Value) -> bool {
    matches!(value, Value::Boolean(true))
}

/// The value as a string, if it is one. Numbers are not coerced.
pub fn returned_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string_lossy().to_string()),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Number(n) if n.fract() == 0.0 => Some(*n as i64),
        _ => None,
    }
}

/// A block type given by code or by name.
pub fn block_type_arg(value: &Value) -> mlua::Result<BlockType> {
    let found = match value {
        Value::String(s) => BlockType::from_name(&s.to_string_lossy()),
        other => integer(other)
            .and_then(|code| i32::try_from(code).ok())
            .and_then(BlockType::from_code),
    };
    found.ok_or_else(|| mlua::Error::runtime(format!("bad gfx block type: {:?}", value)))
}

/// A block id given as a number or as a global block name.
pub fn block_id_arg(value: &Value) -> mlua::Result<i32> {
    let found = match value {
        Value::String(s) => Some(id_code(&s.to_string_lossy())).filter(|id| *id >= 0),
        other => integer(other).and_then(|id| i32::try_from(id).ok()),
    };
    found.ok_or_else(|| mlua::Error::runtime(format!("bad gfx block id: {:?}", value)))
}

/// Alt, ctrl and shift as the integer bit set scripts test against
/// (alt = 1, ctrl = 2, shift = 4). The repeat bit is passed separately.
pub fn modifier_bits(mods: KeyModifiers) -> u8 {
    (mods & (KeyModifiers::ALT | KeyModifiers::CTRL | KeyModifiers::SHIFT)).bits()
}

/// Strings in the array part of a returned table. Anything else yields
/// nothing.
pub fn returned_strings(value: Value) -> mlua::Result<Vec<String>> {
    let Value::Table(table) = value else {
        return Ok(Vec::new());
    };
    let mut words = Vec::new();
    for item in table.sequence_values::<Value>() {
        if let Some(word) = returned_string(&item?) {
            words.push(word);
        }
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::Lua;

    #[test]
    fn block_arguments_accept_codes_and_names() {
        let lua = Lua::new();
        let name = Value::String(lua.create_string("shotradar").unwrap());
        assert_eq!(block_type_arg(&name).unwrap(), BlockType::ShotRadar);
        assert_eq!(block_type_arg(&Value::Integer(3)).unwrap(), BlockType::Flag);
        assert!(block_type_arg(&Value::Integer(7)).is_err());
        assert!(block_type_arg(&Value::Nil).is_err());

        let sky = Value::String(lua.create_string("sky").unwrap());
        assert_eq!(block_id_arg(&sky).unwrap(), id_code("sky"));
        assert_eq!(block_id_arg(&Value::Number(42.0)).unwrap(), 42);
        assert!(block_id_arg(&Value::Number(1.5)).is_err());
        let bogus = Value::String(lua.create_string("nope").unwrap());
        assert!(block_id_arg(&bogus).is_err());
    }

    #[test]
    fn only_true_is_true() {
        assert!(returned_true(&Value::Boolean(true)));
        assert!(!returned_true(&Value::Boolean(false)));
        assert!(!returned_true(&Value::Integer(1)));
        assert!(!returned_true(&Value::Nil));
    }

    #[test]
    fn string_lists_skip_non_strings() {
        let lua = Lua::new();
        let value: Value = lua.load(r#"return { "/say", 3, "/send" }"#).eval().unwrap();
        assert_eq!(returned_strings(value).unwrap(), vec!["/say", "/send"]);
        assert!(returned_strings(Value::Nil).unwrap().is_empty());
    }

    #[test]
    fn modifier_bits_leave_out_repeat() {
        assert_eq!(modifier_bits(KeyModifiers::CTRL | KeyModifiers::REPEAT), 2);
        assert_eq!(modifier_bits(KeyModifiers::ALT | KeyModifiers::SHIFT), 5);
        assert_eq!(modifier_bits(KeyModifiers::empty()), 0);
    }
}
