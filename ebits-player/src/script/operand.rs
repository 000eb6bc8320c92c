//! Operand grammar
//!
//! Turns the raw operand slots of a tokenized line into a typed [`Operand`]
//! for its opcode. An empty slot (`""`) means "use the default" where the
//! opcode has one.
//!
//! | opcode              | accepted                                     | empty slot |
//! |---------------------|----------------------------------------------|------------|
//! | DELAY               | `N` (seconds) or `N` + `ms`/`s`/`m`/`h`, N>0 | rejected   |
//! | FORWARD, BACKWARD   | non-negative decimal seconds                 | 5 seconds  |
//! | REPEAT              | positive integer                             | 1          |
//! | SPEED_UP/SPEED_DOWN | positive integer                             | none       |
//! | JUMP                | `[h]h:mm:ss`, `m:ss`, or `[+-]N[s]`          | rejected   |

use super::opcode::Opcode;
use serde::Serialize;
use std::time::Duration;

/// Seek step used when FORWARD/BACKWARD leave their slot empty
pub const DEFAULT_SEEK_SECONDS: f64 = 5.0;

/// Repeat count used when REPEAT leaves its slot empty
pub const DEFAULT_REPEAT_COUNT: u32 = 1;

/// Target of a JUMP
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum JumpTarget {
    /// Absolute position in seconds
    Absolute(u64),
    /// Offset in seconds from the current position
    Relative(i64),
}

/// Parsed operand of one instruction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Operand {
    /// Voidable opcodes
    None,
    Delay(Duration),
    /// FORWARD/BACKWARD magnitude in seconds
    Seconds(f64),
    /// REPEAT count
    Count(u32),
    /// SPEED_UP/SPEED_DOWN value; validated but not used for the step size
    Step(Option<u32>),
    Jump(JumpTarget),
}

/// Parse the operand slots for `opcode`, returning a description of the
/// problem on failure. Arity (zero vs. some slots) is checked by the caller.
pub fn parse(opcode: Opcode, operands: &[String]) -> Result<Operand, String> {
    match opcode {
        Opcode::Halt | Opcode::VolumeUp | Opcode::VolumeDown | Opcode::Pause | Opcode::Play => {
            Ok(Operand::None)
        }
        Opcode::Delay => parse_delay(single_value(operands)?).map(Operand::Delay),
        Opcode::Forward | Opcode::Backward => match optional_value(operands)? {
            None => Ok(Operand::Seconds(DEFAULT_SEEK_SECONDS)),
            Some(text) => parse_seconds(text).map(Operand::Seconds),
        },
        Opcode::Repeat => match optional_value(operands)? {
            None => Ok(Operand::Count(DEFAULT_REPEAT_COUNT)),
            Some(text) => parse_positive_integer(text).map(Operand::Count),
        },
        Opcode::SpeedUp | Opcode::SpeedDown => match optional_value(operands)? {
            None => Ok(Operand::Step(None)),
            Some(text) => parse_positive_integer(text).map(|n| Operand::Step(Some(n))),
        },
        Opcode::Jump => parse_jump(single_value(operands)?).map(Operand::Jump),
    }
}

/// Exactly one non-empty slot
fn single_value(operands: &[String]) -> Result<&str, String> {
    match operands {
        [only] if !only.is_empty() => Ok(only.as_str()),
        [_] => Err("operand is empty".to_string()),
        _ => Err(format!("expected one operand, found {}", operands.len())),
    }
}

/// At most one slot; an empty slot reads as "absent"
fn optional_value(operands: &[String]) -> Result<Option<&str>, String> {
    match operands {
        [] => Ok(None),
        [only] if only.is_empty() => Ok(None),
        [only] => Ok(Some(only.as_str())),
        _ => Err(format!("expected at most one operand, found {}", operands.len())),
    }
}

fn split_digits(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text.split_at(end)
}

fn parse_delay(text: &str) -> Result<Duration, String> {
    let (digits, unit) = split_digits(text);
    if digits.is_empty() {
        return Err(format!("'{}' does not start with a number", text));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("'{}' is out of range", digits))?;
    if value == 0 {
        return Err("delay must be greater than zero".to_string());
    }

    let millis_per_unit: u64 = match unit.to_ascii_lowercase().as_str() {
        "" | "s" => 1_000,
        "ms" => 1,
        "m" => 60_000,
        "h" => 3_600_000,
        other => return Err(format!("unknown time unit '{}' (expected ms, s, m or h)", other)),
    };

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("'{}' is out of range", text))
}

fn parse_seconds(text: &str) -> Result<f64, String> {
    let valid_shape = !text.is_empty()
        && text.chars().all(|c| c.is_ascii_digit() || c == '.')
        && text.chars().filter(|&c| c == '.').count() <= 1
        && text.chars().any(|c| c.is_ascii_digit());
    if !valid_shape {
        return Err(format!("'{}' is not a non-negative number of seconds", text));
    }
    text.parse::<f64>()
        .map_err(|_| format!("'{}' is not a non-negative number of seconds", text))
}

fn parse_positive_integer(text: &str) -> Result<u32, String> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("'{}' is not a positive integer", text));
    }
    match text.parse::<u32>() {
        Ok(0) => Err("value must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is out of range", text)),
    }
}

fn parse_jump(text: &str) -> Result<JumpTarget, String> {
    if text.contains(':') {
        return parse_timestamp(text).map(JumpTarget::Absolute);
    }

    let body = text.strip_suffix('s').unwrap_or(text);
    let (sign, digits) = match body.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, body.strip_prefix('+').unwrap_or(body)),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "'{}' is neither a timestamp nor a relative offset like +10s",
            text
        ));
    }
    digits
        .parse::<i64>()
        .map(|n| JumpTarget::Relative(sign * n))
        .map_err(|_| format!("'{}' is out of range", text))
}

/// `[h]h:mm:ss` or `m:ss`, each field one or two digits, minutes and seconds
/// at most 59.
fn parse_timestamp(text: &str) -> Result<u64, String> {
    let fields: Vec<&str> = text.split(':').collect();
    if !(2..=3).contains(&fields.len())
        || fields
            .iter()
            .any(|f| f.is_empty() || f.len() > 2 || !f.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(format!("'{}' is not a [hh:]mm:ss timestamp", text));
    }

    // Fields are 1-2 ASCII digits, so they always parse
    let values: Vec<u64> = fields.iter().filter_map(|f| f.parse().ok()).collect();
    let (hours, minutes, seconds) = match values.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(format!("'{}' is not a [hh:]mm:ss timestamp", text)),
    };
    if minutes > 59 || seconds > 59 {
        return Err(format!("'{}': minutes and seconds must be 0-59", text));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_delay_units() {
        let cases = [
            ("2s", 2_000),
            ("2", 2_000),
            ("250ms", 250),
            ("250MS", 250),
            ("3m", 180_000),
            ("1h", 3_600_000),
            ("1H", 3_600_000),
        ];
        for (text, millis) in cases {
            assert_eq!(
                parse(Opcode::Delay, &slots(&[text])),
                Ok(Operand::Delay(Duration::from_millis(millis))),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_delay_rejections() {
        for text in ["0s", "0", "s", "2x", "2 s", "-1s", "1.5s"] {
            assert!(parse(Opcode::Delay, &slots(&[text])).is_err(), "{}", text);
        }
        assert!(parse(Opcode::Delay, &slots(&[""])).is_err());
        assert!(parse(Opcode::Delay, &slots(&["1s", "2s"])).is_err());
    }

    #[test]
    fn test_seek_operands() {
        assert_eq!(parse(Opcode::Forward, &slots(&[""])), Ok(Operand::Seconds(5.0)));
        assert_eq!(parse(Opcode::Backward, &slots(&["2.5"])), Ok(Operand::Seconds(2.5)));
        assert_eq!(parse(Opcode::Forward, &slots(&["10"])), Ok(Operand::Seconds(10.0)));
        for bad in ["-1", "abc", ".", "1.2.3", "5s"] {
            assert!(parse(Opcode::Forward, &slots(&[bad])).is_err(), "{}", bad);
        }
        assert!(parse(Opcode::Forward, &slots(&["", "7"])).is_err());
    }

    #[test]
    fn test_repeat_and_speed_operands() {
        assert_eq!(parse(Opcode::Repeat, &slots(&[""])), Ok(Operand::Count(1)));
        assert_eq!(parse(Opcode::Repeat, &slots(&["3"])), Ok(Operand::Count(3)));
        assert!(parse(Opcode::Repeat, &slots(&["0"])).is_err());

        assert_eq!(parse(Opcode::SpeedUp, &slots(&[""])), Ok(Operand::Step(None)));
        assert_eq!(parse(Opcode::SpeedDown, &slots(&["2"])), Ok(Operand::Step(Some(2))));
        for bad in ["0", "-2", "1.5", "x"] {
            assert!(parse(Opcode::SpeedUp, &slots(&[bad])).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_jump_absolute() {
        let absolute = |text: &str| parse(Opcode::Jump, &slots(&[text]));
        assert_eq!(absolute("00:00:00"), Ok(Operand::Jump(JumpTarget::Absolute(0))));
        assert_eq!(absolute("1:02:03"), Ok(Operand::Jump(JumpTarget::Absolute(3723))));
        assert_eq!(absolute("12:30"), Ok(Operand::Jump(JumpTarget::Absolute(750))));
        assert_eq!(absolute("99:59:59"), Ok(Operand::Jump(JumpTarget::Absolute(359_999))));

        for bad in ["00:60:00", "00:00:60", "123:00:00", "1:2:3:4", ":30", "ab:cd"] {
            assert!(absolute(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_jump_relative() {
        let relative = |text: &str| parse(Opcode::Jump, &slots(&[text]));
        assert_eq!(relative("+10s"), Ok(Operand::Jump(JumpTarget::Relative(10))));
        assert_eq!(relative("-3"), Ok(Operand::Jump(JumpTarget::Relative(-3))));
        assert_eq!(relative("7s"), Ok(Operand::Jump(JumpTarget::Relative(7))));
        for bad in ["+s", "s", "--1", "1.5s", "10ms"] {
            assert!(relative(bad).is_err(), "{}", bad);
        }
        assert!(parse(Opcode::Jump, &slots(&[""])).is_err());
    }
}
