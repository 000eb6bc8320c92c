//! Script tokenizer
//!
//! Scans script bytes into raw instruction records, one per line that carries
//! a code. The first four non-whitespace characters of a line are the code.
//! After that, every whitespace character opens a new (initially empty)
//! operand slot and every other character extends the latest slot, so
//! `0001 2s` yields operands `["2s"]` and `0010 ` yields `[""]`.
//!
//! `\n`, `\r` and `\r\n` each end a line. Blank lines and lines starting with
//! `#` or `//` yield nothing but still advance the line counter.

use crate::error::{Error, Result};

/// One tokenized line, not yet checked against the instruction table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInstruction {
    /// Up to four code characters (fewer if the line was short)
    pub code: String,
    /// 1-based source line
    pub line: usize,
    /// Operand slots in source order, possibly empty strings
    pub operands: Vec<String>,
}

impl RawInstruction {
    fn new(line: usize) -> Self {
        Self {
            code: String::new(),
            line,
            operands: Vec::new(),
        }
    }
}

/// Length of an opcode in characters
pub const CODE_LEN: usize = 4;

/// Tokenize a whole script.
///
/// # Errors
/// `MalformedInstruction` when a line starts with whitespace (except as the
/// very last character of the input) or the input is not UTF-8.
pub fn tokenize(bytes: &[u8]) -> Result<Vec<RawInstruction>> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        Error::MalformedInstruction {
            line: count_lines(valid) + 1,
            reason: "script is not valid UTF-8".to_string(),
        }
    })?;

    let mut instructions = Vec::new();
    let mut current = RawInstruction::new(1);
    let mut in_comment = false;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if ch == '\n' || ch == '\r' {
            if ch == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
                chars.next();
            }
            let line = current.line;
            finish_line(
                &mut instructions,
                std::mem::replace(&mut current, RawInstruction::new(line + 1)),
            );
            in_comment = false;
            continue;
        }

        if in_comment {
            continue;
        }

        let at_line_start = current.code.is_empty() && current.operands.is_empty();
        if at_line_start && is_comment_start(ch, &text[pos..]) {
            in_comment = true;
            continue;
        }

        if ch.is_whitespace() {
            if current.code.is_empty() {
                let is_last = pos + ch.len_utf8() == text.len();
                if is_last {
                    continue;
                }
                return Err(Error::MalformedInstruction {
                    line: current.line,
                    reason: "whitespace before instruction code".to_string(),
                });
            }
            current.operands.push(String::new());
        } else if current.code.chars().count() < CODE_LEN {
            current.code.push(ch);
        } else {
            match current.operands.last_mut() {
                Some(slot) => slot.push(ch),
                None => current.operands.push(ch.to_string()),
            }
        }
    }

    finish_line(&mut instructions, current);
    Ok(instructions)
}

fn finish_line(instructions: &mut Vec<RawInstruction>, raw: RawInstruction) {
    if !raw.code.is_empty() {
        instructions.push(raw);
    }
}

fn is_comment_start(ch: char, rest: &str) -> bool {
    ch == '#' || rest.starts_with("//")
}

/// Line breaks in `bytes`, counting `\r\n` once
fn count_lines(bytes: &[u8]) -> usize {
    let mut count = 0;
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        match b {
            b'\n' => count += 1,
            b'\r' => {
                if iter.peek() == Some(&&b'\n') {
                    iter.next();
                }
                count += 1;
            }
            _ => {}
        }
    }
    count
}
