//! Semantic validation
//!
//! Checks each raw instruction in source order and stops at the first
//! problem:
//!
//! 1. the code is in the instruction table
//! 2. operand arity matches the opcode's class
//! 3. operand content matches the opcode's grammar
//! 4. some strictly-earlier opcode satisfies the dependency set
//!
//! A script either validates as a whole or not at all.

use super::opcode::Opcode;
use super::operand::{self, Operand};
use super::tokenizer::RawInstruction;
use crate::error::{Error, Result};
use tracing::debug;

/// A validated instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// 1-based source line
    pub line: usize,
    /// Operand slots as written
    pub operands: Vec<String>,
    /// Parsed operand
    pub operand: Operand,
}

/// A validated script, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub(crate) instructions: Vec<Instruction>,
}

impl Script {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Opcodes in source order
    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.instructions.iter().map(|i| i.opcode)
    }
}

/// Validate a tokenized script
pub fn validate(raw: Vec<RawInstruction>) -> Result<Script> {
    let mut instructions: Vec<Instruction> = Vec::with_capacity(raw.len());
    let mut prior: Vec<Opcode> = Vec::with_capacity(raw.len());

    for RawInstruction {
        code,
        line,
        operands,
    } in raw
    {
        let opcode = Opcode::from_code(&code).ok_or_else(|| Error::UnknownOpcode {
            line,
            code: code.clone(),
        })?;
        let mnemonic = opcode.mnemonic();

        if opcode.voidable() && !operands.is_empty() {
            return Err(Error::OperandArity {
                line,
                mnemonic,
                detail: "no operand expected",
            });
        }
        if !opcode.voidable() && operands.is_empty() {
            return Err(Error::OperandArity {
                line,
                mnemonic,
                detail: "operand required",
            });
        }

        let operand = operand::parse(opcode, &operands).map_err(|reason| Error::OperandFormat {
            line,
            mnemonic,
            reason,
        })?;

        check_dependencies(opcode, &prior).map_err(|reason| Error::Dependency {
            line,
            mnemonic,
            reason,
        })?;

        debug!("Line {}: {} {:?}", line, mnemonic, operand);
        prior.push(opcode);
        instructions.push(Instruction {
            opcode,
            line,
            operands,
            operand,
        });
    }

    Ok(Script { instructions })
}

/// Dependency rule for `opcode` given the opcodes that precede it.
///
/// DELAY has no dependencies and no audio effect, so a run of leading DELAYs
/// still counts as "nothing before" for the opcodes that may open a script.
pub fn check_dependencies(opcode: Opcode, prior: &[Opcode]) -> std::result::Result<(), String> {
    // REPEAT depends on an earlier HALT, and HALT ends the run, so a valid
    // script never reaches a REPEAT at run time.
    if opcode == Opcode::Repeat && prior.contains(&Opcode::Repeat) {
        return Err("REPEAT may appear at most once per script".to_string());
    }

    let deps = opcode.dependencies();
    if deps.is_empty() {
        return Ok(());
    }
    if opcode.may_open_script() && prior.iter().all(|o| *o == Opcode::Delay) {
        return Ok(());
    }
    if prior.iter().any(|o| deps.contains(o)) {
        return Ok(());
    }

    let names: Vec<&str> = deps.iter().map(|d| d.mnemonic()).collect();
    Err(format!("requires an earlier {}", names.join(" or ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::tokenizer::tokenize;

    fn check(script: &str) -> Result<Script> {
        validate(tokenize(script.as_bytes())?)
    }

    #[test]
    fn test_dependency_rules() {
        use Opcode::*;
        assert!(check_dependencies(Play, &[]).is_ok());
        assert!(check_dependencies(Halt, &[]).is_ok());
        assert!(check_dependencies(Jump, &[]).is_ok());
        assert!(check_dependencies(Pause, &[]).is_err());
        assert!(check_dependencies(Play, &[Delay, Delay]).is_ok());
        assert!(check_dependencies(Pause, &[Delay]).is_err());
        assert!(check_dependencies(Pause, &[Play]).is_ok());
        assert!(check_dependencies(Forward, &[Pause]).is_ok());
        assert!(check_dependencies(Play, &[Forward]).is_err());
        assert!(check_dependencies(Repeat, &[Play, Halt]).is_ok());
        assert!(check_dependencies(Repeat, &[Play, Halt, Repeat, Halt]).is_err());
        assert!(check_dependencies(Delay, &[]).is_ok());
    }

    #[test]
    fn test_dependency_error_message_lists_alternatives() {
        let err = check_dependencies(Opcode::Forward, &[Opcode::Delay]).unwrap_err();
        assert_eq!(err, "requires an earlier PLAY or PAUSE");
    }

    #[test]
    fn test_arity_checked_before_format() {
        match check("0001") {
            Err(Error::OperandArity { line: 1, detail, .. }) => {
                assert_eq!(detail, "operand required")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_format_checked_before_dependency() {
        // SPEED_UP at line 1 has no PLAY before it, but the operand is bad first
        assert!(matches!(check("0101 0"), Err(Error::OperandFormat { line: 1, .. })));
    }

    #[test]
    fn test_validated_instruction_carries_operand() {
        let script = check("1111\n0010 \n1101 2\n0000").unwrap();
        assert_eq!(script.len(), 4);
        assert_eq!(script.instructions()[1].operand, Operand::Seconds(5.0));
        assert_eq!(script.instructions()[2].operand, Operand::Seconds(2.0));
        assert_eq!(script.instructions()[2].operands, vec!["2".to_string()]);
    }

    #[test]
    fn test_first_error_wins() {
        match check("1111\n1111 x\n9999") {
            Err(err) => assert_eq!(err.line(), Some(2)),
            Ok(_) => panic!("expected failure"),
        }
    }
}
