//! EBITS script front end: instruction table, tokenizer, operand grammar and
//! semantic validator.
//!
//! ```
//! use ebits_player::script::{parse_script, Opcode};
//!
//! let script = parse_script(b"1111\n0000").unwrap();
//! let opcodes: Vec<Opcode> = script.opcodes().collect();
//! assert_eq!(opcodes, vec![Opcode::Play, Opcode::Halt]);
//! ```

pub mod opcode;
pub mod operand;
pub mod tokenizer;
pub mod validator;

pub use opcode::{Opcode, OpcodeInfo, INSTRUCTION_TABLE};
pub use operand::{JumpTarget, Operand};
pub use tokenizer::{tokenize, RawInstruction};
pub use validator::{validate, Instruction, Script};

use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Tokenize and validate script bytes
pub fn parse_script(bytes: &[u8]) -> Result<Script> {
    let script = validate(tokenize(bytes)?)?;
    Ok(script)
}

/// Read and validate a script file
pub async fn load_script(path: &Path) -> Result<Script> {
    let bytes = tokio::fs::read(path).await?;
    let script = parse_script(&bytes)?;
    info!("Validated {} instruction(s) from {}", script.len(), path.display());
    Ok(script)
}
