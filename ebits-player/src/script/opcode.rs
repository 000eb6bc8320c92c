//! Instruction table
//!
//! The twelve EBITS opcodes with their mnemonic, operand arity class and
//! dependency set. The table is static; nothing mutates it.

use serde::Serialize;

/// One of the twelve EBITS instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    Halt,
    Delay,
    Forward,
    VolumeUp,
    Repeat,
    SpeedUp,
    SpeedDown,
    Jump,
    VolumeDown,
    Backward,
    Pause,
    Play,
}

/// Static attributes of one opcode
#[derive(Debug)]
pub struct OpcodeInfo {
    pub opcode: Opcode,
    /// 4-symbol binary code as written in scripts
    pub code: &'static str,
    pub mnemonic: &'static str,
    /// Voidable opcodes must carry no operand; the rest need at least one slot
    pub voidable: bool,
    /// Any one of these must appear earlier in the script
    pub dependencies: &'static [Opcode],
    /// Dependency check also passes when nothing precedes the instruction
    pub may_open_script: bool,
}

/// Table in code order
pub static INSTRUCTION_TABLE: [OpcodeInfo; 12] = [
    OpcodeInfo {
        opcode: Opcode::Halt,
        code: "0000",
        mnemonic: "HALT",
        voidable: true,
        dependencies: &[Opcode::Play, Opcode::Pause, Opcode::Delay],
        may_open_script: true,
    },
    OpcodeInfo {
        opcode: Opcode::Delay,
        code: "0001",
        mnemonic: "DELAY",
        voidable: false,
        dependencies: &[],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::Forward,
        code: "0010",
        mnemonic: "FORWARD",
        voidable: false,
        dependencies: &[Opcode::Play, Opcode::Pause],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::VolumeUp,
        code: "0011",
        mnemonic: "VOLUME_UP",
        voidable: true,
        dependencies: &[Opcode::Play],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::Repeat,
        code: "0100",
        mnemonic: "REPEAT",
        voidable: false,
        dependencies: &[Opcode::Halt],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::SpeedUp,
        code: "0101",
        mnemonic: "SPEED_UP",
        voidable: false,
        dependencies: &[Opcode::Play],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::SpeedDown,
        code: "1010",
        mnemonic: "SPEED_DOWN",
        voidable: false,
        dependencies: &[Opcode::Play],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::Jump,
        code: "1011",
        mnemonic: "JUMP",
        voidable: false,
        dependencies: &[Opcode::Halt, Opcode::Play, Opcode::Pause],
        may_open_script: true,
    },
    OpcodeInfo {
        opcode: Opcode::VolumeDown,
        code: "1100",
        mnemonic: "VOLUME_DOWN",
        voidable: true,
        dependencies: &[Opcode::Play],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::Backward,
        code: "1101",
        mnemonic: "BACKWARD",
        voidable: false,
        dependencies: &[Opcode::Play, Opcode::Pause],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::Pause,
        code: "1110",
        mnemonic: "PAUSE",
        voidable: true,
        dependencies: &[Opcode::Play],
        may_open_script: false,
    },
    OpcodeInfo {
        opcode: Opcode::Play,
        code: "1111",
        mnemonic: "PLAY",
        voidable: true,
        dependencies: &[Opcode::Halt, Opcode::Pause],
        may_open_script: true,
    },
];

impl Opcode {
    /// Every opcode, in code order
    pub const ALL: [Opcode; 12] = [
        Opcode::Halt,
        Opcode::Delay,
        Opcode::Forward,
        Opcode::VolumeUp,
        Opcode::Repeat,
        Opcode::SpeedUp,
        Opcode::SpeedDown,
        Opcode::Jump,
        Opcode::VolumeDown,
        Opcode::Backward,
        Opcode::Pause,
        Opcode::Play,
    ];

    /// Look up a 4-symbol code
    pub fn from_code(code: &str) -> Option<Opcode> {
        INSTRUCTION_TABLE
            .iter()
            .find(|info| info.code == code)
            .map(|info| info.opcode)
    }

    /// Table entry for this opcode
    pub fn info(self) -> &'static OpcodeInfo {
        // ALL and INSTRUCTION_TABLE share the same order
        &INSTRUCTION_TABLE[self as usize]
    }

    pub fn code(self) -> &'static str {
        self.info().code
    }

    pub fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    pub fn voidable(self) -> bool {
        self.info().voidable
    }

    pub fn dependencies(self) -> &'static [Opcode] {
        self.info().dependencies
    }

    pub fn may_open_script(self) -> bool {
        self.info().may_open_script
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_discriminants() {
        for (i, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(INSTRUCTION_TABLE[i].opcode, *opcode);
            assert_eq!(opcode.info().opcode, *opcode);
        }
    }

    #[test]
    fn test_codes_are_unique_binary_strings() {
        let mut codes: Vec<&str> = INSTRUCTION_TABLE.iter().map(|i| i.code).collect();
        assert!(codes
            .iter()
            .all(|c| c.len() == 4 && c.chars().all(|ch| ch == '0' || ch == '1')));
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 12);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Opcode::from_code("1111"), Some(Opcode::Play));
        assert_eq!(Opcode::from_code("0000"), Some(Opcode::Halt));
        assert_eq!(Opcode::from_code("1010"), Some(Opcode::SpeedDown));
        assert_eq!(Opcode::from_code("0110"), None);
        assert_eq!(Opcode::from_code("111"), None);
        assert_eq!(Opcode::Jump.to_string(), "JUMP");
        assert_eq!(Opcode::VolumeUp.code(), "0011");
    }

    #[test]
    fn test_arity_classes() {
        let voidable: Vec<_> = Opcode::ALL.iter().filter(|o| o.voidable()).collect();
        assert_eq!(
            voidable,
            vec![
                &Opcode::Halt,
                &Opcode::VolumeUp,
                &Opcode::VolumeDown,
                &Opcode::Pause,
                &Opcode::Play
            ]
        );
    }

    #[test]
    fn test_script_openers() {
        let openers: Vec<_> = Opcode::ALL.iter().filter(|o| o.may_open_script()).collect();
        assert_eq!(openers, vec![&Opcode::Halt, &Opcode::Jump, &Opcode::Play]);
        assert!(Opcode::Delay.dependencies().is_empty());
    }
}
