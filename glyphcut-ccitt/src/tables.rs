//! The code tables of ITU-T T.6 and the state machines derived from them.
//!
//! The encoder looks codes up directly by run length, the decoder walks a
//! binary state machine built at compile time from the very same tables.

/// A coding mode of the two-dimensional coding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Pass,
    Horizontal,
    Vertical(i8),
}

impl Mode {
    /// The code word that announces this mode.
    pub(crate) fn code(self) -> Code {
        let idx = match self {
            Self::Pass => 0,
            Self::Horizontal => 1,
            Self::Vertical(0) => 2,
            Self::Vertical(1) => 3,
            Self::Vertical(2) => 4,
            Self::Vertical(3) => 5,
            Self::Vertical(-1) => 6,
            Self::Vertical(-2) => 7,
            Self::Vertical(-3) => 8,
            Self::Vertical(d) => unreachable!("vertical offset {d} out of range"),
        };

        MODE_CODES[idx]
    }
}

/// A single variable-length code word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Code {
    /// The run length (or mode id) the code word stands for.
    pub(crate) value: u16,
    /// The number of bits of the code word.
    pub(crate) len: u8,
    /// The code word itself, right-aligned.
    pub(crate) bits: u16,
}

impl Code {
    const fn new(value: u16, len: u8, bits: u16) -> Self {
        Self { value, len, bits }
    }
}

// State machine encoding:
// - 0x0000-0x3FFF: next state index
// - 0x8000 | value: decoded run length (value & 0x1FFF)
// - 0xFFFF: invalid/unused
pub(crate) const VALUE_FLAG: u16 = 0x8000;
pub(crate) const VALUE_MASK: u16 = 0x1FFF;
pub(crate) const INVALID: u16 = 0xFFFF;

/// Two consecutive EOL code words, terminating a Group 4 block.
pub(crate) const EOFB: u32 = 0x1001;
pub(crate) const EOFB_LEN: u8 = 24;
/// Run lengths of at least this size need a make-up code.
pub(crate) const MAKEUP_STEP: u16 = 64;
/// The longest run covered by a single make-up code.
pub(crate) const MAX_MAKEUP: u16 = 2560;

#[derive(Clone, Copy)]
pub(crate) struct State {
    pub(crate) on_0: u16,
    pub(crate) on_1: u16,
}

impl State {
    const fn new() -> Self {
        Self {
            on_0: INVALID,
            on_1: INVALID,
        }
    }
}

/// Table 2/T.6 - White terminating codes.
pub(crate) const WHITE_TERMINATING: [Code; 64] = [
    Code::new(0, 8, 0b00110101),
    Code::new(1, 6, 0b000111),
    Code::new(2, 4, 0b0111),
    Code::new(3, 4, 0b1000),
    Code::new(4, 4, 0b1011),
    Code::new(5, 4, 0b1100),
    Code::new(6, 4, 0b1110),
    Code::new(7, 4, 0b1111),
    Code::new(8, 5, 0b10011),
    Code::new(9, 5, 0b10100),
    Code::new(10, 5, 0b00111),
    Code::new(11, 5, 0b01000),
    Code::new(12, 6, 0b001000),
    Code::new(13, 6, 0b000011),
    Code::new(14, 6, 0b110100),
    Code::new(15, 6, 0b110101),
    Code::new(16, 6, 0b101010),
    Code::new(17, 6, 0b101011),
    Code::new(18, 7, 0b0100111),
    Code::new(19, 7, 0b0001100),
    Code::new(20, 7, 0b0001000),
    Code::new(21, 7, 0b0010111),
    Code::new(22, 7, 0b0000011),
    Code::new(23, 7, 0b0000100),
    Code::new(24, 7, 0b0101000),
    Code::new(25, 7, 0b0101011),
    Code::new(26, 7, 0b0010011),
    Code::new(27, 7, 0b0100100),
    Code::new(28, 7, 0b0011000),
    Code::new(29, 8, 0b00000010),
    Code::new(30, 8, 0b00000011),
    Code::new(31, 8, 0b00011010),
    Code::new(32, 8, 0b00011011),
    Code::new(33, 8, 0b00010010),
    Code::new(34, 8, 0b00010011),
    Code::new(35, 8, 0b00010100),
    Code::new(36, 8, 0b00010101),
    Code::new(37, 8, 0b00010110),
    Code::new(38, 8, 0b00010111),
    Code::new(39, 8, 0b00101000),
    Code::new(40, 8, 0b00101001),
    Code::new(41, 8, 0b00101010),
    Code::new(42, 8, 0b00101011),
    Code::new(43, 8, 0b00101100),
    Code::new(44, 8, 0b00101101),
    Code::new(45, 8, 0b00000100),
    Code::new(46, 8, 0b00000101),
    Code::new(47, 8, 0b00001010),
    Code::new(48, 8, 0b00001011),
    Code::new(49, 8, 0b01010010),
    Code::new(50, 8, 0b01010011),
    Code::new(51, 8, 0b01010100),
    Code::new(52, 8, 0b01010101),
    Code::new(53, 8, 0b00100100),
    Code::new(54, 8, 0b00100101),
    Code::new(55, 8, 0b01011000),
    Code::new(56, 8, 0b01011001),
    Code::new(57, 8, 0b01011010),
    Code::new(58, 8, 0b01011011),
    Code::new(59, 8, 0b01001010),
    Code::new(60, 8, 0b01001011),
    Code::new(61, 8, 0b00110010),
    Code::new(62, 8, 0b00110011),
    Code::new(63, 8, 0b00110100),
];

/// Table 3/T.6 - White make-up codes.
pub(crate) const WHITE_MAKEUP: [Code; 27] = [
    Code::new(64, 5, 0b11011),
    Code::new(128, 5, 0b10010),
    Code::new(192, 6, 0b010111),
    Code::new(256, 7, 0b0110111),
    Code::new(320, 8, 0b00110110),
    Code::new(384, 8, 0b00110111),
    Code::new(448, 8, 0b01100100),
    Code::new(512, 8, 0b01100101),
    Code::new(576, 8, 0b01101000),
    Code::new(640, 8, 0b01100111),
    Code::new(704, 9, 0b011001100),
    Code::new(768, 9, 0b011001101),
    Code::new(832, 9, 0b011010010),
    Code::new(896, 9, 0b011010011),
    Code::new(960, 9, 0b011010100),
    Code::new(1024, 9, 0b011010101),
    Code::new(1088, 9, 0b011010110),
    Code::new(1152, 9, 0b011010111),
    Code::new(1216, 9, 0b011011000),
    Code::new(1280, 9, 0b011011001),
    Code::new(1344, 9, 0b011011010),
    Code::new(1408, 9, 0b011011011),
    Code::new(1472, 9, 0b010011000),
    Code::new(1536, 9, 0b010011001),
    Code::new(1600, 9, 0b010011010),
    Code::new(1664, 6, 0b011000),
    Code::new(1728, 9, 0b010011011),
];

/// Table 2/T.6 - Black terminating codes.
pub(crate) const BLACK_TERMINATING: [Code; 64] = [
    Code::new(0, 10, 0b0000110111),
    Code::new(1, 3, 0b010),
    Code::new(2, 2, 0b11),
    Code::new(3, 2, 0b10),
    Code::new(4, 3, 0b011),
    Code::new(5, 4, 0b0011),
    Code::new(6, 4, 0b0010),
    Code::new(7, 5, 0b00011),
    Code::new(8, 6, 0b000101),
    Code::new(9, 6, 0b000100),
    Code::new(10, 7, 0b0000100),
    Code::new(11, 7, 0b0000101),
    Code::new(12, 7, 0b0000111),
    Code::new(13, 8, 0b00000100),
    Code::new(14, 8, 0b00000111),
    Code::new(15, 9, 0b000011000),
    Code::new(16, 10, 0b0000010111),
    Code::new(17, 10, 0b0000011000),
    Code::new(18, 10, 0b0000001000),
    Code::new(19, 11, 0b00001100111),
    Code::new(20, 11, 0b00001101000),
    Code::new(21, 11, 0b00001101100),
    Code::new(22, 11, 0b00000110111),
    Code::new(23, 11, 0b00000101000),
    Code::new(24, 11, 0b00000010111),
    Code::new(25, 11, 0b00000011000),
    Code::new(26, 12, 0b000011001010),
    Code::new(27, 12, 0b000011001011),
    Code::new(28, 12, 0b000011001100),
    Code::new(29, 12, 0b000011001101),
    Code::new(30, 12, 0b000001101000),
    Code::new(31, 12, 0b000001101001),
    Code::new(32, 12, 0b000001101010),
    Code::new(33, 12, 0b000001101011),
    Code::new(34, 12, 0b000011010010),
    Code::new(35, 12, 0b000011010011),
    Code::new(36, 12, 0b000011010100),
    Code::new(37, 12, 0b000011010101),
    Code::new(38, 12, 0b000011010110),
    Code::new(39, 12, 0b000011010111),
    Code::new(40, 12, 0b000001101100),
    Code::new(41, 12, 0b000001101101),
    Code::new(42, 12, 0b000011011010),
    Code::new(43, 12, 0b000011011011),
    Code::new(44, 12, 0b000001010100),
    Code::new(45, 12, 0b000001010101),
    Code::new(46, 12, 0b000001010110),
    Code::new(47, 12, 0b000001010111),
    Code::new(48, 12, 0b000001100100),
    Code::new(49, 12, 0b000001100101),
    Code::new(50, 12, 0b000001010010),
    Code::new(51, 12, 0b000001010011),
    Code::new(52, 12, 0b000000100100),
    Code::new(53, 12, 0b000000110111),
    Code::new(54, 12, 0b000000111000),
    Code::new(55, 12, 0b000000100111),
    Code::new(56, 12, 0b000000101000),
    Code::new(57, 12, 0b000001011000),
    Code::new(58, 12, 0b000001011001),
    Code::new(59, 12, 0b000000101011),
    Code::new(60, 12, 0b000000101100),
    Code::new(61, 12, 0b000001011010),
    Code::new(62, 12, 0b000001100110),
    Code::new(63, 12, 0b000001100111),
];

/// Table 3/T.6 - Black make-up codes.
pub(crate) const BLACK_MAKEUP: [Code; 27] = [
    Code::new(64, 10, 0b0000001111),
    Code::new(128, 12, 0b000011001000),
    Code::new(192, 12, 0b000011001001),
    Code::new(256, 12, 0b000001011011),
    Code::new(320, 12, 0b000000110011),
    Code::new(384, 12, 0b000000110100),
    Code::new(448, 12, 0b000000110101),
    Code::new(512, 13, 0b0000001101100),
    Code::new(576, 13, 0b0000001101101),
    Code::new(640, 13, 0b0000001001010),
    Code::new(704, 13, 0b0000001001011),
    Code::new(768, 13, 0b0000001001100),
    Code::new(832, 13, 0b0000001001101),
    Code::new(896, 13, 0b0000001110010),
    Code::new(960, 13, 0b0000001110011),
    Code::new(1024, 13, 0b0000001110100),
    Code::new(1088, 13, 0b0000001110101),
    Code::new(1152, 13, 0b0000001110110),
    Code::new(1216, 13, 0b0000001110111),
    Code::new(1280, 13, 0b0000001010010),
    Code::new(1344, 13, 0b0000001010011),
    Code::new(1408, 13, 0b0000001010100),
    Code::new(1472, 13, 0b0000001010101),
    Code::new(1536, 13, 0b0000001011010),
    Code::new(1600, 13, 0b0000001011011),
    Code::new(1664, 13, 0b0000001100100),
    Code::new(1728, 13, 0b0000001100101),
];

/// Table 3/T.6 - Common make-up codes.
pub(crate) const COMMON_MAKEUP: [Code; 13] = [
    Code::new(1792, 11, 0b00000001000),
    Code::new(1856, 11, 0b00000001100),
    Code::new(1920, 11, 0b00000001101),
    Code::new(1984, 12, 0b000000010010),
    Code::new(2048, 12, 0b000000010011),
    Code::new(2112, 12, 0b000000010100),
    Code::new(2176, 12, 0b000000010101),
    Code::new(2240, 12, 0b000000010110),
    Code::new(2304, 12, 0b000000010111),
    Code::new(2368, 12, 0b000000011100),
    Code::new(2432, 12, 0b000000011101),
    Code::new(2496, 12, 0b000000011110),
    Code::new(2560, 12, 0b000000011111),
];

/// Table 4/T.6 - Mode codes for 2D encoding, indexed by mode id.
const MODE_CODES: [Code; 9] = [
    Code::new(0, 4, 0b0001),    // Pass
    Code::new(1, 3, 0b001),     // Horizontal
    Code::new(2, 1, 0b1),       // V0
    Code::new(3, 3, 0b011),     // VR1
    Code::new(4, 6, 0b000011),  // VR2
    Code::new(5, 7, 0b0000011), // VR3
    Code::new(6, 3, 0b010),     // VL1
    Code::new(7, 6, 0b000010),  // VL2
    Code::new(8, 7, 0b0000010), // VL3
];

/// Look up the terminating code for a run of `len < 64` pixels.
pub(crate) fn terminating_code(is_white: bool, len: u16) -> Code {
    debug_assert!(len < MAKEUP_STEP);

    if is_white {
        WHITE_TERMINATING[len as usize]
    } else {
        BLACK_TERMINATING[len as usize]
    }
}

/// Look up the make-up code for a run that is a non-zero multiple of 64, at most 2560.
pub(crate) fn makeup_code(is_white: bool, len: u16) -> Code {
    debug_assert!(len.is_multiple_of(MAKEUP_STEP) && (MAKEUP_STEP..=MAX_MAKEUP).contains(&len));

    let idx = (len / MAKEUP_STEP) as usize - 1;

    match (idx, is_white) {
        (0..27, true) => WHITE_MAKEUP[idx],
        (0..27, false) => BLACK_MAKEUP[idx],
        _ => COMMON_MAKEUP[idx - 27],
    }
}

/// Insert a single code into the state machine.
/// Returns the new number of states.
const fn insert_code<const N: usize>(
    states: &mut [State; N],
    mut num_states: usize,
    code: Code,
) -> usize {
    let mut current_state: usize = 0;
    let mut i: u8 = 0;

    while i < code.len {
        let bit = (code.bits >> (code.len - 1 - i)) & 1;

        let next = if bit == 0 {
            states[current_state].on_0
        } else {
            states[current_state].on_1
        };

        if i == code.len - 1 {
            let result = VALUE_FLAG | (code.value & VALUE_MASK);

            if bit == 0 {
                states[current_state].on_0 = result;
            } else {
                states[current_state].on_1 = result;
            }
        } else if next == INVALID || next >= VALUE_FLAG {
            let new_state = num_states;
            num_states += 1;

            if bit == 0 {
                states[current_state].on_0 = new_state as u16;
            } else {
                states[current_state].on_1 = new_state as u16;
            }
            current_state = new_state;
        } else {
            current_state = next as usize;
        }

        i += 1;
    }

    num_states
}

const fn insert_codes<const N: usize, const M: usize>(
    states: &mut [State; N],
    mut num_states: usize,
    codes: &[Code; M],
) -> usize {
    let mut i = 0;
    while i < codes.len() {
        num_states = insert_code(states, num_states, codes[i]);
        i += 1;
    }
    num_states
}

const fn build_run_states<const N: usize, const T: usize, const M: usize>(
    terminating: &[Code; T],
    makeup: &[Code; M],
) -> [State; N] {
    let mut states: [State; N] = [State::new(); N];
    let mut num_states: usize = 1;
    num_states = insert_codes(&mut states, num_states, terminating);
    num_states = insert_codes(&mut states, num_states, makeup);
    let _ = insert_codes(&mut states, num_states, &COMMON_MAKEUP);
    states
}

pub(crate) const WHITE_STATES: [State; 104] = build_run_states(&WHITE_TERMINATING, &WHITE_MAKEUP);
pub(crate) const BLACK_STATES: [State; 104] = build_run_states(&BLACK_TERMINATING, &BLACK_MAKEUP);

pub(crate) const MODE_STATES: [State; 9] = {
    let mut states: [State; 9] = [State::new(); 9];
    let _ = insert_codes(&mut states, 1, &MODE_CODES);
    states
};
