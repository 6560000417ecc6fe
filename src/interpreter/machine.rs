//! Registers and fixed-width word arithmetic

use serde::Serialize;

/// Two's complement word of a fixed bit width (1..=63)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Word {
    bits: u32,
}

impl Word {
    pub fn new(bits: u32) -> Self {
        Self {
            bits: bits.clamp(1, 63),
        }
    }

    pub fn bits(self) -> u32 {
        self.bits
    }

    fn mask(self) -> u64 {
        (1u64 << self.bits) - 1
    }

    /// Reduce `value` to this width, sign-extending the top bit
    pub fn wrap(self, value: i64) -> i64 {
        let shift = 64 - self.bits;
        (value << shift) >> shift
    }

    pub fn min_signed(self) -> i64 {
        -(1i64 << (self.bits - 1))
    }

    pub fn max_unsigned(self) -> i64 {
        (1i64 << self.bits) - 1
    }

    /// Rotate one bit to the right within the word
    pub fn rotate_right(self, value: i64) -> i64 {
        let raw = value as u64 & self.mask();
        let rotated = (raw >> 1) | ((raw & 1) << (self.bits - 1));
        self.wrap(rotated as i64)
    }

    pub fn not(self, value: i64) -> i64 {
        self.wrap(!value)
    }

    /// Whether the sign bit is set
    pub fn is_negative(self, value: i64) -> bool {
        self.wrap(value) < 0
    }
}

/// Registers of the accumulator machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Machine {
    accumulator: i64,
    stack_pointer: i64,
    word: Word,
}

impl Machine {
    pub fn new(word: Word) -> Self {
        Self {
            accumulator: 0,
            stack_pointer: 0,
            word,
        }
    }

    pub fn word(&self) -> Word {
        self.word
    }

    pub fn accumulator(&self) -> i64 {
        self.accumulator
    }

    pub fn set_accumulator(&mut self, value: i64) {
        self.accumulator = self.word.wrap(value);
    }

    pub fn stack_pointer(&self) -> i64 {
        self.stack_pointer
    }

    pub fn set_stack_pointer(&mut self, value: i64) {
        self.stack_pointer = self.word.wrap(value);
    }

    pub fn reset(&mut self) {
        self.accumulator = 0;
        self.stack_pointer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_is_twos_complement() {
        let word = Word::new(24);
        assert_eq!(word.wrap(0x7F_FFFF), 0x7F_FFFF);
        assert_eq!(word.wrap(0x80_0000), -0x80_0000);
        assert_eq!(word.wrap(0xFF_FFFF), -1);
        assert_eq!(word.wrap(0x100_0000), 0);
        assert_eq!(word.min_signed(), -0x80_0000);
        assert_eq!(word.max_unsigned(), 0xFF_FFFF);
    }

    #[test]
    fn test_rotate_right() {
        let word = Word::new(4);
        assert_eq!(word.rotate_right(0b0010), 0b0001);
        // the low bit moves to the sign position
        assert_eq!(word.rotate_right(0b0001), -8);
        assert_eq!(word.rotate_right(-8), 0b0100);
    }

    #[test]
    fn test_not_and_sign() {
        let word = Word::new(8);
        assert_eq!(word.not(0), -1);
        assert_eq!(word.not(-1), 0);
        assert!(word.is_negative(0x80));
        assert!(!word.is_negative(0x7F));
    }

    #[test]
    fn test_registers_wrap() {
        let mut machine = Machine::new(Word::new(8));
        machine.set_accumulator(255);
        assert_eq!(machine.accumulator(), -1);
        machine.set_stack_pointer(300);
        assert_eq!(machine.stack_pointer(), 44);
        machine.reset();
        assert_eq!(machine.accumulator(), 0);
    }
}
