//! Bit-serial checksum used by the VFAT readout electronics.
//!
//! Every word is fed LSB first into a 16 bit shift register seeded with [CRC_SEED].
//! When the register LSB differs from the incoming data bit, the register is shifted right and XORed with [CRC_FEEDBACK].
//! The frame checksum covers words 11 down to 1, in that order.

/// Initial accumulator value.
pub const CRC_SEED: u16 = 0xFFFF;
/// Reflected feedback constant applied on a set feedback bit.
pub const CRC_FEEDBACK: u16 = 0x8408;

/// Fold the 16 bits of `word` into the accumulator `crc`, LSB first.
#[inline]
pub fn fold_word(crc: u16, word: u16) -> u16 {
    (0..16).fold(crc, |acc, bit| {
        let data_bit = (word >> bit) & 1;
        if (acc & 1) ^ data_bit == 1 {
            (acc >> 1) ^ CRC_FEEDBACK
        } else {
            acc >> 1
        }
    })
}

/// Calculate the checksum over `words`, folded in the order they are yielded.
///
/// For a frame the words have to be supplied from index 11 down to index 1, see [VfatFrame::calculate_crc](super::VfatFrame::calculate_crc).
pub fn calculate_crc<I>(words: I) -> u16
where
    I: IntoIterator<Item = u16>,
{
    words.into_iter().fold(CRC_SEED, fold_word)
}
