//! Scalar field extraction.
//!
//! Every number in a cast is written as a run of digit bytes whose width
//! is either announced in-stream or implied by position:
//!
//! - **internal**: `<n><n digits>`; structural counters, never missing
//! - **measured**: `<sig><n><right><n digits>`, or a lone `-` for missing
//! - **fixed**: `<n digits>` with `n` known to the caller
//!
//! In all three the first digit slot may hold `-` for a negative value.
//! Only the leading byte of a measured field uses `-` to mean "missing".

use std::io::BufRead;

use crate::constants::widths;
use crate::cursor::ByteCursor;
use crate::error::{Result, WodError};
use crate::models::Field;

/// Encoding of the next scalar in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// Width read from one leading digit
    Internal,
    /// Significant/total/right-of-decimal figures read in-stream; `-` means missing
    Measured { sentinel: i32 },
    /// Width supplied by the caller
    Fixed(u8),
}

/// Length of a text field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLength {
    /// One leading digit holds the byte count
    Prefixed,
    Known(usize),
}

/// Decodes scalars and text from a [`ByteCursor`]
pub struct FieldDecoder<R> {
    cursor: ByteCursor<R>,
}

impl<R: BufRead> FieldDecoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            cursor: ByteCursor::new(source),
        }
    }

    pub fn decode_scalar(&mut self, mode: FieldMode) -> Result<Field> {
        match mode {
            FieldMode::Internal => {
                let total = self.figure("total figures")?;
                let value = self.digits(total)?;
                Ok(Field::integer(value, total))
            }
            FieldMode::Measured { sentinel } => {
                let lead = self.cursor.next_byte()?;
                if lead == b'-' {
                    return Ok(Field::missing(sentinel));
                }
                let significant = self.digit_value(lead, "significant figures")?;
                let total = self.figure("total figures")?;
                let right = self.figure("right-of-decimal figures")?;
                if right > total {
                    return Err(self.malformed(format!(
                        "{right} figures right of the decimal exceed {total} total figures"
                    )));
                }
                let value = self.digits(total)?;
                Ok(Field::new(value, significant, total, right))
            }
            FieldMode::Fixed(width) => {
                let value = self.digits(width)?;
                Ok(Field::integer(value, width))
            }
        }
    }

    /// Structural counter as a plain integer
    pub fn internal(&mut self) -> Result<i32> {
        Ok(self.decode_scalar(FieldMode::Internal)?.value)
    }

    /// Structural counter that must not be negative
    pub fn count(&mut self, what: &str) -> Result<usize> {
        let value = self.internal()?;
        self.non_negative(value, what)
    }

    pub fn measured(&mut self, sentinel: i32) -> Result<Field> {
        self.decode_scalar(FieldMode::Measured { sentinel })
    }

    pub fn fixed(&mut self, width: u8) -> Result<i32> {
        Ok(self.decode_scalar(FieldMode::Fixed(width))?.value)
    }

    /// Fixed-width counter that must not be negative
    pub fn fixed_count(&mut self, width: u8, what: &str) -> Result<usize> {
        let value = self.fixed(width)?;
        self.non_negative(value, what)
    }

    /// Single-digit error or originator flag
    pub fn flag(&mut self) -> Result<u8> {
        let value = self.fixed(widths::FLAG)?;
        u8::try_from(value).map_err(|_| self.malformed(format!("flag value {value} is negative")))
    }

    /// Raw bytes copied verbatim
    pub fn decode_text(&mut self, length: TextLength) -> Result<String> {
        let len = match length {
            TextLength::Prefixed => usize::from(self.figure("text length")?),
            TextLength::Known(len) => len,
        };
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(self.cursor.next_byte()?);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn cursor(&self) -> &ByteCursor<R> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut ByteCursor<R> {
        &mut self.cursor
    }

    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> WodError {
        WodError::malformed(self.cursor.offset(), reason)
    }

    /// One byte holding a figure count
    fn figure(&mut self, what: &str) -> Result<u8> {
        let byte = self.cursor.next_byte()?;
        self.digit_value(byte, what)
    }

    fn digit_value(&self, byte: u8, what: &str) -> Result<u8> {
        if byte.is_ascii_digit() {
            Ok(byte - b'0')
        } else {
            Err(self.malformed(format!(
                "expected a digit for {what}, found {:?}",
                char::from(byte)
            )))
        }
    }

    /// `width` signed digit slots, most significant first
    fn digits(&mut self, width: u8) -> Result<i32> {
        let mut value: i32 = 0;
        let mut negative = false;
        for slot in 0..width {
            let byte = self.cursor.next_byte()?;
            let digit = match byte {
                b'-' if slot == 0 => {
                    negative = true;
                    0
                }
                // Blank padding reads as zero
                b' ' => 0,
                b'0'..=b'9' => i32::from(byte - b'0'),
                other => {
                    return Err(self.malformed(format!(
                        "expected a digit in value, found {:?}",
                        char::from(other)
                    )));
                }
            };
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| self.malformed(format!("{width}-digit value overflows")))?;
        }
        Ok(if negative { -value } else { value })
    }

    fn non_negative(&self, value: i32, what: &str) -> Result<usize> {
        usize::try_from(value)
            .map_err(|_| self.malformed(format!("{what} is negative ({value})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decoder(bytes: &str) -> FieldDecoder<Cursor<Vec<u8>>> {
        FieldDecoder::new(Cursor::new(bytes.as_bytes().to_vec()))
    }

    #[test]
    fn test_internal_mode() {
        let mut d = decoder("3123");
        let field = d.decode_scalar(FieldMode::Internal).unwrap();
        assert_eq!(field.value, 123);
        assert_eq!(field.total_figures, 3);
        assert_eq!(field.right_of_decimal_figures, 0);
        assert!(!field.is_missing);
    }

    #[test]
    fn test_internal_mode_zero_width() {
        let mut d = decoder("0X");
        assert_eq!(d.internal().unwrap(), 0);
        assert_eq!(d.cursor_mut().next_byte().unwrap(), b'X');
    }

    #[test]
    fn test_measured_mode() {
        // 4 significant, 4 total, 1 right of decimal: 1500 / 10 = 150.0
        let mut d = decoder("4411500");
        let field = d.measured(-9999).unwrap();
        assert_eq!(field.value, 1500);
        assert_eq!(field.significant_figures, 4);
        assert_eq!(field.total_figures, 4);
        assert_eq!(field.right_of_decimal_figures, 1);
        assert_eq!(field.to_f64(), Some(150.0));
    }

    #[test]
    fn test_measured_missing_consumes_one_byte() {
        let mut d = decoder("-Z");
        let field = d.measured(-9999).unwrap();
        assert!(field.is_missing);
        assert_eq!(field.value, -9999);
        assert_eq!(field.significant_figures, 0);
        assert_eq!(field.total_figures, 0);
        assert_eq!(field.right_of_decimal_figures, 0);
        assert_eq!(d.cursor_mut().next_byte().unwrap(), b'Z');
    }

    #[test]
    fn test_measured_negative_value() {
        // -12.345 as sig 5, total 6, right 3
        let mut d = decoder("563-12345");
        let field = d.measured(-9999).unwrap();
        assert!(!field.is_missing);
        assert_eq!(field.value, -12345);
        assert_eq!(field.scaled(), -12.345);
    }

    #[test]
    fn test_fixed_mode() {
        let mut d = decoder("19980714");
        assert_eq!(d.fixed(4).unwrap(), 1998);
        assert_eq!(d.fixed(2).unwrap(), 7);
        assert_eq!(d.fixed(2).unwrap(), 14);
    }

    #[test]
    fn test_fixed_mode_sign_slot() {
        let mut d = decoder("-5");
        assert_eq!(d.fixed(2).unwrap(), -5);
    }

    #[test]
    fn test_leading_blank_reads_as_zero() {
        let mut d = decoder(" 7");
        assert_eq!(d.fixed(2).unwrap(), 7);
    }

    #[test]
    fn test_digits_consumed_exactly() {
        let mut d = decoder("312345");
        assert_eq!(d.internal().unwrap(), 123);
        assert_eq!(d.fixed(2).unwrap(), 45);
    }

    #[test]
    fn test_noise_between_digits_is_skipped() {
        let mut d = decoder("41\r\n234");
        assert_eq!(d.internal().unwrap(), 1234);
    }

    #[test]
    fn test_non_digit_figure_is_malformed() {
        let mut d = decoder("X12");
        assert!(matches!(
            d.internal(),
            Err(WodError::MalformedRecord { .. })
        ));

        let mut d = decoder("4A11500");
        assert!(matches!(
            d.measured(-9999),
            Err(WodError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_right_figures_exceeding_total_is_malformed() {
        let mut d = decoder("11315");
        assert!(matches!(
            d.measured(-9999),
            Err(WodError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_end_of_stream_mid_field() {
        let mut d = decoder("512");
        assert!(matches!(d.internal(), Err(WodError::EndOfStream)));

        let mut d = decoder("");
        assert!(matches!(d.measured(-9999), Err(WodError::EndOfStream)));
    }

    #[test]
    fn test_text_modes() {
        let mut d = decoder("US3ABC");
        assert_eq!(d.decode_text(TextLength::Known(2)).unwrap(), "US");
        assert_eq!(d.decode_text(TextLength::Prefixed).unwrap(), "ABC");
    }

    #[test]
    fn test_non_digit_flag_is_malformed() {
        let mut d = decoder("X");
        assert!(matches!(d.flag(), Err(WodError::MalformedRecord { .. })));
    }

    #[test]
    fn test_count_rejects_negative() {
        let mut d = decoder("2-3");
        assert!(matches!(
            d.count("levels"),
            Err(WodError::MalformedRecord { .. })
        ));
    }
}
