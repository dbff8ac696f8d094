/*!
Translation between byte offsets and code point offsets.

The engine reports positions as byte offsets into the UTF-8 encoding of a
subject, while callers think in code points. An [`OffsetTranslator`] is built
once per subject in a single pass and then answers translations in both
directions without rescanning the subject from the beginning.
*/

use crate::error::InternalError;

/// The number of code points between two checkpoints.
const BLOCK: usize = 64;

/// Converts offsets for one subject.
///
/// For ASCII subjects both coordinate spaces coincide and no index is built.
/// Otherwise, the byte offset of every `BLOCK`th code point is recorded,
/// which bounds the work of any single translation to one block.
///
/// # Example
///
/// ```
/// use regex_host::OffsetTranslator;
///
/// let tr = OffsetTranslator::new("aβc");
/// assert_eq!(3, tr.char_len());
/// assert_eq!(Ok(2), tr.to_char(3));
/// assert_eq!(3, tr.to_byte(2));
/// // Offset 2 is inside the encoding of 'β'.
/// assert!(tr.to_char(2).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct OffsetTranslator<'h> {
    subject: &'h str,
    char_len: usize,
    /// Byte offsets of code points 0, BLOCK, 2*BLOCK, ... Empty when the
    /// subject is ASCII.
    checkpoints: Vec<usize>,
}

impl<'h> OffsetTranslator<'h> {
    /// Build a translator for the given subject.
    pub fn new(subject: &'h str) -> OffsetTranslator<'h> {
        if subject.is_ascii() {
            return OffsetTranslator {
                subject,
                char_len: subject.len(),
                checkpoints: vec![],
            };
        }
        let mut checkpoints = Vec::with_capacity(subject.len() / BLOCK + 1);
        let mut char_len = 0;
        for (i, (byte, _)) in subject.char_indices().enumerate() {
            if i % BLOCK == 0 {
                checkpoints.push(byte);
            }
            char_len += 1;
        }
        OffsetTranslator { subject, char_len, checkpoints }
    }

    /// The subject this translator was built for.
    pub fn subject(&self) -> &'h str {
        self.subject
    }

    /// The length of the subject in code points.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Whether the subject is ASCII, in which case translation is the
    /// identity.
    pub fn is_ascii(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Converts a byte offset reported by the engine to a code point offset.
    ///
    /// An offset past the end of the subject or inside the encoding of a
    /// code point is an internal consistency error.
    pub fn to_char(&self, byte: usize) -> Result<usize, InternalError> {
        if !self.subject.is_char_boundary(byte) {
            error!(
                "byte offset {} is not a code point boundary of a {} byte \
                 subject",
                byte,
                self.subject.len(),
            );
            return Err(InternalError::misaligned(byte, self.subject.len()));
        }
        if self.is_ascii() {
            return Ok(byte);
        }
        // The first checkpoint is always 0, so the partition point is at
        // least 1.
        let block = self.checkpoints.partition_point(|&b| b <= byte) - 1;
        let from = self.checkpoints[block];
        Ok(block * BLOCK + self.subject[from..byte].chars().count())
    }

    /// Converts a code point offset supplied by a caller to a byte offset.
    ///
    /// Offsets past the end of the subject are clamped to its length.
    pub fn to_byte(&self, at: usize) -> usize {
        if at >= self.char_len {
            return self.subject.len();
        }
        if self.is_ascii() {
            return at;
        }
        let from = self.checkpoints[at / BLOCK];
        match self.subject[from..].char_indices().nth(at % BLOCK) {
            Some((i, _)) => from + i,
            None => self.subject.len(),
        }
    }

    /// Converts a byte span to a code point span.
    pub fn to_char_span(
        &self,
        span: (usize, usize),
    ) -> Result<(usize, usize), InternalError> {
        Ok((self.to_char(span.0)?, self.to_char(span.1)?))
    }

    /// Returns the byte offset of the code point following the one that
    /// starts at `byte`. At the end of the subject, this returns `None`.
    pub(crate) fn next_boundary(&self, byte: usize) -> Option<usize> {
        let ch = self.subject.get(byte..)?.chars().next()?;
        Some(byte + ch.len_utf8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn ascii_is_identity() {
        let tr = OffsetTranslator::new("hello");
        assert!(tr.is_ascii());
        assert_eq!(5, tr.char_len());
        for i in 0..=5 {
            assert_eq!(Ok(i), tr.to_char(i));
            assert_eq!(i, tr.to_byte(i));
        }
        assert_eq!(5, tr.to_byte(100));
        assert!(tr.to_char(6).is_err());
    }

    #[test]
    fn multi_byte() {
        // 'é' is 2 bytes, '☃' is 3 bytes and '💩' is 4 bytes.
        let s = "aé☃💩z";
        let tr = OffsetTranslator::new(s);
        assert!(!tr.is_ascii());
        assert_eq!(5, tr.char_len());
        let expected = [(0, 0), (1, 1), (3, 2), (6, 3), (10, 4), (11, 5)];
        for &(byte, ch) in &expected {
            assert_eq!(Ok(ch), tr.to_char(byte));
            assert_eq!(byte, tr.to_byte(ch));
        }
        for &bad in &[2, 4, 5, 7, 8, 9, 12] {
            assert!(tr.to_char(bad).is_err(), "offset {}", bad);
        }
    }

    #[test]
    fn misaligned_reports_offset() {
        let tr = OffsetTranslator::new("β");
        let err = tr.to_char(1).unwrap_err();
        assert_eq!(1, err.offset());
        assert!(err.to_string().contains("splits a code point"));
        let err = tr.to_char(9).unwrap_err();
        assert!(err.to_string().contains("past the end"));
    }

    #[test]
    fn crosses_many_checkpoints() {
        let s = "αb".repeat(500);
        let tr = OffsetTranslator::new(&s);
        assert_eq!(1000, tr.char_len());
        for ch in 0..=1000 {
            let byte = tr.to_byte(ch);
            let expected =
                s.char_indices().nth(ch).map_or(s.len(), |(b, _)| b);
            assert_eq!(expected, byte);
            assert_eq!(Ok(ch), tr.to_char(byte));
        }
    }

    #[test]
    fn next_boundary() {
        let tr = OffsetTranslator::new("a☃");
        assert_eq!(Some(1), tr.next_boundary(0));
        assert_eq!(Some(4), tr.next_boundary(1));
        assert_eq!(None, tr.next_boundary(4));
    }

    quickcheck! {
        fn prop_round_trip_every_boundary(s: String) -> bool {
            let tr = OffsetTranslator::new(&s);
            let mut boundaries: Vec<usize> =
                s.char_indices().map(|(b, _)| b).collect();
            boundaries.push(s.len());
            boundaries.iter().enumerate().all(|(ch, &byte)| {
                tr.to_char(byte) == Ok(ch) && tr.to_byte(ch) == byte
            })
        }

        fn prop_interior_bytes_rejected(s: String) -> bool {
            let tr = OffsetTranslator::new(&s);
            (0..=s.len())
                .filter(|&b| !s.is_char_boundary(b))
                .all(|b| tr.to_char(b).is_err())
        }
    }
}
