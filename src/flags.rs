/*!
The set of options a pattern is compiled with.

Each flag is a single bit in a [`Flags`] value, and flags combine with `|`.
Flags are checked for mutual compatibility by [`Flags::validate`] before a
pattern ever reaches the engine.
*/

use crate::error::FlagConflictError;

/// A set of compile options.
///
/// The default value has no flags set: matching is case sensitive, `^` and
/// `$` only match at the ends of the subject, `.` does not match `\n` and
/// character classes like `\w` are Unicode aware.
///
/// # Example
///
/// ```
/// use regex_host::Flags;
///
/// let flags = Flags::IGNORECASE | Flags::MULTILINE;
/// assert!(flags.is_ignore_case());
/// assert!(flags.is_multi_line());
/// assert!(!flags.is_dot_all());
/// ```
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Flags {
    bits: u8,
}

impl Flags {
    define_flag!(0, IGNORECASE, is_ignore_case);
    define_flag!(1, MULTILINE, is_multi_line);
    define_flag!(2, DOTALL, is_dot_all);
    define_flag!(3, UNICODE, is_unicode);
    define_flag!(4, LITERAL, is_literal);
    define_flag!(5, ASCII, is_ascii);
    define_flag!(6, VERBOSE, is_verbose);

    /// The empty flag set.
    pub const NONE: Flags = Flags { bits: 0 };

    const NAMES: &'static [(Flags, &'static str)] = &[
        (Flags::IGNORECASE, "IGNORECASE"),
        (Flags::MULTILINE, "MULTILINE"),
        (Flags::DOTALL, "DOTALL"),
        (Flags::UNICODE, "UNICODE"),
        (Flags::LITERAL, "LITERAL"),
        (Flags::ASCII, "ASCII"),
        (Flags::VERBOSE, "VERBOSE"),
    ];

    /// Returns the empty flag set.
    pub fn new() -> Flags {
        Flags::NONE
    }

    /// Returns the raw bits of this flag set.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Returns true if every flag in `other` is also set in `self`.
    pub fn contains(&self, other: Flags) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Returns true when no flag is set.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Whether character classes, word boundaries and case folding should
    /// be Unicode aware. This is the default unless `ASCII` is given.
    pub fn unicode_classes(&self) -> bool {
        !self.is_ascii()
    }

    /// Checks that the flags in this set can be used together.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_host::Flags;
    ///
    /// assert!((Flags::LITERAL | Flags::IGNORECASE).validate().is_ok());
    /// assert!((Flags::ASCII | Flags::UNICODE).validate().is_err());
    /// assert!((Flags::LITERAL | Flags::VERBOSE).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), FlagConflictError> {
        if self.is_ascii() && self.is_unicode() {
            return Err(FlagConflictError::new(
                *self,
                Flags::ASCII | Flags::UNICODE,
            ));
        }
        if self.is_literal() {
            for &other in &[Flags::VERBOSE, Flags::MULTILINE, Flags::DOTALL] {
                if self.contains(other) {
                    return Err(FlagConflictError::new(
                        *self,
                        Flags::LITERAL | other,
                    ));
                }
            }
        }
        Ok(())
    }
}

impl core::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags { bits: self.bits | rhs.bits }
    }
}

impl core::ops::BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.bits |= rhs.bits;
    }
}

impl core::fmt::Debug for Flags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let mut first = true;
        for &(flag, name) in Flags::NAMES {
            if !self.contains(flag) {
                continue;
            }
            if !first {
                write!(f, "|")?;
            }
            write!(f, "{}", name)?;
            first = false;
        }
        Ok(())
    }
}
