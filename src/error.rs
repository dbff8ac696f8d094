use crate::flags::Flags;

/// An error that occurs when compiling a pattern or preparing a replacement.
///
/// This unifies every failure a caller can cause. Each variant wraps a more
/// specific error type which can be inspected for details.
///
/// Note that "no match" is never an error. Searches report the absence of a
/// match with `None`.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The engine rejected the pattern text.
    Compile(CompileError),
    /// The caller supplied flags that cannot be used together.
    FlagConflict(FlagConflictError),
    /// A group was referenced by an index or a name the pattern lacks.
    Group(GroupError),
    /// A replacement template could not be parsed.
    Template(TemplateError),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Compile(ref err) => Some(err),
            Error::FlagConflict(ref err) => Some(err),
            Error::Group(ref err) => Some(err),
            Error::Template(ref err) => Some(err),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Error::Compile(ref err) => err.fmt(f),
            Error::FlagConflict(ref err) => err.fmt(f),
            Error::Group(ref err) => err.fmt(f),
            Error::Template(ref err) => err.fmt(f),
        }
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Error {
        Error::Compile(err)
    }
}

impl From<FlagConflictError> for Error {
    fn from(err: FlagConflictError) -> Error {
        Error::FlagConflict(err)
    }
}

impl From<GroupError> for Error {
    fn from(err: GroupError) -> Error {
        Error::Group(err)
    }
}

impl From<TemplateError> for Error {
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

/// The reason the engine gave for rejecting a pattern.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum CompileErrorKind {
    /// The pattern is not valid syntax.
    Syntax,
    /// The pattern uses a construct the engine cannot execute in linear
    /// time, such as a backreference or a look-around assertion.
    Unsupported,
    /// The compiled program would exceed the configured size limit.
    TooBig,
}

/// An error that occurs when the engine rejects a pattern.
///
/// A compile error carries the offending pattern text, the byte offset into
/// that text at which the problem was detected (when the engine reports
/// one) and a human readable message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompileError {
    kind: CompileErrorKind,
    pattern: String,
    offset: Option<usize>,
    message: String,
}

impl CompileError {
    pub(crate) fn new(
        kind: CompileErrorKind,
        pattern: &str,
        offset: Option<usize>,
        message: String,
    ) -> CompileError {
        CompileError { kind, pattern: pattern.to_string(), offset, message }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> CompileErrorKind {
        self.kind
    }

    /// Returns the pattern text that failed to compile.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the byte offset into the pattern at which the failure was
    /// detected, if the engine reported one.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Returns the engine's diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::error::Error for CompileError {}

impl core::fmt::Display for CompileError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.offset {
            Some(offset) => write!(
                f,
                "error compiling pattern {:?} at offset {}: {}",
                self.pattern, offset, self.message,
            ),
            None => write!(
                f,
                "error compiling pattern {:?}: {}",
                self.pattern, self.message,
            ),
        }
    }
}

/// An error that occurs when mutually incompatible flags are given.
///
/// This is detected before the engine is invoked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlagConflictError {
    flags: Flags,
    conflicting: Flags,
}

impl FlagConflictError {
    pub(crate) fn new(flags: Flags, conflicting: Flags) -> FlagConflictError {
        FlagConflictError { flags, conflicting }
    }

    /// The full flag set the caller supplied.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The subset of flags that cannot be combined.
    pub fn conflicting(&self) -> Flags {
        self.conflicting
    }
}

impl std::error::Error for FlagConflictError {}

impl core::fmt::Display for FlagConflictError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "incompatible flags: {:?}", self.conflicting)
    }
}

/// An error that occurs when a group is referenced by an index out of range
/// or by a name that the pattern does not define.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupError {
    kind: GroupErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum GroupErrorKind {
    Index { index: usize, len: usize },
    Name { name: String },
}

impl GroupError {
    pub(crate) fn index(index: usize, len: usize) -> GroupError {
        GroupError { kind: GroupErrorKind::Index { index, len } }
    }

    pub(crate) fn name(name: &str) -> GroupError {
        GroupError { kind: GroupErrorKind::Name { name: name.to_string() } }
    }

    /// Returns the offending index, if the group was referenced by index.
    pub fn invalid_index(&self) -> Option<usize> {
        match self.kind {
            GroupErrorKind::Index { index, .. } => Some(index),
            GroupErrorKind::Name { .. } => None,
        }
    }

    /// Returns the offending name, if the group was referenced by name.
    pub fn invalid_name(&self) -> Option<&str> {
        match self.kind {
            GroupErrorKind::Index { .. } => None,
            GroupErrorKind::Name { ref name } => Some(name),
        }
    }
}

impl std::error::Error for GroupError {}

impl core::fmt::Display for GroupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            GroupErrorKind::Index { index, len } => write!(
                f,
                "invalid group reference {} (pattern has {} groups)",
                index,
                len.saturating_sub(1),
            ),
            GroupErrorKind::Name { ref name } => {
                write!(f, "unknown group name {:?}", name)
            }
        }
    }
}

/// An error that occurs when a replacement template is malformed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateError {
    template: String,
    offset: usize,
    message: &'static str,
}

impl TemplateError {
    pub(crate) fn new(
        template: &str,
        offset: usize,
        message: &'static str,
    ) -> TemplateError {
        TemplateError { template: template.to_string(), offset, message }
    }

    /// Returns the template text that failed to parse.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the byte offset into the template where the problem starts.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl std::error::Error for TemplateError {}

impl core::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "bad replacement template {:?} at offset {}: {}",
            self.template, self.offset, self.message,
        )
    }
}

/// An error that indicates a defect rather than bad input: a byte offset
/// reported by the engine does not fall on a code point boundary of the
/// subject.
///
/// Matching operations never return this error. If it is ever observed, the
/// operation panics, since continuing would produce corrupted offsets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InternalError {
    offset: usize,
    len: usize,
}

impl InternalError {
    pub(crate) fn misaligned(offset: usize, len: usize) -> InternalError {
        InternalError { offset, len }
    }

    /// The byte offset that could not be translated.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl std::error::Error for InternalError {}

impl core::fmt::Display for InternalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.offset > self.len {
            write!(
                f,
                "internal consistency error: byte offset {} is past the end \
                 of a subject of {} bytes",
                self.offset, self.len,
            )
        } else {
            write!(
                f,
                "internal consistency error: byte offset {} splits a \
                 code point",
                self.offset,
            )
        }
    }
}
