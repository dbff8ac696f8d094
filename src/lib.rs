/*!
This crate provides a host facing regex API on top of a linear time regex
engine.

The API follows the shape scripting languages usually give their regex
modules: compile a [`Pattern`] once, then use it to `fullmatch`, `match`,
`search`, `finditer`, `findall`, `sub` and `split` over text. All positions
that cross this API are counted in code points, not bytes, and every match
method accepts a starting position. The engine itself never backtracks, so
every operation runs in time linear in the size of the subject. The price is
that backreferences and look-around assertions are rejected at compile time.

# Example

```
use regex_host::{compile, Flags};

let re = compile(r"(?P<key>\w+)=(?P<value>\w*)", Flags::NONE)?;
let m = re.search("où=ça", 0).unwrap();
assert_eq!(Some("où"), m.group("key")?);
// Spans are in code points.
assert_eq!(Some((3, 5)), m.span("value")?);
assert_eq!(Some((4, 7)), m.byte_span("value")?);

let (text, n) = re.sub("a=1 b=2", r"\g<value>:\1", 0)?;
assert_eq!("1:a 2:b", text);
assert_eq!(2, n);

# Ok::<(), Box<dyn std::error::Error>>(())
```

# Caching

[`compile`] always compiles. Programs that compile the same patterns over and
over should keep a [`Cache`], which compiles each distinct pattern and flag
set at most once, even when many threads ask for it at the same time.

# Host locks

Hosts with a global interpreter lock can give the compiler a [`HostLock`].
Every engine run then happens inside a [`ConcurrencyGuard`], which releases
the lock for the duration of the run so that other host threads can make
progress. See [`ConcurrencyGuard`] for details.

# Crate features

* **logging** - Emit compile, cache and scan events through the `log` crate.
*/

#![deny(missing_debug_implementations)]

#[macro_use]
mod macros;

pub mod cache;
mod captures;
pub mod compiler;
mod engine;
mod error;
mod flags;
mod guard;
mod iter;
mod offset;
mod pattern;
mod template;

pub use crate::{
    cache::{Cache, CacheStats},
    captures::{CapturedGroup, GroupRef, Match},
    compiler::Compiler,
    error::{
        CompileError, CompileErrorKind, Error, FlagConflictError, GroupError,
        InternalError, TemplateError,
    },
    flags::Flags,
    guard::{
        ConcurrencyGuard, ExclusiveLock, ExclusiveLockHolder, HostLock,
        NoHostLock,
    },
    iter::Matches,
    offset::OffsetTranslator,
    pattern::{Found, Pattern},
};

/// Compile `pattern` with `flags` using a default [`Compiler`].
///
/// This does not consult any cache. Use a [`Cache`] to avoid compiling the
/// same pattern repeatedly.
///
/// # Example
///
/// ```
/// use regex_host::{compile, CompileErrorKind, Error, Flags};
///
/// let re = compile(r"\d+", Flags::NONE)?;
/// assert!(re.contains("abc 123", 0));
///
/// match compile(r"(a)\1", Flags::NONE) {
///     Err(Error::Compile(err)) => {
///         assert_eq!(CompileErrorKind::Unsupported, err.kind());
///     }
///     _ => unreachable!(),
/// }
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn compile(pattern: &str, flags: Flags) -> Result<Pattern, Error> {
    Compiler::new().compile(pattern, flags)
}

/// Escape every meta character in `text`, so that compiling the result
/// matches `text` literally.
///
/// # Example
///
/// ```
/// use regex_host::{compile, escape, Flags};
///
/// let re = compile(&escape("1+1=2?"), Flags::NONE)?;
/// assert!(re.fullmatch("1+1=2?", 0).is_some());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn escape(text: &str) -> String {
    regex_syntax::escape(text)
}
