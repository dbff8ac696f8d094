/*!
Turning pattern text and flags into a [`Pattern`].

A [`Compiler`] validates flags, hands the pattern to the engine and
assembles the result. It never consults or fills a cache; see
[`Cache`](crate::Cache) for that.
*/

use std::sync::Arc;

use crate::{
    engine::{BuildOptions, Program},
    error::Error,
    flags::Flags,
    guard::{HostLock, NoHostLock},
    pattern::Pattern,
};

/// The configuration used by a [`Compiler`].
///
/// As with other configuration types, every knob is optional so that unset
/// values can be told apart from defaults when combining configurations with
/// [`Config::overwrite`].
#[derive(Clone, Debug, Default)]
pub struct Config {
    size_limit: Option<Option<usize>>,
    never_capture: Option<bool>,
    host_lock: Option<Arc<dyn HostLock>>,
}

impl Config {
    /// Return a new default configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set an approximate limit, in bytes, on the size of a compiled
    /// program. Patterns that exceed it fail with a
    /// [`CompileErrorKind::TooBig`](crate::CompileErrorKind::TooBig) error.
    /// `None` disables the limit.
    ///
    /// The default is 8 MiB.
    pub fn size_limit(self, limit: Option<usize>) -> Config {
        Config { size_limit: Some(limit), ..self }
    }

    /// When enabled, explicit capture groups are compiled as if they were
    /// non-capturing. Every pattern then has a group count of zero.
    ///
    /// This is disabled by default.
    pub fn never_capture(self, yes: bool) -> Config {
        Config { never_capture: Some(yes), ..self }
    }

    /// Set the host lock that is released while the engine runs.
    ///
    /// By default, there is no host lock.
    pub fn host_lock(self, lock: Arc<dyn HostLock>) -> Config {
        Config { host_lock: Some(lock), ..self }
    }

    /// Returns the program size limit, or `None` when there is no limit.
    pub fn get_size_limit(&self) -> Option<usize> {
        self.size_limit.unwrap_or(Some(8 * (1 << 20)))
    }

    /// Returns whether explicit capture groups are compiled away.
    pub fn get_never_capture(&self) -> bool {
        self.never_capture.unwrap_or(false)
    }

    /// Returns the host lock released around engine runs.
    pub fn get_host_lock(&self) -> Arc<dyn HostLock> {
        match self.host_lock {
            Some(ref lock) => Arc::clone(lock),
            None => Arc::new(NoHostLock),
        }
    }

    /// Overwrite the default configuration such that the options in `o` are
    /// always used. If an option in `o` is not set, then the corresponding
    /// option in `self` is used.
    pub fn overwrite(&self, o: Config) -> Config {
        Config {
            size_limit: o.size_limit.or(self.size_limit),
            never_capture: o.never_capture.or(self.never_capture),
            host_lock: o.host_lock.or_else(|| self.host_lock.clone()),
        }
    }
}

/// Compiles patterns.
///
/// # Example
///
/// ```
/// use regex_host::{compiler::{Compiler, Config}, Flags};
///
/// let compiler = Compiler::with_config(Config::new().never_capture(true));
/// let re = compiler.compile(r"(\w+)@(\w+)", Flags::NONE)?;
/// assert_eq!(0, re.group_count());
/// assert!(re.search("me@example", 0).is_some());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    config: Config,
}

impl Compiler {
    /// Create a compiler with a default configuration.
    pub fn new() -> Compiler {
        Compiler::default()
    }

    /// Create a compiler with the given configuration.
    pub fn with_config(config: Config) -> Compiler {
        Compiler { config }
    }

    /// Return this compiler's configuration.
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Compile `pattern` with the given flags.
    ///
    /// Incompatible flags are rejected before the engine is invoked. If the
    /// engine rejects the pattern, the error carries the engine's message
    /// and, when known, the byte offset into `pattern` at fault.
    pub fn compile(
        &self,
        pattern: &str,
        flags: Flags,
    ) -> Result<Pattern, Error> {
        flags.validate()?;
        let opts = BuildOptions {
            size_limit: self.config.get_size_limit(),
            never_capture: self.config.get_never_capture(),
        };
        let program = Program::compile(pattern, flags, opts)?;
        let pattern =
            Pattern::new(pattern, flags, program, self.config.get_host_lock());
        debug!(
            "compiled pattern {:?} with flags {:?} ({} groups)",
            pattern.pattern(),
            flags,
            pattern.group_count(),
        );
        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorKind;

    #[test]
    fn determinism() {
        let compiler = Compiler::new();
        let pattern = r"(?P<y>\d{4})-(?P<m>\d{2})(x)?";
        let a = compiler.compile(pattern, Flags::NONE).unwrap();
        let b = compiler.compile(pattern, Flags::NONE).unwrap();
        assert_eq!(a.group_count(), b.group_count());
        assert_eq!(a.group_index(), b.group_index());
        assert_eq!(a.group_names(), b.group_names());
    }

    #[test]
    fn flag_conflicts_before_engine() {
        // The pattern is invalid too, but the flags are checked first.
        let err = Compiler::new()
            .compile("(", Flags::ASCII | Flags::UNICODE)
            .unwrap_err();
        assert!(matches!(err, Error::FlagConflict(_)));
    }

    #[test]
    fn compile_errors() {
        match Compiler::new().compile(r"(\w+) \1", Flags::NONE) {
            Err(Error::Compile(err)) => {
                assert_eq!(CompileErrorKind::Unsupported, err.kind());
                assert_eq!(r"(\w+) \1", err.pattern());
                assert_eq!(Some(6), err.offset());
            }
            r => panic!("unexpected result: {:?}", r.map(|_| ())),
        }
    }

    #[test]
    fn flags_reach_the_engine() {
        let c = Compiler::new();
        let re = c.compile("^b.c$", Flags::MULTILINE | Flags::DOTALL).unwrap();
        assert!(re.search("a\nb\nc\nd", 0).is_some());
        let re = c.compile("δ", Flags::IGNORECASE).unwrap();
        assert!(re.search("Δ", 0).is_some());
        let re = c.compile(r"\w", Flags::ASCII).unwrap();
        assert!(re.search("β", 0).is_none());
        let re = c.compile(r"a b # comment", Flags::VERBOSE).unwrap();
        assert!(re.fullmatch("ab", 0).is_some());
        let re = c.compile("a+b", Flags::LITERAL).unwrap();
        assert!(re.search("aab", 0).is_none());
        assert!(re.search("xa+b", 0).is_some());
    }

    #[test]
    fn config_overwrite() {
        let base = Config::new().size_limit(Some(10)).never_capture(true);
        let merged = base.overwrite(Config::new().size_limit(None));
        assert_eq!(None, merged.get_size_limit());
        assert!(merged.get_never_capture());
        assert_eq!(Some(8 * (1 << 20)), Config::new().get_size_limit());
    }
}
