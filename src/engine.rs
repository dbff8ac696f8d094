/*!
The boundary with the automaton engine.

Everything in this module speaks the engine's language: patterns are parsed
into an [`Hir`] by `regex-syntax`, programs are `regex-automata` meta regexes
and every position is a byte offset into a UTF-8 subject. Nothing here knows
about code points.
*/

use std::collections::HashMap;

use regex_automata::{
    meta,
    nfa::thompson::WhichCaptures,
    util::captures::Captures,
    Anchored, Input, PatternID,
};
use regex_syntax::{
    ast,
    hir::{
        self, Capture, Class, ClassBytes, ClassUnicode, ClassUnicodeRange, Hir,
        HirKind, Look, Repetition,
    },
    ParserBuilder,
};

use crate::{
    error::{CompileError, CompileErrorKind},
    flags::Flags,
};

/// The byte span of every group of one match, in index order. Group 0 is the
/// overall match and is always present. `None` marks a group that did not
/// participate.
pub(crate) type GroupSpans = Vec<Option<(usize, usize)>>;

/// How a run is anchored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Anchor {
    /// The match must start at the start position and end at the end of the
    /// subject.
    Full,
    /// The match must start at the start position.
    Start,
    /// The match may start anywhere at or after the start position.
    Unanchored,
}

/// Options that shape how a program is built, independent of flags.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BuildOptions {
    pub(crate) size_limit: Option<usize>,
    pub(crate) never_capture: bool,
}

/// A compiled program.
///
/// Two engine programs are built from one parse: `prefix` runs the pattern
/// as written, `full` runs the pattern followed by an end of text assertion
/// and backs `Anchor::Full`. Since the assertion is concatenated rather than
/// grouped, both agree on group numbering.
///
/// A program is never mutated after it is built. The scratch space each run
/// needs comes from a pool internal to the meta regex, so a `Program` can be
/// shared freely between threads.
#[derive(Clone, Debug)]
pub(crate) struct Program {
    prefix: meta::Regex,
    full: meta::Regex,
}

impl Program {
    /// Parse and compile `pattern` with the given flags.
    ///
    /// Flags must already have been validated.
    pub(crate) fn compile(
        pattern: &str,
        flags: Flags,
        opts: BuildOptions,
    ) -> Result<Program, CompileError> {
        let escaped;
        let text = if flags.is_literal() {
            escaped = regex_syntax::escape(pattern);
            escaped.as_str()
        } else {
            pattern
        };
        // Without Unicode, classes like '.' and '\W' are byte classes that
        // could match part of a code point. Those are rewritten below, so
        // the parser must not reject them.
        let unicode = flags.unicode_classes();
        let mut hir = ParserBuilder::new()
            .case_insensitive(flags.is_ignore_case())
            .multi_line(flags.is_multi_line())
            .dot_matches_new_line(flags.is_dot_all())
            .unicode(unicode)
            .ignore_whitespace(flags.is_verbose())
            .utf8(unicode)
            .build()
            .parse(text)
            .map_err(|err| syntax_error(pattern, &err))?;
        if !unicode {
            hir = ascii_classes(&hir);
            if !hir.properties().is_utf8() {
                return Err(CompileError::new(
                    CompileErrorKind::Unsupported,
                    pattern,
                    None,
                    "pattern can match invalid UTF-8".to_string(),
                ));
            }
        }
        let full_hir = Hir::concat(vec![hir.clone(), Hir::look(Look::End)]);

        let which = if opts.never_capture {
            WhichCaptures::Implicit
        } else {
            WhichCaptures::All
        };
        let config = meta::Config::new()
            .nfa_size_limit(opts.size_limit)
            .which_captures(which);
        let mut builder = meta::Builder::new();
        builder.configure(config);
        let prefix = builder
            .build_from_hir(&hir)
            .map_err(|err| build_error(pattern, &err))?;
        let full = builder
            .build_from_hir(&full_hir)
            .map_err(|err| build_error(pattern, &err))?;
        Ok(Program { prefix, full })
    }

    /// Returns the number of explicit capture groups. The implicit group
    /// for the overall match is not counted.
    pub(crate) fn group_count(&self) -> usize {
        self.prefix
            .group_info()
            .group_len(PatternID::ZERO)
            .saturating_sub(1)
    }

    /// Returns the name of every group in index order, starting with the
    /// unnamed group 0.
    pub(crate) fn group_names(&self) -> Vec<Option<String>> {
        self.prefix
            .group_info()
            .pattern_names(PatternID::ZERO)
            .map(|name| name.map(|n| n.to_string()))
            .collect()
    }

    /// Returns the mapping from group name to group index.
    pub(crate) fn group_index(&self) -> HashMap<String, usize> {
        self.group_names()
            .into_iter()
            .enumerate()
            .filter_map(|(i, name)| name.map(|n| (n, i)))
            .collect()
    }

    /// Run this program on `subject`, beginning at the byte offset `start`.
    ///
    /// Bytes before `start` are never part of a match, but they are visible
    /// to assertions like `\b`.
    ///
    /// # Panics
    ///
    /// When `start` is greater than the length of `subject`.
    pub(crate) fn run(
        &self,
        subject: &str,
        start: usize,
        anchor: Anchor,
    ) -> Option<GroupSpans> {
        let (re, anchored) = match anchor {
            Anchor::Full => (&self.full, Anchored::Yes),
            Anchor::Start => (&self.prefix, Anchored::Yes),
            Anchor::Unanchored => (&self.prefix, Anchored::No),
        };
        let input = Input::new(subject).range(start..).anchored(anchored);
        let mut caps = re.create_captures();
        re.search_captures(&input, &mut caps);
        if !caps.is_match() {
            return None;
        }
        Some(spans(&caps))
    }

    /// Report whether this program matches anywhere at or after `start`,
    /// without resolving any group offsets.
    pub(crate) fn is_match(&self, subject: &str, start: usize) -> bool {
        self.prefix.is_match(Input::new(subject).range(start..))
    }
}

/// Rewrite every byte class in `hir` as a class of code points, such that
/// ASCII bytes map to themselves and any non-ASCII byte stands for every
/// non-ASCII code point. So `.` still matches `β` in ASCII mode, while `\w`
/// does not.
fn ascii_classes(hir: &Hir) -> Hir {
    match *hir.kind() {
        HirKind::Class(Class::Bytes(ref cls)) => {
            Hir::class(Class::Unicode(widen(cls)))
        }
        HirKind::Repetition(ref rep) => Hir::repetition(Repetition {
            min: rep.min,
            max: rep.max,
            greedy: rep.greedy,
            sub: Box::new(ascii_classes(&rep.sub)),
        }),
        HirKind::Capture(ref cap) => Hir::capture(Capture {
            index: cap.index,
            name: cap.name.clone(),
            sub: Box::new(ascii_classes(&cap.sub)),
        }),
        HirKind::Concat(ref subs) => {
            Hir::concat(subs.iter().map(ascii_classes).collect())
        }
        HirKind::Alternation(ref subs) => {
            Hir::alternation(subs.iter().map(ascii_classes).collect())
        }
        _ => hir.clone(),
    }
}

fn widen(cls: &ClassBytes) -> ClassUnicode {
    let mut ranges = vec![];
    for r in cls.iter() {
        if r.start() <= 0x7F {
            let end = r.end().min(0x7F);
            ranges.push(ClassUnicodeRange::new(
                char::from(r.start()),
                char::from(end),
            ));
        }
        if r.end() >= 0x80 {
            ranges.push(ClassUnicodeRange::new('\u{80}', char::MAX));
        }
    }
    ClassUnicode::new(ranges)
}

fn spans(caps: &Captures) -> GroupSpans {
    (0..caps.group_len())
        .map(|i| caps.get_group(i).map(|sp| (sp.start, sp.end)))
        .collect()
}

/// Translate a parse or translation diagnostic from `regex-syntax`.
fn syntax_error(pattern: &str, err: &regex_syntax::Error) -> CompileError {
    let (kind, offset, message) = match *err {
        regex_syntax::Error::Parse(ref err) => {
            let kind = match *err.kind() {
                ast::ErrorKind::UnsupportedBackreference
                | ast::ErrorKind::UnsupportedLookAround => {
                    CompileErrorKind::Unsupported
                }
                _ => CompileErrorKind::Syntax,
            };
            (kind, Some(err.span().start.offset), err.kind().to_string())
        }
        regex_syntax::Error::Translate(ref err) => {
            let kind = match *err.kind() {
                hir::ErrorKind::UnicodeNotAllowed
                | hir::ErrorKind::InvalidUtf8 => CompileErrorKind::Unsupported,
                _ => CompileErrorKind::Syntax,
            };
            (kind, Some(err.span().start.offset), err.kind().to_string())
        }
        _ => (CompileErrorKind::Syntax, None, err.to_string()),
    };
    debug!("pattern {:?} rejected ({:?}): {}", pattern, kind, message);
    CompileError::new(kind, pattern, offset, message)
}

/// Translate a failure to build an engine program from a parsed pattern.
fn build_error(pattern: &str, err: &meta::BuildError) -> CompileError {
    let kind = match err.size_limit() {
        Some(_) => CompileErrorKind::TooBig,
        None => CompileErrorKind::Syntax,
    };
    debug!("pattern {:?} failed to build ({:?}): {}", pattern, kind, err);
    CompileError::new(kind, pattern, None, err.to_string())
}
