use std::{collections::HashMap, sync::Arc};

use crate::{
    captures::Match,
    engine::{Anchor, GroupSpans, Program},
    error::Error,
    flags::Flags,
    guard::{ConcurrencyGuard, HostLock},
    iter::{Matches, Scanner},
    offset::OffsetTranslator,
    template::Template,
};

/// A compiled pattern.
///
/// A `Pattern` owns the engine program for one pattern text and flag set,
/// together with the metadata about its capture groups. It is immutable once
/// built, and cloning it is cheap since all clones share the same program.
/// It may be used from any number of threads at once.
///
/// Every matching operation takes a subject and reports positions as code
/// point offsets into it. Start positions are code point offsets too. A
/// start position past the end of the subject is treated as the end of the
/// subject.
///
/// # Example
///
/// ```
/// use regex_host::{compile, Flags};
///
/// let re = compile(r"(\d+)-(\d+)", Flags::NONE)?;
/// let (replaced, count) = re.sub("12-34 and 56-78", r"\2-\1", 0)?;
/// assert_eq!("34-12 and 78-56", replaced);
/// assert_eq!(2, count);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Pattern(Arc<PatternInner>);

#[derive(Debug)]
struct PatternInner {
    source: String,
    flags: Flags,
    program: Program,
    group_count: usize,
    group_index: HashMap<String, usize>,
    group_names: Vec<Option<Arc<str>>>,
    host_lock: Arc<dyn HostLock>,
}

/// One element of the result of [`Pattern::findall`].
///
/// Which variant is produced depends only on the number of explicit capture
/// groups in the pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Found<'h> {
    /// The text of the overall match, when the pattern has no groups.
    Match(&'h str),
    /// The text of the only group, when the pattern has exactly one.
    Group(Option<&'h str>),
    /// The text of every group in index order, when the pattern has more
    /// than one.
    Groups(Vec<Option<&'h str>>),
}

impl Pattern {
    pub(crate) fn new(
        source: &str,
        flags: Flags,
        program: Program,
        host_lock: Arc<dyn HostLock>,
    ) -> Pattern {
        let group_names = program
            .group_names()
            .into_iter()
            .map(|name| name.map(Arc::from))
            .collect();
        Pattern(Arc::new(PatternInner {
            source: source.to_string(),
            flags,
            group_count: program.group_count(),
            group_index: program.group_index(),
            group_names,
            program,
            host_lock,
        }))
    }

    /// The pattern text this was compiled from.
    pub fn pattern(&self) -> &str {
        &self.0.source
    }

    /// The flags this was compiled with.
    pub fn flags(&self) -> Flags {
        self.0.flags
    }

    /// The number of explicit capture groups. Group 0, the overall match,
    /// is not counted.
    pub fn group_count(&self) -> usize {
        self.0.group_count
    }

    /// The mapping from group name to group index.
    pub fn group_index(&self) -> &HashMap<String, usize> {
        &self.0.group_index
    }

    /// The name of every group in index order, starting with group 0 which
    /// never has a name.
    pub fn group_names(&self) -> &[Option<Arc<str>>] {
        &self.0.group_names
    }

    /// Match the pattern starting exactly at `start` and ending exactly at
    /// the end of `subject`.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_host::{compile, Flags};
    ///
    /// let re = compile(r"a|ab", Flags::NONE)?;
    /// assert_eq!((0, 2), re.fullmatch("ab", 0).unwrap().whole_span());
    /// assert!(re.fullmatch("abc", 0).is_none());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn fullmatch<'h>(
        &self,
        subject: &'h str,
        start: usize,
    ) -> Option<Match<'h>> {
        self.find_one(subject, start, Anchor::Full)
    }

    /// Match the pattern starting exactly at `start`. The match need not
    /// extend to the end of `subject`.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_host::{compile, Flags};
    ///
    /// let re = compile(r"\d+", Flags::NONE)?;
    /// assert_eq!(Some("42"), re.r#match("42abc", 0).map(|m| m.as_str()));
    /// assert!(re.r#match("abc42", 0).is_none());
    /// assert_eq!(Some("42"), re.r#match("abc42", 3).map(|m| m.as_str()));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn r#match<'h>(
        &self,
        subject: &'h str,
        start: usize,
    ) -> Option<Match<'h>> {
        self.find_one(subject, start, Anchor::Start)
    }

    /// Find the leftmost match beginning at or after `start`.
    pub fn search<'h>(
        &self,
        subject: &'h str,
        start: usize,
    ) -> Option<Match<'h>> {
        self.find_one(subject, start, Anchor::Unanchored)
    }

    /// Returns true if the pattern matches anywhere at or after `start`.
    ///
    /// This is cheaper than `search` since no group offsets are resolved.
    pub fn contains(&self, subject: &str, start: usize) -> bool {
        let at = self.start_byte(subject, start);
        let _guard = ConcurrencyGuard::new(&*self.0.host_lock);
        self.0.program.is_match(subject, at)
    }

    /// Iterate over every non-overlapping match at or after `start`, left
    /// to right.
    ///
    /// After an empty match, the next search begins one code point later,
    /// so iteration always terminates.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_host::{compile, Flags};
    ///
    /// let re = compile(r"a*", Flags::NONE)?;
    /// let spans: Vec<(usize, usize)> =
    ///     re.finditer("baaab", 0).map(|m| m.whole_span()).collect();
    /// assert_eq!(vec![(0, 0), (1, 4), (4, 4), (5, 5)], spans);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn finditer<'p, 'h>(
        &'p self,
        subject: &'h str,
        start: usize,
    ) -> Matches<'p, 'h> {
        let translator = Arc::new(OffsetTranslator::new(subject));
        let pos = start.min(translator.char_len());
        let at = translator.to_byte(pos);
        Matches::new(Scanner::new(self, translator, at), pos)
    }

    /// Collect every non-overlapping match at or after `start`.
    ///
    /// Without groups, each element is the matched text. With one group,
    /// it is the text of that group, and with more than one, the text of
    /// every group in index order.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_host::{compile, Flags, Found};
    ///
    /// let re = compile(r"(\d+)-(\d+)", Flags::NONE)?;
    /// assert_eq!(
    ///     vec![
    ///         Found::Groups(vec![Some("12"), Some("34")]),
    ///         Found::Groups(vec![Some("56"), Some("78")]),
    ///     ],
    ///     re.findall("12-34 and 56-78", 0),
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn findall<'h>(
        &self,
        subject: &'h str,
        start: usize,
    ) -> Vec<Found<'h>> {
        let groups = self.group_count();
        self.finditer(subject, start)
            .map(|m| match groups {
                0 => Found::Match(m.as_str()),
                1 => Found::Group(m.groups()[0]),
                _ => Found::Groups(m.groups()),
            })
            .collect()
    }

    /// Count the matches [`Pattern::finditer`] would produce.
    pub fn count(&self, subject: &str, start: usize) -> usize {
        let translator = Arc::new(OffsetTranslator::new(subject));
        let at = translator.to_byte(start);
        let mut scanner = Scanner::new(self, translator, at);
        let mut count = 0;
        while scanner.advance().is_some() {
            count += 1;
        }
        count
    }

    /// Replace matches in `subject` with the expansion of `template`.
    ///
    /// Matches are found exactly as [`Pattern::finditer`] finds them. If
    /// `max_count` is greater than zero, at most that many matches are
    /// replaced. Returns the new text and the number of replacements made.
    ///
    /// The template may refer to groups:
    ///
    /// * `\0` through `\99` refer to a group by index, taking two digits if
    /// present,
    /// * `\g<name>` and `\g<index>` refer to a group by name or by index,
    /// * `\\` is a literal backslash and `\n`, `\t`, `\r`, `\f`, `\v` and
    /// `\a` are the usual control characters.
    ///
    /// Any other escape of an ASCII letter is an error, while a backslash
    /// before anything else is kept as is. A group that did not participate
    /// in a match expands to nothing. A reference to a group the pattern
    /// lacks is an error, reported before anything is replaced.
    pub fn sub(
        &self,
        subject: &str,
        template: &str,
        max_count: usize,
    ) -> Result<(String, usize), Error> {
        let template = Template::parse(template, self)?;
        let result = match template.as_literal() {
            Some(text) => {
                self.replace(subject, max_count, |_, dst| dst.push_str(text))
            }
            None => self.replace(subject, max_count, |m, dst| {
                template.append(m, dst)
            }),
        };
        Ok(result)
    }

    /// Replace matches in `subject` with the text `replace` returns for
    /// each of them.
    ///
    /// This otherwise behaves like [`Pattern::sub`].
    ///
    /// # Example
    ///
    /// ```
    /// use regex_host::{compile, Flags};
    ///
    /// let re = compile(r"\w+", Flags::NONE)?;
    /// let (upper, n) =
    ///     re.sub_with("to be", 1, |m| m.as_str().to_uppercase());
    /// assert_eq!("TO be", upper);
    /// assert_eq!(1, n);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn sub_with<F>(
        &self,
        subject: &str,
        max_count: usize,
        mut replace: F,
    ) -> (String, usize)
    where
        F: FnMut(&Match<'_>) -> String,
    {
        self.replace(subject, max_count, |m, dst| dst.push_str(&replace(m)))
    }

    /// Split `subject` at every non-overlapping match.
    ///
    /// When the pattern has groups, the text of every group is inserted
    /// after each piece, with `None` for groups that did not participate.
    /// If `max_split` is greater than zero, at most that many splits are
    /// made and the remainder of the subject is the last element.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_host::{compile, Flags};
    ///
    /// let re = compile(r"(,)|;", Flags::NONE)?;
    /// assert_eq!(
    ///     vec![Some("a"), Some(","), Some("b"), None, Some("c")],
    ///     re.split("a,b;c", 0),
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn split<'h>(
        &self,
        subject: &'h str,
        max_split: usize,
    ) -> Vec<Option<&'h str>> {
        let mut pieces = vec![];
        let mut last = 0;
        for (n, m) in self.finditer(subject, 0).enumerate() {
            if max_split > 0 && n >= max_split {
                break;
            }
            let (start, end) = m.whole_byte_span();
            pieces.push(Some(&subject[last..start]));
            pieces.extend(m.groups());
            last = end;
        }
        pieces.push(Some(&subject[last..]));
        pieces
    }

    /// Run the engine with the host lock released.
    pub(crate) fn run(
        &self,
        subject: &str,
        at: usize,
        anchor: Anchor,
    ) -> Option<GroupSpans> {
        let _guard = ConcurrencyGuard::new(&*self.0.host_lock);
        self.0.program.run(subject, at, anchor)
    }

    fn find_one<'h>(
        &self,
        subject: &'h str,
        start: usize,
        anchor: Anchor,
    ) -> Option<Match<'h>> {
        let translator = Arc::new(OffsetTranslator::new(subject));
        let pos = start.min(translator.char_len());
        let spans = self.run(subject, translator.to_byte(pos), anchor)?;
        Some(Match::new(self, &translator, pos, spans))
    }

    fn start_byte(&self, subject: &str, start: usize) -> usize {
        OffsetTranslator::new(subject).to_byte(start)
    }

    /// The scanning loop shared by `sub` and `sub_with`.
    fn replace<F>(
        &self,
        subject: &str,
        max_count: usize,
        mut append: F,
    ) -> (String, usize)
    where
        F: FnMut(&Match<'_>, &mut String),
    {
        let mut dst = String::with_capacity(subject.len());
        let mut last = 0;
        let mut count = 0;
        for m in self.finditer(subject, 0) {
            if max_count > 0 && count >= max_count {
                break;
            }
            let (start, end) = m.whole_byte_span();
            dst.push_str(&subject[last..start]);
            append(&m, &mut dst);
            last = end;
            count += 1;
        }
        dst.push_str(&subject[last..]);
        (dst, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    fn re(pattern: &str) -> Pattern {
        compile(pattern, Flags::NONE).unwrap()
    }

    #[test]
    fn metadata() {
        let p = compile(r"(?P<a>x)(y)", Flags::IGNORECASE).unwrap();
        assert_eq!(r"(?P<a>x)(y)", p.pattern());
        assert_eq!(Flags::IGNORECASE, p.flags());
        assert_eq!(2, p.group_count());
        assert_eq!(Some(&1), p.group_index().get("a"));
        assert_eq!(3, p.group_names().len());
        assert_eq!(Some("a"), p.group_names()[1].as_deref());
    }

    #[test]
    fn start_positions_are_code_points() {
        let p = re(r"\w");
        let m = p.search("ββ☃x", 2).unwrap();
        assert_eq!((3, 4), m.whole_span());
        assert_eq!(Some((7, 8)), m.get(0).unwrap().byte_span());
        assert_eq!(2, m.pos());
        assert!(p.search("ββ☃x", 10).is_none());
        assert!(p.r#match("ββ☃x", 1).is_some());
        assert!(p.r#match("ββ☃x", 2).is_none());
    }

    #[test]
    fn fullmatch_from_start() {
        let p = re(r"\d+");
        assert!(p.fullmatch("ab123", 2).is_some());
        assert!(p.fullmatch("ab123x", 2).is_none());
        assert!(p.fullmatch("ab123", 0).is_none());
    }

    #[test]
    fn findall_shapes() {
        assert_eq!(
            vec![Found::Match("1"), Found::Match("22")],
            re(r"\d+").findall("1 22", 0)
        );
        assert_eq!(
            vec![Found::Group(Some("a")), Found::Group(None)],
            re(r"(a)?b").findall("abb", 0)
        );
    }

    #[test]
    fn contains_and_count() {
        let p = re("a*");
        assert!(p.contains("xyz", 0));
        assert_eq!(3, p.count("baaab", 1));
        assert_eq!(p.finditer("baaab", 0).count(), p.count("baaab", 0));
        assert!(!re("z").contains("xyw", 0));
        assert!(re("z").contains("xyz", 2));
        assert!(!re("x").contains("xyz", 1));
    }

    #[test]
    fn sub_limits_and_literals() {
        let p = re("a");
        assert_eq!(("bbba".to_string(), 3), p.sub("aaaa", "b", 3).unwrap());
        assert_eq!(("xyz".to_string(), 0), p.sub("xyz", "b", 0).unwrap());
        assert_eq!(("-x-".to_string(), 2), re("").sub("x", "-", 0).unwrap());
        assert!(p.sub("aaaa", r"\1", 0).is_err());
    }

    #[test]
    fn sub_with_sees_groups() {
        let p = re(r"(?P<n>\d+)");
        let (text, n) = p.sub_with("a1b22", 0, |m| {
            let digits = m.group("n").unwrap().unwrap();
            digits.len().to_string()
        });
        assert_eq!("a1b2", text);
        assert_eq!(2, n);
    }

    #[test]
    fn split_on_empty_matches() {
        let pieces = vec!["", "a", "", "b", "c", ""];
        assert_eq!(
            pieces.into_iter().map(Some).collect::<Vec<_>>(),
            re("x*").split("axbc", 0)
        );
        assert_eq!(vec![Some("a"), Some("b,c")], re(",").split("a,b,c", 1));
        assert_eq!(vec![Some("abc")], re(",").split("abc", 0));
    }
}
