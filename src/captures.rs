/*!
Match results and the capture groups inside them.

A [`Match`] is produced by every successful search. It keeps the byte spans
the engine reported and converts them to code point spans only when asked,
one group at a time. Each conversion is memoized in its [`CapturedGroup`].
*/

use std::{cell::OnceCell, sync::Arc};

use crate::{
    engine::GroupSpans,
    error::{Error, GroupError},
    offset::OffsetTranslator,
    pattern::Pattern,
    template::Template,
};

/// A reference to a capture group, either by index or by name.
///
/// This exists so that routines like [`Match::group`] accept both `usize`
/// and `&str`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupRef<'a> {
    /// A group index. Index 0 is the overall match.
    Index(usize),
    /// A group name.
    Name(&'a str),
}

impl<'a> From<usize> for GroupRef<'a> {
    fn from(index: usize) -> GroupRef<'a> {
        GroupRef::Index(index)
    }
}

impl<'a> From<&'a str> for GroupRef<'a> {
    fn from(name: &'a str) -> GroupRef<'a> {
        GroupRef::Name(name)
    }
}

impl<'a> From<&'a String> for GroupRef<'a> {
    fn from(name: &'a String) -> GroupRef<'a> {
        GroupRef::Name(name)
    }
}

/// One capture group of a match.
///
/// A group that did not participate in the match has no span and no text.
/// That is distinct from a group that matched the empty string, which has an
/// empty span and the text `""`.
#[derive(Clone, Debug)]
pub struct CapturedGroup<'h> {
    index: usize,
    name: Option<Arc<str>>,
    bytes: Option<(usize, usize)>,
    subject: &'h str,
    translator: Arc<OffsetTranslator<'h>>,
    chars: OnceCell<Option<(usize, usize)>>,
}

impl<'h> CapturedGroup<'h> {
    /// The index of this group. Index 0 is the overall match.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The name of this group, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this group participated in the match.
    pub fn matched(&self) -> bool {
        self.bytes.is_some()
    }

    /// The span of this group in bytes, as reported by the engine.
    pub fn byte_span(&self) -> Option<(usize, usize)> {
        self.bytes
    }

    /// The span of this group in code points.
    ///
    /// This is computed on first use and cached.
    ///
    /// # Panics
    ///
    /// When the engine reported a byte offset inside the encoding of a code
    /// point. That indicates a defect, not bad input.
    pub fn span(&self) -> Option<(usize, usize)> {
        *self.chars.get_or_init(|| {
            let bytes = self.bytes?;
            match self.translator.to_char_span(bytes) {
                Ok(span) => Some(span),
                Err(err) => panic!(
                    "group {} of a match is not aligned with the \
                     subject's code points: {}",
                    self.index, err,
                ),
            }
        })
    }

    /// The text of this group.
    pub fn as_str(&self) -> Option<&'h str> {
        let (start, end) = self.bytes?;
        Some(&self.subject[start..end])
    }
}

/// The result of one successful search.
///
/// The lifetime parameter `'h` refers to the subject that was searched. The
/// match also keeps the [`Pattern`] that produced it.
///
/// # Example
///
/// ```
/// use regex_host::{compile, Flags};
///
/// let re = compile(r"(?P<key>\w+)=(?P<value>\w*)", Flags::NONE)?;
/// let m = re.search("☃ color=blue", 0).unwrap();
/// assert_eq!(Ok(Some("color")), m.group("key"));
/// assert_eq!(Ok(Some((2, 7))), m.span(1));
/// assert_eq!(Ok(Some((4, 9))), m.byte_span("key"));
/// assert!(m.group(3).is_err());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Match<'h> {
    pattern: Pattern,
    subject: &'h str,
    pos: usize,
    groups: Vec<CapturedGroup<'h>>,
}

impl<'h> Match<'h> {
    /// Assemble a match from the spans of one engine run.
    ///
    /// Callers guarantee that every span lies within `translator`'s subject.
    pub(crate) fn new(
        pattern: &Pattern,
        translator: &Arc<OffsetTranslator<'h>>,
        pos: usize,
        spans: GroupSpans,
    ) -> Match<'h> {
        let subject = translator.subject();
        let names = pattern.group_names();
        let groups = spans
            .into_iter()
            .enumerate()
            .map(|(index, bytes)| {
                debug_assert!(bytes.map_or(true, |(s, e)| {
                    s <= e && e <= subject.len()
                }));
                CapturedGroup {
                    index,
                    name: names.get(index).cloned().flatten(),
                    bytes,
                    subject,
                    translator: Arc::clone(translator),
                    chars: OnceCell::new(),
                }
            })
            .collect();
        Match { pattern: pattern.clone(), subject, pos, groups }
    }

    /// The pattern that produced this match.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The subject that was searched.
    pub fn subject(&self) -> &'h str {
        self.subject
    }

    /// The code point offset at which the search began.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The number of groups in this match, including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns the group with the given index or name.
    pub fn get<'a, G: Into<GroupRef<'a>>>(
        &self,
        group: G,
    ) -> Result<&CapturedGroup<'h>, GroupError> {
        let index = match group.into() {
            GroupRef::Index(index) => index,
            GroupRef::Name(name) => self
                .pattern
                .group_index()
                .get(name)
                .copied()
                .ok_or_else(|| GroupError::name(name))?,
        };
        self.groups
            .get(index)
            .ok_or_else(|| GroupError::index(index, self.groups.len()))
    }

    /// Returns the text of the given group, or `None` if it did not
    /// participate in the match.
    pub fn group<'a, G: Into<GroupRef<'a>>>(
        &self,
        group: G,
    ) -> Result<Option<&'h str>, GroupError> {
        Ok(self.get(group)?.as_str())
    }

    /// Returns the code point span of the given group.
    pub fn span<'a, G: Into<GroupRef<'a>>>(
        &self,
        group: G,
    ) -> Result<Option<(usize, usize)>, GroupError> {
        Ok(self.get(group)?.span())
    }

    /// Returns the byte span of the given group.
    pub fn byte_span<'a, G: Into<GroupRef<'a>>>(
        &self,
        group: G,
    ) -> Result<Option<(usize, usize)>, GroupError> {
        Ok(self.get(group)?.byte_span())
    }

    /// Returns the code point offset at which the given group starts.
    pub fn start<'a, G: Into<GroupRef<'a>>>(
        &self,
        group: G,
    ) -> Result<Option<usize>, GroupError> {
        Ok(self.span(group)?.map(|(s, _)| s))
    }

    /// Returns the code point offset at which the given group ends.
    pub fn end<'a, G: Into<GroupRef<'a>>>(
        &self,
        group: G,
    ) -> Result<Option<usize>, GroupError> {
        Ok(self.span(group)?.map(|(_, e)| e))
    }

    /// The text of the overall match.
    pub fn as_str(&self) -> &'h str {
        self.groups[0].as_str().unwrap_or("")
    }

    /// The code point span of the overall match.
    pub fn whole_span(&self) -> (usize, usize) {
        self.groups[0].span().unwrap_or((0, 0))
    }

    /// The byte span of the overall match.
    pub(crate) fn whole_byte_span(&self) -> (usize, usize) {
        self.groups[0].byte_span().unwrap_or((0, 0))
    }

    /// Returns the text of every explicit group, in index order. Group 0 is
    /// not included.
    pub fn groups(&self) -> Vec<Option<&'h str>> {
        self.groups[1..].iter().map(|g| g.as_str()).collect()
    }

    /// Iterate over every group, including group 0.
    pub fn iter(&self) -> core::slice::Iter<'_, CapturedGroup<'h>> {
        self.groups.iter()
    }

    /// Returns the name and text of every named group, in index order.
    pub fn groupdict(&self) -> Vec<(&str, Option<&'h str>)> {
        self.groups
            .iter()
            .filter_map(|g| g.name().map(|name| (name, g.as_str())))
            .collect()
    }

    /// The index of the last group to close: of all participating explicit
    /// groups, the one ending furthest right. Among groups ending at the
    /// same offset, the one starting furthest right closed last, and an
    /// enclosing group wins over a group inside it with the same span.
    pub fn lastindex(&self) -> Option<usize> {
        let mut last: Option<(usize, (usize, usize))> = None;
        for g in &self.groups[1..] {
            let (start, end) = match g.byte_span() {
                None => continue,
                Some(span) => span,
            };
            let later = last.map_or(true, |(_, (best_start, best_end))| {
                end > best_end || (end == best_end && start > best_start)
            });
            if later {
                last = Some((g.index(), (start, end)));
            }
        }
        last.map(|(index, _)| index)
    }

    /// The name of the group reported by [`Match::lastindex`], if it has one.
    pub fn lastgroup(&self) -> Option<&str> {
        self.groups[self.lastindex()?].name()
    }

    /// Expand a replacement template against this match.
    ///
    /// See [`Pattern::sub`] for the template syntax.
    pub fn expand(&self, template: &str) -> Result<String, Error> {
        let template = Template::parse(template, &self.pattern)?;
        let mut dst = String::new();
        template.append(self, &mut dst);
        Ok(dst)
    }
}

#[cfg(test)]
mod tests {
    use crate::{compile, Flags};

    #[test]
    fn absent_versus_empty() {
        let re = compile(r"(a)|(b?)", Flags::NONE).unwrap();
        let m = re.search("c", 0).unwrap();
        assert_eq!(Ok(None), m.group(1));
        assert_eq!(Ok(Some("")), m.group(2));
        assert_eq!(Ok(None), m.span(1));
        assert_eq!(Ok(Some((0, 0))), m.span(2));
        assert!(!m.get(1).unwrap().matched());
        assert!(m.get(2).unwrap().matched());
    }

    #[test]
    fn invalid_references() {
        let re = compile(r"(?P<word>\w+)", Flags::NONE).unwrap();
        let m = re.search("hi", 0).unwrap();
        let err = m.group(2).unwrap_err();
        assert_eq!(Some(2), err.invalid_index());
        let err = m.span("nope").unwrap_err();
        assert_eq!(Some("nope"), err.invalid_name());
        assert_eq!(Ok(Some("hi")), m.group("word"));
    }

    #[test]
    fn lazy_span_is_memoized() {
        let re = compile(r"(β+)", Flags::NONE).unwrap();
        let m = re.search("aββ", 0).unwrap();
        let g = m.get(1).unwrap();
        assert_eq!(Some((1, 5)), g.byte_span());
        assert_eq!(Some((1, 3)), g.span());
        assert_eq!(Some((1, 3)), g.span());
        assert_eq!(Some("ββ"), g.as_str());
        assert_eq!(1, g.index());
    }

    #[test]
    fn lastindex_prefers_enclosing_group() {
        let re = compile(r"((a)b)", Flags::NONE).unwrap();
        assert_eq!(Some(1), re.search("ab", 0).unwrap().lastindex());
        let re = compile(r"((ab))", Flags::NONE).unwrap();
        assert_eq!(Some(1), re.search("ab", 0).unwrap().lastindex());
        let re = compile(r"(a)(?P<last>b)", Flags::NONE).unwrap();
        let m = re.search("ab", 0).unwrap();
        assert_eq!(Some(2), m.lastindex());
        assert_eq!(Some("last"), m.lastgroup());
        let re = compile(r"ab", Flags::NONE).unwrap();
        assert_eq!(None, re.search("ab", 0).unwrap().lastindex());
    }

    #[test]
    fn lastindex_ties_go_to_the_group_closed_last() {
        // Both groups end at 1, but the empty second group closes after the
        // first one.
        let re = compile(r"(a)(b?)", Flags::NONE).unwrap();
        assert_eq!(Some(2), re.search("a", 0).unwrap().lastindex());
        let re = compile(r"(a)(?P<tail>b?)(c)?", Flags::NONE).unwrap();
        let m = re.search("a", 0).unwrap();
        assert_eq!(Some(2), m.lastindex());
        assert_eq!(Some("tail"), m.lastgroup());
    }

    #[test]
    fn groupdict_and_groups() {
        let re = compile(r"(?P<a>x)(y)?(?P<b>z)?", Flags::NONE).unwrap();
        let m = re.search("x", 0).unwrap();
        assert_eq!(vec![Some("x"), None, None], m.groups());
        assert_eq!(vec![("a", Some("x")), ("b", None)], m.groupdict());
        assert_eq!(4, m.len());
        let indices: Vec<usize> = m.iter().map(|g| g.index()).collect();
        assert_eq!(vec![0, 1, 2, 3], indices);
    }

    #[test]
    fn groupdict_keeps_index_order() {
        let re = compile(r"(?P<z>a)(?P<m>b)?(?P<a>c)", Flags::NONE).unwrap();
        let m = re.search("ac", 0).unwrap();
        assert_eq!(
            vec![("z", Some("a")), ("m", None), ("a", Some("c"))],
            m.groupdict()
        );
    }
}
