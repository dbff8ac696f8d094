use std::sync::Arc;

use crate::{
    captures::Match,
    engine::{Anchor, GroupSpans},
    offset::OffsetTranslator,
    pattern::Pattern,
};

/// A scanner for advancing through all non-overlapping matches in a subject,
/// left to right.
///
/// After each match, the next search begins where that match ended. If the
/// match was empty, the next search instead begins one code point later.
/// Without that rule, an empty match would be found again and again at the
/// same position and iteration would never end. It also means that an empty
/// match may directly follow a non-empty one: `a*` finds four matches in
/// `baaab`, at `0..0`, `1..4`, `4..4` and `5..5`.
///
/// Scanning ends after an empty match at the end of the subject, so a
/// subject of `n` code points yields at most `n + 1` matches.
#[derive(Clone, Debug)]
pub(crate) struct Scanner<'p, 'h> {
    pattern: &'p Pattern,
    translator: Arc<OffsetTranslator<'h>>,
    /// The byte offset of the next search, or `None` once scanning is done.
    at: Option<usize>,
}

impl<'p, 'h> Scanner<'p, 'h> {
    pub(crate) fn new(
        pattern: &'p Pattern,
        translator: Arc<OffsetTranslator<'h>>,
        at: usize,
    ) -> Scanner<'p, 'h> {
        Scanner { pattern, translator, at: Some(at) }
    }

    pub(crate) fn translator(&self) -> &Arc<OffsetTranslator<'h>> {
        &self.translator
    }

    /// Find the next match, returning the byte spans of all of its groups.
    pub(crate) fn advance(&mut self) -> Option<GroupSpans> {
        let at = self.at?;
        let subject = self.translator.subject();
        let spans = self.pattern.run(subject, at, Anchor::Unanchored);
        let (start, end) = match spans.as_ref().and_then(|s| s[0]) {
            None => {
                self.at = None;
                return None;
            }
            Some(span) => span,
        };
        self.at = if start == end {
            self.translator.next_boundary(end)
        } else {
            Some(end)
        };
        trace!("scan found {}..{}, next search at {:?}", start, end, self.at);
        spans
    }
}

/// An iterator over all non-overlapping matches in a subject.
///
/// This is created by [`Pattern::finditer`]. Matches are produced lazily,
/// one engine run per call to `next`. To scan again, call `finditer` again.
///
/// `'p` is the lifetime of the pattern and `'h` the lifetime of the subject.
#[derive(Clone, Debug)]
pub struct Matches<'p, 'h> {
    scanner: Scanner<'p, 'h>,
    pos: usize,
}

impl<'p, 'h> Matches<'p, 'h> {
    pub(crate) fn new(
        scanner: Scanner<'p, 'h>,
        pos: usize,
    ) -> Matches<'p, 'h> {
        Matches { scanner, pos }
    }
}

impl<'p, 'h> Iterator for Matches<'p, 'h> {
    type Item = Match<'h>;

    fn next(&mut self) -> Option<Match<'h>> {
        let spans = self.scanner.advance()?;
        Some(Match::new(
            self.scanner.pattern,
            self.scanner.translator(),
            self.pos,
            spans,
        ))
    }
}

impl<'p, 'h> core::iter::FusedIterator for Matches<'p, 'h> {}
