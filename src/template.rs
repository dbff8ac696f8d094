/*!
Replacement templates for [`Pattern::sub`](crate::Pattern::sub) and
[`Match::expand`](crate::Match::expand).

A template is parsed once per call, against the pattern it will be expanded
with, so that references to groups the pattern lacks are reported before any
replacement is made.
*/

use crate::{
    captures::Match,
    error::{Error, GroupError, TemplateError},
    pattern::Pattern,
};

#[derive(Clone, Debug, Eq, PartialEq)]
enum Piece {
    Literal(String),
    Group(usize),
}

/// A parsed replacement template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    /// Parse `template`, resolving group references against `pattern`.
    pub(crate) fn parse(
        template: &str,
        pattern: &Pattern,
    ) -> Result<Template, Error> {
        let bytes = template.as_bytes();
        let mut pieces = vec![];
        let mut literal = String::new();
        let mut at = 0;
        while let Some(i) = memchr::memchr(b'\\', &bytes[at..]) {
            let slash = at + i;
            literal.push_str(&template[at..slash]);
            let next = match bytes.get(slash + 1) {
                None => {
                    return Err(TemplateError::new(
                        template,
                        slash,
                        "trailing backslash",
                    )
                    .into())
                }
                Some(&b) => b,
            };
            at = slash + 2;
            let index = match next {
                b'\\' => {
                    literal.push('\\');
                    continue;
                }
                b'n' | b't' | b'r' | b'f' | b'v' | b'a' => {
                    literal.push(control(next));
                    continue;
                }
                b'0'..=b'9' => {
                    let mut index = usize::from(next - b'0');
                    if let Some(&d @ b'0'..=b'9') = bytes.get(at) {
                        index = index * 10 + usize::from(d - b'0');
                        at += 1;
                    }
                    check_index(index, pattern)?
                }
                b'g' => {
                    let (group, end) = bracketed(template, slash, at)?;
                    at = end;
                    resolve(group, pattern)?
                }
                b if b.is_ascii_alphabetic() => {
                    return Err(TemplateError::new(
                        template,
                        slash,
                        "unknown escape",
                    )
                    .into());
                }
                _ => {
                    // Keep unknown non-letter escapes verbatim. Step back so
                    // that a multi-byte code point is copied whole.
                    literal.push('\\');
                    at = slash + 1;
                    continue;
                }
            };
            if !literal.is_empty() {
                pieces.push(Piece::Literal(core::mem::take(&mut literal)));
            }
            pieces.push(Piece::Group(index));
        }
        literal.push_str(&template[at..]);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Template { pieces })
    }

    /// If this template has no group references, return its text.
    pub(crate) fn as_literal(&self) -> Option<&str> {
        match self.pieces.as_slice() {
            [] => Some(""),
            [Piece::Literal(s)] => Some(s.as_str()),
            _ => None,
        }
    }

    /// Append the expansion of this template for `m` to `dst`. Groups that
    /// did not participate in `m` expand to nothing.
    pub(crate) fn append(&self, m: &Match<'_>, dst: &mut String) {
        for piece in &self.pieces {
            match *piece {
                Piece::Literal(ref s) => dst.push_str(s),
                Piece::Group(index) => {
                    if let Ok(Some(text)) = m.group(index) {
                        dst.push_str(text);
                    }
                }
            }
        }
    }
}

fn control(b: u8) -> char {
    match b {
        b'n' => '\n',
        b't' => '\t',
        b'r' => '\r',
        b'f' => '\x0C',
        b'v' => '\x0B',
        _ => '\x07',
    }
}

/// Parse the `<...>` following `\g` at `at`, returning its contents and the
/// offset just past the closing `>`.
fn bracketed<'t>(
    template: &'t str,
    slash: usize,
    at: usize,
) -> Result<(&'t str, usize), TemplateError> {
    let rest = &template[at..];
    if !rest.starts_with('<') {
        return Err(TemplateError::new(template, slash, "missing '<'"));
    }
    let close = match memchr::memchr(b'>', rest.as_bytes()) {
        None => {
            return Err(TemplateError::new(template, slash, "missing '>'"))
        }
        Some(close) => close,
    };
    let group = &rest[1..close];
    if group.is_empty() {
        return Err(TemplateError::new(template, slash, "empty group name"));
    }
    Ok((group, at + close + 1))
}

fn resolve(group: &str, pattern: &Pattern) -> Result<usize, GroupError> {
    if group.bytes().all(|b| b.is_ascii_digit()) {
        let index = group
            .parse::<usize>()
            .map_err(|_| GroupError::name(group))?;
        return check_index(index, pattern);
    }
    pattern
        .group_index()
        .get(group)
        .copied()
        .ok_or_else(|| GroupError::name(group))
}

fn check_index(index: usize, pattern: &Pattern) -> Result<usize, GroupError> {
    let len = pattern.group_count() + 1;
    if index >= len {
        return Err(GroupError::index(index, len));
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, Flags};

    fn pattern() -> Pattern {
        compile(r"(?P<first>\w+) (\w+)", Flags::NONE).unwrap()
    }

    fn expand(template: &str) -> Result<String, Error> {
        let re = pattern();
        let m = re.search("hello world", 0).unwrap();
        m.expand(template)
    }

    #[test]
    fn references() {
        assert_eq!("world hello", expand(r"\2 \1").unwrap());
        assert_eq!("world-hello", expand(r"\g<2>-\g<first>").unwrap());
        assert_eq!("hello world", expand(r"\0").unwrap());
        assert_eq!("<hello>", expand(r"<\g<first>>").unwrap());
    }

    #[test]
    fn escapes() {
        assert_eq!("a\\b", expand(r"a\\b").unwrap());
        assert_eq!("1\n2\t3", expand(r"1\n2\t3").unwrap());
        assert_eq!(r"\& \☃", expand(r"\& \☃").unwrap());
    }

    #[test]
    fn errors() {
        let err = expand(r"abc\").unwrap_err();
        match err {
            Error::Template(ref err) => assert_eq!(3, err.offset()),
            _ => panic!("unexpected error: {:?}", err),
        }
        assert!(matches!(expand(r"\q"), Err(Error::Template(_))));
        assert!(matches!(expand(r"\g<first"), Err(Error::Template(_))));
        assert!(matches!(expand(r"\gfirst"), Err(Error::Template(_))));
        assert!(matches!(expand(r"\g<>"), Err(Error::Template(_))));
        assert!(matches!(expand(r"\3"), Err(Error::Group(_))));
        assert!(matches!(expand(r"\g<nope>"), Err(Error::Group(_))));
        assert!(matches!(expand(r"\g<12>"), Err(Error::Group(_))));
    }

    #[test]
    fn two_digit_references_are_greedy() {
        let re = compile(r"(a)", Flags::NONE).unwrap();
        let m = re.search("a", 0).unwrap();
        // '\10' refers to group 10, not group 1 followed by '0'.
        assert!(matches!(m.expand(r"\10"), Err(Error::Group(_))));
        assert_eq!("a0", m.expand(r"\g<1>0").unwrap());
    }

    #[test]
    fn literal_templates() {
        let re = pattern();
        let t = Template::parse(r"plain\ntext", &re).unwrap();
        assert_eq!(Some("plain\ntext"), t.as_literal());
        let t = Template::parse("", &re).unwrap();
        assert_eq!(Some(""), t.as_literal());
        let t = Template::parse(r"x\1", &re).unwrap();
        assert_eq!(None, t.as_literal());
    }
}
