use quickcheck::quickcheck;

use regex_host::{compile, Flags, OffsetTranslator};

use crate::small_alphabet;

#[test]
fn long_mixed_subject() {
    // Long enough to cross several checkpoints.
    let subject: String = "aβ☃𝄞".repeat(100);
    let tr = OffsetTranslator::new(&subject);
    assert_eq!(400, tr.char_len());
    assert!(!tr.is_ascii());
    for (i, (byte, _)) in subject.char_indices().enumerate() {
        assert_eq!(Ok(i), tr.to_char(byte));
        assert_eq!(byte, tr.to_byte(i));
    }
    assert_eq!(Ok(400), tr.to_char(subject.len()));
    assert_eq!(subject.len(), tr.to_byte(400));
    assert!(tr.to_char(subject.len() + 1).is_err());
}

#[test]
fn match_spans_are_code_points() {
    let re = compile("𝄞+", Flags::NONE).unwrap();
    let m = re.search("aβ𝄞𝄞c", 0).unwrap();
    assert_eq!((2, 4), m.whole_span());
    assert_eq!(Some((3, 11)), m.byte_span(0).unwrap());
    assert_eq!("𝄞𝄞", m.as_str());
}

quickcheck! {
    fn char_offsets_round_trip(text: String) -> bool {
        let tr = OffsetTranslator::new(&text);
        (0..=tr.char_len()).all(|i| tr.to_char(tr.to_byte(i)) == Ok(i))
    }

    fn spans_agree_with_text(text: String) -> bool {
        let subject = small_alphabet(&text);
        let re = compile(r"[^-]+", Flags::NONE).unwrap();
        let chars: Vec<char> = subject.chars().collect();
        re.finditer(&subject, 0).all(|m| {
            let (start, end) = m.whole_span();
            chars[start..end].iter().collect::<String>() == m.as_str()
        })
    }
}
