use quickcheck_macros::quickcheck;
use rstest::rstest;

use super::*;

fn scan_whole(input: &[u8]) -> Vec<ObjectSpan> {
    let mut scanner = ObjectScanner::new();
    scanner.feed(input).collect()
}

fn scan_chunked(input: &[u8], chunk: usize) -> Vec<ObjectSpan> {
    assert!(chunk > 0);
    let mut scanner = ObjectScanner::new();
    let mut spans = Vec::new();
    for piece in input.chunks(chunk) {
        spans.extend(scanner.feed(piece));
    }
    spans
}

#[test]
fn single_object() {
    let spans = scan_whole(br#"[{"key":"A","v":1}]"#);
    assert_eq!(spans, vec![1..18]);
}

#[test]
fn two_objects_in_file_order() {
    let input = br#"[{"key":"A","v":1},{"key":"B","v":2}]"#;
    let spans = scan_whole(input);
    assert_eq!(spans, vec![1..18, 19..36]);
    assert_eq!(&input[1..18], br#"{"key":"A","v":1}"#);
    assert_eq!(&input[19..36], br#"{"key":"B","v":2}"#);
}

#[test]
fn nested_objects_are_not_reported_separately() {
    let input = br#"[{"key":"A","inner":{"deep":{}}}]"#;
    let spans = scan_whole(input);
    assert_eq!(spans, vec![1..32]);
}

#[test]
fn braces_inside_strings_are_literal() {
    let input = br#"[{"key":"{not}a{brace}"}]"#;
    let spans = scan_whole(input);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].start, 1);
}

#[test]
fn offset_tracks_total_bytes() {
    let mut scanner = ObjectScanner::new();
    let _ = scanner.feed(b"[{}").count();
    let _ = scanner.feed(b",{}]").count();
    assert_eq!(scanner.offset(), 7);
}

#[test]
fn object_straddling_chunk_boundary() {
    let input = br#"[{"key":"A","v":1},{"key":"B","v":2}]"#;
    for chunk in 1..=input.len() {
        assert_eq!(
            scan_chunked(input, chunk),
            scan_whole(input),
            "chunk size {chunk}"
        );
    }
}

#[test]
fn stray_closer_does_not_sink_depth() {
    // A stray `}` before the first object must not swallow it.
    let spans = scan_whole(br#"} {"key":"A"}"#);
    assert_eq!(spans, vec![2..13]);
}

#[test]
fn trailing_sentinel_is_a_span_too() {
    // The scanner reports every top-level object; filtering the sentinel by
    // key field is the index builder's job.
    let spans = scan_whole(br#"[{"key":"A"},{"done":true}]"#);
    assert_eq!(spans.len(), 2);
}

// Escaped-quote classification. The even-backslash run is the case a
// look-behind-one-byte heuristic gets wrong: in `"a\\" }`, the backslash is
// itself escaped, so the quote really closes the string and the `}` is
// structural.
#[rstest]
#[case::escaped_quote_stays_in_string(br#"[{"a":"\"}"}]"#.as_slice(), 1)]
#[case::even_run_closes_string(br#"[{"a":"\\"}]"#.as_slice(), 1)]
#[case::odd_run_stays_in_string(br#"[{"a":"\\\"}"}]"#.as_slice(), 1)]
#[case::four_backslashes_close(br#"[{"a":"\\\\"}]"#.as_slice(), 1)]
fn escaped_quotes(#[case] input: &[u8], #[case] expected: usize) {
    let spans = scan_whole(input);
    assert_eq!(spans.len(), expected, "input {:?}", input);
    // Every span must cover the whole object, ending at the final `}`.
    let end = spans[0].end as usize;
    assert_eq!(input[end - 1], b'}');
}

#[test]
fn backslash_runs_exhaustive() {
    // "x" followed by n backslashes and a quote: the quote closes the string
    // iff n is even. When it stays open, the object's `}` is literal text and
    // no span may be reported.
    for n in 0..8 {
        let mut obj = Vec::new();
        obj.extend_from_slice(b"{\"a\":\"x");
        obj.extend(std::iter::repeat_n(b'\\', n));
        obj.extend_from_slice(b"\"");
        if n % 2 == 0 {
            // String closed; terminate the object normally.
            obj.extend_from_slice(b"}");
            let spans = scan_whole(&obj);
            assert_eq!(spans.len(), 1, "{n} backslashes");
            assert_eq!(spans[0], 0..obj.len() as u64);
        } else {
            // Quote was escaped: still inside the string, so a `}` here is
            // literal. Close the string first, then the object.
            obj.extend_from_slice(b"}");
            assert_eq!(scan_whole(&obj).len(), 0, "{n} backslashes");
            obj.extend_from_slice(b"\"}");
            let spans = scan_whole(&obj);
            assert_eq!(spans.len(), 1, "{n} backslashes, closed");
        }
    }
}

#[quickcheck]
fn spans_invariant_under_chunking(data: Vec<u8>, cuts: Vec<u8>) -> bool {
    // Split `data` at arbitrary positions and compare against one-shot
    // scanning. Holds for arbitrary bytes, not just well-formed JSON.
    let whole = scan_whole(&data);
    let mut scanner = ObjectScanner::new();
    let mut spans = Vec::new();
    let mut rest = data.as_slice();
    for cut in cuts {
        let at = (cut as usize).min(rest.len());
        let (piece, tail) = rest.split_at(at);
        spans.extend(scanner.feed(piece));
        rest = tail;
    }
    spans.extend(scanner.feed(rest));
    spans == whole
}

#[quickcheck]
fn spans_are_ordered_and_disjoint(data: Vec<u8>) -> bool {
    let spans = scan_whole(&data);
    spans.windows(2).all(|w| w[0].end <= w[1].start)
}
