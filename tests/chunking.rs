//! Property-based tests for chunked input.
//!
//! However the input is split across reads, and whatever chunk size the
//! buffer uses, the parse must come out the same as parsing the whole input
//! at once.

use proptest::prelude::*;
use rustydtd::{parse_dtd, DtdParser, ParsedDtd, ParserConfig};
use std::io::{self, Read};

const FIXTURES: &[&str] = &[
    "<!ENTITY % p \"foo\"><!ENTITY % q \"%p;bar\"><!ELEMENT e (%q;)>",
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- comment -- >\n<!ENTITY % content \"(#PCDATA|em)*\">\n<!ELEMENT para %content;>\n<!ATTLIST para\n  id ID #IMPLIED\n  role (note|tip) \"note\">\n",
    "<!-- header -->\n<!ENTITY % content \"(#PCDATA|em)*\">\n<!ELEMENT para %content;>\n<!ATTLIST para\n  id ID #IMPLIED\n  role (note|tip) \"note\">\n",
    "<!ENTITY % draft 'INCLUDE'>\r\n<![%draft;[\r\n<!ELEMENT d ANY>\r\n]]>\r\n<![IGNORE[ <!ELEMENT x <![ nested ]]> ]]>",
    "<!ENTITY % caf\u{e9} \"na\u{ef}ve\">\n<!ELEMENT r\u{e9}sum\u{e9} (%caf\u{e9};)>",
    "<!ELEMENT a (%undef;)>\n<!ELEMENT b EMPTY> = <!ELEMENT c EMPTY>",
    "<!ENTITY % a \"&#37;b;\"><!ENTITY % b \"&#37;a;\">%a;<!NOTATION gif SYSTEM \"image/gif\">",
    "<!ENTITY % x \"]]>\"><!ATTLIST a b CDATA %x;>",
    "<!ENTITY % e \"abc",
    "<?pi data?><!ENTITY % n SYSTEM \"x\" NDATA note>%n;<!ELEMENT z EMPTY>",
    "<!ENTITY % long \"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\">  \n\n  %long;",
];

/// Hands out the input in reads of the given sizes, cycling through them
struct ChunkedReader<'a> {
    data: &'a [u8],
    sizes: Vec<usize>,
    next: usize,
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let size = self.sizes[self.next % self.sizes.len()];
        self.next += 1;
        let n = size.min(out.len()).min(self.data.len());
        out[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn summary(dtd: &ParsedDtd) -> (String, Vec<String>) {
    let diagnostics = dtd.diagnostics().iter().map(|e| e.to_string()).collect();
    (dtd.dump(), diagnostics)
}

fn parse_chunked(input: &str, sizes: Vec<usize>, config: ParserConfig) -> ParsedDtd {
    let reader = ChunkedReader {
        data: input.as_bytes(),
        sizes,
        next: 0,
    };
    DtdParser::new(reader).with_config(config).parse().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: read boundaries never change tokens, atoms or diagnostics.
    #[test]
    fn prop_chunking_invariance(
        input in prop::sample::select(FIXTURES),
        sizes in prop::collection::vec(1usize..17, 1..8),
        read_size in 1usize..32,
        initial_chunks in 1usize..4,
    ) {
        let whole = parse_dtd(input.as_bytes()).unwrap();
        let config = ParserConfig::default()
            .with_read_size(read_size)
            .with_initial_chunks(initial_chunks);
        let chunked = parse_chunked(input, sizes, config);
        prop_assert_eq!(summary(&chunked), summary(&whole));
    }

    /// Property: poisoning discarded storage is never observed.
    #[test]
    fn prop_poisoned_compaction(
        input in prop::sample::select(FIXTURES),
        sizes in prop::collection::vec(1usize..5, 1..4),
        read_size in 1usize..8,
    ) {
        let whole = parse_dtd(input.as_bytes()).unwrap();
        let config = ParserConfig::default()
            .with_read_size(read_size)
            .with_initial_chunks(1)
            .with_poison_discarded(true);
        let chunked = parse_chunked(input, sizes, config);
        prop_assert_eq!(summary(&chunked), summary(&whole));
    }

    /// Property: arbitrary text may produce diagnostics but never a panic,
    /// and still does not depend on read boundaries.
    #[test]
    fn prop_arbitrary_text(
        input in "[<>!%;&#'\"()|,?*+\\[\\] a-zA-Z0-9\n-]{0,80}",
        read_size in 1usize..8,
    ) {
        let whole = parse_dtd(input.as_bytes()).unwrap();
        let config = ParserConfig::default().with_read_size(read_size).with_initial_chunks(1);
        let chunked = parse_chunked(&input, vec![1, 2, 3], config);
        prop_assert_eq!(summary(&chunked), summary(&whole));
    }
}

#[test]
fn test_fixtures_parse() {
    for input in FIXTURES {
        let dtd = parse_dtd(input.as_bytes()).unwrap();
        assert!(!dtd.dump().is_empty());
    }
}
