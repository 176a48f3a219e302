//! Framing must not depend on where the transport happens to split the stream.

use gnsstream_frame::{checksum, Framing, Message, SentenceFilter, DEFAULT_MAX_BUFFER};
use proptest::prelude::*;

/// Cut `wire` at the given (sorted, deduplicated) offsets.
fn split_at_offsets(wire: &[u8], mut cuts: Vec<usize>) -> Vec<&[u8]> {
    cuts.retain(|c| *c > 0 && *c < wire.len());
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        chunks.push(&wire[start..cut]);
        start = cut;
    }
    chunks.push(&wire[start..]);
    chunks
}

fn feed(framing: &Framing, chunks: &[&[u8]]) -> Vec<Message> {
    let mut decoder = framing.decoder(DEFAULT_MAX_BUFFER);
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend(decoder.decode(chunk).expect("well-formed stream must not overflow"));
    }
    out
}

fn record() -> impl Strategy<Value = String> {
    // Printable, non-blank, no delimiter; interior spaces allowed.
    "[A-Za-z0-9.,:{}\"-][A-Za-z0-9 .,:{}\"-]{0,38}[A-Za-z0-9.,:{}\"-]"
}

fn sentence_body() -> impl Strategy<Value = String> {
    ("(GN|GP|GL)(GGA|RMC|GSA)", "[A-Z0-9.,]{0,60}").prop_map(|(addr, fields)| {
        format!("{addr},{fields}")
    })
}

proptest! {
    #[test]
    fn lines_survive_arbitrary_chunking(
        records in prop::collection::vec(record(), 1..20),
        crlf in any::<bool>(),
        cuts in prop::collection::vec(0usize..2048, 0..32),
    ) {
        let terminator = if crlf { "\r\n" } else { "\n" };
        let wire: String = records.iter().map(|r| format!("{r}{terminator}")).collect();

        let out = feed(&Framing::Lines, &split_at_offsets(wire.as_bytes(), cuts));
        let got: Vec<&str> = out.iter().map(Message::as_str).collect();
        let expected: Vec<&str> = records.iter().map(|r| r.trim()).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn sentences_survive_arbitrary_chunking(
        bodies in prop::collection::vec(sentence_body(), 1..16),
        cuts in prop::collection::vec(0usize..2048, 0..32),
    ) {
        let wire: Vec<u8> = bodies
            .iter()
            .flat_map(|b| format!("${}*{:02X}\r\n", b, checksum(b.as_bytes())).into_bytes())
            .collect();

        let framing = Framing::sentences(SentenceFilter::Any);
        let out = feed(&framing, &split_at_offsets(&wire, cuts));
        prop_assert_eq!(out.len(), bodies.len());
        for (message, body) in out.iter().zip(&bodies) {
            let expected_prefix = format!("${body}*");
            prop_assert!(message.as_str().starts_with(&expected_prefix));
        }
    }
}

#[test]
fn split_inside_crlf() {
    let wire = b"12.3,4.5\r\n67.8,9.0\r\n";
    // Cut between '\r' and '\n'.
    let out = feed(&Framing::Lines, &split_at_offsets(wire, vec![9]));
    let got: Vec<&str> = out.iter().map(Message::as_str).collect();
    assert_eq!(got, vec!["12.3,4.5", "67.8,9.0"]);
}
