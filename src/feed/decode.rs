use futures::stream::{self, Stream, StreamExt};

/// Incremental UTF-8 decoder for a body that arrives in arbitrary chunks.
///
/// A code point split across two chunks is held back until the rest of it
/// arrives. Invalid sequences become U+FFFD, matching what browsers' text
/// decoders do for feeds that lie about their encoding.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `chunk` (plus any held-back bytes) as possible.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest = self.pending.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // from_utf8 just confirmed this prefix
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let held = rest.len();
        let consumed = self.pending.len() - held;
        self.pending.drain(..consumed);
        out
    }

    /// Flushes bytes still held back once the input has ended.
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.pending).into_owned())
        }
    }
}

/// Turns a stream of byte chunks into a stream of text chunks.
///
/// Errors from the byte stream are passed through unchanged. Chunks that
/// decode to nothing (a lone partial code point) are not emitted.
pub fn decode_utf8<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    stream::unfold(
        Some((Box::pin(bytes), Utf8Decoder::new())),
        |state| async move {
            let (mut bytes, mut decoder) = state?;
            loop {
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        let text = decoder.decode(chunk.as_ref());
                        if !text.is_empty() {
                            return Some((Ok(text), Some((bytes, decoder))));
                        }
                    }
                    Some(Err(e)) => return Some((Err(e), None)),
                    None => return decoder.finish().map(|tail| (Ok(tail), None)),
                }
            }
        },
    )
}
