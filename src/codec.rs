use bytes::{Buf, BytesMut};
use encoding_rs::{DecoderResult, Encoding};
use std::io;
use tokio_util::codec::Decoder;

/// Decodes a byte stream in `encoding` into UTF-8 text chunks.
///
/// A leading BOM is stripped. Invalid byte sequences fail the stream with
/// `InvalidData` instead of being replaced.
pub struct CharsetDecoder {
    decoder: encoding_rs::Decoder,
    encoding: &'static Encoding,
    finished: bool,
}

impl CharsetDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_with_bom_removal(),
            encoding,
            finished: false,
        }
    }

    fn drain(&mut self, src: &mut BytesMut, last: bool) -> io::Result<String> {
        let mut out = String::new();
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length_without_replacement(src.len())
                .unwrap_or_else(|| src.len() * 3 + 16);
            out.reserve(needed);

            let (result, read) =
                self.decoder
                    .decode_to_string_without_replacement(&src[..], &mut out, last);
            src.advance(read);

            match result {
                DecoderResult::InputEmpty => return Ok(out),
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(_, _) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid {} byte sequence", self.encoding.name()),
                    ))
                }
            }
        }
    }
}

impl Decoder for CharsetDecoder {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        // Partial multi-byte sequences are held inside the decoder, so the
        // whole buffer is always consumed.
        let text = self.drain(src, false)?;
        Ok((!text.is_empty()).then_some(text))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.finished {
            return Ok(None);
        }
        self.finished = true;
        let text = self.drain(buf, true)?;
        buf.clear();
        Ok((!text.is_empty()).then_some(text))
    }
}
