use crate::proto::command::Command;
use bytes::BytesMut;
use std::{
    fmt::Write,
    io::{self},
};
use tokio_util::codec::{Decoder, Encoder};

const EOL: &str = "\r\n";

/// Longest line we buffer; the rest of a longer line is skipped.
pub const MAX_LINE_LEN: usize = 256;

/// Line codec for SCPI over RS-232: commands go out terminated by
/// CR LF, every response is one line terminated by LF (CR optional).
#[derive(Default)]
pub struct ScpiCodec {
    // Start of an overlong line, handed up once its terminator arrives.
    overlong: Option<String>,
}

impl ScpiCodec {
    fn take_line(src: &mut BytesMut, len: usize, skip: usize) -> String {
        let line = src.split_to(len);
        let _ = src.split_to(skip);
        // The device only speaks ASCII; anything else is line noise and
        // must fail the numeric parser instead of the stream.
        String::from_utf8_lossy(&line).trim().to_string()
    }
}

impl Decoder for ScpiCodec {
    type Item = String;
    // Empty or garbled lines are valid frames at this level. Deciding if
    // they are an error is up to a higher level.
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src.iter().position(|b| *b == b'\n') {
            Some(n) => match self.overlong.take() {
                // One overlong line is still one response.
                Some(start) => {
                    let _ = src.split_to(n + 1);
                    Ok(Some(start))
                }
                None => Ok(Some(Self::take_line(src, n, 1))),
            },
            None if self.overlong.is_some() => {
                src.clear();
                Ok(None)
            }
            None if src.len() > MAX_LINE_LEN => {
                log::warn!(
                    "Skipping response line longer than {} bytes",
                    MAX_LINE_LEN
                );
                let len = src.len();
                self.overlong = Some(Self::take_line(src, len, 0));
                Ok(None)
            }
            None => Ok(None), // Not enough bytes yet
        }
    }
}

impl Encoder<Command> for ScpiCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write!(dst, "{}{}", item, EOL).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
