#![allow(dead_code, missing_docs)]

use rangebuf::{BufError, Buffer, ByteView, RangeSet};

/// Slot indices of one tokenized request head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub verb: usize,
    pub path: usize,
    pub protocol: usize,
    /// First and one-past-last header slot.
    pub headers: (usize, usize),
    /// Offset one past the blank line closing the head.
    pub end: usize,
}

/// Tokenize the request head starting at the buffer's read cursor.
///
/// Returns `Ok(None)` until the blank line has arrived; nothing is recorded
/// in that case. Each header line becomes one range (`Name: value`).
pub fn tokenize_head(buffer: &Buffer, ranges: &mut RangeSet) -> Result<Option<Head>, BufError> {
    let start = buffer.read_position();
    let Some(blank) = buffer.find_from(start, b"\r\n\r\n") else {
        return Ok(None);
    };
    let line_end = buffer
        .find_from(start, b"\r\n")
        .expect("blank line implies a line end");

    let sp1 = buffer.find_from(start, b" ").filter(|&at| at < line_end);
    let sp2 = sp1.and_then(|at| buffer.find_from(at + 1, b" ")).filter(|&at| at < line_end);
    let (sp1, sp2) = (sp1.unwrap_or(line_end), sp2.unwrap_or(line_end));

    let verb = ranges.append(start, sp1 - start)?;
    let path = ranges.append((sp1 + 1).min(sp2), sp2 - (sp1 + 1).min(sp2))?;
    let protocol = ranges.append((sp2 + 1).min(line_end), line_end - (sp2 + 1).min(line_end))?;

    let first_header = ranges.len();
    let mut at = line_end + 2;
    while at < blank + 2 {
        let eol = buffer.find_from(at, b"\r\n").expect("head ends with CRLF");
        ranges.append(at, eol - at)?;
        at = eol + 2;
    }

    Ok(Some(Head {
        verb,
        path,
        protocol,
        headers: (first_header, ranges.len()),
        end: blank + 4,
    }))
}

pub const PIPELINED: &[u8] = b"GET /a HTTP/1.1\r\nHost: example.org\r\nAccept: */*\r\n\r\n\
POST /submit HTTP/1.1\r\nHost: example.org\r\nContent-Type: text/plain\r\nX-Trace: 1\r\nX-Trace: 2\r\n\r\n";
