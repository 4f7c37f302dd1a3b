//! Parses pipelined HTTP request heads that trickle in over several reads.
//!
//! The "socket" below delivers two requests in five irregular chunks, cutting
//! through the middle of tokens and across the boundary between the two
//! messages. A toy tokenizer records the request line and every header as
//! ranges over the connection's buffer; nothing is copied until a value is
//! actually printed. After each head the message is finished, which compacts
//! the buffer so the pipelined tail moves to offset 0.
//!
//! Run with
//!
//! ```bash
//! RUST_LOG=rangebuf=trace cargo run -p rangebuf --example request_head
//! ```

use rangebuf::{BufError, BufferOptions, ByteView, ParseContext, PrefixScanner};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), BufError> {
    tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let simulated_reads: [&[u8]; 5] = [
        b"GET /ind",
        b"ex.html HTTP/1.1\r\nHost: exa",
        b"mple.org\r\nAccept: text/html\r\n\r\nPOST /form HT",
        b"TP/1.1\r\nHost: example.org\r\nContent-Type: application/x-www-form-urlencoded\r\n",
        b"\r\n",
    ];

    let mut context = ParseContext::new(BufferOptions {
        initial_capacity: 32,
        max_capacity: Some(4096),
        range_capacity: 16,
    });

    for read in simulated_reads {
        context.feed(read)?;
        while let Some(end) = parse_head(&mut context)? {
            let compaction = context.finish_message(end)?;
            info!(
                discarded = compaction.discarded,
                carried = context.buffer().remaining(),
                "message finished"
            );
        }
    }
    Ok(())
}

/// Record and print one request head; `None` means more bytes are needed.
fn parse_head(context: &mut ParseContext) -> Result<Option<usize>, BufError> {
    let (buffer, ranges) = context.parts();
    let start = buffer.read_position();
    let Some(blank) = buffer.find_from(start, b"\r\n\r\n") else {
        return Ok(None);
    };

    let mut at = start;
    while at < blank + 2 {
        let Some(eol) = buffer.find_from(at, b"\r\n") else {
            break;
        };
        ranges.append(at, eol - at)?;
        at = eol + 2;
    }

    let request_line = ranges[0].str(buffer)?;
    info!(%request_line, "request");

    match PrefixScanner::new(b"host:", false).value_of(buffer, ranges) {
        Some(host) => {
            let host = host.str(buffer)?;
            info!(%host, "virtual host");
        }
        None => warn!("request without a Host header"),
    }
    if let Some(range) = PrefixScanner::new(b"content-type:", false).value_of(buffer, ranges) {
        let content_type = range.str(buffer)?;
        info!(%content_type, "request has a body type");
    }

    Ok(Some(blank + 4))
}
