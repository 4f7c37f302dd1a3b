//! One connection's parse state: a [`Buffer`] and the [`RangeSet`] indexing
//! it.
//!
//! The context owns both halves so the message-boundary contract is applied
//! in one place: when a message is done, its bytes are consumed, its ranges
//! are reset, and the buffer is compacted with the set renormalized, in that
//! order and exactly once. A parser working on the next message can never
//! observe a range from the previous one.
use crate::{
    buffer::{Buffer, Compaction},
    error::BufError,
    options::BufferOptions,
    range_set::RangeSet,
};

/// Parse state for a single connection.
#[derive(Debug, Clone)]
pub struct ParseContext {
    buffer: Buffer,
    ranges: RangeSet,
    messages: u64,
}

impl ParseContext {
    /// Allocate a buffer and range pool sized by `options`.
    #[must_use]
    pub fn new(options: BufferOptions) -> Self {
        Self {
            buffer: Buffer::with_options(options),
            ranges: RangeSet::with_capacity(options.range_capacity),
            messages: 0,
        }
    }

    /// Hand newly received bytes to the buffer.
    ///
    /// # Errors
    ///
    /// [`BufError::LimitExceeded`] if the buffer may not grow that far.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), BufError> {
        self.buffer.append(chunk)
    }

    /// The connection's bytes.
    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Ranges recorded for the current message.
    #[must_use]
    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    /// Mutable access to the current message's ranges.
    pub fn ranges_mut(&mut self) -> &mut RangeSet {
        &mut self.ranges
    }

    /// Split borrow for a parser that reads the buffer while recording ranges.
    pub fn parts(&mut self) -> (&Buffer, &mut RangeSet) {
        (&self.buffer, &mut self.ranges)
    }

    /// Close the current message, which ended at byte `end`.
    ///
    /// # Errors
    ///
    /// [`crate::OutOfRange::Bounds`] if `end` is past the buffered bytes. The
    /// context is left untouched in that case.
    pub fn finish_message(&mut self, end: usize) -> Result<Compaction, BufError> {
        self.buffer.consume_up_to(end)?;
        self.ranges.reset();
        let compaction = self.buffer.compact_with(&mut self.ranges);
        self.messages += 1;
        tracing::trace!(
            messages = self.messages,
            carried = self.buffer.remaining(),
            "finished message"
        );
        Ok(compaction)
    }

    /// Messages finished since the context was created or last closed.
    #[must_use]
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Return to the empty state when the connection goes away, keeping the
    /// allocations for the next one.
    pub fn close(&mut self) {
        self.buffer.clear();
        self.ranges.rebind(&self.buffer);
        self.messages = 0;
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new(BufferOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ByteView;

    #[test]
    fn finish_message_carries_the_pipelined_tail() {
        let mut context = ParseContext::default();
        context.feed(b"ping\npo").unwrap();
        {
            let (buffer, ranges) = context.parts();
            let end = buffer.find_from(0, b"\n").unwrap();
            ranges.append(0, end).unwrap();
            assert_eq!(ranges[0].str(buffer).unwrap(), "ping");
        }

        let compaction = context.finish_message(5).unwrap();
        assert_eq!(compaction.discarded, 5);
        assert!(context.ranges().is_empty());
        assert_eq!(context.buffer().as_slice(), b"po");
        assert_eq!(context.messages(), 1);

        context.feed(b"ng\n").unwrap();
        let (buffer, ranges) = context.parts();
        ranges.append(0, 4).unwrap();
        assert_eq!(ranges[0].str(buffer).unwrap(), "pong");
    }

    #[test]
    fn finish_message_past_the_data_changes_nothing() {
        let mut context = ParseContext::default();
        context.feed(b"abc").unwrap();
        context.ranges_mut().append(0, 3).unwrap();
        assert!(context.finish_message(4).is_err());
        assert_eq!(context.ranges().len(), 1);
        assert_eq!(context.messages(), 0);
    }

    #[test]
    fn close_returns_to_empty_and_stays_usable() {
        let mut context = ParseContext::default();
        context.feed(b"abc").unwrap();
        context.ranges_mut().append(0, 3).unwrap();
        let stale = context.ranges()[0];
        context.close();

        assert!(context.buffer().is_empty());
        assert!(context.ranges().is_empty());
        context.feed(b"xyz").unwrap();
        assert!(stale.str(context.buffer()).is_err());

        context.ranges_mut().append(0, 3).unwrap();
        assert_eq!(context.ranges()[0].str(context.buffer()).unwrap(), "xyz");
    }

    #[test]
    fn range_recorded_on_drained_buffer_does_not_survive_close() {
        let mut context = ParseContext::default();
        context.feed(b"abc").unwrap();
        let _ = context.finish_message(3).unwrap();
        assert!(context.buffer().is_empty());

        context.ranges_mut().append(0, 3).unwrap();
        let early = context.ranges()[0];
        context.close();
        context.feed(b"xyz").unwrap();
        assert!(matches!(
            early.str(context.buffer()),
            Err(BufError::OutOfRange(crate::OutOfRange::Stale { .. }))
        ));
    }
}
