/// Sizing for one connection's [`crate::Buffer`] and [`crate::RangeSet`].
///
/// # Examples
///
/// ```rust
/// use rangebuf::{BufferOptions, ParseContext};
///
/// let context = ParseContext::new(BufferOptions {
///     max_capacity: Some(64 * 1024),
///     ..BufferOptions::default()
/// });
/// assert_eq!(context.ranges().capacity(), 64);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferOptions {
    /// Bytes allocated up front for the buffer's backing storage.
    ///
    /// Storage grows geometrically past this as chunks arrive.
    ///
    /// # Default
    ///
    /// `4096`
    pub initial_capacity: usize,

    /// Hard limit on the buffer's backing storage.
    ///
    /// An append that would need more is refused with
    /// [`crate::BufError::LimitExceeded`] and leaves the buffer untouched; a
    /// message that large has to be rejected by the caller.
    ///
    /// # Default
    ///
    /// `None` (unbounded)
    pub max_capacity: Option<usize>,

    /// Range slots available per message.
    ///
    /// A message with more tokens than this fails with
    /// [`crate::BufError::CapacityExceeded`].
    ///
    /// # Default
    ///
    /// `64`
    pub range_capacity: usize,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 4096,
            max_capacity: None,
            range_capacity: 64,
        }
    }
}
