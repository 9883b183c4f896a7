//! Proptest generators for property-based testing.

use proptest::prelude::*;

use booklink_core::ChannelId;

/// Generate a friendly name, sometimes blank.
pub fn friendly_name() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[ A-Za-z0-9]{0,12}")
}

/// Generate one of `count` channel ids.
pub fn channel_id(count: usize) -> impl Strategy<Value = ChannelId> {
    (0..count).prop_map(|i| ChannelId::new(format!("channel-{i}")))
}

/// One step against a file register.
#[derive(Debug, Clone)]
pub enum FileOp {
    Add { channel: ChannelId, size: u64 },
    /// Remove the n-th file added so far (modulo the count).
    Remove { nth: usize },
    Advance { millis: i64 },
    Sweep,
}

/// Generate a file register operation over a few channels.
pub fn file_op(max_size: u64) -> impl Strategy<Value = FileOp> {
    prop_oneof![
        4 => (channel_id(4), 0..=max_size).prop_map(|(channel, size)| FileOp::Add { channel, size }),
        1 => any::<usize>().prop_map(|nth| FileOp::Remove { nth }),
        2 => (0i64..5_000).prop_map(|millis| FileOp::Advance { millis }),
        1 => Just(FileOp::Sweep),
    ]
}

/// Generate a sequence of file register operations.
pub fn file_ops(max_size: u64, max_len: usize) -> impl Strategy<Value = Vec<FileOp>> {
    prop::collection::vec(file_op(max_size), 1..=max_len)
}
