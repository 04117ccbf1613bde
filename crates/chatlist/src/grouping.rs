use std::fmt::Write as _;

use chatlist_layout::LayoutFlags;
use chatlist_window::OrderingKey;
use chrono::Local;

use crate::record::ChatItem;

/// Flags for `current` given its visual predecessor. A row starts a sender
/// group when the sender changes or more than `group_gap_secs` passed.
pub fn layout_flags(
    previous: Option<&ChatItem>,
    current: &ChatItem,
    is_last: bool,
    direct_chat: bool,
    group_gap_secs: i64,
) -> LayoutFlags {
    let first_in_group = previous.is_none_or(|previous| {
        previous.payload.sender_id != current.payload.sender_id
            || current.ordering.seconds_since(previous.ordering).saturating_abs() > group_gap_secs
    });
    LayoutFlags {
        first_in_group,
        first_in_window: previous.is_none(),
        last_in_window: is_last,
        direct_chat,
    }
}

/// Local wall-clock label for an ordering key. `None` for keys outside
/// chrono's range or formats chrono rejects.
pub fn time_label(key: OrderingKey, format: &str) -> Option<String> {
    let at = key.to_datetime()?.with_timezone(&Local);
    let mut label = String::new();
    write!(&mut label, "{}", at.format(format)).ok()?;
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MessageRecord;
    use chatlist_window::{ConversationId, LocalId, StableId, WindowItem};
    use rstest::rstest;

    fn item(id: i64, sender: i64, seconds: i64) -> ChatItem {
        WindowItem {
            stable_id: StableId(id),
            local_id: LocalId(id),
            conversation: ConversationId::Thread(1),
            ordering: OrderingKey(seconds * 1000),
            payload: MessageRecord::text(sender, "hi"),
        }
    }

    #[rstest]
    #[case::same_sender_close(1, 60, false)]
    #[case::same_sender_at_gap(1, 300, false)]
    #[case::same_sender_after_gap(1, 301, true)]
    #[case::other_sender(2, 10, true)]
    fn group_starts(#[case] sender: i64, #[case] gap: i64, #[case] expected: bool) {
        let previous = item(1, 1, 1000);
        let current = item(2, sender, 1000 + gap);
        let flags = layout_flags(Some(&previous), &current, false, false, 300);
        assert_eq!(flags.first_in_group, expected);
        assert!(!flags.first_in_window);
    }

    #[test]
    fn extreme_ordering_keys_start_a_group() {
        let mut previous = item(1, 1, 0);
        previous.ordering = OrderingKey(i64::MIN);
        let mut current = item(2, 1, 0);
        current.ordering = OrderingKey(i64::MAX);
        assert!(layout_flags(Some(&previous), &current, false, false, 300).first_in_group);
        assert!(layout_flags(Some(&current), &previous, false, false, 300).first_in_group);
    }

    #[test]
    fn first_row_starts_group_and_window() {
        let flags = layout_flags(None, &item(1, 1, 0), true, true, 300);
        assert!(flags.first_in_group);
        assert!(flags.first_in_window);
        assert!(flags.last_in_window);
        assert!(flags.direct_chat);
    }

    #[test]
    fn time_label_uses_format() {
        let label = time_label(OrderingKey(1_700_000_000_000), "%H:%M").unwrap();
        assert_eq!(label.len(), 5);
        assert_eq!(time_label(OrderingKey(i64::MAX), "%H:%M"), None);
    }

    #[test]
    fn invalid_format_yields_no_label() {
        assert_eq!(time_label(OrderingKey(0), "%Q"), None);
    }
}
