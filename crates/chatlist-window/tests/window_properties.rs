use std::collections::HashSet;

use chatlist_window::{
    ChangeFeed, ChangeKind, ChangeSet, ConversationId, Direction, InMemoryStore, LocalId,
    MessageWindow, OrderingKey, SortOrder, StableId, WindowConfig, WindowItem,
};
use proptest::prelude::*;

const CONVERSATION: ConversationId = ConversationId::Thread(7);

fn item(id: i64, ordering: i64) -> WindowItem<u32> {
    WindowItem {
        stable_id: StableId(id),
        local_id: LocalId(id),
        conversation: CONVERSATION,
        ordering: OrderingKey(ordering),
        payload: 0,
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(Vec<(i64, i64)>),
    Update(i64, u32),
    Delete(Vec<i64>),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::collection::vec((0i64..40, 0i64..20), 1..5).prop_map(Op::Add),
        (0i64..40, any::<u32>()).prop_map(|(id, payload)| Op::Update(id, payload)),
        proptest::collection::vec(0i64..40, 1..4).prop_map(Op::Delete),
    ]
}

fn arb_order() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Ascending), Just(SortOrder::Descending)]
}

fn assert_sorted_and_unique(window: &MessageWindow<u32>) -> Result<(), TestCaseError> {
    let items = window.items();
    for pair in items.windows(2) {
        prop_assert!(window.order().compare(&pair[0], &pair[1]).is_lt());
    }
    let ids: HashSet<_> = items.iter().map(|i| i.stable_id).collect();
    prop_assert_eq!(ids.len(), items.len());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_window_stays_sorted_and_unique(
        order in arb_order(),
        ops in proptest::collection::vec(arb_op(), 1..30),
    ) {
        let mut window = MessageWindow::new(CONVERSATION, WindowConfig { order, ..WindowConfig::default() });
        // Keys are fixed per id so updates never move items.
        let key_of = |id: i64| id % 20;

        for op in ops {
            let before = window.len();
            match op {
                Op::Add(entries) => {
                    let items: Vec<_> = entries.iter().map(|(id, _)| item(*id, key_of(*id))).collect();
                    if let Some(ChangeSet::Added { positions, items: added }) =
                        window.apply_local(ChangeKind::Add(items))
                    {
                        prop_assert_eq!(window.len(), before + positions.len());
                        prop_assert!(positions.windows(2).all(|p| p[0] < p[1]));
                        for (position, added) in positions.iter().zip(&added) {
                            prop_assert_eq!(window.items()[*position].stable_id, added.stable_id);
                        }
                    } else {
                        prop_assert_eq!(window.len(), before);
                    }
                }
                Op::Update(id, payload) => {
                    let mut updated = item(id, key_of(id));
                    updated.payload = payload;
                    let present = window.contains(StableId(id));
                    let change = window.apply_local(ChangeKind::Update(updated));
                    prop_assert_eq!(change.is_some(), present);
                    prop_assert_eq!(window.len(), before);
                }
                Op::Delete(ids) => {
                    let local_ids: Vec<_> = ids.iter().map(|id| LocalId(*id)).collect();
                    if let Some(ChangeSet::Deleted { positions, .. }) =
                        window.apply_local(ChangeKind::Delete(local_ids))
                    {
                        prop_assert!(positions.windows(2).all(|p| p[0] > p[1]));
                        prop_assert_eq!(window.len(), before - positions.len());
                    }
                }
            }
            assert_sorted_and_unique(&window)?;
        }
    }

    #[test]
    fn prop_add_is_idempotent(
        order in arb_order(),
        entries in proptest::collection::vec((0i64..50, 0i64..100), 1..20),
    ) {
        let mut window = MessageWindow::new(CONVERSATION, WindowConfig { order, ..WindowConfig::default() });
        let items: Vec<_> = entries.iter().map(|(id, key)| item(*id, *key)).collect();

        window.apply_local(ChangeKind::Add(items.clone()));
        let snapshot: Vec<_> = window.items().to_vec();

        prop_assert_eq!(window.apply_local(ChangeKind::Add(items)), None);
        prop_assert_eq!(window.items(), snapshot.as_slice());
    }
}

#[tokio::test]
async fn paginate_then_live_add_at_cursor_does_not_duplicate() {
    let store = InMemoryStore::new();
    store.extend((1..=10).map(|i| item(i, i * 10))).unwrap();
    let mut window = MessageWindow::new(CONVERSATION, WindowConfig::default());
    window.load(&store, 5).await;

    let cursor = window.min_cursor().unwrap();
    window.paginate(&store, Direction::Older, cursor, 5).await;
    let min = window.min_cursor().unwrap();
    let at_min = window
        .items()
        .iter()
        .find(|i| i.ordering == min)
        .cloned()
        .unwrap();

    let change = window.apply_local(ChangeKind::Add(vec![at_min]));

    assert_eq!(change, None);
    assert_eq!(window.len(), 10);
}

#[tokio::test]
async fn feed_events_drive_the_window() {
    let store = InMemoryStore::new();
    let feed = ChangeFeed::new(32);
    let mut subscription = feed.subscribe(CONVERSATION);
    let mut window = MessageWindow::new(CONVERSATION, WindowConfig::default());

    feed.messages_added(CONVERSATION, vec![item(1, 10), item(2, 20)]);
    feed.message_updated(CONVERSATION, item(2, 20));
    feed.messages_deleted(CONVERSATION, vec![LocalId(1)]);

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let event = subscription.recv().await.unwrap();
        if let Some(change) = window.apply(&store, event).await {
            kinds.push(change.kind());
        }
    }

    assert_eq!(kinds, vec!["added", "updated", "deleted"]);
    assert_eq!(window.len(), 1);
    assert_eq!(window.items()[0].stable_id, StableId(2));
}
