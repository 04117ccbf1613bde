use std::sync::Arc;

use chatlist::layout::{LayoutEngine, MessageContent};
use chatlist::window::{ChangeSet, ConversationId, LocalId, OrderingKey, SortOrder, StableId, WindowItem};
use chatlist::{ChatItem, MessageRecord, MessageViewport, ViewportConfig};
use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tokio::sync::mpsc;

const VIEWPORT_WIDTH: f64 = 420.0;
const VIEWPORT_HEIGHT: f64 = 800.0;
const SCROLL_STEPS: usize = 200;
const SCROLL_DELTA: f64 = 37.0;

const CHAT_SIZES: [usize; 3] = [1_000, 5_000, 20_000];
const CONVERSATION: ConversationId = ConversationId::Thread(1);

fn body(i: usize) -> String {
    if i % 3 == 0 {
        format!("Message {i}: lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor.")
    } else {
        format!("Message {i}")
    }
}

fn build_items(count: usize) -> Vec<ChatItem> {
    (0..count)
        .map(|i| WindowItem {
            stable_id: StableId(i as i64),
            local_id: LocalId(i as i64),
            conversation: CONVERSATION,
            ordering: OrderingKey(i as i64 * 30_000),
            payload: MessageRecord::text((i % 2) as i64, body(i)),
        })
        .collect()
}

fn loaded_viewport(items: &[ChatItem]) -> MessageViewport {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut viewport = MessageViewport::new(
        Arc::new(LayoutEngine::default()),
        ViewportConfig {
            animate_changes: false,
            ..ViewportConfig::default()
        },
        CONVERSATION,
        SortOrder::Ascending,
        tx,
    );
    viewport.set_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
    viewport.apply_change_set(&ChangeSet::Reload, items);
    viewport.layout();
    viewport
}

fn bench_compute_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_layout");

    let contents: Vec<MessageContent> = (0..200)
        .map(|i| MessageContent::text(i as i64, body(i)))
        .collect();

    group.bench_function("cold", |b| {
        b.iter_batched(
            LayoutEngine::default,
            |engine| {
                for content in &contents {
                    black_box(engine.compute_layout(content, 300.0));
                }
            },
            BatchSize::SmallInput,
        );
    });

    let engine = LayoutEngine::default();
    for content in &contents {
        engine.compute_layout(content, 300.0);
    }
    group.bench_function("warm", |b| {
        b.iter(|| {
            for content in &contents {
                black_box(engine.compute_layout(content, 300.0));
            }
        });
    });

    group.finish();
}

fn bench_viewport_reload(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport_reload");
    group.sample_size(10);

    for size in CHAT_SIZES {
        let items = build_items(size);
        group.bench_function(BenchmarkId::new("reload", format!("{size}_messages")), |b| {
            b.iter(|| black_box(loaded_viewport(&items).content_height()));
        });
    }

    group.finish();
}

fn bench_viewport_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport_scroll");
    group.sample_size(10);

    for size in CHAT_SIZES {
        let items = build_items(size);
        group.bench_function(BenchmarkId::new("scroll", format!("{size}_messages")), |b| {
            b.iter_batched(
                || loaded_viewport(&items),
                |mut viewport| {
                    viewport.notify_user_scroll_begin();
                    for _ in 0..SCROLL_STEPS {
                        viewport.scroll_by(black_box(-SCROLL_DELTA));
                        black_box(viewport.layout());
                    }
                    viewport.notify_user_scroll_end();
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_viewport_width_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport_width_change");
    group.sample_size(10);

    let items = build_items(5_000);
    group.bench_function("narrow_then_widen", |b| {
        b.iter_batched(
            || loaded_viewport(&items),
            |mut viewport| {
                viewport.notify_width_changed(black_box(VIEWPORT_WIDTH - 120.0));
                viewport.notify_width_changed(black_box(VIEWPORT_WIDTH));
                black_box(viewport.content_height());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_layout,
    bench_viewport_reload,
    bench_viewport_scroll,
    bench_viewport_width_change
);
criterion_main!(benches);
