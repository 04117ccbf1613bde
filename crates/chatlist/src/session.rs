//! One conversation's list, owned by a single task.
//!
//! The actor holds the window and the viewport and serializes everything that
//! touches them: host commands, live change events, pagination results and
//! the viewport's own intents. Store reads for pagination run on separate
//! tasks and come back through a channel, so a slow page never blocks input.

use std::sync::Arc;

use chatlist_layout::LayoutEngine;
use chatlist_window::{
    ChangeEvent, ChangeFeed, ChangeSet, ChangeSubscription, ConversationId, Direction,
    MessageStore, MessageWindow, PageRequest, StoreError,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::config::ChatListConfig;
use crate::error::{Error, Result};
use crate::record::{ChatItem, MessageRecord};
use crate::state::ScrollPhase;
use crate::viewport::{MessageViewport, ViewportIntent, VisibleRow};

const COMMAND_CAPACITY: usize = 64;
const PAGE_RESULT_CAPACITY: usize = 4;
const CHANGE_BROADCAST_CAPACITY: usize = 256;

type PageResult = (PageRequest, std::result::Result<Vec<ChatItem>, StoreError>);

/// Everything a host needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub rows: Vec<VisibleRow>,
    pub offset: f64,
    pub content_height: f64,
    pub viewport_height: f64,
    pub len: usize,
    pub at_bottom: bool,
    pub phase: ScrollPhase,
}

pub(crate) enum SessionCmd {
    Resize {
        width: f64,
        height: f64,
    },
    ScrollBy {
        delta: f64,
    },
    ScrollTo {
        offset: f64,
    },
    ScrollToBottom,
    ScrollToRow {
        index: usize,
    },
    UserScrollBegin,
    UserScrollEnd,
    CompleteUpdate,
    Frame {
        reply: oneshot::Sender<Frame>,
    },
    HeightForRow {
        index: usize,
        reply: oneshot::Sender<f64>,
    },
    SubscribeChanges {
        reply: oneshot::Sender<broadcast::Receiver<Arc<ChangeSet<MessageRecord>>>>,
    },
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct ChatSessionHandle {
    conversation: ConversationId,
    cmd_tx: mpsc::Sender<SessionCmd>,
}

impl ChatSessionHandle {
    /// Start the actor for `conversation` on the current tokio runtime. The
    /// first window is loaded before any command is handled.
    pub fn spawn(
        conversation: ConversationId,
        store: Arc<dyn MessageStore<MessageRecord>>,
        feed: &ChangeFeed<MessageRecord>,
        engine: Arc<LayoutEngine>,
        config: &ChatListConfig,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        // Subscribe before loading so no event between the two is lost.
        let changes = feed.subscribe(conversation);
        let actor = SessionActor::new(conversation, store, changes, engine, config);
        tokio::spawn(actor.run(cmd_rx));
        Self {
            conversation,
            cmd_tx,
        }
    }

    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    async fn send(&self, cmd: SessionCmd) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| Error::SessionClosed)
    }

    pub async fn resize(&self, width: f64, height: f64) -> Result<()> {
        self.send(SessionCmd::Resize { width, height }).await
    }

    pub async fn scroll_by(&self, delta: f64) -> Result<()> {
        self.send(SessionCmd::ScrollBy { delta }).await
    }

    pub async fn scroll_to(&self, offset: f64) -> Result<()> {
        self.send(SessionCmd::ScrollTo { offset }).await
    }

    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.send(SessionCmd::ScrollToBottom).await
    }

    pub async fn scroll_to_row(&self, index: usize) -> Result<()> {
        self.send(SessionCmd::ScrollToRow { index }).await
    }

    pub async fn user_scroll_begin(&self) -> Result<()> {
        self.send(SessionCmd::UserScrollBegin).await
    }

    pub async fn user_scroll_end(&self) -> Result<()> {
        self.send(SessionCmd::UserScrollEnd).await
    }

    /// The host finished animating the last insert or remove.
    pub async fn complete_update(&self) -> Result<()> {
        self.send(SessionCmd::CompleteUpdate).await
    }

    pub async fn frame(&self) -> Result<Frame> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCmd::Frame { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| Error::SessionClosed)
    }

    pub async fn height_for_row(&self, index: usize) -> Result<f64> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCmd::HeightForRow {
            index,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Every change-set applied from now on, in application order.
    pub async fn subscribe_changes(
        &self,
    ) -> Result<broadcast::Receiver<Arc<ChangeSet<MessageRecord>>>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCmd::SubscribeChanges { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| Error::SessionClosed)
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.try_send(SessionCmd::Shutdown);
    }
}

struct SessionActor {
    store: Arc<dyn MessageStore<MessageRecord>>,
    window: MessageWindow<MessageRecord>,
    viewport: MessageViewport,
    changes: ChangeSubscription<MessageRecord>,
    feed_open: bool,
    intents_rx: mpsc::UnboundedReceiver<ViewportIntent>,
    page_tx: mpsc::Sender<PageResult>,
    page_rx: mpsc::Receiver<PageResult>,
    change_broadcast: broadcast::Sender<Arc<ChangeSet<MessageRecord>>>,
    /// The last older page came back short; cleared by reloads.
    older_exhausted: bool,
}

impl SessionActor {
    fn new(
        conversation: ConversationId,
        store: Arc<dyn MessageStore<MessageRecord>>,
        changes: ChangeSubscription<MessageRecord>,
        engine: Arc<LayoutEngine>,
        config: &ChatListConfig,
    ) -> Self {
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (page_tx, page_rx) = mpsc::channel(PAGE_RESULT_CAPACITY);
        let (change_broadcast, _) = broadcast::channel(CHANGE_BROADCAST_CAPACITY);
        let window = MessageWindow::new(conversation, config.window.clone());
        let viewport = MessageViewport::new(
            engine,
            config.viewport.clone(),
            conversation,
            window.order(),
            intents_tx,
        );

        Self {
            store,
            window,
            viewport,
            changes,
            feed_open: true,
            intents_rx,
            page_tx,
            page_rx,
            change_broadcast,
            older_exhausted: false,
        }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<SessionCmd>) {
        let conversation = self.window.conversation();
        let limit = self.window.config().initial_limit;
        let change = self.window.load(self.store.as_ref(), limit).await;
        self.apply_change(change);
        tracing::debug!(
            target: "chatlist::session",
            conversation = %conversation,
            len = self.window.len(),
            "Session started"
        );

        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_cmd(cmd) {
                        break;
                    }
                }

                Some((request, result)) = self.page_rx.recv() => {
                    self.handle_page(request, result);
                }

                Some(intent) = self.intents_rx.recv() => {
                    self.handle_intent(intent);
                }

                event = self.changes.recv(), if self.feed_open => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            tracing::debug!(
                                target: "chatlist::session",
                                conversation = %conversation,
                                "Change feed closed"
                            );
                            self.feed_open = false;
                        }
                    }
                }

                else => break,
            }
        }

        tracing::debug!(target: "chatlist::session", conversation = %conversation, "Session stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_cmd(&mut self, cmd: SessionCmd) -> bool {
        match cmd {
            SessionCmd::Resize { width, height } => self.viewport.set_size(width, height),
            SessionCmd::ScrollBy { delta } => {
                self.viewport.scroll_by(delta);
            }
            SessionCmd::ScrollTo { offset } => {
                self.viewport.scroll_to(offset);
            }
            SessionCmd::ScrollToBottom => self.viewport.scroll_to_bottom(),
            SessionCmd::ScrollToRow { index } => self.viewport.scroll_to_row(index),
            SessionCmd::UserScrollBegin => self.viewport.notify_user_scroll_begin(),
            SessionCmd::UserScrollEnd => self.viewport.notify_user_scroll_end(),
            SessionCmd::CompleteUpdate => self.viewport.complete_update(),
            SessionCmd::Frame { reply } => {
                let _ = reply.send(self.frame());
            }
            SessionCmd::HeightForRow { index, reply } => {
                let _ = reply.send(self.viewport.height_for_row(index));
            }
            SessionCmd::SubscribeChanges { reply } => {
                let _ = reply.send(self.change_broadcast.subscribe());
            }
            SessionCmd::Shutdown => return false,
        }
        true
    }

    fn frame(&mut self) -> Frame {
        let rows = self.viewport.layout();
        Frame {
            rows,
            offset: self.viewport.offset(),
            content_height: self.viewport.content_height(),
            viewport_height: self.viewport.viewport_height(),
            len: self.viewport.len(),
            at_bottom: self.viewport.is_at_bottom(),
            phase: self.viewport.phase(),
        }
    }

    async fn handle_event(&mut self, event: ChangeEvent<MessageRecord>) {
        if let Some(change) = self.window.apply(self.store.as_ref(), event).await {
            self.apply_change(change);
        }
    }

    fn apply_change(&mut self, change: ChangeSet<MessageRecord>) {
        if change.is_empty() {
            return;
        }
        if matches!(change, ChangeSet::Reload) {
            self.older_exhausted = false;
        }
        self.viewport.apply_change_set(&change, self.window.items());
        let _ = self.change_broadcast.send(Arc::new(change));
    }

    fn handle_intent(&mut self, intent: ViewportIntent) {
        match intent {
            ViewportIntent::AtBottomChanged(at_bottom) => self.window.set_at_bottom(at_bottom),
            ViewportIntent::Paginate(direction) => self.start_page(direction),
        }
    }

    fn start_page(&mut self, direction: Direction) {
        let request = match self.window.page_request(direction) {
            Some(_) if direction == Direction::Older && self.older_exhausted => None,
            request => request,
        };
        let Some(request) = request else {
            self.viewport.finish_pagination();
            return;
        };

        tracing::debug!(
            target: "chatlist::session",
            conversation = %request.conversation,
            direction = ?request.direction,
            cursor = %request.cursor,
            limit = request.limit,
            "Fetching page"
        );
        let store = Arc::clone(&self.store);
        let page_tx = self.page_tx.clone();
        tokio::spawn(async move {
            let result = store
                .fetch_ordered(request.conversation, request.query())
                .await;
            let _ = page_tx.send((request, result)).await;
        });
    }

    fn handle_page(
        &mut self,
        request: PageRequest,
        result: std::result::Result<Vec<ChatItem>, StoreError>,
    ) {
        if request.direction == Direction::Older
            && request.generation == self.window.generation()
            && matches!(&result, Ok(items) if items.len() < request.limit)
        {
            self.older_exhausted = true;
        }
        let change = self.window.merge_page(&request, result);
        self.viewport.apply_page(&change, self.window.items());
        if !change.is_empty() {
            let _ = self.change_broadcast.send(Arc::new(change));
        }
    }
}
