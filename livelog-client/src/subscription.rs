//! ConsoleSubscriber - following an instance console.
//!
//! This module provides [`ConsoleSubscriber`], the primary API for
//! applications that show a live console with its recent history.
//!
//! # Architecture
//!
//! Each subscription is one driver task. The driver owns the status and the
//! log, feeds events into the pure status machine from livelog-core and
//! interprets the actions it returns.
//!
//! ```text
//! CoreContext (watch) ─┐
//! set_target()        ─┼─→ driver ─→ ConsoleView (watch)
//! stream pump / fetch ─┘      ↓
//!                        livelog-core (pure status machine)
//! ```
//!
//! Inputs from the stream pump and the fetch task are stamped with the
//! generation of the activation that produced them. A context or target
//! change starts a new generation; anything still in flight from the old one
//! is ignored when it lands.

use std::sync::Arc;

use livelog_core::{
    can_access, normalize_json, Action, Authorizer, ConnectionStatus, Event, LogSequence,
    PermissionAuthorizer,
};
use livelog_types::{CloseCode, InstanceUuid};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::context::CoreContext;
use crate::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::fetch::{BufferFetcher, FetchRequest};
use crate::stream::{Input, StreamHandle, Tagged};
use crate::transport::StreamConnector;

/// What a subscription currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleView {
    /// Instance being followed.
    pub target: InstanceUuid,
    /// Current status.
    pub status: ConnectionStatus,
    /// Merged console log.
    pub log: LogSequence,
}

impl ConsoleView {
    fn new(target: InstanceUuid) -> Self {
        Self {
            target,
            status: ConnectionStatus::new(),
            log: LogSequence::new(),
        }
    }
}

/// Creates console subscriptions that share a connector, a fetcher and a
/// context.
pub struct ConsoleSubscriber<C, F> {
    connector: Arc<C>,
    fetcher: Arc<F>,
    context: watch::Receiver<CoreContext>,
    authorizer: Arc<dyn Authorizer>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl<C, F> ConsoleSubscriber<C, F>
where
    C: StreamConnector,
    F: BufferFetcher,
{
    /// Create a subscriber.
    ///
    /// Access is decided by [`PermissionAuthorizer`] and fetch failures are
    /// logged through [`TracingDiagnostics`] unless replaced.
    pub fn new(connector: C, fetcher: F, context: watch::Receiver<CoreContext>) -> Self {
        Self {
            connector: Arc::new(connector),
            fetcher: Arc::new(fetcher),
            context,
            authorizer: Arc::new(PermissionAuthorizer),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Replace the access decision.
    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }

    /// Replace the diagnostics sink.
    pub fn with_diagnostics(mut self, diagnostics: impl DiagnosticsSink + 'static) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }

    /// Start following the console of `target`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self, target: impl Into<InstanceUuid>) -> ConsoleSubscription {
        let target = target.into();
        let (view_tx, view_rx) = watch::channel(ConsoleView::new(target.clone()));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            connector: Arc::clone(&self.connector),
            fetcher: Arc::clone(&self.fetcher),
            authorizer: Arc::clone(&self.authorizer),
            diagnostics: Arc::clone(&self.diagnostics),
            context: self.context.clone(),
            current: CoreContext::default(),
            target,
            view: view_tx,
            inputs_tx,
            generation: 0,
            key: None,
            stream: None,
            retired: None,
        };
        let task = tokio::spawn(driver.run(commands_rx, inputs_rx));

        ConsoleSubscription {
            view: view_rx,
            commands: commands_tx,
            task,
        }
    }
}

#[derive(Debug)]
enum Command {
    SetTarget(InstanceUuid),
}

/// A running console subscription.
///
/// Dropping the subscription stops the driver and closes its connection;
/// [`ConsoleSubscription::unsubscribe`] does the same and waits for it.
pub struct ConsoleSubscription {
    view: watch::Receiver<ConsoleView>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl ConsoleSubscription {
    /// Snapshot of the current view.
    pub fn view(&self) -> ConsoleView {
        self.view.borrow().clone()
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        self.view.borrow().status
    }

    /// Current log.
    pub fn log(&self) -> LogSequence {
        self.view.borrow().log.clone()
    }

    /// Instance currently followed.
    pub fn target(&self) -> InstanceUuid {
        self.view.borrow().target.clone()
    }

    /// A receiver for view updates, for embedding in other select loops.
    pub fn watch(&self) -> watch::Receiver<ConsoleView> {
        self.view.clone()
    }

    /// Wait for the next view update. Returns false once the driver stopped.
    pub async fn changed(&mut self) -> bool {
        self.view.changed().await.is_ok()
    }

    /// Wait until the view satisfies `predicate`, checking the current view
    /// first. Returns `None` if the driver stopped first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&ConsoleView) -> bool,
    ) -> Option<ConsoleView> {
        self.view
            .wait_for(predicate)
            .await
            .ok()
            .map(|view| view.clone())
    }

    /// Follow a different instance. The log is discarded.
    pub fn set_target(&self, target: impl Into<InstanceUuid>) {
        let _ = self.commands.send(Command::SetTarget(target.into()));
    }

    /// Stop the subscription and wait until its connection is closed.
    pub async fn unsubscribe(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "console subscription task failed");
        }
    }
}

/// Everything whose change restarts the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SubscriptionKey {
    target: InstanceUuid,
    permitted: bool,
    ready: bool,
    principal: Option<String>,
    address: String,
    port: u16,
    api_version: String,
    tls: bool,
    token: String,
}

impl SubscriptionKey {
    fn new(target: &InstanceUuid, context: &CoreContext, permitted: bool) -> Self {
        Self {
            target: target.clone(),
            permitted,
            ready: context.ready,
            principal: context.principal.as_ref().map(|p| p.uid.clone()),
            address: context.address.clone(),
            port: context.port,
            api_version: context.api_version.clone(),
            tls: context.tls,
            token: context.token.clone(),
        }
    }
}

struct Driver<C, F> {
    connector: Arc<C>,
    fetcher: Arc<F>,
    authorizer: Arc<dyn Authorizer>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    context: watch::Receiver<CoreContext>,
    /// Context the current generation was activated with.
    current: CoreContext,
    target: InstanceUuid,
    view: watch::Sender<ConsoleView>,
    inputs_tx: mpsc::UnboundedSender<Tagged>,
    generation: u64,
    key: Option<SubscriptionKey>,
    stream: Option<StreamHandle>,
    /// Closed stream the next one waits for before connecting.
    retired: Option<StreamHandle>,
}

impl<C, F> Driver<C, F>
where
    C: StreamConnector,
    F: BufferFetcher,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut inputs: mpsc::UnboundedReceiver<Tagged>,
    ) {
        self.reevaluate();
        let mut context_open = true;

        loop {
            tokio::select! {
                changed = self.context.changed(), if context_open => {
                    if changed.is_err() {
                        // Sender gone; the last context stays in force.
                        context_open = false;
                        continue;
                    }
                    self.reevaluate();
                }
                command = commands.recv() => match command {
                    Some(Command::SetTarget(target)) => {
                        self.target = target;
                        self.reevaluate();
                    }
                    None => break,
                },
                Some(tagged) = inputs.recv() => self.handle(tagged),
            }
        }

        tracing::debug!(instance = %self.target, "console subscription stopped");
        for stream in [self.stream.take(), self.retired.take()].into_iter().flatten() {
            stream.shutdown().await;
        }
    }

    /// Recompute access and restart the lifecycle if anything it depends on
    /// changed.
    fn reevaluate(&mut self) {
        let context = self.context.borrow_and_update().clone();
        let permitted = can_access(
            self.authorizer.as_ref(),
            context.principal.as_ref(),
            &self.target,
        );
        let key = SubscriptionKey::new(&self.target, &context, permitted);
        self.current = context;

        if self.key.as_ref() == Some(&key) {
            return;
        }
        self.key = Some(key);
        self.generation += 1;
        tracing::debug!(
            instance = %self.target,
            generation = self.generation,
            permitted,
            ready = self.current.ready,
            "console subscription restarting"
        );

        self.apply(Event::ContextChanged);
        if !permitted {
            self.apply(Event::PermissionDenied);
        } else if self.current.ready {
            self.apply(Event::Activated);
        }
    }

    fn handle(&mut self, tagged: Tagged) {
        if tagged.generation != self.generation {
            tracing::debug!(
                instance = %self.target,
                stale = tagged.generation,
                generation = self.generation,
                "ignoring input from previous activation"
            );
            return;
        }

        match tagged.input {
            Input::Opened => self.apply(Event::StreamOpened),
            Input::Frame(text) => match normalize_json(&text) {
                Ok(record) => self.apply(Event::MessageReceived { record }),
                Err(e) => {
                    tracing::warn!(instance = %self.target, error = %e, "dropping console message");
                }
            },
            Input::Closed(code) => self.apply(Event::StreamClosed { code }),
            Input::Fetched(Ok(records)) => self.apply(Event::BufferFetched { records }),
            Input::Fetched(Err(e)) => self.apply(Event::BufferFetchFailed {
                error: e.to_string(),
            }),
        }
    }

    /// Run one transition. Status and log change in a single publish; the
    /// remaining actions run afterwards, in order.
    fn apply(&mut self, event: Event) {
        let before = self.view.borrow().status;
        let (status, actions) = before.on_event(event);

        let target = self.target.clone();
        let mut effects = Vec::new();
        self.view.send_if_modified(|view| {
            let mut modified = false;
            if view.target != target {
                view.target = target;
                modified = true;
            }
            if view.status != status {
                view.status = status;
                modified = true;
            }
            for action in actions {
                match action {
                    Action::ResetLog => {
                        if !view.log.is_empty() {
                            view.log.clear();
                            modified = true;
                        }
                    }
                    Action::MergeRecords { records } => {
                        modified |= view.log.merge(records) > 0;
                    }
                    Action::MergeHistory { records } => {
                        modified |= !records.is_empty();
                        view.log.merge_history(records);
                    }
                    other => effects.push(other),
                }
            }
            modified
        });

        if status != before {
            tracing::info!(
                instance = %self.target,
                generation = self.generation,
                from = %before,
                to = %status,
                "console status changed"
            );
        }

        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::CloseStream => {
                if let Some(mut stream) = self.stream.take() {
                    stream.close();
                    self.retired = Some(stream);
                }
            }
            Action::OpenStream => match self.current.stream_url(&self.target) {
                Ok(url) => {
                    self.stream = Some(StreamHandle::spawn(
                        Arc::clone(&self.connector),
                        url.to_string(),
                        self.generation,
                        self.inputs_tx.clone(),
                        self.retired.take(),
                    ));
                }
                Err(e) => {
                    tracing::warn!(instance = %self.target, error = %e, "cannot open console stream");
                    self.apply(Event::StreamClosed {
                        code: CloseCode::ABNORMAL,
                    });
                }
            },
            Action::FetchBuffer => match self.current.buffer_url(&self.target) {
                Ok(url) => {
                    let request = FetchRequest {
                        url: url.to_string(),
                        token: self.current.token.clone(),
                        target: self.target.clone(),
                    };
                    let fetcher = Arc::clone(&self.fetcher);
                    let inputs = self.inputs_tx.clone();
                    let generation = self.generation;
                    tokio::spawn(async move {
                        let result = fetcher.fetch_buffer(&request).await;
                        let _ = inputs.send(Tagged {
                            generation,
                            input: Input::Fetched(result),
                        });
                    });
                }
                Err(e) => self.apply(Event::BufferFetchFailed {
                    error: e.to_string(),
                }),
            },
            Action::ReportFetchFailure { error } => {
                self.diagnostics.report_fetch_failure(&self.target, &error);
            }
            // Applied together with the status.
            Action::ResetLog | Action::MergeRecords { .. } | Action::MergeHistory { .. } => {}
        }
    }
}
