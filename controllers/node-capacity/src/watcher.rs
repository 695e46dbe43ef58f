//! Kubernetes node watcher.
//!
//! Turns the raw `kube_runtime::watcher` stream into add/update notifications
//! for a `NodeEventHandler`. The first sighting of a node is an add, every later
//! sighting an update carrying the previous snapshot. Completion of the initial
//! listing is signalled so startup can bound how long it waits for it.

use crate::error::ControllerError;
use crate::reconciler::NodeEventHandler;
use capacity::NodeSnapshot;
use futures::{future, Stream, StreamExt};
use k8s_openapi::api::core::v1::Node;
use kube::Api;
use kube_runtime::{watcher, WatchStreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Notification delivered to the handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// Node seen for the first time
    Added(NodeSnapshot),
    /// Node seen again
    Updated {
        /// Snapshot from the previous sighting
        old: NodeSnapshot,
        /// Current snapshot
        new: NodeSnapshot,
    },
}

/// Tracks the last snapshot of every node to tell adds from updates.
#[derive(Debug)]
pub struct EventTranslator {
    resource_name: String,
    known: HashMap<String, NodeSnapshot>,
    // Names seen since the last Init; None outside a relist
    relisted: Option<HashSet<String>>,
}

impl EventTranslator {
    /// Translator reading `resource_name` from node capacity.
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            known: HashMap::new(),
            relisted: None,
        }
    }

    /// Records `node` and returns the matching notification.
    pub fn observe(&mut self, node: &Node) -> Option<NodeEvent> {
        let Some(snapshot) = NodeSnapshot::from_node(node, &self.resource_name) else {
            warn!("Ignoring node without a name");
            return None;
        };

        if let Some(seen) = self.relisted.as_mut() {
            seen.insert(snapshot.name.clone());
        }

        match self.known.insert(snapshot.name.clone(), snapshot.clone()) {
            Some(old) => Some(NodeEvent::Updated { old, new: snapshot }),
            None => Some(NodeEvent::Added(snapshot)),
        }
    }

    /// Drops a deleted node.
    pub fn forget(&mut self, node: &Node) {
        if let Some(name) = node.metadata.name.as_deref() {
            self.known.remove(name);
        }
    }

    /// A full listing is starting (initial start or watch restart).
    pub fn begin_relist(&mut self) {
        self.relisted = Some(HashSet::new());
    }

    /// Drops nodes the finished listing no longer contains. Returns how many were dropped.
    pub fn finish_relist(&mut self) -> usize {
        let Some(seen) = self.relisted.take() else {
            return 0;
        };
        let before = self.known.len();
        self.known.retain(|name, _| seen.contains(name));
        before - self.known.len()
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.known.len()
    }
}

/// Applies one watcher event to the translator.
///
/// `synced` is fired (once) when the initial listing completes.
pub fn handle_event(
    translator: &mut EventTranslator,
    synced: &mut Option<oneshot::Sender<()>>,
    event: watcher::Event<Node>,
) -> Option<NodeEvent> {
    match event {
        watcher::Event::Apply(node) => translator.observe(&node),
        watcher::Event::Delete(node) => {
            info!(node = ?node.metadata.name, "Node deleted");
            translator.forget(&node);
            None
        }
        watcher::Event::Init => {
            debug!("Node watcher initialized");
            translator.begin_relist();
            None
        }
        watcher::Event::InitApply(node) => translator.observe(&node),
        watcher::Event::InitDone => {
            let dropped = translator.finish_relist();
            info!(
                nodes = translator.len(),
                dropped,
                "Node watcher initialization complete"
            );
            if let Some(tx) = synced.take() {
                // Receiver gone means startup already gave up
                let _ = tx.send(());
            }
            None
        }
    }
}

/// Passes a notification to the handler.
pub async fn dispatch(handler: &dyn NodeEventHandler, event: NodeEvent) {
    match event {
        NodeEvent::Added(node) => handler.on_add(&node).await,
        NodeEvent::Updated { old, new } => handler.on_update(&old, &new).await,
    }
}

/// Watches cluster nodes and feeds them to the handler.
pub struct Watcher {
    nodes: Api<Node>,
    handler: Arc<dyn NodeEventHandler>,
    resource_name: String,
    concurrency: usize,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        nodes: Api<Node>,
        handler: Arc<dyn NodeEventHandler>,
        resource_name: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            nodes,
            handler,
            resource_name: resource_name.into(),
            concurrency,
        }
    }

    /// Watches nodes until `shutdown` is cancelled.
    pub async fn run(
        self,
        shutdown: CancellationToken,
        synced: oneshot::Sender<()>,
    ) -> Result<(), ControllerError> {
        info!("Starting Node watcher");

        let events = watcher(self.nodes, watcher::Config::default()).default_backoff();
        process_events(
            events,
            self.handler,
            self.resource_name,
            self.concurrency,
            shutdown,
            synced,
        )
        .await
    }
}

/// Feeds watcher events to `handler` until `shutdown` is cancelled or the stream ends.
///
/// Events are handled concurrently, up to `concurrency` at a time. After
/// cancellation no new events are taken; handlers already running are awaited
/// before returning. An ended stream is an error, since the watcher is
/// expected to restart itself after failures.
pub async fn process_events<S>(
    events: S,
    handler: Arc<dyn NodeEventHandler>,
    resource_name: String,
    concurrency: usize,
    shutdown: CancellationToken,
    synced: oneshot::Sender<()>,
) -> Result<(), ControllerError>
where
    S: Stream<Item = Result<watcher::Event<Node>, watcher::Error>>,
{
    let mut translator = EventTranslator::new(resource_name);
    let mut synced = Some(synced);
    let stop = shutdown.clone();

    events
        .take_until(async move { stop.cancelled().await })
        .filter_map(|result| {
            let event = match result {
                Ok(event) => handle_event(&mut translator, &mut synced, event),
                Err(e) => {
                    // default_backoff restarts the watch after errors
                    warn!("Node watch error: {}", e);
                    None
                }
            };
            future::ready(event)
        })
        // Two events for one node may overlap; both build the same patch, so the
        // worst case is a redundant write
        .for_each_concurrent(concurrency, |event| {
            let handler = handler.clone();
            async move { dispatch(handler.as_ref(), event).await }
        })
        .await;

    if shutdown.is_cancelled() {
        info!("Node watcher stopped");
        Ok(())
    } else {
        Err(ControllerError::Watch("node watch stream ended".to_string()))
    }
}
