//! Dependency-graph runner
//!
//! A [`Graph`] is a DAG of nodes. Invoke nodes run a callback and complete at
//! once, action nodes step a resumable [`Action`] until it completes, and join
//! nodes complete once every one of their parents has. Completing a node
//! starts its children, so sibling branches run in parallel and a join fans
//! them back in.
//!
//! [`DynamicSequence`] runs a graph. It is itself a job: hand it to a
//! [`TweenManager`](crate::TweenManager) or tick it yourself.

use std::fmt;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::action::Action;
use crate::error::{Result, TweenError};
use crate::handle::Handle;
use crate::runnable::{RunState, Runnable};

new_key_type! {
    pub struct NodeId;
}

/// Builds a fresh action each time its node starts
pub type ActionFactory = Box<dyn FnMut() -> Box<dyn Action>>;

pub enum NodeKind {
    Invoke(Box<dyn FnMut()>),
    Action(ActionFactory),
    Join(SmallVec<[NodeId; 4]>),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Invoke(_) => f.write_str("Invoke"),
            NodeKind::Action(_) => f.write_str("Action"),
            NodeKind::Join(parents) => f.debug_tuple("Join").field(parents).finish(),
        }
    }
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    children: SmallVec<[NodeId; 2]>,
}

// ============================================================================
// Graph
// ============================================================================

/// A DAG of invoke, action and join nodes
#[derive(Default, Debug)]
pub struct Graph {
    nodes: SlotMap<NodeId, Node>,
    root: Option<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.insert(Node {
            kind,
            children: SmallVec::new(),
        });
        // The first node added becomes the root unless one is set explicitly
        self.root.get_or_insert(id);
        id
    }

    pub fn add_invoke(&mut self, f: impl FnMut() + 'static) -> NodeId {
        self.insert(NodeKind::Invoke(Box::new(f)))
    }

    pub fn add_action<A, F>(&mut self, mut factory: F) -> NodeId
    where
        A: Action + 'static,
        F: FnMut() -> A + 'static,
    {
        self.add_action_boxed(Box::new(move || Box::new(factory()) as Box<dyn Action>))
    }

    pub fn add_action_boxed(&mut self, factory: ActionFactory) -> NodeId {
        self.insert(NodeKind::Action(factory))
    }

    /// Add a join over `parents`, linking it as a child of each
    pub fn add_join(&mut self, parents: &[NodeId]) -> NodeId {
        let mut unique: SmallVec<[NodeId; 4]> = SmallVec::new();
        for &parent in parents {
            if !unique.contains(&parent) {
                unique.push(parent);
            }
        }
        let id = self.insert(NodeKind::Join(unique.clone()));
        for parent in unique {
            self.link(parent, id);
        }
        id
    }

    /// Start `child` when `parent` completes
    pub fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent) {
            if !node.children.contains(&child) {
                node.children.push(child);
            }
        }
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map_or(&[][..], |node| node.children.as_slice())
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|node| &node.kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ============================================================================
// DynamicSequence
// ============================================================================

/// Node progress within one run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Running,
    Completed,
}

enum TaskBody {
    Action(Box<dyn Action>),
    Join,
}

/// A running node that has not completed yet
struct Task {
    node: NodeId,
    body: TaskBody,
    /// Frame the task was created in
    started: u64,
    /// Frame the task was last stepped in
    stepped: u64,
}

/// Runs a [`Graph`] cooperatively, one frame per tick
#[derive(Default)]
pub struct DynamicSequence {
    state: RunState,
    graph: Graph,
    states: FxHashMap<NodeId, NodeState>,
    tasks: Vec<Task>,
    frame: u64,
    running: bool,
    started: bool,
    /// Root start deferred until the delay has elapsed
    pending_start: bool,
}

impl DynamicSequence {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            ..Self::default()
        }
    }

    /// Replace the graph; fails while a run is in progress
    pub fn load(&mut self, graph: Graph) -> Result<()> {
        if self.running {
            return Err(TweenError::AlreadyRunning);
        }
        self.graph = graph;
        self.started = false;
        self.pending_start = false;
        self.states.clear();
        self.tasks.clear();
        Ok(())
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a run has started and finished
    pub fn is_finished(&self) -> bool {
        self.started && !self.running
    }

    pub fn node_state(&self, id: NodeId) -> Option<NodeState> {
        self.states.get(&id).copied()
    }

    /// Start running from the root
    ///
    /// Steps that can finish immediately (invokes, zero delays) run before
    /// this returns. Running a graph that is still running is an error; a
    /// finished graph may be run again.
    pub fn run(&mut self) -> Result<()> {
        if self.running {
            return Err(TweenError::AlreadyRunning);
        }
        if self.graph.root().is_none() {
            return Err(TweenError::EmptySequence);
        }

        self.states.clear();
        self.tasks.clear();
        self.running = true;
        self.started = true;

        if self.state.delay() > 0.0 {
            self.pending_start = true;
        } else {
            self.start_root();
        }
        Ok(())
    }

    fn start_root(&mut self) {
        self.pending_start = false;
        if let Some(root) = self.graph.root() {
            self.run_node(root);
        }
        self.advance(0.0);
    }

    /// Start a node unless it has already been visited this run
    fn run_node(&mut self, id: NodeId) {
        let mut pending: SmallVec<[NodeId; 8]> = SmallVec::new();
        pending.push(id);
        self.start_nodes(pending);
    }

    fn complete_node(&mut self, id: NodeId) {
        self.states.insert(id, NodeState::Completed);
        let pending = self.graph.children(id).iter().rev().copied().collect();
        self.start_nodes(pending);
    }

    /// Start nodes depth first in child order
    ///
    /// Instant nodes complete in place and push their children, so long
    /// chains of invokes don't grow the call stack.
    fn start_nodes(&mut self, mut pending: SmallVec<[NodeId; 8]>) {
        while let Some(id) = pending.pop() {
            if self.states.contains_key(&id) {
                continue;
            }
            let Some(node) = self.graph.nodes.get_mut(id) else {
                continue;
            };
            self.states.insert(id, NodeState::Running);

            let body = match &mut node.kind {
                NodeKind::Invoke(f) => {
                    f();
                    None
                }
                NodeKind::Action(factory) => Some(TaskBody::Action(factory())),
                NodeKind::Join(_) => Some(TaskBody::Join),
            };

            match body {
                Some(body) => self.tasks.push(Task {
                    node: id,
                    body,
                    started: self.frame,
                    stepped: 0,
                }),
                None => {
                    self.states.insert(id, NodeState::Completed);
                    pending.extend(self.graph.children(id).iter().rev().copied());
                }
            }
        }
    }

    fn join_ready(&self, id: NodeId) -> bool {
        match self.graph.kind(id) {
            Some(NodeKind::Join(parents)) => parents
                .iter()
                .all(|parent| self.states.get(parent) == Some(&NodeState::Completed)),
            _ => true,
        }
    }

    /// Step every pending task once, repeating until nothing else can finish
    /// this frame
    fn advance(&mut self, dt: f32) {
        self.frame += 1;
        let frame = self.frame;

        loop {
            let mut progressed = false;
            let mut i = 0;
            while i < self.tasks.len() {
                let (node, is_join) = {
                    let task = &self.tasks[i];
                    (task.node, matches!(task.body, TaskBody::Join))
                };
                let done = if is_join {
                    self.join_ready(node)
                } else {
                    let task = &mut self.tasks[i];
                    if task.stepped == frame {
                        false
                    } else {
                        // Actions started this frame begin with an empty step
                        let step_dt = if task.started == frame { 0.0 } else { dt };
                        task.stepped = frame;
                        match &mut task.body {
                            TaskBody::Action(action) => action.step(step_dt).is_complete(),
                            TaskBody::Join => false,
                        }
                    }
                };

                if done {
                    let task = self.tasks.remove(i);
                    self.complete_node(task.node);
                    progressed = true;
                } else {
                    i += 1;
                }
            }
            if !progressed {
                break;
            }
        }

        if self.tasks.is_empty() {
            self.running = false;
        }
    }
}

impl Runnable for DynamicSequence {
    fn state(&self) -> &RunState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }

    /// Graphs have no fixed length
    fn duration(&self) -> f32 {
        0.0
    }

    /// 0 until the run finishes, then 1
    fn raw_progress(&self) -> f32 {
        if self.is_finished() {
            1.0
        } else {
            0.0
        }
    }

    fn on_update(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        if self.pending_start {
            self.start_root();
        } else {
            self.advance(dt);
        }
    }

    fn on_cancel(&mut self, _snap: bool) {
        self.tasks.clear();
        self.running = false;
    }

    fn is_complete(&self) -> bool {
        self.state.is_cancelled() || self.is_finished()
    }

    fn reset_payload(&mut self) {
        self.graph = Graph::default();
        self.states.clear();
        self.tasks.clear();
        self.frame = 0;
        self.running = false;
        self.started = false;
        self.pending_start = false;
    }
}

impl fmt::Debug for DynamicSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicSequence")
            .field("state", &self.state)
            .field("nodes", &self.graph.len())
            .field("pending", &self.tasks.len())
            .field("running", &self.running)
            .finish()
    }
}

impl Handle<DynamicSequence> {
    /// Start the graph; see [`DynamicSequence::run`]
    pub fn run(&self) -> Result<()> {
        self.with_mut(|runner| runner.run())
            .unwrap_or(Err(TweenError::StaleHandle))
    }

    pub fn is_running(&self) -> bool {
        self.borrow().is_running()
    }
}
