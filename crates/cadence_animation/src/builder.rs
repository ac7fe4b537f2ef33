//! Graph builder
//!
//! Describes a graph as ordered chains instead of wiring nodes by hand.
//! Each step follows the one before it; [`GraphBuilder::fork`] starts sibling
//! branches from the current point while the main chain carries on, and
//! [`GraphBuilder::join`] waits for every open branch and the main chain
//! before continuing. Nothing is linked until [`GraphBuilder::build`].
//!
//! ```rust
//! use cadence_animation::GraphBuilder;
//!
//! let graph = GraphBuilder::new()
//!     .invoke(|| println!("start"))
//!     .fork(vec![
//!         GraphBuilder::new().delay(0.5).invoke(|| println!("left")),
//!         GraphBuilder::new().delay(1.0).invoke(|| println!("right")),
//!     ])
//!     .join()
//!     .invoke(|| println!("both done"))
//!     .build()
//!     .unwrap();
//! assert_eq!(graph.len(), 7);
//! ```

use smallvec::SmallVec;

use crate::action::{Action, ActionState, Delay, WaitFor};
use crate::dynamic::{ActionFactory, Graph, NodeId};
use crate::error::{Result, TweenError};
use crate::handle::Handle;
use crate::runnable::Runnable;

enum Step {
    Invoke(Box<dyn FnMut()>),
    Action(ActionFactory),
    Fork(Vec<GraphBuilder>),
    Join,
}

/// Ordered description of a graph branch
#[derive(Default)]
pub struct GraphBuilder {
    steps: Vec<Step>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a callback
    pub fn invoke(mut self, f: impl FnMut() + 'static) -> Self {
        self.steps.push(Step::Invoke(Box::new(f)));
        self
    }

    /// Wait a fixed time
    pub fn delay(self, seconds: f32) -> Self {
        self.action(move || Delay::new(seconds))
    }

    /// Run an action built fresh for every run
    pub fn action<A, F>(mut self, mut factory: F) -> Self
    where
        A: Action + 'static,
        F: FnMut() -> A + 'static,
    {
        self.steps.push(Step::Action(Box::new(move || {
            Box::new(factory()) as Box<dyn Action>
        })));
        self
    }

    /// Start a job and wait for it to finish
    ///
    /// A factory error is logged and the step completes immediately.
    pub fn job<T, F>(mut self, mut factory: F) -> Self
    where
        T: Runnable,
        F: FnMut() -> Result<Handle<T>> + 'static,
    {
        self.steps.push(Step::Action(Box::new(move || -> Box<dyn Action> {
            match factory() {
                Ok(job) => Box::new(WaitFor::new(job)),
                Err(err) => {
                    tracing::error!("Graph step failed to start its job: {}", err);
                    Box::new(|_dt: f32| ActionState::Complete)
                }
            }
        })));
        self
    }

    /// Start sibling branches from the current point
    pub fn fork(mut self, branches: Vec<GraphBuilder>) -> Self {
        self.steps.push(Step::Fork(branches));
        self
    }

    /// Wait for every open branch and the main chain
    pub fn join(mut self) -> Self {
        self.steps.push(Step::Join);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Link the described chains into a graph
    pub fn build(self) -> Result<Graph> {
        if self.is_empty() {
            return Err(TweenError::EmptySequence);
        }
        let mut graph = Graph::new();
        self.link_into(&mut graph, None);
        Ok(graph)
    }

    /// Append this chain after `parent`. Returns the chain's last node and
    /// the tails of forked branches no join has waited for yet.
    fn link_into(self, graph: &mut Graph, parent: Option<NodeId>) -> (Option<NodeId>, OpenTails) {
        let mut tail = parent;
        let mut open = OpenTails::new();

        for step in self.steps {
            match step {
                Step::Invoke(f) => {
                    let node = graph.add_invoke(f);
                    chain(graph, &mut tail, node);
                }
                Step::Action(factory) => {
                    let node = graph.add_action_boxed(factory);
                    chain(graph, &mut tail, node);
                }
                Step::Fork(branches) => {
                    let anchor = *tail.get_or_insert_with(|| graph.add_invoke(|| {}));
                    for branch in branches {
                        let (end, nested) = branch.link_into(graph, Some(anchor));
                        open.extend(end);
                        open.extend(nested);
                    }
                }
                Step::Join => {
                    let mut parents = std::mem::take(&mut open);
                    parents.extend(tail);
                    tail = Some(graph.add_join(&parents));
                }
            }
        }

        open.retain(|id| Some(*id) != tail);
        (tail, open)
    }
}

type OpenTails = SmallVec<[NodeId; 4]>;

fn chain(graph: &mut Graph, tail: &mut Option<NodeId>, node: NodeId) {
    if let Some(prev) = *tail {
        graph.link(prev, node);
    }
    *tail = Some(node);
}
