mod cache;
mod dispatch;
mod engine;
mod executor;
mod lifecycle;
mod node;

pub use cache::{ArtifactCache, CacheEntry};
pub use dispatch::{locate_element, Dispatch, ElementSlot, ResolvedCallable};
pub use engine::RunCodeEngine;
pub use executor::{AwaitHost, AwaitPoll, ScriptTask, TaskPoll};
pub use lifecycle::{Lifecycle, SessionBus, SessionContext, SessionEvents, SESSION_SUBSCRIBER};
pub use node::{NodeStatus, RunCodeNode};
