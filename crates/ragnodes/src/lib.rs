//! Standard node library
//!
//! Handlers for the four node kinds of a retrieval-augmented workflow.

mod generation;
mod query;
mod retrieval;
mod sink;

pub use generation::GenerationNode;
pub use query::QuerySourceNode;
pub use retrieval::RetrievalNode;
pub use sink::SinkNode;

use ragcore::Collaborators;
use ragruntime::NodeDispatcher;
use std::sync::Arc;

/// Register every node kind, wired to the given collaborators
pub fn register_all(dispatcher: &mut NodeDispatcher, collaborators: Collaborators) {
    dispatcher.register(Arc::new(query::QuerySourceNodeFactory));
    dispatcher.register(Arc::new(retrieval::RetrievalNodeFactory::new(
        collaborators.vector_store.clone(),
    )));
    dispatcher.register(Arc::new(generation::GenerationNodeFactory::new(
        collaborators.llm.clone(),
        collaborators.web_search.clone(),
    )));
    dispatcher.register(Arc::new(sink::SinkNodeFactory));
}
