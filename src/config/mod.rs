//! Configuration and persisted state
//!
//! agentbox keeps everything under one per-user cache root:
//!
//! ```text
//! $HOME/.agentbox/
//! ├── state.json                      advisory state record
//! └── bin/<agent>/<version>/<binary>  installation store
//! ```
//!
//! # Modules
//!
//! - `paths` - resolution of the cache root and its fixed children
//! - `state` - the advisory [`State`] record and its saving [`StateHandle`]

mod paths;
mod state;

pub use paths::{CACHE_DIR_NAME, Paths};
pub use state::{AgentState, State, StateHandle};
