//! Structured event ids shared by session store, relay pipeline, and gateway logs.

mod session_events;

pub(crate) use session_events::SessionEvent;
