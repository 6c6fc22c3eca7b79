//! Types shared by the CurioTrail query API and its mobile-style client.
//!
//! A query entry is a mailbox row: the client creates it with a location and a
//! question, an external responder writes `llm_response` and `status` back, and
//! the client polls until the status is terminal.

pub mod entry;
pub mod params;
pub mod status;
pub mod wire;

pub use entry::{Coordinates, NewQuery, QueryEntry, QueryUpdate};
pub use params::{Action, ParamError};
pub use status::{InvalidStatus, QueryStatus};
pub use wire::{CreatedResponse, ErrorBody, UpdatedResponse};
