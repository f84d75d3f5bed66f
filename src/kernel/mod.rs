pub mod context;
pub mod event;
pub mod orchestrator;
pub mod routing;
pub mod session;
pub mod telemetry;
pub mod transcript;

pub use context::SessionContext;
pub use event::{Command, Notice, SessionEvent, TerminationReason};
pub use orchestrator::{Orchestrator, SessionHandle, SessionParts, TurnOutcome};
pub use routing::{route_reply, route_text, RouteTag, RoutingDecision};
pub use session::{SessionGraph, SessionRequest, SessionState};
pub use transcript::{ConfidenceBand, Speaker, Transcript, TurnMessage};
