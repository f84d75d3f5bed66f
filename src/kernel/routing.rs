use serde::{Deserialize, Serialize};

/// Control-flow effect of an interviewer reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingDecision {
    Continue,
    EnterCodingRound,
    EnterBehavioralNotice,
    EndInterview,
}

/// Explicit routing tag a backend may attach to its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTag {
    Continue,
    CodingRound,
    BehavioralNotice,
    End,
}

impl From<RouteTag> for RoutingDecision {
    fn from(tag: RouteTag) -> Self {
        match tag {
            RouteTag::Continue => Self::Continue,
            RouteTag::CodingRound => Self::EnterCodingRound,
            RouteTag::BehavioralNotice => Self::EnterBehavioralNotice,
            RouteTag::End => Self::EndInterview,
        }
    }
}

/// A structured tag wins; reply text is the legacy fallback.
pub fn route_reply(tag: Option<RouteTag>, text: &str) -> RoutingDecision {
    match tag {
        Some(tag) => tag.into(),
        None => route_text(text),
    }
}

/// Substring rules over the lower-cased reply, first match wins.
///
/// Precedence follows rule order: a reply mentioning both "behavioral" and
/// "live coding round" routes to the coding round.
pub fn route_text(text: &str) -> RoutingDecision {
    let text = text.to_lowercase();

    if text.contains("interview is complete") {
        RoutingDecision::EndInterview
    } else if text.contains("live coding round") {
        RoutingDecision::EnterCodingRound
    } else if text.contains("behavioral") && !text.contains("thank you") {
        RoutingDecision::EnterBehavioralNotice
    } else {
        RoutingDecision::Continue
    }
}
