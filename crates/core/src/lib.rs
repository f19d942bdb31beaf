#![forbid(unsafe_code)]

pub mod flow;
pub mod guard;
pub mod model;
pub mod pagination;
pub mod time;
pub mod validation;

pub use flow::{
    AnswerTicket, AssessmentFlow, FlowContext, FlowError, FlowState, NavTarget, PageAdvance,
    StartPlan, SubmitGate,
};
pub use guard::{LEAVE_WARNING, LeaveDecision, LeaveSignal, leave_decision};
pub use pagination::{DEFAULT_PAGE_SIZE, PageNumber, PaginationError, Paginator};
pub use time::Clock;
