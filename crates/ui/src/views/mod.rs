mod account;
mod assessment;
mod expiry;
mod guard;
mod home;
mod idle;
mod login;
mod scripts;
mod state;
mod window;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use account::{ForgotPasswordView, SignupView};
pub use assessment::AssessmentView;
pub(crate) use expiry::SessionExpiredNotice;
pub use guard::{LeaveGuard, LeavePolicy};
pub use home::HomeView;
pub use idle::use_idle_timeout;
pub use login::LoginView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use window::use_window_close_guard;
