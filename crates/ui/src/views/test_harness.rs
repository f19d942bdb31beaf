use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{ApiConfig, AppServices, InMemoryAssessmentApi};
use strand_core::Clock;
use strand_core::time::fixed_now;

use crate::context::{UiApp, build_app_context};
use crate::routes::Layout;
use crate::views::{
    AssessmentView, ForgotPasswordView, HomeView, LeaveGuard, LoginView, SignupView,
};

pub const DEMO_EMAIL: &str = "student@strandify.test";
pub const DEMO_PASSWORD: &str = "password";

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Login,
    Signup,
    ForgotPassword,
    Home,
    Assessment,
    /// The signed-in shell with its session check.
    Shell,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<AppServices>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(LeaveGuard::new);
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Login => rsx! { LoginView {} },
        ViewKind::Signup => rsx! { SignupView {} },
        ViewKind::ForgotPassword => rsx! { ForgotPasswordView {} },
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Assessment => rsx! { AssessmentView {} },
        ViewKind::Shell => rsx! { Layout {} },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub app: Arc<AppServices>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild, then keep driving until `needle` shows up or we give up.
    pub async fn render_until(&mut self, needle: &str) -> String {
        self.rebuild();
        for _ in 0..20 {
            let html = self.render();
            if html.contains(needle) {
                return html;
            }
            self.drive_async().await;
        }
        self.render()
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// Harness around `api`; logs the demo student in first when `signed_in`.
pub async fn setup_view_harness(
    view: ViewKind,
    api: InMemoryAssessmentApi,
    signed_in: bool,
) -> ViewHarness {
    let services = AppServices::with_api(
        Clock::fixed(fixed_now()),
        ApiConfig::default(),
        Arc::new(api.clone()),
    );
    if signed_in {
        services
            .auth()
            .login(&api, DEMO_EMAIL, DEMO_PASSWORD, false)
            .await
            .expect("demo login");
    }

    let app = Arc::new(services);
    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app: Arc::clone(&app),
            view,
        },
    );

    ViewHarness { dom, app }
}
