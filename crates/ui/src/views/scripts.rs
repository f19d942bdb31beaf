use dioxus::document::eval;

const SCROLL_INTO_VIEW_SCRIPT_TEMPLATE: &str = r#"
    const el = document.getElementById("{element_id}");
    if (el) {
        el.scrollIntoView({ behavior: "smooth", block: "center" });
    }
"#;

const SCROLL_TOP_SCRIPT: &str = r#"
    const root = document.getElementById("assessment-root");
    if (root) { root.scrollIntoView({ block: "start" }); }
    window.scrollTo(0, 0);
"#;

pub async fn scroll_into_view(element_id: &str) {
    let script = SCROLL_INTO_VIEW_SCRIPT_TEMPLATE.replace("{element_id}", element_id);
    let _ = eval(&script).await;
}

pub async fn scroll_to_top() {
    let _ = eval(SCROLL_TOP_SCRIPT).await;
}

/// Ask the user to confirm leaving. Without a webview there is nobody to ask.
pub async fn confirm(message: &str) -> bool {
    let script = format!("return window.confirm({message:?});");
    eval(&script).join::<bool>().await.unwrap_or(true)
}

/// Forwards activity events to Rust, at most once per second.
pub(crate) fn activity_listener_script(events: &[&str]) -> String {
    let names = events
        .iter()
        .map(|name| format!("{name:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r"(function() {{
            const events = [{names}];
            const previous = window.__strandActivity;
            if (previous) {{
                previous.events.forEach((name) => window.removeEventListener(name, previous.handler));
            }}
            let last = 0;
            const handler = (event) => {{
                const now = Date.now();
                if (now - last < 1000) return;
                last = now;
                dioxus.send(event.type);
            }};
            events.forEach((name) => window.addEventListener(name, handler, {{ passive: true }}));
            window.__strandActivity = {{ events, handler }};
        }})();"
    )
}

/// Undoes [`activity_listener_script`].
pub(crate) const ACTIVITY_UNLISTEN_SCRIPT: &str = r"
    (function() {
        const previous = window.__strandActivity;
        if (!previous) return;
        previous.events.forEach((name) => window.removeEventListener(name, previous.handler));
        delete window.__strandActivity;
    })();
";
