use log::warn;
use sysinfo::System;

const TEMPLATE: &str = include_str!("ui.html");

/// Dashboard page, rendered once at startup with the host and namespace.
#[derive(Debug, Clone)]
pub struct UiPage {
    html: String,
}

impl UiPage {
    /// Render for this host. Falls back to `"unknown"` if the hostname can't be read.
    pub fn new(namespace: &str) -> Self {
        let hostname = System::host_name().unwrap_or_else(|| {
            warn!("⚠️  Couldn't get hostname");
            "unknown".to_string()
        });
        Self::render(&hostname, namespace)
    }

    pub fn render(hostname: &str, namespace: &str) -> Self {
        let html = TEMPLATE
            .replace("{{hostname}}", &escape_html(hostname))
            .replace("{{namespace}}", &escape_html(namespace));
        Self { html }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
