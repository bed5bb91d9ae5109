//! Plain-text rendering of an exchange result.

use crucible_core::result::ExchangeResult;
use std::fmt::Write;

/// Renders the full exchange in the sectioned format used by the print and
/// log handlers.
///
/// Empty sections are omitted.
#[must_use]
pub fn render_exchange(result: &ExchangeResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Exchange result:");
    let _ = writeln!(out, "       Request: {} {}", result.method(), result.uri());
    let _ = writeln!(out, "        Status: {}", result.status());

    if !result.headers().is_empty() {
        let _ = writeln!(out, "       Headers:");
        for (name, value) in result.headers() {
            let _ = writeln!(out, "                {}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
    }

    if !result.body().is_empty() {
        match result.text() {
            Ok(text) => {
                let _ = writeln!(out, "          Body: {text}");
            }
            Err(_) => {
                let _ = writeln!(out, "          Body: <{} bytes>", result.body().len());
            }
        }
    }

    if let Some(handler) = result.handler() {
        match handler.operation() {
            Some(operation) => {
                let _ = writeln!(out, "       Handler: {} ({operation})", handler.name());
            }
            None => {
                let _ = writeln!(out, "       Handler: {}", handler.name());
            }
        }
    }

    for (label, map) in [
        ("Session", result.session()),
        ("Model", result.model()),
        ("Flash", result.flash()),
    ] {
        if !map.is_empty() {
            let _ = writeln!(out, "       {label:>7}:");
            for (name, value) in map {
                let _ = writeln!(out, "                {name} = {value}");
            }
        }
    }

    if let Some(view) = result.view_name() {
        let _ = writeln!(out, "          View: {view}");
    }
    if let Some(url) = result.forwarded_url() {
        let _ = writeln!(out, "     Forwarded: {url}");
    }
    if let Some(url) = result.redirected_url() {
        let _ = writeln!(out, "    Redirected: {url}");
    }

    out
}
