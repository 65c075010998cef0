// src/browser/mod.rs
// =============================================================================
// The browser-evaluation collaborator.
//
// Two jobs need a real JavaScript engine:
// - evaluating small generated programs that rebuild bundler chunk names
// - rendering pages whose links only exist after client-side scripts ran
//
// The crawler depends on the `ScriptEngine` trait only. `ChromeEngine`
// (chrome.rs) drives a headless Chrome over the DevTools protocol.
// =============================================================================

mod chrome;

use std::future::Future;
use thiserror::Error;

pub use chrome::{ChromeEngine, ChromeOptions};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("browser call timed out")]
    Timeout,
}

pub trait ScriptEngine: Send + Sync + 'static {
    // Applies `function` (JavaScript function source) to `argument` (a
    // JavaScript literal) in a fresh, isolated context.
    //
    // Ok(None) = the call produced undefined or null.
    fn evaluate(
        &self,
        function: &str,
        argument: &str,
    ) -> impl Future<Output = Result<Option<String>, EvalError>> + Send;

    // Navigates to `url` and returns the rendered DOM as HTML
    fn render(&self, url: &str) -> impl Future<Output = Result<String, EvalError>> + Send;
}

// Builds the expression that applies a function source to one argument
pub(crate) fn call_expression(function: &str, argument: &str) -> String {
    format!("({function})({argument})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_expression() {
        assert_eq!(
            call_expression("function f(e) { return e; }", "\"1\""),
            "(function f(e) { return e; })(\"1\")"
        );
    }
}
