// src/finder/chunks.rs
// =============================================================================
// Recovers bundler chunk file names that only exist at runtime.
//
// Webpack-style loaders build script URLs like
//
//   o.p+"chunks/"+({1:"todo"}[e]||e)+"."+{1:"d41d8cd98f00b204e980"}[e]+".js"
//
// so the real name ("chunks/todo.d41d8cd98f00b204e980.js") never appears as
// a literal. For every such expression we:
// 1. rebuild it as a tiny one-argument function (`js_compile`)
// 2. collect the keys of the inline lookup tables ({1:..., 2:...})
// 3. ask the script engine to run the function once per key
//
// Planning (steps 1 and 2) is pure and tested without a browser.
// =============================================================================

use crate::browser::ScriptEngine;
use crate::util::dedup;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

// Prefixes at or above this size are skipped (minified bundles can contain
// a `x.p+"` far away from the next ".js")
const MAX_PREFIX_LEN: usize = 30_000;

// The loader sets this up before appending chunk scripts
const CHUNK_LOADER_MARKER: &str = r#"document.createElement("script");"#;

static CHUNK_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\w\.p\+"(.*?)\.js"#).expect("valid chunk regex"));
static INDEX_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*?)\]").expect("valid index regex"));
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"));
static FALLBACK_IDIOM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\{\}\[(.*?)\]\|\|(.*?)\)").expect("valid fallback regex"));
static FIRST_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(.*?):").expect("valid key regex"));
static NEXT_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r",(.*?):").expect("valid key regex"));

// One evaluable chunk-name program and the arguments to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkProgram {
    pub program: String,
    pub keys: Vec<String>,
}

// Whether the source contains a chunk loader worth evaluating
pub fn has_chunk_loader(source: &str) -> bool {
    source.contains(CHUNK_LOADER_MARKER)
}

pub fn plan_chunks(source: &str) -> Vec<ChunkProgram> {
    CHUNK_PATH
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|prefix| prefix.as_str())
        .filter(|prefix| prefix.len() < MAX_PREFIX_LEN)
        .map(plan_one)
        .collect()
}

fn plan_one(prefix: &str) -> ChunkProgram {
    let expression = format!("\"{prefix}.js\"");

    let parameter = INDEX_VARIABLE
        .captures(&expression)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| IDENTIFIER.is_match(name))
        .unwrap_or_default();

    // ({}[e]||e) always evaluates to e
    let body = FALLBACK_IDIOM.replace_all(&expression, |caps: &Captures| {
        if caps[1] == caps[2] {
            caps[1].to_string()
        } else {
            caps[0].to_string()
        }
    });

    // Keys come from the stripped body so "{}[" cannot swallow the next table
    let keys = dedup(
        FIRST_KEY
            .captures_iter(&body)
            .chain(NEXT_KEY.captures_iter(&body))
            .map(|caps| caps[1].replace(['"', '\''], "").trim().to_string())
            .filter(|key| !key.is_empty()),
    );

    let program = format!("function js_compile({parameter}) {{ return {body}; }}");

    ChunkProgram { program, keys }
}

// Evaluates every planned program for every key.
//
// Keys that fail to evaluate, or evaluate to undefined, are skipped; the
// remaining keys of the same program are still tried.
pub async fn resolve_chunks<E: ScriptEngine>(source: &str, engine: &E) -> Vec<String> {
    let mut resolved = Vec::new();

    for chunk in plan_chunks(source) {
        for key in &chunk.keys {
            let argument = serde_json::Value::String(key.clone()).to_string();

            match engine.evaluate(&chunk.program, &argument).await {
                Ok(Some(value)) if !value.contains("undefined") => resolved.push(value),
                Ok(_) => debug!("chunk key {key} resolved to undefined"),
                Err(e) => debug!("chunk key {key} failed to evaluate: {e}"),
            }
        }
    }

    dedup(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::EvalError;
    use std::collections::HashMap;

    const LOADER: &str = r#"var c,u=document.createElement("script");u.charset="utf-8",u.timeout=120,o.nc&&u.setAttribute("nonce",o.nc),u.src=function(e){return o.p+"chunks/"+({1:"todo"}[e]||e)+"."+{1:"d41d8cd98f00b204e980"}[e]+".js"}(e),c=function(n){u.onerror=u.onload=null}"#;

    const EXPECTED_PROGRAM: &str = r#"function js_compile(e) { return "chunks/"+({1:"todo"}[e]||e)+"."+{1:"d41d8cd98f00b204e980"}[e]+".js"; }"#;

    // Answers evaluate() from a fixed table keyed by argument.
    // A missing argument is an evaluation error.
    struct TableEngine {
        answers: HashMap<&'static str, Option<&'static str>>,
    }

    impl ScriptEngine for TableEngine {
        async fn evaluate(&self, function: &str, argument: &str) -> Result<Option<String>, EvalError> {
            assert!(function.starts_with("function js_compile("));
            match self.answers.get(argument) {
                Some(answer) => Ok(answer.map(str::to_string)),
                None => Err(EvalError::Browser("ReferenceError".to_string())),
            }
        }

        async fn render(&self, _url: &str) -> Result<String, EvalError> {
            Err(EvalError::Browser("not supported".to_string()))
        }
    }

    #[test]
    fn test_plan_rebuilds_loader_expression() {
        assert!(has_chunk_loader(LOADER));

        let plans = plan_chunks(LOADER);
        assert_eq!(
            plans,
            vec![ChunkProgram {
                program: EXPECTED_PROGRAM.to_string(),
                keys: vec!["1".to_string()],
            }]
        );
    }

    #[test]
    fn test_plan_strips_empty_fallback_object() {
        let source = r#"a.p+"js/"+({}[t]||t)+"."+{0:"aa11",5:"bb22"}[t]+".js""#;
        let plans = plan_chunks(source);

        assert_eq!(plans.len(), 1);
        assert_eq!(
            plans[0].program,
            r#"function js_compile(t) { return "js/"+t+"."+{0:"aa11",5:"bb22"}[t]+".js"; }"#
        );
        assert_eq!(plans[0].keys, vec!["0", "5"]);
    }

    #[test]
    fn test_plan_skips_huge_prefix() {
        let source = format!(r#"a.p+"{}.js""#, "x".repeat(MAX_PREFIX_LEN));
        assert!(plan_chunks(&source).is_empty());
    }

    #[tokio::test]
    async fn test_resolve_yields_single_chunk() {
        let engine = TableEngine {
            answers: HashMap::from([("\"1\"", Some("chunks/todo.d41d8cd98f00b204e980.js"))]),
        };

        let links = resolve_chunks(LOADER, &engine).await;
        assert_eq!(links, vec!["chunks/todo.d41d8cd98f00b204e980.js"]);
    }

    #[tokio::test]
    async fn test_resolve_skips_failing_and_undefined_keys() {
        let source = r#"a.p+"js/"+{0:"aa11",5:"bb22",9:"cc33"}[t]+".js""#;
        let engine = TableEngine {
            answers: HashMap::from([
                // "0" is missing: evaluation error
                ("\"5\"", Some("js/bb22.js")),
                ("\"9\"", Some("js/undefined.js")),
            ]),
        };

        let links = resolve_chunks(source, &engine).await;
        assert_eq!(links, vec!["js/bb22.js"]);
    }

    #[tokio::test]
    #[ignore = "needs a local Chrome"]
    async fn test_resolve_with_real_browser() {
        use crate::browser::{ChromeEngine, ChromeOptions};
        use std::time::Duration;

        let engine = ChromeEngine::launch(&ChromeOptions {
            timeout: Duration::from_secs(10),
            proxy: None,
            user_agent: None,
        })
        .await
        .unwrap();

        let links = resolve_chunks(LOADER, &engine).await;
        assert_eq!(links, vec!["chunks/todo.d41d8cd98f00b204e980.js"]);
    }
}
