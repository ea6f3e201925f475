//! Structural route and guard matching
//!
//! Recognizes decorator-style route registrations and their attached
//! authorization guards without a full language grammar. Matching is
//! line-oriented and deterministic: the same file content always produces
//! the same descriptors in the same order.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use sentinel_core::config::ExtractionConfig;
use sentinel_core::domain::{DYNAMIC_PATH, Endpoint, ParamDescriptor};

/// Route decorator with a string-literal path: `@router.get("/orders/{id}")`
static ROUTE_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*@(\w+)\.(get|post|put|delete|patch|options|head)\(\s*(?:"([^"]*)"|'([^']*)')"#,
    )
    .expect("route literal pattern")
});

/// Route decorator whose first argument is not a string literal; the path
/// template cannot be resolved statically
static ROUTE_DYNAMIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*@(\w+)\.(get|post|put|delete|patch|options|head)\(\s*[^"'\s)]"#)
        .expect("route dynamic pattern")
});

/// Handler definition following the decorator block
static HANDLER_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(?:async\s+)?def\s+(\w+)\s*\(").expect("handler pattern"));

/// Dependency-injected guard: `Depends(verify_token)`
static DEPENDS_GUARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Depends\(\s*([A-Za-z_]\w*)\s*\)").expect("depends pattern"));

/// Decorator-level dependency list: `dependencies=[Depends(a), Depends(b)]`
static DECORATOR_DEPENDENCIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"dependencies\s*=\s*\[([^\]]*)\]").expect("dependencies pattern"));

/// How many lines past a route decorator the handler `def` may appear
/// (stacked decorators in between are common)
const MAX_DECORATOR_DISTANCE: usize = 12;

/// Cap on captured handler source submitted to inference backends
const MAX_HANDLER_LINES: usize = 80;

/// One route match within a single file, before normalization
#[derive(Debug)]
pub struct RouteMatch {
    pub method: String,
    pub path_template: String,
    pub handler_name: String,
    pub declared_guards: BTreeSet<String>,
    pub parameters: Vec<ParamDescriptor>,
    pub handler_source: String,
    pub line: usize,
}

/// Scan one file for route registrations.
///
/// Routes whose guard forms are not recognized come back with an empty
/// guard set; routes whose path is built dynamically come back with
/// [`DYNAMIC_PATH`]. Neither condition is an error.
pub fn match_routes(content: &str, config: &ExtractionConfig) -> Vec<RouteMatch> {
    let lines: Vec<&str> = content.lines().collect();
    let mut matches = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let path = if let Some(caps) = ROUTE_LITERAL.captures(lines[i]) {
            let literal = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Some((caps[2].to_uppercase(), literal))
        } else if let Some(caps) = ROUTE_DYNAMIC.captures(lines[i]) {
            Some((caps[2].to_uppercase(), DYNAMIC_PATH.to_string()))
        } else {
            None
        };

        let Some((method, path_template)) = path else {
            i += 1;
            continue;
        };

        // Guards may be declared on the decorator itself
        let decorator_block = collect_decorator_block(&lines, i);
        let mut guards = decorator_guards(&decorator_block, config);

        // Find the handler definition below the decorator block
        let Some((def_idx, indent, handler_name)) = find_handler(&lines, i) else {
            // Decorator without a handler is not a route
            i += 1;
            continue;
        };

        let signature = collect_signature(&lines, def_idx);
        let parameters = parse_parameters(&signature);
        guards.extend(signature_guards(&signature, config));

        let handler_source = capture_handler_source(&lines, i, def_idx, &indent);

        matches.push(RouteMatch {
            method,
            path_template,
            handler_name,
            declared_guards: guards,
            parameters,
            handler_source,
            line: i + 1,
        });

        i = def_idx + 1;
    }

    matches
}

/// Normalize file matches into endpoint descriptors
pub fn into_endpoints(
    repo_id: &str,
    revision_sha: &str,
    file_path: &str,
    matches: Vec<RouteMatch>,
) -> Vec<Endpoint> {
    matches
        .into_iter()
        .map(|m| Endpoint {
            repo_id: repo_id.to_string(),
            revision_sha: revision_sha.to_string(),
            method: m.method,
            path_template: m.path_template,
            handler_name: m.handler_name,
            file_path: file_path.to_string(),
            declared_guards: m.declared_guards,
            parameters: m.parameters,
            handler_source: m.handler_source,
        })
        .collect()
}

fn collect_decorator_block(lines: &[&str], start: usize) -> String {
    collect_balanced(lines, start, MAX_DECORATOR_DISTANCE)
}

fn find_handler(lines: &[&str], decorator_idx: usize) -> Option<(usize, String, String)> {
    for (offset, line) in lines
        .iter()
        .enumerate()
        .skip(decorator_idx + 1)
        .take(MAX_DECORATOR_DISTANCE)
    {
        if let Some(caps) = HANDLER_DEF.captures(line) {
            return Some((offset, caps[1].to_string(), caps[2].to_string()));
        }
    }
    None
}

/// Collect the full `def` signature, which may span multiple lines
fn collect_signature(lines: &[&str], def_idx: usize) -> String {
    collect_balanced(lines, def_idx, MAX_HANDLER_LINES)
}

/// Accumulate lines until every opened bracket is closed again
fn collect_balanced(lines: &[&str], start: usize, max_lines: usize) -> String {
    let mut collected = String::new();
    let mut depth = 0i32;
    let mut opened = false;
    for line in lines.iter().skip(start).take(max_lines) {
        collected.push_str(line);
        collected.push('\n');
        for ch in line.chars() {
            match ch {
                '(' | '[' | '{' => {
                    depth += 1;
                    opened = true;
                }
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            break;
        }
    }
    collected
}

/// Parse parameter descriptors out of a handler signature.
///
/// Splits the argument list at top-level commas; each parameter is
/// `name[: type_hint][= default]`.
fn parse_parameters(signature: &str) -> Vec<ParamDescriptor> {
    let Some(open) = signature.find('(') else {
        return Vec::new();
    };
    let args = balanced_slice(&signature[open..]);

    let mut params = Vec::new();
    for raw in split_top_level(args, ',') {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" || raw.starts_with('*') {
            continue;
        }
        let before_default = raw.split('=').next().unwrap_or(raw);
        let mut pieces = before_default.splitn(2, ':');
        let name = pieces.next().unwrap_or("").trim().to_string();
        if name.is_empty() || !name.chars().next().is_some_and(unicode_ident_start) {
            continue;
        }
        let type_hint = pieces
            .next()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        params.push(ParamDescriptor { name, type_hint });
    }
    params
}

fn unicode_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Contents between the first `(` and its matching `)`
fn balanced_slice(text: &str) -> &str {
    let mut depth = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return &text[1..idx];
                }
            }
            _ => {}
        }
    }
    &text[1.min(text.len())..]
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == separator && depth == 0 => {
                pieces.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Guards declared on the decorator itself via a dependency list
fn decorator_guards(decorator_block: &str, config: &ExtractionConfig) -> BTreeSet<String> {
    let mut guards = BTreeSet::new();
    if let Some(caps) = DECORATOR_DEPENDENCIES.captures(decorator_block) {
        guards.extend(known_depends(&caps[1], config));
    }
    guards
}

/// Guards injected through handler parameter defaults
fn signature_guards(signature: &str, config: &ExtractionConfig) -> BTreeSet<String> {
    known_depends(signature, config)
}

/// `Depends(name)` occurrences whose target matches a known guard
/// signature. Anything else is an unrecognized guard form and contributes
/// nothing, by design of the fail-open per-route rule.
fn known_depends(text: &str, config: &ExtractionConfig) -> BTreeSet<String> {
    DEPENDS_GUARD
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .filter(|name| config.known_guards.iter().any(|g| g == name))
        .collect()
}

fn capture_handler_source(
    lines: &[&str],
    decorator_idx: usize,
    def_idx: usize,
    def_indent: &str,
) -> String {
    let mut captured = Vec::new();
    for (offset, line) in lines.iter().enumerate().skip(decorator_idx) {
        if captured.len() >= MAX_HANDLER_LINES {
            break;
        }
        // Stop at the next sibling definition after the handler body began
        if offset > def_idx
            && !line.trim().is_empty()
            && indent_of(line).len() <= def_indent.len()
            && (line.trim_start().starts_with("def ")
                || line.trim_start().starts_with("async def ")
                || line.trim_start().starts_with('@')
                || line.trim_start().starts_with("class "))
        {
            break;
        }
        captured.push(*line);
    }
    captured.join("\n")
}

fn indent_of(line: &str) -> &str {
    let end = line.len() - line.trim_start().len();
    &line[..end]
}
