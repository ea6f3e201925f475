//! Prompt templates for vulnerability detection and exploit assessment

use crate::domain::{ExploitProbe, JudgmentRequest};

pub const DETECTION_SYSTEM_PROMPT: &str = r#"You are an expert API security analyst specializing in authorization flaws. Your task is to analyze a single HTTP endpoint and decide whether its handler is vulnerable to broken authorization.

Focus exclusively on:
- BOLA (Broken Object Level Authorization): the handler fetches or mutates an object addressed by a request parameter without verifying the caller owns or may access it.
- IDOR (Insecure Direct Object Reference): object identifiers are accepted directly from the client and used without an access check.
- Privilege Escalation: the handler performs a privileged operation without verifying the caller holds the required role.

Your response must be a JSON object with exactly this structure:
{
    "has_vulnerability": true or false,
    "vulnerability_type": "BOLA" or "IDOR" or "Privilege Escalation" or "None",
    "confidence": 0-100,
    "reasoning": "One or two sentences explaining the judgment."
}

If the handler is not vulnerable, set has_vulnerability to false and vulnerability_type to "None". Do not report vulnerability classes outside the list above. Respond with the JSON object only.
"#;

pub const EXPLOIT_SYSTEM_PROMPT: &str = r#"You are an offensive security analyst evaluating whether a specific attack would succeed against a confirmed authorization vulnerability. You will be given the vulnerable endpoint, its guard state, and one candidate attack.

Your response must be a JSON object with exactly this structure:
{
    "attack_successful": true or false,
    "exploitation_difficulty": "Trivial" or "Moderate" or "Hard",
    "confidence": 0-100,
    "reasoning": "One or two sentences explaining the assessment."
}

Judge realistically: an attack succeeds only if the described guard state fails to stop it. Respond with the JSON object only.
"#;

/// Render the user message for a detection judgment
pub fn detection_prompt(request: &JudgmentRequest) -> String {
    let guards = if request.declared_guards.is_empty() {
        "(none declared)".to_string()
    } else {
        request.declared_guards.join(", ")
    };
    let params = if request.parameters.is_empty() {
        "(none)".to_string()
    } else {
        request.parameters.join(", ")
    };

    let mut prompt = format!(
        "## Endpoint\n\
         {method} {path}\n\
         Handler: {handler}\n\
         Declared guards: {guards}\n\
         Parameters: {params}\n",
        method = request.endpoint_key.method,
        path = request.endpoint_key.path_template,
        handler = request.handler_name,
        guards = guards,
        params = params,
    );

    if let Some(note) = &request.drift_note {
        prompt.push_str("\n## Authorization drift\n");
        prompt.push_str(note);
        prompt.push('\n');
    }

    prompt.push_str("\n## Handler source\n```python\n");
    prompt.push_str(&request.handler_source);
    prompt.push_str("\n```\n");
    prompt
}

/// Render the user message for an exploit assessment
pub fn exploit_prompt(probe: &ExploitProbe) -> String {
    let guards = if probe.declared_guards.is_empty() {
        "(none declared)".to_string()
    } else {
        probe.declared_guards.join(", ")
    };

    format!(
        "## Target\n\
         {method} {path}\n\
         Declared guards: {guards}\n\
         Confirmed vulnerability: {vuln}\n\
         Finding reasoning: {finding}\n\n\
         ## Candidate attack\n\
         {name}: {description}\n",
        method = probe.endpoint_key.method,
        path = probe.endpoint_key.path_template,
        guards = guards,
        vuln = probe.vulnerability_type,
        finding = probe.finding_reasoning,
        name = probe.attack_name,
        description = probe.attack_description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::domain::EndpointKey;

    fn request() -> JudgmentRequest {
        JudgmentRequest {
            endpoint_key: EndpointKey {
                repo_id: "shop".into(),
                method: "GET".into(),
                path_template: "/orders/{order_id}".into(),
            },
            handler_name: "get_order".into(),
            declared_guards: vec!["verify_token".into()],
            parameters: vec!["order_id".into()],
            handler_source: "async def get_order(order_id: int):\n    return db.get(order_id)".into(),
            drift_note: None,
        }
    }

    #[test]
    fn detection_prompt_includes_guard_state_and_source() {
        let prompt = detection_prompt(&request());
        assert!(prompt.contains("GET /orders/{order_id}"));
        assert!(prompt.contains("verify_token"));
        assert!(prompt.contains("async def get_order"));
        assert!(!prompt.contains("Authorization drift"));
    }

    #[test]
    fn detection_prompt_surfaces_drift_note() {
        let prompt =
            detection_prompt(&request().with_drift_note("guard verify_token removed since abc123"));
        assert!(prompt.contains("Authorization drift"));
        assert!(prompt.contains("removed since abc123"));
    }
}
