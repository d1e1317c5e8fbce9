//! The submission-script resource-request encoding.
//!
//! The submission script is a semi-structured artifact: somewhere in its
//! text sits the adjacent token pair `-t <minutes> -p <class>`, which is
//! the persistence layer for "what was last requested". Parsing validates
//! that the pair exists; rewriting replaces the first occurrence in place
//! and leaves the rest of the script untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

static RESOURCE_REQUEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-t ([0-9]+) -p ([A-Za-z0-9_-]+)").unwrap());

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("no `-t <minutes> -p <class>` request found in submission script")]
    MissingRequest,
    #[error("runtime in submission script is not a valid minute count: {0}")]
    BadRuntime(String),
}

/// The two required fields of the submission-script encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub runtime_minutes: u64,
    pub queue_class: String,
}

impl fmt::Display for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-t {} -p {}", self.runtime_minutes, self.queue_class)
    }
}

/// Parse the resource request out of submission-script text.
pub fn parse_resource_request(script: &str) -> Result<ResourceRequest, ScriptError> {
    let caps = RESOURCE_REQUEST
        .captures(script)
        .ok_or(ScriptError::MissingRequest)?;
    let runtime_minutes = caps[1]
        .parse()
        .map_err(|_| ScriptError::BadRuntime(caps[1].to_string()))?;
    Ok(ResourceRequest {
        runtime_minutes,
        queue_class: caps[2].to_string(),
    })
}

/// Replace the first resource request in `script` with `new`.
pub fn replace_resource_request(
    script: &str,
    new: &ResourceRequest,
) -> Result<String, ScriptError> {
    let m = RESOURCE_REQUEST
        .find(script)
        .ok_or(ScriptError::MissingRequest)?;
    let mut out = String::with_capacity(script.len());
    out.push_str(&script[..m.start()]);
    out.push_str(&new.to_string());
    out.push_str(&script[m.end()..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "#!/bin/sh\n\
        vigil submit -J align -t 1000 -p medium -n 4 --mem 8192 \
        -o out -e err script.sh\n";

    #[test]
    fn test_parse_resource_request() {
        let req = parse_resource_request(SCRIPT).unwrap();
        assert_eq!(req.runtime_minutes, 1000);
        assert_eq!(req.queue_class, "medium");
    }

    #[test]
    fn test_parse_missing_request() {
        let result = parse_resource_request("#!/bin/sh\necho hello\n");
        assert!(matches!(result, Err(ScriptError::MissingRequest)));
    }

    #[test]
    fn test_replace_resource_request() {
        let new = ResourceRequest {
            runtime_minutes: 1500,
            queue_class: "medium".to_string(),
        };
        let rewritten = replace_resource_request(SCRIPT, &new).unwrap();
        assert!(rewritten.contains("-t 1500 -p medium"));
        assert!(!rewritten.contains("-t 1000"));
        // Everything around the request survives.
        assert!(rewritten.contains("-J align"));
        assert!(rewritten.contains("--mem 8192"));
    }

    #[test]
    fn test_replace_only_first_occurrence() {
        let script = "-t 10 -p short\n-t 10 -p short\n";
        let new = ResourceRequest {
            runtime_minutes: 15,
            queue_class: "short".to_string(),
        };
        let rewritten = replace_resource_request(script, &new).unwrap();
        assert_eq!(rewritten, "-t 15 -p short\n-t 10 -p short\n");
    }

    #[test]
    fn test_display_renders_token_pair() {
        let req = ResourceRequest {
            runtime_minutes: 720,
            queue_class: "short".to_string(),
        };
        assert_eq!(req.to_string(), "-t 720 -p short");
    }
}
