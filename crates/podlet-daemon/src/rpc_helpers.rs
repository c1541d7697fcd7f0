//! RPC parameter extraction macros
//!
//! Reduces boilerplate in RPC handlers by providing macros for extracting
//! and validating JSON-RPC parameters.
//!
//! These macros use `#[macro_export]` for availability across the crate.
//! They return early with error responses when parameters are missing or invalid.

/// Extract a required string parameter from a request.
///
/// Returns the parameter value as `&str`, or returns early with an error Response
/// if the parameter is missing or not a string.
///
/// # Example
///
/// ```ignore
/// let name = require_str_param!(req, "name");
/// // `name` is now &str, or function returned early with error
/// ```
#[macro_export]
macro_rules! require_str_param {
    ($req:expr, $name:literal) => {
        match $req.params.get($name).and_then(|v| v.as_str()) {
            Some(v) => v,
            None => {
                return podlet_protocol::Response::error(
                    $req.id.clone(),
                    podlet_protocol::INVALID_PARAMS,
                    concat!("Missing or invalid '", $name, "' parameter"),
                )
            }
        }
    };
}

/// Extract an optional array-of-strings parameter from a request.
///
/// Returns `Vec<String>`, empty when the parameter is absent. Returns early
/// with an error Response if the parameter is present but not an array of
/// strings.
///
/// # Example
///
/// ```ignore
/// let args = str_array_param!(req, "args");
/// // `args` is Vec<String>, or function returned early with error
/// ```
#[macro_export]
macro_rules! str_array_param {
    ($req:expr, $name:literal) => {
        match $req.params.get($name) {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(value) => match value.as_array().map(|items| {
                items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<String>>>()
            }) {
                Some(Some(strings)) => strings,
                _ => {
                    return podlet_protocol::Response::error(
                        $req.id.clone(),
                        podlet_protocol::INVALID_PARAMS,
                        concat!("Parameter '", $name, "' must be an array of strings"),
                    )
                }
            },
        }
    };
}

#[cfg(test)]
mod tests {
    use podlet_protocol::{Request, Response, INVALID_PARAMS};
    use serde_json::json;

    fn request(params: serde_json::Value) -> Request {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "test",
            "params": params,
        }))
        .unwrap()
    }

    fn extract_name(req: &Request) -> Response {
        let name = require_str_param!(req, "name");
        Response::success(req.id.clone(), name)
    }

    fn extract_args(req: &Request) -> Response {
        let args = str_array_param!(req, "args");
        Response::success(req.id.clone(), json!({ "count": args.len() }))
    }

    #[test]
    fn require_str_param_extracts_value() {
        let req = request(json!({ "name": "lens" }));
        let resp = extract_name(&req);
        assert_eq!(resp.result, Some(json!("lens")));
    }

    #[test]
    fn require_str_param_rejects_missing() {
        let req = request(json!({}));
        let resp = extract_name(&req);
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn require_str_param_rejects_wrong_type() {
        let req = request(json!({ "name": 42 }));
        let resp = extract_name(&req);
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn str_array_param_defaults_to_empty() {
        let req = request(json!({}));
        let resp = extract_args(&req);
        assert_eq!(resp.result, Some(json!({ "count": 0 })));
    }

    #[test]
    fn str_array_param_extracts_strings() {
        let req = request(json!({ "args": ["--a", "--b"] }));
        let resp = extract_args(&req);
        assert_eq!(resp.result, Some(json!({ "count": 2 })));
    }

    #[test]
    fn str_array_param_rejects_mixed_array() {
        let req = request(json!({ "args": ["--a", 3] }));
        let resp = extract_args(&req);
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }
}
