//! Code snippets that reproduce a dispatch outside the dashboard

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dispatcher::{build_headers, build_url};
use crate::registry::{Endpoint, HttpMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Curl,
    Python,
    Javascript,
    Typescript,
}

/// Body of `POST /api/snippet`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetRequest {
    pub path: String,
    pub language: Language,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub language: Language,
    pub code: String,
}

/// Render the snippet for a registered endpoint
pub fn generate(
    base_url: &str,
    endpoint: &Endpoint,
    request: &SnippetRequest,
) -> crate::Result<Snippet> {
    let url = build_url(base_url, &endpoint.path, &request.query)?;
    let headers = build_headers(&request.headers);
    let body = request
        .body
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty());
    let post = endpoint.method == HttpMethod::Post;
    // Anything other than the sole default Content-Type counts as custom
    let has_content_type = headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
    let custom_headers = headers.len() > 1 || !has_content_type;

    let code = match request.language {
        Language::Curl => curl(&url, post, &headers, body),
        Language::Python => python(&url, endpoint.method, &headers, custom_headers, body)?,
        Language::Javascript => fetch(&url, post, &headers, custom_headers, body, "")?,
        Language::Typescript => fetch(&url, post, &headers, custom_headers, body, ": ApiResponse")?,
    };

    Ok(Snippet {
        language: request.language,
        code,
    })
}

fn curl(url: &str, post: bool, headers: &[(String, String)], body: Option<&str>) -> String {
    let mut cmd = if post {
        format!("curl -X POST \"{}\"", url)
    } else {
        format!("curl \"{}\"", url)
    };
    for (name, value) in headers {
        cmd.push_str(&format!(" \\\n  -H \"{}: {}\"", name, value));
    }
    if let (true, Some(body)) = (post, body) {
        cmd.push_str(&format!(" \\\n  -d '{}'", body));
    }
    cmd
}

fn python(
    url: &str,
    method: HttpMethod,
    headers: &[(String, String)],
    custom_headers: bool,
    body: Option<&str>,
) -> crate::Result<String> {
    let mut py = String::from("import requests\n\n");
    if custom_headers {
        py.push_str(&format!("headers = {}\n\n", headers_json(headers)?));
    }
    py.push_str(&format!(
        "res = requests.{}(\"{}\"",
        method.as_str().to_lowercase(),
        url
    ));
    if custom_headers {
        py.push_str(", headers=headers");
    }
    if method == HttpMethod::Post {
        py.push_str(&format!(", json={}", body.unwrap_or("{}")));
    }
    py.push_str(")\nprint(res.json())");
    Ok(py)
}

fn fetch(
    url: &str,
    post: bool,
    headers: &[(String, String)],
    custom_headers: bool,
    body: Option<&str>,
    annotation: &str,
) -> crate::Result<String> {
    let mut js = format!("const res = await fetch(\"{}\"", url);
    if post || custom_headers {
        js.push_str(", {\n");
        if post {
            js.push_str("  method: \"POST\",\n");
        }
        js.push_str(&format!(
            "  headers: {}",
            headers_json(headers)?.replace('\n', "\n  ")
        ));
        if post {
            js.push_str(&format!(
                ",\n  body: JSON.stringify({})",
                body.unwrap_or("{}")
            ));
        }
        js.push_str("\n}");
    }
    js.push_str(&format!(");\nconst data{} = await res.json();", annotation));
    Ok(js)
}

fn headers_json(headers: &[(String, String)]) -> crate::Result<String> {
    let map: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    Ok(serde_json::to_string_pretty(&map)?)
}
