//! Locally synthesized responses for when neither network nor cache can
//! answer.

use m360_core::Response;

/// Self-contained page served for a navigation that failed with nothing
/// cached. References no external resources.
pub const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <title>Offline - Monastery360</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
      body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        text-align: center;
        padding: 50px 20px;
        background: linear-gradient(135deg, #1a1a2e, #16213e);
        color: white;
        min-height: 90vh;
        display: flex;
        align-items: center;
        justify-content: center;
      }
      .offline-container { max-width: 400px; }
      .icon { font-size: 64px; margin-bottom: 20px; }
      h1 { color: #ff6b35; margin-bottom: 20px; }
      p { color: #ccc; line-height: 1.6; margin-bottom: 30px; }
      button {
        background: #ff6b35;
        color: white;
        border: none;
        padding: 12px 24px;
        border-radius: 25px;
        cursor: pointer;
        margin: 0 8px;
        font-weight: 600;
      }
      button:hover { background: #e55a2d; }
    </style>
  </head>
  <body>
    <div class="offline-container">
      <div class="icon">&#127963;</div>
      <h1>You're Offline</h1>
      <p>You're currently offline, but you can still browse cached monastery content and explore the features you've already visited.</p>
      <button id="retry" onclick="window.location.reload()">Try Again</button>
      <button id="back" onclick="window.history.back()">Go Back</button>
    </div>
  </body>
</html>
"#;

fn header(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

/// The offline page: 200, `text/html`, `no-cache`.
pub fn offline_page() -> Response {
    Response::new(
        200,
        vec![header("Content-Type", "text/html"), header("Cache-Control", "no-cache")],
        OFFLINE_PAGE,
    )
}

/// Empty-object JSON so maps callers can parse it as "no data".
pub fn empty_json() -> Response {
    Response::new(200, vec![header("Content-Type", "application/json")], "{}")
}

pub fn not_found() -> Response {
    Response::new(404, Vec::new(), "")
}

pub fn service_unavailable() -> Response {
    Response::new(503, vec![header("Content-Type", "text/plain")], "Service Unavailable")
}
