// src/error_pages.rs
// Self-contained HTML bodies for enforcement responses. No external
// assets; one document per status code.

/// 451 page for region-restricted media. The requester country is echoed
/// only when it is a clean two-letter code; anything else is dropped
/// rather than reflected into the page.
pub fn render_legal_block_page(reason: &str, country: &str) -> String {
    let region = match clean_country(country) {
        Some(cc) => format!(" (<span class=\"code\">{}</span>)", cc),
        None => String::new(),
    };
    let reason = if reason.is_empty() {
        "Legal compliance requirement"
    } else {
        reason
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>451 Unavailable For Legal Reasons</title>
  <style>
    body {{
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
      margin: 0;
      padding: 40px 20px;
      background: #f9fafb;
      color: #1f2937;
      text-align: center;
    }}
    .container {{
      max-width: 600px;
      margin: 0 auto;
      background: white;
      border-radius: 12px;
      padding: 40px;
      box-shadow: 0 1px 3px rgba(0,0,0,0.1);
    }}
    h1 {{
      font-size: 48px;
      margin: 0 0 16px;
      color: #dc2626;
    }}
    h2 {{
      font-size: 24px;
      margin: 0 0 24px;
      font-weight: 500;
    }}
    p {{
      line-height: 1.6;
      color: #4b5563;
      margin: 0 0 32px;
    }}
    .code {{
      font-family: ui-monospace, SFMono-Regular, Menlo, Monaco, monospace;
      background: #f3f4f6;
      padding: 4px 8px;
      border-radius: 4px;
      font-size: 14px;
    }}
    .footer {{
      margin-top: 40px;
      padding-top: 32px;
      border-top: 1px solid #e5e7eb;
      font-size: 14px;
      color: #6b7280;
    }}
  </style>
</head>
<body>
  <div class="container">
    <h1>451</h1>
    <h2>Unavailable For Legal Reasons</h2>
    <p>This content is not available in your region{region} due to legal restrictions.</p>
    <p><strong>Reason:</strong> {reason}</p>
    <div class="footer">
      <p>This restriction is based on your geographic location as determined by your IP address.</p>
      <p>If you believe this is an error, please contact support.</p>
    </div>
  </div>
</body>
</html>"#,
        region = region,
        reason = reason
    )
}

/// 410 page for globally removed media.
pub fn render_removed_page(reason: &str) -> String {
    let reason = if reason.is_empty() {
        "Content policy violation"
    } else {
        reason
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>410 Gone</title>
  <style>
    body {{
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
      margin: 0;
      padding: 40px 20px;
      background: #f9fafb;
      color: #1f2937;
      text-align: center;
    }}
    .container {{
      max-width: 600px;
      margin: 0 auto;
      background: white;
      border-radius: 12px;
      padding: 40px;
      box-shadow: 0 1px 3px rgba(0,0,0,0.1);
    }}
    h1 {{
      font-size: 48px;
      margin: 0 0 16px;
      color: #7c3aed;
    }}
    h2 {{
      font-size: 24px;
      margin: 0 0 24px;
      font-weight: 500;
    }}
    p {{
      line-height: 1.6;
      color: #4b5563;
      margin: 0 0 32px;
    }}
    .footer {{
      margin-top: 40px;
      padding-top: 32px;
      border-top: 1px solid #e5e7eb;
      font-size: 14px;
      color: #6b7280;
    }}
  </style>
</head>
<body>
  <div class="container">
    <h1>410</h1>
    <h2>Content Removed</h2>
    <p>This content has been permanently removed and is no longer available.</p>
    <p><strong>Reason:</strong> {reason}</p>
    <div class="footer">
      <p>This content has been removed in accordance with our content policies or legal requirements.</p>
    </div>
  </div>
</body>
</html>"#,
        reason = reason
    )
}

/// Minimal page for any status the evaluator does not produce today.
pub fn render_fallback_page(code: u16, reason: &str) -> String {
    format!(
        r#"<!doctype html><meta charset="utf-8"><title>{code}</title><h1>{code}</h1><p>{reason}</p>"#,
        code = code,
        reason = reason
    )
}

fn clean_country(country: &str) -> Option<String> {
    let trimmed = country.trim();
    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        None
    }
}
