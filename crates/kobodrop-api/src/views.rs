//! HTML for the e-reader page.
//!
//! E-ink browsers get plain markup: black on white, large tap targets, no
//! scripts. Every interpolated value goes through [`escape_html`].

use kobodrop_services::{KoboPage, ListedFile};

const STYLE: &str = r#"
body { font-family: Georgia, serif; font-size: 18px; line-height: 1.5; margin: 0; padding: 16px; background: #fff; color: #000; }
h1 { font-size: 24px; margin: 0 0 16px 0; padding-bottom: 8px; border-bottom: 2px solid #000; }
h2 { font-size: 20px; margin: 24px 0 12px 0; }
a { color: #000; }
label { display: block; font-weight: bold; margin-bottom: 8px; }
input[type="text"] { width: 100%; max-width: 300px; padding: 12px; font-size: 24px; font-family: monospace; border: 3px solid #000; text-transform: uppercase; letter-spacing: 4px; box-sizing: border-box; }
input[type="submit"], .btn { display: inline-block; padding: 12px 24px; font-size: 18px; font-weight: bold; background: #000; color: #fff; border: 3px solid #000; text-decoration: none; margin-top: 12px; }
.file-item { padding: 16px; border: 2px solid #000; margin-bottom: 12px; }
.file-name { font-weight: bold; word-break: break-all; }
.file-size, .hint { font-size: 14px; margin-top: 4px; }
.file-ext { display: inline-block; font-family: monospace; font-size: 12px; font-weight: bold; background: #000; color: #fff; padding: 4px 8px; margin-bottom: 8px; }
.note { font-size: 12px; margin-top: 8px; }
.error { padding: 12px; border: 3px solid #000; font-weight: bold; margin: 16px 0; }
.empty { padding: 24px; text-align: center; border: 2px dashed #000; }
.footer { margin-top: 24px; padding-top: 12px; border-top: 2px solid #000; font-size: 14px; }
"#;

const NOT_FOUND_MESSAGE: &str = "Code not found or expired. Please check the code and try again.";
const UNAVAILABLE_MESSAGE: &str = "Something went wrong. Please try again.";
const LARGE_FILE_NOTE: &str = "Large file - will save with a long name.";

pub fn render_kobo_page(page: &KoboPage) -> String {
    match page {
        KoboPage::EntryForm => layout("Download Files", &entry_form()),
        KoboPage::InvalidCode { message } => layout("Error", &error_block(message)),
        KoboPage::NotFound { .. } => layout("Not Found", &error_block(NOT_FOUND_MESSAGE)),
        KoboPage::Unavailable => layout("Error", &error_block(UNAVAILABLE_MESSAGE)),
        KoboPage::Files { code, files } => {
            let list = if files.is_empty() {
                r#"<div class="empty">No files uploaded yet. Upload files from your computer first.</div>"#
                    .to_string()
            } else {
                files.iter().map(file_item).collect::<Vec<_>>().join("\n")
            };
            let content = format!(
                r#"<h1>Kobodrop</h1>
<p>Connected: <strong>{grouped}</strong></p>
<p><a href="/kobo">Disconnect</a> | <a href="/kobo?code={code}">Refresh</a></p>
<h2>Available Files</h2>
{list}"#,
                grouped = escape_html(&code.grouped()),
                code = escape_html(code.as_str()),
                list = list,
            );
            layout("Files", &content)
        }
    }
}

fn entry_form() -> String {
    r#"<h1>Kobodrop</h1>
<p>Enter the code shown on your computer to download files.</p>
<form method="GET" action="/kobo">
<label for="code">Pairing Code:</label>
<input type="text" id="code" name="code" maxlength="7" placeholder="ABC-123" autocomplete="off" required>
<p class="hint">Type with or without the hyphen</p>
<input type="submit" value="Connect">
</form>"#
        .to_string()
}

fn error_block(message: &str) -> String {
    format!(
        r#"<h1>Kobodrop</h1>
<div class="error">{}</div>
<p><a href="/kobo" class="btn">Try Again</a></p>"#,
        escape_html(message)
    )
}

fn file_item(file: &ListedFile) -> String {
    let note = if file.is_large {
        format!(r#"<p class="note">{}</p>"#, LARGE_FILE_NOTE)
    } else {
        String::new()
    };
    format!(
        r#"<div class="file-item">
<span class="file-ext">{badge}</span>
<div class="file-name">{name}</div>
<div class="file-size">{size}</div>
<a href="{href}" class="btn">Download</a>
{note}
</div>"#,
        badge = escape_html(&file.badge),
        name = escape_html(&file.name),
        size = escape_html(&file.size_label),
        href = escape_html(&file.href),
        note = note,
    )
}

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - Kobodrop</title>
<style>{style}</style>
</head>
<body>
{content}
<div class="footer"><a href="/kobo">Kobodrop</a></div>
</body>
</html>"#,
        title = escape_html(title),
        style = STYLE,
        content = content,
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
