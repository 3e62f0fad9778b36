//! HTML pages.
//!
//! Pages are plain server-rendered HTML; the staff area's data is served by the JSON
//! API in [`crate::api`].

pub mod home;
pub mod login;
pub mod staff;

pub use home::home_page;
pub use login::login_page;
pub use staff::staff_dashboard;

use axum::response::Html;

/// Wraps a body fragment in the shared document shell.
fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\"/>\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\n\
         <title>{} | Tatame</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    ))
}

/// Escapes text for use inside HTML element content or attribute values.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_handles_markup() {
        assert_eq!(
            escape(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }
}
