//! Markdown-to-HTML formatting for the blog platform.
//!
//! Converts the generated markdown body into mobile-friendly HTML: featured
//! image block, italic excerpt, h2/h3 headings, bullet lists, escaped
//! paragraphs.

const MOBILE_CSS: &str = "<style>\n\
@media (max-width: 768px) {\n\
    .featured-image img { max-width: 100% !important; }\n\
    h2 { font-size: 1.5em; }\n\
    h3 { font-size: 1.3em; }\n\
    p, li { font-size: 1.1em; line-height: 1.6; }\n\
}\n\
</style>\n";

/// Render the publishable HTML document body.
pub fn format_content(body: &str, image_url: Option<&str>, excerpt: Option<&str>) -> String {
    let mut html = String::from(MOBILE_CSS);

    if let Some(url) = image_url {
        html.push_str(&format!(
            "<div class=\"featured-image\"><img src=\"{}\" alt=\"Featured Image\" \
             style=\"width:100%; max-width:800px; height:auto; border-radius:8px;\"></div>\n\n",
            escape(url)
        ));
    }

    if let Some(excerpt) = excerpt {
        html.push_str(&format!(
            "<p class=\"article-excerpt\" style=\"font-style: italic; color: #666; \
             font-size: 1.1em;\">{}</p>\n\n",
            escape(excerpt)
        ));
    }

    let mut in_list = false;
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let is_list_item = line.starts_with("- ") || line.starts_with("* ");
        if in_list && !is_list_item {
            html.push_str("</ul>\n\n");
            in_list = false;
        }

        if let Some(heading) = line.strip_prefix("### ") {
            html.push_str(&format!("<h3>{}</h3>\n\n", escape(heading.trim())));
        } else if let Some(heading) = line.strip_prefix("## ") {
            html.push_str(&format!("<h2>{}</h2>\n\n", escape(heading.trim())));
        } else if let Some(heading) = line.strip_prefix("# ") {
            html.push_str(&format!("<h2>{}</h2>\n\n", escape(heading.trim())));
        } else if is_list_item {
            if !in_list {
                html.push_str("<ul>\n");
                in_list = true;
            }
            html.push_str(&format!("<li>{}</li>\n", escape(line[2..].trim())));
        } else {
            html.push_str(&format!("<p>{}</p>\n\n", escape(line)));
        }
    }
    if in_list {
        html.push_str("</ul>\n\n");
    }

    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
