//! Pure HTML rendering of a response thread.
//!
//! Produces markup only; writing it anywhere is the orchestrator's job.

use chrono::{DateTime, Utc};

use crate::comments::CommentRecord;

const PAGE_STYLE: &str = "\
ul.responses { list-style: none; padding-left: 1.5em; }\n\
li.response { border: 1px dotted; margin: 0.5em 0; padding: 0.5em; }\n\
li.response header { font-family: Consolas, monaco, monospace; font-size: 12px; }\n\
li.response div.body { font-family: Georgia, serif; font-size: 14px; }\n";

/// A complete standalone page: heading linking back to the story, then the
/// nested thread.
pub fn page(title: &str, source_url: &str, thread: &[CommentRecord]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>Responses to {}</title>\n", escape(title)));
    out.push_str(&format!("<style>\n{PAGE_STYLE}</style>\n"));
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!(
        "<h1>Responses to <a href=\"{}\">{}</a></h1>\n",
        escape(source_url),
        escape(title)
    ));
    out.push_str(&comment_list(thread));
    out.push_str("</body>\n</html>\n");
    out
}

/// One level of the thread as an unbulleted list, recursing into replies.
pub fn comment_list(comments: &[CommentRecord]) -> String {
    let mut out = String::new();
    out.push_str("<ul class=\"responses\">\n");
    for comment in comments {
        render_comment(&mut out, comment);
    }
    out.push_str("</ul>\n");
    out
}

fn render_comment(out: &mut String, comment: &CommentRecord) {
    out.push_str("<li class=\"response\">\n<header>\n");
    out.push_str(&format!(
        "<address><a href=\"{}\">{}</a></address>\n",
        escape(&comment.url),
        escape(&comment.author)
    ));
    out.push_str(&format!(
        "<time>{}</time>\n</header>\n",
        published_label(comment.published_at)
    ));

    out.push_str("<div class=\"body\">\n");
    for paragraph in &comment.paragraphs {
        out.push_str(&format!("<p>{}</p>\n", escape(paragraph)));
    }
    out.push_str("</div>\n");

    if !comment.children.is_empty() {
        out.push_str(&comment_list(&comment.children));
    }
    out.push_str("</li>\n");
}

/// en-US short date label, e.g. `Tue, Jan 1, 2019`.
pub fn published_label(at: DateTime<Utc>) -> String {
    at.format("%a, %b %-d, %Y").to_string()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
