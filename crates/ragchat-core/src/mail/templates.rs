//! Message bodies for outgoing mail.
//!
//! Every user-supplied value is HTML-escaped before it is placed in markup.

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:'Segoe UI',Tahoma,Verdana,sans-serif;background:#f4f5fb;padding:32px 16px;margin:0}\
.card{max-width:600px;margin:0 auto;background:#fff;border-radius:16px;overflow:hidden;box-shadow:0 8px 30px rgba(0,0,0,.12)}\
.head{background:linear-gradient(135deg,#667eea,#764ba2);color:#fff;padding:32px 24px;text-align:center}\
.head h1{margin:0 0 8px;font-size:26px}\
.body{padding:32px 24px;color:#444;line-height:1.7}\
.field{background:#f8f9fa;border-left:4px solid #667eea;padding:16px;margin:16px 0;border-radius:6px}\
.field h3{margin:0 0 6px;font-size:13px;text-transform:uppercase;letter-spacing:1px;color:#333}\
.message{white-space:pre-wrap}\
.foot{background:#f8f9fa;padding:20px;text-align:center;color:#999;font-size:13px}";

fn page(title: &str, header: &str, body: &str, footer: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"card\">\n<div class=\"head\">{header}</div>\n<div class=\"body\">{body}</div>\n<div class=\"foot\">{footer}</div>\n</div>\n</body>\n</html>\n"
    )
}

/// Subject line for a discussion request delivered to the team.
pub fn discussion_subject(subject: &str) -> String {
    format!("[Discussion] {}", single_line(subject))
}

/// HTML body of a discussion request delivered to the team.
pub fn discussion_html(user_name: &str, user_email: &str, subject: &str, message: &str) -> String {
    let name = escape_html(user_name);
    let email = escape_html(user_email);
    let subject = escape_html(subject);
    let message = escape_html(message);
    let body = format!(
        "<div class=\"field\"><h3>From</h3><p><strong>{name}</strong><br>{email}</p></div>\
<div class=\"field\"><h3>Subject</h3><p><strong>{subject}</strong></p></div>\
<div class=\"field\"><h3>Message</h3><p class=\"message\">{message}</p></div>\
<p>Reply to <a href=\"mailto:{email}\">{email}</a> to continue the conversation.</p>"
    );
    page(
        "New Discussion Request",
        "<h1>New Discussion Request</h1><p>Someone wants to connect with you.</p>",
        &body,
        "Sent by the DSA RAG Chatbot discussion form",
    )
}

/// Plain-text alternative of [`discussion_html`].
pub fn discussion_text(user_name: &str, user_email: &str, subject: &str, message: &str) -> String {
    format!(
        "New Discussion Request from {user_name} ({user_email})\n\nSubject: {subject}\n\nMessage:\n{message}"
    )
}

/// Subject line of the confirmation sent back to the requester.
pub const CONFIRMATION_SUBJECT: &str = "We received your message! 🎉";

/// HTML body of the confirmation sent back to the requester.
pub fn confirmation_html(user_name: &str, subject: &str) -> String {
    let name = escape_html(user_name);
    let subject = escape_html(subject);
    let body = format!(
        "<h2>Thank you, {name}! 🎉</h2>\
<p>We have received your message about \"<strong>{subject}</strong>\" and will get back to you soon.</p>\
<p>The team usually replies within 24-48 hours.</p>\
<p>Keep learning and coding! 💻</p>"
    );
    page(
        "Message Received",
        "<h1>Message Received!</h1>",
        &body,
        "DSA RAG Chatbot Team",
    )
}

/// Plain-text alternative of [`confirmation_html`].
pub fn confirmation_text(user_name: &str, subject: &str) -> String {
    format!(
        "Thank you, {user_name}!\n\nWe have received your message about \"{subject}\" and will get back to you soon. The team usually replies within 24-48 hours.\n\nDSA RAG Chatbot Team"
    )
}

/// Subject of the chat export email.
pub const TRANSCRIPT_SUBJECT: &str = "Your Chat Conversation";

/// Body of the chat export email.
pub const TRANSCRIPT_TEXT: &str = "Attached is your chat conversation.";

/// Filename of the chat export attachment.
pub const TRANSCRIPT_FILENAME: &str = "chat.txt";

/// Collapse line breaks so user text cannot inject extra header lines.
fn single_line(s: &str) -> String {
    s.split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
