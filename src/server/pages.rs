// Server-rendered pages — minimal phone-screen HTML assembled in code.

use crate::config::MAX_LOCATION_LEN;
use crate::store::record::{Delivery, Tool};

/// Escape a value for interpolation into HTML text or attributes.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 1.5em; max-width: 30em; }}\n\
         input, select, button {{ font-size: 1.1em; padding: 0.3em; }}\n\
         .error {{ color: #b00; }}\n\
         .notice {{ color: #555; }}\n\
         </style>\n\
         </head>\n\
         <body>\n{body}</body>\n\
         </html>\n",
        title = escape(title),
        body = body,
    )
}

fn error_block(error: Option<&str>) -> String {
    match error {
        Some(msg) => format!("<p class=\"error\">{}</p>\n", escape(msg)),
        None => String::new(),
    }
}

/// Landing page — staff land here only if they typed the bare host.
pub fn index() -> String {
    layout(
        "Tool tracker",
        "<h1>Tool tracker</h1>\n\
         <p>Scan the label on a tool to see its status, or check\n\
         <a href=\"/d/\">deliveries</a>.</p>\n",
    )
}

pub fn not_found(what: &str) -> String {
    layout(
        "Not found",
        &format!(
            "<h1>Not found</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to start</a></p>\n",
            escape(what)
        ),
    )
}

pub fn tool(tool: &Tool, error: Option<&str>) -> String {
    let body = format!(
        "<h1>Tool {id}</h1>\n\
         <p>Status: <strong>{status}</strong><br>\n\
         Location: {location}</p>\n\
         {error}\
         <form method=\"post\">\n\
         <label>Location\n\
         <input name=\"location\" maxlength=\"{maxlen}\" value=\"{location}\" required>\n\
         </label>\n\
         <p>\n\
         <button name=\"action\" value=\"checkout\">Check out</button>\n\
         <button name=\"action\" value=\"checkin\">Check in</button>\n\
         </p>\n\
         </form>\n",
        id = tool.id,
        status = escape(&tool.status),
        location = escape(&tool.location),
        maxlen = MAX_LOCATION_LEN,
        error = error_block(error),
    );
    layout(&format!("Tool {}", tool.id), &body)
}

pub fn delivery(delivery: &Delivery, error: Option<&str>) -> String {
    let body = format!(
        "<h1>Delivery {tracking}</h1>\n\
         <p>Status: <strong>{status}</strong><br>\n\
         Location: {location}</p>\n\
         {error}\
         <form method=\"post\">\n\
         <label>Status\n\
         <select name=\"status\">\n\
         <option value=\"arrived\">Arrived</option>\n\
         <option value=\"dispatched\">Dispatched</option>\n\
         <option value=\"collected\">Collected</option>\n\
         </select>\n\
         </label>\n\
         <label>Location\n\
         <input name=\"location\" maxlength=\"{maxlen}\" value=\"{location}\">\n\
         </label>\n\
         <p><button>Update</button></p>\n\
         </form>\n",
        tracking = escape(&delivery.tracking_number),
        status = escape(&delivery.status),
        location = escape(&delivery.location),
        maxlen = MAX_LOCATION_LEN,
        error = error_block(error),
    );
    layout(
        &format!("Delivery {}", delivery.tracking_number),
        &body,
    )
}

/// Tracking-code search form, with an optional notice (e.g. "no match").
pub fn delivery_lookup(notice: Option<&str>) -> String {
    let notice = match notice {
        Some(msg) => format!("<p class=\"notice\">{}</p>\n", escape(msg)),
        None => String::new(),
    };
    let body = format!(
        "<h1>Deliveries</h1>\n\
         {notice}\
         <form method=\"get\">\n\
         <label>Tracking number\n\
         <input name=\"tracking\" required>\n\
         </label>\n\
         <p><button>Look up</button></p>\n\
         </form>\n",
        notice = notice,
    );
    layout("Deliveries", &body)
}

pub fn bad_request(what: &str) -> String {
    layout(
        "Bad request",
        &format!(
            "<h1>Bad request</h1>\n<p>{}</p>\n<p><a href=\"/d/\">Back to deliveries</a></p>\n",
            escape(what)
        ),
    )
}
