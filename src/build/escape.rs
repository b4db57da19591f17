//! Escaping for values interpolated into generated pages.
//!
//! Record fields are free text, so every interpolation point goes through
//! one of these before it reaches the output.

/// Escape text for HTML element content and quoted attribute values.
///
/// Unlike Tera's built-in escaper, `/` is left alone so paths and URLs in
/// attributes stay readable.
pub fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        if !push_html_entity(&mut output, c) {
            output.push(c);
        }
    }
    output
}

/// Escape text for an Astro component body.
///
/// Astro evaluates `{...}` in markup as an expression, so braces are
/// escaped in addition to the HTML set.
pub fn escape_astro(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '{' => output.push_str("&#123;"),
            '}' => output.push_str("&#125;"),
            _ => {
                if !push_html_entity(&mut output, c) {
                    output.push(c);
                }
            }
        }
    }
    output
}

fn push_html_entity(output: &mut String, c: char) -> bool {
    let entity = match c {
        '&' => "&amp;",
        '<' => "&lt;",
        '>' => "&gt;",
        '"' => "&quot;",
        '\'' => "&#x27;",
        _ => return false,
    };
    output.push_str(entity);
    true
}

/// Make serialized JSON safe to embed in a `<script>` element.
///
/// `<`, `>` and `&` can only appear inside JSON strings, where the
/// `\uXXXX` form decodes to the same value.
pub fn json_for_script(json: &str) -> String {
    let mut output = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => output.push_str("\\u003c"),
            '>' => output.push_str("\\u003e"),
            '&' => output.push_str("\\u0026"),
            _ => output.push(c),
        }
    }
    output
}

/// Encode `value` as a JS string literal for an Astro `prop={...}` expression.
///
/// Text reaches the component unchanged (no HTML entities); only `<`, `{`
/// and `}` are written as `\uXXXX` so the expression cannot open markup or
/// close early.
pub fn astro_prop(value: &str) -> Result<String, serde_json::Error> {
    let literal = serde_json::to_string(value)?;
    let mut output = String::with_capacity(literal.len());
    for c in literal.chars() {
        match c {
            '<' => output.push_str("\\u003c"),
            '{' => output.push_str("\\u007b"),
            '}' => output.push_str("\\u007d"),
            _ => output.push(c),
        }
    }
    Ok(output)
}
