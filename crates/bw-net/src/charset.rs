//! Response body text decoding.

use encoding_rs::Encoding;

const META_SCAN_BYTES: usize = 8192;

pub fn decode_text(body: &[u8], content_type: &str) -> String {
    if let Some(encoding) = detect(body, content_type) {
        let (decoded, _, had_errors) = encoding.decode(body);
        if had_errors {
            log::debug!("body is not clean {}", encoding.name());
        }
        return decoded.into_owned();
    }

    String::from_utf8_lossy(body).into_owned()
}

fn detect(body: &[u8], content_type: &str) -> Option<&'static Encoding> {
    let lower = content_type.to_ascii_lowercase();
    let from_meta = if lower.is_empty() || lower.contains("text/html") {
        meta_charset(body)
    } else {
        None
    };

    from_meta
        .or_else(|| content_type_charset(content_type))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}

fn content_type_charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let (name, value) = part.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches(|ch| ch == '"' || ch == '\'');
        (!label.is_empty()).then(|| label.to_owned())
    })
}

fn meta_charset(body: &[u8]) -> Option<String> {
    let prefix = String::from_utf8_lossy(&body[..body.len().min(META_SCAN_BYTES)]);
    let lower = prefix.to_ascii_lowercase();
    let mut from = 0_usize;

    while let Some(found) = lower[from..].find("charset=") {
        let start = from + found + "charset=".len();
        if let Some(label) = label_at(&prefix[start..]) {
            return Some(label);
        }
        from = start;
    }

    None
}

fn label_at(input: &str) -> Option<String> {
    let trimmed = input.trim_start();
    let label = match trimmed.chars().next()? {
        quote @ ('"' | '\'') => {
            let rest = &trimmed[1..];
            &rest[..rest.find(quote)?]
        }
        _ => {
            let end = trimmed
                .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '>' | '/'))
                .unwrap_or(trimmed.len());
            &trimmed[..end]
        }
    };

    let label = label.trim();
    (!label.is_empty()).then(|| label.to_owned())
}

#[cfg(test)]
mod tests {
    use super::decode_text;

    #[test]
    fn content_type_charset_is_honoured() {
        let body = [0x63, 0x61, 0x66, 0xe9];
        assert_eq!(decode_text(&body, "text/plain; charset=ISO-8859-1"), "café");
    }

    #[test]
    fn meta_charset_wins_for_html() {
        let mut body = b"<meta charset=\"windows-1252\"><p>".to_vec();
        body.push(0xe9);
        assert_eq!(
            decode_text(&body, "text/html; charset=utf-8"),
            "<meta charset=\"windows-1252\"><p>é"
        );
    }

    #[test]
    fn falls_back_to_lossy_utf8() {
        assert_eq!(decode_text("héllo".as_bytes(), ""), "héllo");
        assert_eq!(decode_text(&[0x61, 0xff], "text/plain"), "a\u{fffd}");
    }
}
