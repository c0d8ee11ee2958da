// Copyright 2020-2025 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

/// Returns true if `raw` is syntactically a signed compact JWS: three
/// non-empty dot-separated base64url segments.
pub(crate) fn is_compact_jws(raw: &str) -> bool {
    let mut segments = raw.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return false;
    };

    [header, payload, signature]
        .iter()
        .all(|segment| !segment.is_empty() && segment.bytes().all(is_base64url_byte))
}

fn is_base64url_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Compares two entity identifiers, tolerating a trailing slash difference.
///
/// Entity identifiers are URLs; `https://ta.example` and `https://ta.example/`
/// name the same entity but frequently appear in both spellings across
/// authority hints and `sub` claims.
pub(crate) fn same_entity(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}
