/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

/// Returns `true` if `address` looks like a deliverable e-mail address.
///
/// The local part is either a sequence of dot-separated atoms or a quoted
/// string, the domain part is either a bracketed IPv4 literal or a dotted
/// host name ending in an alphabetic label. Matching is case-insensitive.
pub fn is_valid_address(address: &str) -> bool {
    let address = address.to_lowercase();

    // Domains never contain '@', so the separator is always the last one.
    match address.rsplit_once('@') {
        Some((local, domain)) => {
            (is_dot_atom(local) || is_quoted_string(local))
                && (is_ipv4_literal(domain) || is_host_name(domain))
        }
        None => false,
    }
}

fn is_atom_char(ch: char) -> bool {
    !ch.is_whitespace()
        && !matches!(
            ch,
            '<' | '>' | '(' | ')' | '[' | ']' | '\\' | '.' | ',' | ';' | ':' | '@' | '"'
        )
}

fn is_dot_atom(local: &str) -> bool {
    local
        .split('.')
        .all(|atom| !atom.is_empty() && atom.chars().all(is_atom_char))
}

fn is_quoted_string(local: &str) -> bool {
    local.len() >= 3
        && local.starts_with('"')
        && local.ends_with('"')
        && !local[1..local.len() - 1]
            .chars()
            .any(|ch| matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}'))
}

fn is_ipv4_literal(domain: &str) -> bool {
    let octets = match domain
        .strip_prefix('[')
        .and_then(|domain| domain.strip_suffix(']'))
    {
        Some(octets) => octets,
        None => return false,
    };

    let mut count = 0;
    for octet in octets.split('.') {
        if !(1..=3).contains(&octet.len()) || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        count += 1;
    }
    count == 4
}

fn is_host_name(domain: &str) -> bool {
    let (labels, tld) = match domain.rsplit_once('.') {
        Some(parts) => parts,
        None => return false,
    };

    tld.len() >= 2
        && tld.bytes().all(|b| b.is_ascii_alphabetic())
        && labels.split('.').all(|label| {
            !label.is_empty()
                && label
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}
