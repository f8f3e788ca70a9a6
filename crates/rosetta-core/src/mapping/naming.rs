//! Structural name conversion between logical camelCase and device kebab-case.
//!
//! Most fields are never registered explicitly and rely on this fallback,
//! so `kebab_to_camel(camel_to_kebab(x)) == x` must hold for plain ASCII
//! identifiers.

/// `macAddress` -> `mac-address`.
pub fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `mac-address` -> `macAddress`; device-internal `.id` -> `id`.
pub fn kebab_to_camel(name: &str) -> String {
    let name = name.strip_prefix('.').unwrap_or(name);
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
