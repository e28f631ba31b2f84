/// Collapses consecutive equal names into `(name, count)` runs.
pub fn runs<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut runs: Vec<(&str, usize)> = Vec::new();
    for name in names {
        if let Some((last, count)) = runs.last_mut() {
            if *last == name {
                *count += 1;
                continue;
            }
        }
        runs.push((name, 1));
    }
    runs
}

/// Human-readable summary of a message sequence, e.g.
/// `Increment (x3), Decrement and Save`.
pub fn title<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let parts: Vec<String> = runs(names)
        .into_iter()
        .map(|(name, count)| match count {
            1 => name.to_string(),
            n => format!("{name} (x{n})"),
        })
        .collect();

    match parts.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}

/// Lowercase snake_case identifier derived from arbitrary text:
/// `SetText` becomes `set_text`, `Increment (x3)` becomes `increment_x3`.
pub fn snake_ident(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev_lower = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }

    let trimmed = out.trim_end_matches('_');
    match trimmed.chars().next() {
        None => "unnamed".to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{trimmed}"),
        Some(_) => trimmed.to_string(),
    }
}
