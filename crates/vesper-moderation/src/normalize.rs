//! Unicode hardening for scanner input.
//!
//! Term matching runs on a normal form that strips the usual evasion
//! tricks: diacritics ("ídìót"), zero-width and directional control
//! characters spliced between letters, and separator runs ("i.d.i.o.t").

/// Normalizes text for scanning: diacritics folded to ASCII, invisible and
/// directional control characters removed, separator runs collapsed to a
/// single space, lowercased.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;

    for c in text.chars() {
        if is_invisible(c) {
            continue;
        }
        let c = fold_diacritic(c);
        if is_separator(c) {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }
        for lower in c.to_lowercase() {
            out.push(lower);
        }
        last_was_space = false;
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Zero-width characters and bidirectional control characters, both used to
/// splice or reorder letters without changing the rendered text.
/// Apostrophes are dropped too, so contractions match their squeezed forms
/// ("you're" → "youre").
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}'
            | '\u{FEFF}'
            | '\u{2060}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2066}'..='\u{2069}'
            | '\''
            | '\u{2019}'
    )
}

/// Characters treated as word separators when they appear in runs.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '_' | '-' | '*' | ',' | '/' | '\\' | '|' | '~')
}

/// Folds common Latin diacritics to their ASCII base letter. Characters
/// outside the table pass through unchanged.
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'ç' | 'Ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'i',
        'ñ' | 'Ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
        'ý' | 'ÿ' | 'Ý' => 'y',
        'š' | 'Š' => 's',
        'ž' | 'Ž' => 'z',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize_text("  Hello   WORLD  "), "hello world");
    }

    #[test]
    fn folds_diacritics() {
        assert_eq!(normalize_text("ídìót"), "idiot");
        assert_eq!(normalize_text("Ñoño"), "nono");
    }

    #[test]
    fn strips_zero_width_characters() {
        assert_eq!(normalize_text("id\u{200B}i\u{200D}ot"), "idiot");
        assert_eq!(normalize_text("\u{202E}evil\u{202C}"), "evil");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(normalize_text("i.d.i.o.t"), "i d i o t");
        assert_eq!(normalize_text("k__y__s"), "k y s");
        assert_eq!(normalize_text("a -- b"), "a b");
    }

    #[test]
    fn squeezes_contractions() {
        assert_eq!(normalize_text("You're"), "youre");
        assert_eq!(normalize_text("I’ll"), "ill");
    }

    #[test]
    fn empty_and_separator_only_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("... --- ..."), "");
    }
}
