/// One `%%NAME[:ARG]%%` token found in a snippet or template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroToken<'a> {
    pub name: &'a str,
    pub arg: Option<&'a str>,
    /// The full `%%...%%` text, kept for diagnostics.
    pub raw: &'a str,
}

/// Extracts every macro token in order of appearance.
pub fn tokens(input: &str) -> Vec<MacroToken<'_>> {
    let mut found = Vec::new();
    scan(input, |token, _| {
        found.push(token);
        None::<()>
    });
    found
}

/// Single left-to-right substitution pass. `replace` decides per token;
/// `None` leaves the token verbatim. Replacement text is emitted as-is
/// and never rescanned, so one macro's output can never trigger another.
pub fn substitute<F>(input: &str, mut replace: F) -> String
where
    F: FnMut(&MacroToken<'_>) -> Option<String>,
{
    scan(input, |token, out| replace(&token).map(|r| out.push_str(&r)))
}

fn scan<'a, F, T>(input: &'a str, mut on_token: F) -> String
where
    F: FnMut(MacroToken<'a>, &mut String) -> Option<T>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("%%") {
        let after_open = &rest[start + 2..];
        let Some(close) = after_open.find("%%") else {
            // Unterminated opener, nothing left to tokenize.
            break;
        };
        let inner = &after_open[..close];
        let raw = &rest[start..start + 2 + close + 2];
        let (name, arg) = match inner.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (inner, None),
        };
        out.push_str(&rest[..start]);
        let token = MacroToken { name, arg, raw };
        if on_token(token, &mut out).is_none() {
            out.push_str(raw);
        }
        rest = &rest[start + 2 + close + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tokens_in_order() {
        let found = tokens("a %%P0%% b %%CACHEBUSTER:x%% c");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "P0");
        assert_eq!(found[0].arg, None);
        assert_eq!(found[1].name, "CACHEBUSTER");
        assert_eq!(found[1].arg, Some("x"));
        assert_eq!(found[1].raw, "%%CACHEBUSTER:x%%");
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let out = substitute("x %%NOPE%% y", |_| None);
        assert_eq!(out, "x %%NOPE%% y");
    }

    #[test]
    fn replacement_output_is_not_rescanned() {
        let out = substitute("%%A%%%%B%%", |token| match token.name {
            "A" => Some("%%B%%".to_string()),
            "B" => Some("never".to_string()),
            _ => None,
        });
        // The %%B%% produced by A's replacement must survive untouched
        // while the literal %%B%% is replaced.
        assert_eq!(out, "%%B%%never");
    }

    #[test]
    fn unterminated_opener_passes_through() {
        let out = substitute("a %%STUCK", |_| Some("x".to_string()));
        assert_eq!(out, "a %%STUCK");
    }
}
