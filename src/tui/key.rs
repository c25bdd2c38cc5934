//! Key names for `--expect`.
//!
//! A name is any number of `shift-`, `alt-`, `meta-` or `ctrl-` prefixes
//! (case-insensitive) followed by a single character, `space`, or a named
//! key such as `enter`, `f5` or `pgdn`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key: {0:?}")]
pub struct KeyParseError(pub String);

const PREFIXES: &[(&str, KeyModifiers)] = &[
    ("shift-", KeyModifiers::SHIFT),
    ("alt-", KeyModifiers::ALT),
    // Terminals report meta as alt.
    ("meta-", KeyModifiers::ALT),
    ("ctrl-", KeyModifiers::CONTROL),
];

/// Parse a key name into the event that key produces.
///
/// `shift-` on a single character yields the upper-case character with no
/// shift modifier.
pub fn parse_key(input: &str) -> Result<KeyEvent, KeyParseError> {
    let mut rest = input;
    let mut modifiers = KeyModifiers::NONE;
    'prefixes: loop {
        for (prefix, modifier) in PREFIXES {
            if let Some(head) = rest.get(..prefix.len())
                && head.eq_ignore_ascii_case(prefix)
            {
                modifiers |= *modifier;
                rest = &rest[prefix.len()..];
                continue 'prefixes;
            }
        }
        break;
    }

    let mut chars = rest.chars();
    let single = match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ if rest.eq_ignore_ascii_case("space") => Some(' '),
        _ => None,
    };

    let code = match single {
        Some(mut c) => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                modifiers.remove(KeyModifiers::SHIFT);
                c = c.to_uppercase().next().unwrap_or(c);
            }
            KeyCode::Char(c)
        }
        None => named_key(rest).ok_or_else(|| KeyParseError(rest.to_string()))?,
    };

    Ok(KeyEvent::new(code, modifiers))
}

fn named_key(name: &str) -> Option<KeyCode> {
    let lower = name.to_ascii_lowercase();
    let code = match lower.as_str() {
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "esc" | "escape" => KeyCode::Esc,
        "backspace" | "bspace" | "bs" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "insert" | "ins" => KeyCode::Insert,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pgup" | "pageup" => KeyCode::PageUp,
        "pgdn" | "pagedown" => KeyCode::PageDown,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        f => {
            let n: u8 = f.strip_prefix('f')?.parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
    };
    Some(code)
}

/// Normalise a terminal event so it compares equal to [`parse_key`] output.
///
/// Terminals disagree on whether shifted characters carry `SHIFT` and on
/// the case of control characters.
pub fn normalize(event: KeyEvent) -> KeyEvent {
    let mut modifiers = event.modifiers & (KeyModifiers::SHIFT | KeyModifiers::ALT | KeyModifiers::CONTROL);
    let code = match event.code {
        KeyCode::Char(c) => {
            modifiers.remove(KeyModifiers::SHIFT);
            if modifiers.contains(KeyModifiers::CONTROL) {
                KeyCode::Char(c.to_ascii_lowercase())
            } else {
                KeyCode::Char(c)
            }
        }
        other => other,
    };
    KeyEvent::new(code, modifiers)
}

/// The configured key, if any, that `event` triggers.
pub fn match_key<'a>(bindings: &'a [(String, KeyEvent)], event: KeyEvent) -> Option<&'a str> {
    let event = normalize(event);
    bindings
        .iter()
        .find(|(_, key)| normalize(*key) == event)
        .map(|(name, _)| name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_parse_key() {
        let cases = [
            ("space", key(KeyCode::Char(' '), KeyModifiers::NONE)),
            ("a", key(KeyCode::Char('a'), KeyModifiers::NONE)),
            ("f1", key(KeyCode::F(1), KeyModifiers::NONE)),
            ("shift-a", key(KeyCode::Char('A'), KeyModifiers::NONE)),
            ("alt-t", key(KeyCode::Char('t'), KeyModifiers::ALT)),
            ("meta-t", key(KeyCode::Char('t'), KeyModifiers::ALT)),
            ("ctrl-v", key(KeyCode::Char('v'), KeyModifiers::CONTROL)),
            ("ctrl-\\", key(KeyCode::Char('\\'), KeyModifiers::CONTROL)),
            ("ctrl-]", key(KeyCode::Char(']'), KeyModifiers::CONTROL)),
            ("ctrl-^", key(KeyCode::Char('^'), KeyModifiers::CONTROL)),
            ("ctrl-_", key(KeyCode::Char('_'), KeyModifiers::CONTROL)),
            ("ctrl-space", key(KeyCode::Char(' '), KeyModifiers::CONTROL)),
            ("right", key(KeyCode::Right, KeyModifiers::NONE)),
            ("shift-right", key(KeyCode::Right, KeyModifiers::SHIFT)),
            (
                "alt-shift-right",
                key(KeyCode::Right, KeyModifiers::SHIFT | KeyModifiers::ALT),
            ),
            (
                "ctrl-alt-space",
                key(KeyCode::Char(' '), KeyModifiers::CONTROL | KeyModifiers::ALT),
            ),
            ("CTRL-Enter", key(KeyCode::Enter, KeyModifiers::CONTROL)),
            ("pgdn", key(KeyCode::PageDown, KeyModifiers::NONE)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_key(input), Ok(expected), "{input}");
        }
    }

    #[test]
    fn test_unknown_keys() {
        assert_eq!(parse_key("ctrl-nope"), Err(KeyParseError("nope".into())));
        assert!(parse_key("f13").is_err());
        assert!(parse_key("").is_err());
        assert!(parse_key("ctrl-").is_err());
    }

    #[test]
    fn test_match_key_normalises_terminal_events() {
        let bindings = vec![
            ("ctrl-o".to_string(), parse_key("ctrl-o").unwrap()),
            ("shift-x".to_string(), parse_key("shift-x").unwrap()),
        ];
        assert_eq!(
            match_key(&bindings, key(KeyCode::Char('o'), KeyModifiers::CONTROL)),
            Some("ctrl-o")
        );
        assert_eq!(
            match_key(&bindings, key(KeyCode::Char('X'), KeyModifiers::SHIFT)),
            Some("shift-x")
        );
        assert_eq!(
            match_key(&bindings, key(KeyCode::Char('x'), KeyModifiers::NONE)),
            None
        );
    }
}
