//! Splitting the `try:` line into argv-style tokens.

use crate::error::{Result, TrySyntaxError};

/// Extract the try line from a commit message and split it into tokens.
///
/// Returns an empty list when the message holds no `try:` marker. The first
/// token is always `try:`. Whitespace inside `[...]` platform lists stays
/// part of the token, so `-u xpcshell[Windows 10]` is a single argument.
pub fn split_try_msg(message: &str) -> Result<Vec<String>> {
    let Some(idx) = message.find("try:") else {
        return Ok(Vec::new());
    };
    let line = message[idx..].lines().next().unwrap_or_default();
    shell_split(line)
}

fn shell_split(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_brackets = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                in_brackets = true;
                in_token = true;
                current.push(c);
            }
            ']' => {
                in_brackets = false;
                in_token = true;
                current.push(c);
            }
            c if c.is_whitespace() && in_brackets => current.push(c),
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\\' => {
                in_token = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(q) => current.push(q),
                        None => return Err(TrySyntaxError::UnterminatedQuote(line.to_string())),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(e @ ('"' | '\\')) => current.push(e),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(TrySyntaxError::UnterminatedQuote(line.to_string())),
                        },
                        Some(q) => current.push(q),
                        None => return Err(TrySyntaxError::UnterminatedQuote(line.to_string())),
                    }
                }
            }
            _ => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_try_marker() {
        assert!(split_try_msg("Bug 1 - fix things r=me").unwrap().is_empty());
    }

    #[test]
    fn test_only_first_line_after_marker() {
        let tokens = split_try_msg("WIP try: -b o -p linux64\nsecond line -u all").unwrap();
        assert_eq!(tokens, vec!["try:", "-b", "o", "-p", "linux64"]);
    }

    #[test]
    fn test_brackets_keep_whitespace() {
        let tokens = split_try_msg("try: -u mochitest[Windows 10,x64] -t none").unwrap();
        assert_eq!(tokens, vec!["try:", "-u", "mochitest[Windows 10,x64]", "-t", "none"]);
    }

    #[test]
    fn test_quotes() {
        let tokens = split_try_msg(r#"try: --setenv "FOO=a b" --tag 'x y'"#).unwrap();
        assert_eq!(tokens, vec!["try:", "--setenv", "FOO=a b", "--tag", "x y"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(matches!(
            split_try_msg(r#"try: --setenv "FOO=bar"#),
            Err(TrySyntaxError::UnterminatedQuote(_))
        ));
    }
}
