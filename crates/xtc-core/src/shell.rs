use crate::CoreError;
use std::borrow::Cow;

/// Split a user-supplied options string into argv words the way a POSIX
/// shell would: whitespace separates words, single and double quotes group
/// and are removed, backslash escapes the next character.
///
/// `#` is an ordinary character, even at the start of a word. Unbalanced
/// quotes or a trailing backslash fail with
/// [`CoreError::MalformedCustomOptions`].
pub fn split_shell_tokens(raw: &str) -> Result<Vec<String>, CoreError> {
    shlex::split(&escape_comment_marks(raw))
        .ok_or_else(|| CoreError::MalformedCustomOptions(raw.to_owned()))
}

/// Backslash-escape every unquoted `#` that starts a word, so shlex keeps it
/// instead of dropping the rest of the line as a comment.
fn escape_comment_marks(raw: &str) -> Cow<'_, str> {
    if !raw.contains('#') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len() + 4);
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut word_start = true;

    for c in raw.chars() {
        if escaped {
            escaped = false;
        } else if in_single {
            in_single = c != '\'';
        } else if in_double {
            match c {
                '\\' => escaped = true,
                '"' => in_double = false,
                _ => {}
            }
        } else {
            match c {
                ' ' | '\t' | '\n' => {
                    word_start = true;
                    out.push(c);
                    continue;
                }
                '#' if word_start => out.push('\\'),
                '\\' => escaped = true,
                '\'' => in_single = true,
                '"' => in_double = true,
                _ => {}
            }
        }
        word_start = false;
        out.push(c);
    }
    Cow::Owned(out)
}
