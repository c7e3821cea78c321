//! Split response-file text into argument tokens.
//!
//! Tokens are separated by whitespace and never span lines. Double quotes
//! group text containing spaces. A run of backslashes is literal unless it
//! precedes a quote: then each pair yields one backslash, and an odd one out
//! makes the quote literal. Lines starting with `#` are comments.

pub fn split_arguments(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in text.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        split_line(line, &mut tokens);
    }
    tokens
}

fn split_line(line: &str, tokens: &mut Vec<String>) {
    let mut current = String::new();
    let mut started = false;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let mut run = 1;
                while chars.peek() == Some(&'\\') {
                    chars.next();
                    run += 1;
                }
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.extend(std::iter::repeat_n('\\', run / 2));
                    if run % 2 == 1 {
                        current.push('"');
                    } else {
                        in_quotes = !in_quotes;
                    }
                } else {
                    current.extend(std::iter::repeat_n('\\', run));
                }
                started = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if started {
        tokens.push(current);
    }
}
