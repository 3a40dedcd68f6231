//! Split a SQL script into individual statements.

/// Split on `;` outside quotes, `$tag$` bodies and comments. Empty statements
/// are dropped and the trailing `;` is not kept.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                current.push(c);
                // doubled quote is an escaped quote, handled by reopening
                for q in chars.by_ref() {
                    current.push(q);
                    if q == c {
                        break;
                    }
                }
            }
            '$' => {
                current.push(c);
                let Some(tag) = dollar_tag(chars.clone()) else {
                    continue;
                };
                // opening tag, then everything up to the matching closing tag
                current.extend(chars.by_ref().take(tag.chars().count() - 1));
                let body = current.len();
                for q in chars.by_ref() {
                    current.push(q);
                    if current[body..].ends_with(&tag) {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
                current.push(' ');
            }
            ';' => push_statement(&mut statements, &mut current),
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &mut current);

    statements
}

/// `$$` or `$name$` starting right after a `$`. `$1` style parameters are
/// not tags.
fn dollar_tag(rest: impl Iterator<Item = char>) -> Option<String> {
    let mut tag = String::from("$");
    for c in rest {
        match c {
            '$' => {
                tag.push('$');
                return Some(tag);
            }
            c if c == '_' || c.is_alphabetic() || (c.is_ascii_digit() && tag.len() > 1) => {
                tag.push(c)
            }
            _ => return None,
        }
    }
    None
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let stmt = current.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
    current.clear();
}
