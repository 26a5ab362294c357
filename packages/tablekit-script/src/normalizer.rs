//! Statement terminator insertion for user scripts.
//!
//! Scripts are typed by end users who often leave out semicolons. The
//! normalizer masks every literal and comment behind a placeholder, appends
//! `;` to lines that plainly end a statement, then puts the literals back.
//! It is a line heuristic, not a parser: lines it cannot classify are left
//! untouched, and running it on its own output changes nothing.

/// Utilities injected into the sandbox.
pub const UTILITIES: [&str; 3] = ["getFieldValue", "setFieldValue", "sendEmail"];

/// Keywords after which a `/` starts a regular expression.
const REGEX_PREFIX_KEYWORDS: [&str; 14] = [
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Leading words of lines that open a block or label a branch.
const BLOCK_KEYWORDS: [&str; 13] = [
    "if", "else", "for", "while", "do", "switch", "try", "catch", "finally", "function", "class",
    "case", "default",
];

/// Words that make a line a complete statement.
const TERMINATING_WORDS: [&str; 5] = ["return", "await", "throw", "break", "continue"];

/// Prefixes of a following line that continue the current expression.
const CONTINUATION_PREFIXES: [&str; 14] = [
    ".", "?", "||", "&&", "+", "-", "*", "/", ",", ")", "]", "(", "[", "__TEMPLATE_",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    Template,
    DoubleQuoted,
    SingleQuoted,
    Regex,
    LineComment,
    BlockComment,
}

impl LiteralKind {
    const ALL: [LiteralKind; 6] = [
        LiteralKind::Template,
        LiteralKind::DoubleQuoted,
        LiteralKind::SingleQuoted,
        LiteralKind::Regex,
        LiteralKind::LineComment,
        LiteralKind::BlockComment,
    ];

    fn tag(self) -> &'static str {
        match self {
            LiteralKind::Template => "TEMPLATE",
            LiteralKind::DoubleQuoted => "DQ_STRING",
            LiteralKind::SingleQuoted => "SQ_STRING",
            LiteralKind::Regex => "REGEX",
            LiteralKind::LineComment => "LINE_COMMENT",
            LiteralKind::BlockComment => "BLOCK_COMMENT",
        }
    }

    fn is_comment(self) -> bool {
        matches!(self, LiteralKind::LineComment | LiteralKind::BlockComment)
    }
}

/// Masked literals, one list per kind, indexed by placeholder number.
#[derive(Debug, Default)]
struct Literals {
    slots: [Vec<String>; 6],
}

impl Literals {
    fn stash(&mut self, kind: LiteralKind, text: String) -> String {
        let list = &mut self.slots[kind as usize];
        let placeholder = format!("__{}_{}__", kind.tag(), list.len());
        list.push(text);
        placeholder
    }

    fn get(&self, kind: LiteralKind, index: usize) -> Option<&str> {
        self.slots[kind as usize].get(index).map(String::as_str)
    }
}

/// Adds statement terminators to a user script.
///
/// Blank input is returned as is.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }
    let (masked, literals) = mask_literals(raw);
    let terminated = terminate_lines(&masked);
    restore_literals(&terminated, &literals)
}

/// Script text with every literal and comment replaced by a placeholder.
pub(crate) fn mask(src: &str) -> String {
    mask_literals(src).0
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replaces templates, strings, regexes and comments with placeholders.
fn mask_literals(src: &str) -> (String, Literals) {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut literals = Literals::default();

    // last significant character and the identifier it ended, if any
    let mut last: Option<char> = None;
    let mut word = String::new();
    let mut in_word = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let literal = match c {
            '`' => scan_quoted(&chars, i, '`', true).map(|end| (LiteralKind::Template, end)),
            '"' => scan_quoted(&chars, i, '"', false).map(|end| (LiteralKind::DoubleQuoted, end)),
            '\'' => {
                scan_quoted(&chars, i, '\'', false).map(|end| (LiteralKind::SingleQuoted, end))
            }
            '/' if next == Some('/') => Some((LiteralKind::LineComment, scan_line(&chars, i))),
            '/' if next == Some('*') => Some((LiteralKind::BlockComment, scan_block(&chars, i))),
            '/' if regex_allowed(last, &word) => {
                scan_regex(&chars, i).map(|end| (LiteralKind::Regex, end))
            }
            _ => None,
        };

        if let Some((kind, end)) = literal {
            let text: String = chars[i..end].iter().collect();
            out.push_str(&literals.stash(kind, text));
            if !kind.is_comment() {
                // a literal is an operand, so a following `/` divides
                last = Some('_');
                word.clear();
            }
            in_word = false;
            i = end;
            continue;
        }

        out.push(c);
        if is_ident_char(c) {
            if !in_word {
                word.clear();
            }
            word.push(c);
            in_word = true;
            last = Some(c);
        } else {
            in_word = false;
            if !c.is_whitespace() {
                word.clear();
                last = Some(c);
            }
        }
        i += 1;
    }

    (out, literals)
}

fn regex_allowed(last: Option<char>, word: &str) -> bool {
    match last {
        None => true,
        Some(')') | Some(']') => false,
        Some(c) if is_ident_char(c) => REGEX_PREFIX_KEYWORDS.contains(&word),
        Some(_) => true,
    }
}

/// End (exclusive) of a quoted literal starting at `start`.
fn scan_quoted(chars: &[char], start: usize, quote: char, multiline: bool) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return Some(i + 1),
            '\n' if !multiline => return None,
            _ => i += 1,
        }
    }
    None
}

fn scan_line(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(chars.len(), |offset| start + offset)
}

/// An unterminated block comment runs to the end of the input.
fn scan_block(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

fn scan_regex(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    let mut in_class = false;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\n' => return None,
            '[' => {
                in_class = true;
                i += 1;
            }
            ']' => {
                in_class = false;
                i += 1;
            }
            '/' if !in_class => {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                return Some(i);
            }
            _ => i += 1,
        }
    }
    None
}

/// Parses a placeholder at the start of `s`: kind, index and length.
fn parse_placeholder(s: &str) -> Option<(LiteralKind, usize, usize)> {
    let body = s.strip_prefix("__")?;
    for kind in LiteralKind::ALL {
        let Some(rest) = body
            .strip_prefix(kind.tag())
            .and_then(|r| r.strip_prefix('_'))
        else {
            continue;
        };
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || !rest[digits..].starts_with("__") {
            continue;
        }
        let index = rest[..digits].parse().ok()?;
        return Some((kind, index, kind.tag().len() + digits + 5));
    }
    None
}

/// Start of a comment placeholder that ends `s` exactly.
fn trailing_comment_start(s: &str) -> Option<usize> {
    if !s.ends_with("__") {
        return None;
    }
    [LiteralKind::LineComment, LiteralKind::BlockComment]
        .into_iter()
        .filter_map(|kind| s.rfind(&format!("__{}_", kind.tag())))
        .find(|&start| {
            parse_placeholder(&s[start..]).is_some_and(|(_, _, len)| start + len == s.len())
        })
}

/// Splits a masked line into code and trailing comments.
fn split_trailing_comments(line: &str) -> (&str, &str) {
    let mut code = line;
    while let Some(start) = trailing_comment_start(code.trim_end()) {
        code = &code[..start];
    }
    (code, &line[code.len()..])
}

fn strip_leading_comments(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim_start();
        match parse_placeholder(trimmed) {
            Some((kind, _, len)) if kind.is_comment() => s = &trimmed[len..],
            _ => return trimmed,
        }
    }
}

/// Statement text of a masked line, without comments or outer whitespace.
fn line_body(line: &str) -> &str {
    strip_leading_comments(split_trailing_comments(line).0).trim()
}

fn terminate_lines(masked: &str) -> String {
    let lines: Vec<&str> = masked.split('\n').collect();
    let mut out = Vec::with_capacity(lines.len());
    let mut brackets = Brackets::default();
    // a statement spanning lines carries its trigger to the line that ends it
    let mut pending = false;

    for (idx, line) in lines.iter().enumerate() {
        let body = line_body(line);
        brackets.feed(body);
        if body.is_empty() {
            out.push((*line).to_string());
            continue;
        }

        let triggered = pending || has_trigger(body);
        let inside_expression = brackets.inside_expression();
        let next = lines[idx + 1..]
            .iter()
            .map(|l| line_body(l))
            .find(|b| !b.is_empty());

        let terminate = if opens_block(body) || body.ends_with([';', '{', '}']) {
            pending = false;
            false
        } else if inside_expression
            || ends_open(body)
            || next.is_some_and(|next| continues(body, next))
        {
            pending = triggered;
            false
        } else {
            pending = false;
            triggered
        };

        if terminate {
            let (code, tail) = split_trailing_comments(line);
            let trimmed = code.trim_end();
            out.push(format!("{};{}{}", trimmed, &code[trimmed.len()..], tail));
        } else {
            out.push((*line).to_string());
        }
    }

    out.join("\n")
}

/// Marks a `{` that opens an object literal rather than a block.
const OBJECT_BRACE: char = 'o';

/// Brackets left open by the lines seen so far.
#[derive(Debug, Default)]
struct Brackets {
    open: Vec<char>,
    /// Last non-blank character
    last: Option<char>,
    /// Identifier that ended at `last`, if any
    word: String,
}

impl Brackets {
    fn feed(&mut self, body: &str) {
        let mut prev_ident = false;
        for c in body.chars() {
            match c {
                '{' if self.starts_object() => self.open.push(OBJECT_BRACE),
                '(' | '[' | '{' => self.open.push(c),
                ')' | ']' | '}' => {
                    self.open.pop();
                }
                _ => {}
            }
            if is_ident_char(c) {
                if !prev_ident {
                    self.word.clear();
                }
                self.word.push(c);
            }
            prev_ident = is_ident_char(c);
            if !c.is_whitespace() {
                self.last = Some(c);
            }
        }
    }

    /// A `{` in expression position starts an object literal.
    fn starts_object(&self) -> bool {
        match self.last {
            Some('=' | '(' | '[' | ',' | ':' | '?') => true,
            Some(c) if is_ident_char(c) => self.word == "return",
            _ => false,
        }
    }

    /// True while a parenthesis, bracket or object literal is open.
    fn inside_expression(&self) -> bool {
        self.open
            .last()
            .is_some_and(|c| matches!(*c, '(' | '[' | OBJECT_BRACE))
    }
}

fn has_trigger(body: &str) -> bool {
    body.contains("console.")
        || has_word(body, &TERMINATING_WORDS)
        || has_assignment(body)
        || is_utility_call(body)
}

fn ends_open(body: &str) -> bool {
    if body.ends_with("++") || body.ends_with("--") {
        return false;
    }
    body.ends_with([
        ';', '{', '}', ',', '(', '[', ':', '.', '?', '=', '+', '-', '*', '/', '%', '&', '|', '^',
        '!', '<', '>', '~',
    ])
}

fn opens_block(body: &str) -> bool {
    if body.starts_with('}') {
        return true;
    }
    let first: String = body.chars().take_while(|&c| is_ident_char(c)).collect();
    if BLOCK_KEYWORDS.contains(&first.as_str()) {
        return true;
    }
    first == "async"
        && body["async".len()..]
            .trim_start()
            .starts_with("function")
}

fn continues(body: &str, next: &str) -> bool {
    if next.starts_with("++") || next.starts_with("--") {
        return false;
    }
    if next.starts_with(':') {
        return body.contains('?');
    }
    CONTINUATION_PREFIXES
        .iter()
        .any(|prefix| next.starts_with(prefix))
}

fn has_word(body: &str, words: &[&str]) -> bool {
    body.split(|c: char| !is_ident_char(c))
        .any(|token| words.contains(&token))
}

/// True if the line holds an `=` that is not part of a comparison or arrow.
fn has_assignment(body: &str) -> bool {
    let chars: Vec<char> = body.chars().collect();
    chars.iter().enumerate().any(|(i, &c)| {
        if c != '=' {
            return false;
        }
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        if matches!(next, Some('=') | Some('>')) {
            return false;
        }
        match prev {
            Some('=') | Some('!') => false,
            // `<=` and `>=` compare, `<<=` and `>>=` assign
            Some(p @ ('<' | '>')) => i >= 2 && chars[i - 2] == p,
            _ => true,
        }
    })
}

fn is_utility_call(body: &str) -> bool {
    let call = body
        .strip_prefix("await")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map_or(body, str::trim_start);
    let Some(name) = UTILITIES.iter().find(|name| call.starts_with(*name)) else {
        return false;
    };
    if !call[name.len()..].trim_start().starts_with('(') || !call.ends_with(')') {
        return false;
    }
    let mut depth = 0i32;
    for c in call.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

/// Puts the masked literals back in a single left-to-right pass, so literal
/// text that looks like a placeholder is never expanded.
fn restore_literals(text: &str, literals: &Literals) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("__") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let restored = parse_placeholder(candidate)
            .and_then(|(kind, index, len)| literals.get(kind, index).map(|lit| (lit, len)));
        match restored {
            Some((literal, len)) => {
                out.push_str(literal);
                rest = &candidate[len..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
