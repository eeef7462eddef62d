//! Source rewrite for legacy-dialect scripts.
//!
//! The legacy engine binds UI callbacks synchronously and leaves network
//! requests as bare calls. The host engine wants event callbacks wrapped in
//! `async(...)` and request calls completed with `:await()`. The rewrite
//! works on a token stream so strings, comments and nested blocks never
//! confuse it. It only inserts text; nothing in the input is removed.

const EVENT_BINDINGS: [&str; 3] = ["on_click", "on_input", "on_submit"];
const REQUEST_CALL: &str = "fetch";
const ASYNC_OPEN: &str = "async(";
const ASYNC_CLOSE: &str = ")";
const AWAIT_SUFFIX: &str = ":await()";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Space,
    Comment,
    Str,
    Ident,
    Number,
    Punct,
    Other,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: Kind,
    start: usize,
    end: usize,
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token() {
            tokens.push(tok);
        }
        tokens
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek(0).is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let b = self.peek(0)?;
        let kind = match b {
            b' ' | b'\t' | b'\r' | b'\n' => {
                self.eat_while(|c| c.is_ascii_whitespace());
                Kind::Space
            },
            b'-' if self.peek(1) == Some(b'-') => {
                self.pos += 2;
                match self.long_bracket_level() {
                    Some(level) => self.long_bracket(level),
                    None => self.eat_while(|c| c != b'\n'),
                }
                Kind::Comment
            },
            b'"' | b'\'' => {
                self.quoted(b);
                Kind::Str
            },
            b'[' if self.long_bracket_level().is_some() => {
                if let Some(level) = self.long_bracket_level() {
                    self.long_bracket(level);
                }
                Kind::Str
            },
            b if b.is_ascii_alphabetic() || b == b'_' => {
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == b'_');
                Kind::Ident
            },
            b if b.is_ascii_digit() => {
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == b'.' || c == b'_');
                Kind::Number
            },
            b if b.is_ascii() => {
                self.pos += 1;
                Kind::Punct
            },
            _ => {
                self.eat_while(|c| !c.is_ascii());
                Kind::Other
            },
        };
        Some(Token {
            kind,
            start,
            end: self.pos,
        })
    }

    /// Level of a `[`, `[=`, `[==` ... `[` opener at the cursor.
    fn long_bracket_level(&self) -> Option<usize> {
        if self.peek(0) != Some(b'[') {
            return None;
        }
        let mut level = 0;
        while self.peek(1 + level) == Some(b'=') {
            level += 1;
        }
        (self.peek(1 + level) == Some(b'[')).then_some(level)
    }

    fn long_bracket(&mut self, level: usize) {
        self.pos += level + 2;
        let mut close = Vec::with_capacity(level + 2);
        close.push(b']');
        close.extend(std::iter::repeat_n(b'=', level));
        close.push(b']');
        match self.bytes[self.pos..]
            .windows(close.len())
            .position(|w| w == close.as_slice())
        {
            Some(i) => self.pos += i + close.len(),
            None => self.pos = self.bytes.len(),
        }
    }

    fn quoted(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            match c {
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                b'\n' => return,
                c if c == quote => {
                    self.pos += 1;
                    return;
                },
                _ => self.pos += 1,
            }
        }
    }
}

struct Rewriter<'a> {
    src: &'a str,
    sig: Vec<Token>,
}

impl Rewriter<'_> {
    fn text(&self, i: usize) -> &str {
        self.sig
            .get(i)
            .map(|t| &self.src[t.start..t.end])
            .unwrap_or_default()
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        self.sig.get(i).is_some_and(|t| t.kind == Kind::Punct) && self.text(i) == p
    }

    fn is_ident(&self, i: usize, name: &str) -> bool {
        self.sig.get(i).is_some_and(|t| t.kind == Kind::Ident) && self.text(i) == name
    }

    /// `.on_click(function(` with `function` at `i`.
    fn opens_event_callback(&self, i: usize) -> bool {
        i >= 3
            && self.is_punct(i - 1, "(")
            && EVENT_BINDINGS.iter().any(|b| self.is_ident(i - 2, b))
            && self.is_punct(i - 3, ".")
            && self.is_punct(i + 1, "(")
    }

    /// `fetch({` with `fetch` at `i`.
    fn opens_request(&self, i: usize) -> bool {
        self.is_punct(i + 1, "(") && self.is_punct(i + 2, "{")
    }

    /// `:await(` starting at `i`.
    fn already_awaited(&self, i: usize) -> bool {
        self.is_punct(i, ":") && self.is_ident(i + 1, "await") && self.is_punct(i + 2, "(")
    }

    fn insertions(&self) -> Vec<(usize, &'static str)> {
        let mut inserts = Vec::new();
        let mut block_depth: i64 = 0;
        let mut bracket_depth: i64 = 0;
        // Block depth outside each wrapped callback.
        let mut callbacks: Vec<i64> = Vec::new();
        // Bracket depth outside each request call.
        let mut requests: Vec<i64> = Vec::new();

        for (i, tok) in self.sig.iter().enumerate() {
            match tok.kind {
                Kind::Ident => match self.text(i) {
                    "function" => {
                        if self.opens_event_callback(i) {
                            inserts.push((tok.start, ASYNC_OPEN));
                            callbacks.push(block_depth);
                        }
                        block_depth += 1;
                    },
                    "do" | "if" | "repeat" => block_depth += 1,
                    "end" | "until" => {
                        block_depth -= 1;
                        if callbacks.last() == Some(&block_depth) {
                            callbacks.pop();
                            inserts.push((tok.end, ASYNC_CLOSE));
                        }
                    },
                    REQUEST_CALL if self.opens_request(i) => requests.push(bracket_depth),
                    _ => {},
                },
                Kind::Punct => match self.text(i) {
                    "(" | "{" | "[" => bracket_depth += 1,
                    ")" | "}" | "]" => {
                        bracket_depth -= 1;
                        if self.text(i) == ")" && requests.last() == Some(&bracket_depth) {
                            requests.pop();
                            if !self.already_awaited(i + 1) {
                                inserts.push((tok.end, AWAIT_SUFFIX));
                            }
                        }
                    },
                    _ => {},
                },
                _ => {},
            }
        }
        inserts
    }
}

/// Rewrite legacy source into the form the host engine expects.
pub fn rewrite(source: &str) -> String {
    let sig = Lexer::new(source)
        .tokenize()
        .into_iter()
        .filter(|t| !matches!(t.kind, Kind::Space | Kind::Comment))
        .collect();
    let rewriter = Rewriter { src: source, sig };
    let mut inserts = rewriter.insertions();
    if inserts.is_empty() {
        return source.to_string();
    }
    inserts.sort_by_key(|&(at, _)| at);

    let extra: usize = inserts.iter().map(|(_, s)| s.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut cursor = 0;
    for (at, text) in inserts {
        out.push_str(&source[cursor..at]);
        out.push_str(text);
        cursor = at;
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wraps_click_callback() {
        let src = "btn.on_click(function()\n  print(\"hi\")\nend)";
        assert_eq!(
            rewrite(src),
            "btn.on_click(async(function()\n  print(\"hi\")\nend))"
        );
    }

    #[test]
    fn wraps_each_binding_kind() {
        let src = "a.on_input(function(v) x = v end)\nb.on_submit(function() end)";
        assert_eq!(
            rewrite(src),
            "a.on_input(async(function(v) x = v end))\nb.on_submit(async(function() end))"
        );
    }

    #[test]
    fn nested_blocks_close_at_outer_end() {
        let src = "get(\"b\").on_click(function()\n\
                   \x20 if ok then\n\
                   \x20   for i = 1, 3 do print(i) end\n\
                   \x20 end\n\
                   \x20 local f = function() return 1 end\n\
                   end)";
        let out = rewrite(src);
        assert!(out.starts_with("get(\"b\").on_click(async(function()"));
        assert!(out.ends_with("return 1 end\nend))"));
        assert_eq!(out.matches("async(").count(), 1);
    }

    #[test]
    fn strings_and_comments_are_untouched() {
        let src = "-- x.on_click(function() end)\n\
                   local s = \"end) .on_click(function()\"\n\
                   local l = [[ fetch({ }) ]]";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn long_comment_hides_code() {
        let src = "--[==[ b.on_click(function() end) ]==]\nprint(1)";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn named_handler_not_wrapped() {
        let src = "btn.on_click(handler)";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn awaits_request_literal() {
        let request = concat!(
            "local res = fetch({\n",
            "  url = \"https://a.b\",\n",
            "  headers = { a = \"b\" },\n",
            "})",
        );
        let src = format!("{request}\nprint(res)");
        assert_eq!(rewrite(&src), format!("{request}:await()\nprint(res)"));
    }

    #[test]
    fn existing_await_kept() {
        for src in ["fetch({ url = \"x\" }):await()", "fetch({ url = \"x\" }) : await ( )"] {
            assert_eq!(rewrite(src), src);
        }
    }

    #[test]
    fn request_inside_callback() {
        let src = "b.on_click(function()\n  local r = fetch({ url = \"x\" })\nend)";
        assert_eq!(
            rewrite(src),
            "b.on_click(async(function()\n  local r = fetch({ url = \"x\" }):await()\nend))"
        );
    }

    #[test]
    fn rewrite_is_idempotent() {
        let src = "b.on_click(function()\n  local r = fetch({ url = \"x\" })\nend)";
        let once = rewrite(src);
        assert_eq!(rewrite(&once), once);
    }

    #[test]
    fn unbalanced_input_does_not_panic() {
        for src in [
            "b.on_click(function(",
            "fetch({",
            "end end end )))",
            "\"unterminated",
            "[==[ open",
            "é.on_click(function() end)",
        ] {
            let _ = rewrite(src);
        }
    }

    fn is_subsequence(needle: &str, haystack: &str) -> bool {
        let mut hay = haystack.chars();
        needle.chars().all(|c| hay.any(|h| h == c))
    }

    proptest! {
        #[test]
        fn only_inserts(src in "\\PC{0,200}") {
            let out = rewrite(&src);
            prop_assert!(out.len() >= src.len());
            prop_assert!(is_subsequence(&src, &out));
        }

        #[test]
        fn handler_shapes_round_trip(
            body in "[a-z ]{0,20}",
            binding in prop::sample::select(vec!["on_click", "on_input", "on_submit"]),
        ) {
            let src = format!("x.{binding}(function() {body} end)");
            let out = rewrite(&src);
            let expected = format!("x.{binding}(async(function() {body} end))");
            // Bodies that spell block keywords change the nesting.
            let nests = body
                .split(' ')
                .any(|w| matches!(w, "do" | "if" | "end" | "function" | "repeat" | "until"));
            if !nests {
                prop_assert_eq!(out, expected);
            }
        }
    }
}
