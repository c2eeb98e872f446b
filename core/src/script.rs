//! Statement delimiters and SQL script splitting.
//!
//! [`SqlScript::parse`] turns a [`Resource`] into an ordered list of
//! statements. Delimiters inside string literals, quoted identifiers,
//! `$tag$` bodies and comments are ignored, as are delimiters within the
//! `BEGIN ... END` body of a `CREATE TRIGGER`, `PROCEDURE` or `FUNCTION`.
//! Statements consisting only of comments are dropped.
//!
//! # Examples
//!
//! ```
//! use schema_history_core::{Delimiter, Resource, SqlScript};
//!
//! let resource = Resource::inline("SET a = 'x;y';\n-- note\nSELECT 1;");
//! let script = SqlScript::parse(&resource, &Delimiter::SEMICOLON).unwrap();
//! assert_eq!(script.len(), 2);
//! assert_eq!(script.statements()[0].sql, "SET a = 'x;y'");
//! assert_eq!(script.statements()[1].line, 3);
//! ```

use std::borrow::Cow;
use std::fmt;

use crate::error::Result;
use crate::resource::Resource;

/// Token that terminates a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    token: Cow<'static, str>,
    alone_on_line: bool,
}

impl Delimiter {
    /// `;` anywhere on a line.
    pub const SEMICOLON: Delimiter = Delimiter {
        token: Cow::Borrowed(";"),
        alone_on_line: false,
    };

    /// `GO` on a line of its own, as used by SQL Server batch tools.
    pub const GO: Delimiter = Delimiter {
        token: Cow::Borrowed("GO"),
        alone_on_line: true,
    };

    pub fn new(token: impl Into<String>, alone_on_line: bool) -> Self {
        Self {
            token: Cow::Owned(token.into()),
            alone_on_line,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether the token only counts when it is the sole content of a line.
    pub fn is_alone_on_line(&self) -> bool {
        self.alone_on_line
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::SEMICOLON
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// One statement of a script, without its delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// 1-based line on which the statement starts.
    pub line: usize,
    pub sql: String,
}

/// An ordered list of statements parsed from a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScript {
    resource_name: String,
    statements: Vec<SqlStatement>,
}

impl SqlScript {
    /// Reads and splits `resource` on `delimiter`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`](crate::CoreError::Io) if the resource is a
    /// file that cannot be read.
    pub fn parse(resource: &Resource, delimiter: &Delimiter) -> Result<Self> {
        let text = resource.read()?;
        Ok(Self::from_sql(resource.filename(), &text, delimiter))
    }

    /// Splits already-loaded text.
    pub fn from_sql(resource_name: impl Into<String>, sql: &str, delimiter: &Delimiter) -> Self {
        Self {
            resource_name: resource_name.into(),
            statements: split_statements(sql, delimiter),
        }
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn statements(&self) -> &[SqlStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    SingleQuoted,
    DoubleQuoted,
    BacktickQuoted,
    /// Inside a `$tag$ ... $tag$` body.
    DollarQuoted,
    LineComment,
    BlockComment,
}

/// Accumulates the text of the statement being scanned.
#[derive(Default)]
struct Pending {
    text: String,
    start_line: Option<usize>,
    words: usize,
    starts_with_create: bool,
    /// Set once a `CREATE TRIGGER`, `PROCEDURE` or `FUNCTION` header is seen.
    compound: bool,
    depth: usize,
}

impl Pending {
    fn push(&mut self, c: char) {
        self.text.push(c);
    }

    fn push_all(&mut self, chars: &[char]) {
        self.text.extend(chars);
    }

    fn mark_code(&mut self, line: usize) {
        self.start_line.get_or_insert(line);
    }

    /// Tracks `BEGIN ... END` nesting inside compound statements.
    fn keyword(&mut self, word: &str, next_word: Option<&str>) {
        let upper = word.to_ascii_uppercase();
        if self.words == 0 {
            self.starts_with_create = upper == "CREATE";
        }
        self.words += 1;

        if self.starts_with_create
            && self.depth == 0
            && matches!(upper.as_str(), "TRIGGER" | "PROCEDURE" | "FUNCTION")
        {
            self.compound = true;
        }
        if !self.compound {
            return;
        }
        match upper.as_str() {
            "BEGIN" | "CASE" => self.depth += 1,
            "END" => {
                let closes_control_flow = next_word.is_some_and(|next| {
                    ["IF", "LOOP", "WHILE", "REPEAT", "FOR"]
                        .iter()
                        .any(|kw| next.eq_ignore_ascii_case(kw))
                });
                if !closes_control_flow {
                    self.depth = self.depth.saturating_sub(1);
                }
            }
            _ => {}
        }
    }

    fn in_block(&self) -> bool {
        self.depth > 0
    }

    fn flush(&mut self, out: &mut Vec<SqlStatement>) {
        let pending = std::mem::take(self);
        if let Some(line) = pending.start_line {
            out.push(SqlStatement {
                line,
                sql: pending.text.trim().to_string(),
            });
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// End (exclusive) of the word starting at `start`.
fn word_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|&c| !is_word_char(c))
        .map_or(chars.len(), |p| start + p)
}

/// The word following position `from`, skipping whitespace.
fn next_word(chars: &[char], from: usize) -> Option<String> {
    let start = chars[from..]
        .iter()
        .position(|c| !c.is_whitespace())
        .map(|p| from + p)?;
    if !is_word_char(chars[start]) {
        return None;
    }
    Some(chars[start..word_end(chars, start)].iter().collect())
}

/// Length of a `$tag$` opener at `start`, if there is one.
fn dollar_tag_len(chars: &[char], start: usize) -> Option<usize> {
    let tag_end = word_end(chars, start + 1);
    let first = chars.get(start + 1).copied();
    if first.is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    (chars.get(tag_end) == Some(&'$')).then_some(tag_end + 1 - start)
}

fn split_statements(sql: &str, delimiter: &Delimiter) -> Vec<SqlStatement> {
    let chars: Vec<char> = sql.chars().collect();
    let token: Vec<char> = delimiter.token().chars().collect();
    let mut statements = Vec::new();
    let mut pending = Pending::default();
    let mut state = ScanState::Code;
    let mut dollar_tag: Vec<char> = Vec::new();
    let mut line = 1;
    let mut at_line_start = true;
    let mut i = 0;

    while i < chars.len() {
        if at_line_start && delimiter.is_alone_on_line() && state == ScanState::Code {
            let end = chars[i..]
                .iter()
                .position(|&c| c == '\n')
                .map_or(chars.len(), |p| i + p);
            let text: String = chars[i..end].iter().collect();
            if text.trim().eq_ignore_ascii_case(delimiter.token()) {
                pending.flush(&mut statements);
                i = end;
                at_line_start = false;
                continue;
            }
        }
        at_line_start = false;

        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let word_start = i == 0 || !is_word_char(chars[i - 1]);

        match state {
            ScanState::Code => {
                if !delimiter.is_alone_on_line()
                    && !pending.in_block()
                    && !token.is_empty()
                    && chars[i..].starts_with(&token)
                {
                    pending.flush(&mut statements);
                    i += token.len();
                    continue;
                }
                match (c, next) {
                    ('-', Some('-')) => state = ScanState::LineComment,
                    ('/', Some('*')) => {
                        pending.push_all(&['/', '*']);
                        state = ScanState::BlockComment;
                        i += 2;
                        continue;
                    }
                    ('\'', _) => {
                        state = ScanState::SingleQuoted;
                        pending.mark_code(line);
                    }
                    ('"', _) => {
                        state = ScanState::DoubleQuoted;
                        pending.mark_code(line);
                    }
                    ('`', _) => {
                        state = ScanState::BacktickQuoted;
                        pending.mark_code(line);
                    }
                    ('$', _) if word_start => {
                        if let Some(len) = dollar_tag_len(&chars, i) {
                            dollar_tag = chars[i..i + len].to_vec();
                            pending.push_all(&dollar_tag);
                            pending.mark_code(line);
                            state = ScanState::DollarQuoted;
                            i += len;
                            continue;
                        }
                        pending.mark_code(line);
                    }
                    _ if word_start && is_word_char(c) => {
                        let end = word_end(&chars, i);
                        let word: String = chars[i..end].iter().collect();
                        pending.keyword(&word, next_word(&chars, end).as_deref());
                        pending.push_all(&chars[i..end]);
                        pending.mark_code(line);
                        i = end;
                        continue;
                    }
                    _ if !c.is_whitespace() => pending.mark_code(line),
                    _ => {}
                }
            }
            ScanState::SingleQuoted if c == '\'' => state = ScanState::Code,
            ScanState::DoubleQuoted if c == '"' => state = ScanState::Code,
            ScanState::BacktickQuoted if c == '`' => state = ScanState::Code,
            ScanState::DollarQuoted if chars[i..].starts_with(&dollar_tag) => {
                pending.push_all(&dollar_tag);
                state = ScanState::Code;
                i += dollar_tag.len();
                continue;
            }
            ScanState::LineComment if c == '\n' => state = ScanState::Code,
            ScanState::BlockComment if c == '*' && next == Some('/') => {
                pending.push_all(&['*', '/']);
                state = ScanState::Code;
                i += 2;
                continue;
            }
            _ => {}
        }

        pending.push(c);
        if c == '\n' {
            line += 1;
            at_line_start = true;
        }
        i += 1;
    }
    pending.flush(&mut statements);

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(sql: &str) -> Vec<String> {
        SqlScript::from_sql("test", sql, &Delimiter::SEMICOLON)
            .statements()
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    #[test]
    fn test_splits_on_semicolon() {
        assert_eq!(split("SELECT 1; SELECT 2;"), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_trailing_statement_without_delimiter() {
        assert_eq!(split("SELECT 1;\nSELECT 2"), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_ignores_delimiter_in_literals_and_identifiers() {
        assert_eq!(
            split("INSERT INTO \"a;b\" VALUES ('x;y', 'it''s;');"),
            vec!["INSERT INTO \"a;b\" VALUES ('x;y', 'it''s;')"]
        );
    }

    #[test]
    fn test_ignores_delimiter_in_comments() {
        assert_eq!(
            split("SELECT 1 -- not; here\n; /* nor; here */ SELECT 2;"),
            vec!["SELECT 1 -- not; here", "/* nor; here */ SELECT 2"]
        );
    }

    #[test]
    fn test_block_comment_opener_does_not_close_it() {
        assert_eq!(split("/*/ a; */ SELECT 1;"), vec!["/*/ a; */ SELECT 1"]);
    }

    #[test]
    fn test_trigger_body_is_one_statement() {
        let sql = "CREATE TRIGGER t AFTER INSERT ON a BEGIN\n INSERT INTO b VALUES (NEW.id);\n UPDATE c SET n = CASE WHEN n > 0 THEN n + 1 ELSE 1 END;\nEND;\nSELECT 1;";
        let statements = split(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TRIGGER t"));
        assert!(statements[0].ends_with("END"));
        assert_eq!(statements[1], "SELECT 1");
    }

    #[test]
    fn test_procedure_with_control_flow_blocks() {
        let sql = "CREATE PROCEDURE p()\nBEGIN\n  IF 1 THEN SELECT 1; END IF;\n  WHILE 0 DO SELECT 2; END WHILE;\nEND;\nCALL p();";
        let statements = split(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1], "CALL p()");
    }

    #[test]
    fn test_transaction_begin_is_not_a_block() {
        assert_eq!(
            split("BEGIN;\nCREATE TABLE t (a INT);\nEND;"),
            vec!["BEGIN", "CREATE TABLE t (a INT)", "END"]
        );
    }

    #[test]
    fn test_ignores_delimiter_in_dollar_quotes() {
        let sql = "CREATE FUNCTION f() RETURNS int AS $body$ BEGIN RETURN 1; END; $body$ LANGUAGE plpgsql;\nSELECT $$a;b$$, $1;";
        assert_eq!(
            split(sql),
            vec![
                "CREATE FUNCTION f() RETURNS int AS $body$ BEGIN RETURN 1; END; $body$ LANGUAGE plpgsql",
                "SELECT $$a;b$$, $1",
            ]
        );
    }

    #[test]
    fn test_ignores_delimiter_in_backticks() {
        assert_eq!(
            split("CREATE TABLE `a;b` (`c;d` INT); SELECT 1;"),
            vec!["CREATE TABLE `a;b` (`c;d` INT)", "SELECT 1"]
        );
    }

    #[test]
    fn test_comment_only_statements_are_dropped() {
        assert!(split("-- just a comment\n/* and another */;").is_empty());
        assert!(split("  ;; \n ;").is_empty());
    }

    #[test]
    fn test_records_start_line() {
        let script = SqlScript::from_sql("test", "\n\nSELECT 1;\n-- c\nSELECT\n 2;", &Delimiter::SEMICOLON);
        let lines: Vec<usize> = script.statements().iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn test_go_alone_on_line() {
        let sql = "CREATE TABLE t (a INT);\nCREATE INDEX i ON t (a);\ngo\nSELECT 'GO';\n  GO  \n";
        let script = SqlScript::from_sql("test", sql, &Delimiter::GO);
        let statements: Vec<&str> = script.statements().iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(
            statements,
            vec!["CREATE TABLE t (a INT);\nCREATE INDEX i ON t (a);", "SELECT 'GO';"]
        );
        assert_eq!(script.statements()[1].line, 4);
    }

    #[test]
    fn test_go_inside_a_line_is_not_a_delimiter() {
        let script = SqlScript::from_sql("test", "SELECT 1 GO\n", &Delimiter::GO);
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn test_parse_reads_resource() {
        let resource = Resource::named("init.sql", "SELECT 1;");
        let script = SqlScript::parse(&resource, &Delimiter::default()).unwrap();
        assert_eq!(script.resource_name(), "init.sql");
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn test_custom_delimiter() {
        let delimiter = Delimiter::new("$$", false);
        let script = SqlScript::from_sql("test", "SELECT 1$$SELECT 2", &delimiter);
        assert_eq!(script.len(), 2);
        assert_eq!(delimiter.to_string(), "$$");
    }
}
