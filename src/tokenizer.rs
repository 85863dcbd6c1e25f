//! Splitting an input line into argument tokens.
//!
//! Tokens are borrowed slices of the input line, so an [`ArgVector`] cannot outlive
//! the line it was parsed from.

/// Capacity of the input line buffer in bytes.
///
/// Also bounds the number of tokens an [`ArgVector`] may hold.
pub const LINE_CAPACITY: usize = 80;

/// The token separating the two stages of a pipeline.
pub const PIPE_TOKEN: &str = "|";

/// Where (if anywhere) the pipe separator was found in a parsed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipePosition {
    /// The line was empty or contained only whitespace.
    Empty,
    /// The line holds a single command.
    NoPipe,
    /// Zero-based index of the first `|` token.
    At(usize),
}

impl PipePosition {
    /// Integer encoding used by the classic C shell loop: `0` for an empty line,
    /// `-1` for no pipe, otherwise the separator index.
    ///
    /// Note that `At(0)` and `Empty` share the encoding `0`.
    pub fn as_raw(self) -> isize {
        match self {
            PipePosition::Empty => 0,
            PipePosition::NoPipe => -1,
            PipePosition::At(i) => i as isize,
        }
    }
}

/// Ordered, capacity-bounded sequence of tokens borrowed from an input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgVector<'line> {
    tokens: Vec<&'line str>,
}

impl<'line> ArgVector<'line> {
    /// Maximum number of tokens kept; further tokens are dropped.
    pub const CAPACITY: usize = LINE_CAPACITY;

    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Appends a token. Returns `false` (and drops the token) once the vector is full.
    fn push(&mut self, token: &'line str) -> bool {
        if self.tokens.len() >= Self::CAPACITY {
            return false;
        }
        self.tokens.push(token);
        true
    }

    pub fn as_slice(&self) -> &[&'line str] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The command name, i.e. the first token.
    pub fn command(&self) -> Option<&'line str> {
        self.tokens.first().copied()
    }

    /// Splits the vector around the separator at `index`.
    ///
    /// The separator itself belongs to neither half. An `index` past the end
    /// yields the whole vector and an empty second stage.
    pub fn split_at_pipe(&self, index: usize) -> (&[&'line str], &[&'line str]) {
        if index >= self.tokens.len() {
            return (&self.tokens, &[]);
        }
        (&self.tokens[..index], &self.tokens[index + 1..])
    }
}

impl<'line> std::ops::Deref for ArgVector<'line> {
    type Target = [&'line str];

    fn deref(&self) -> &Self::Target {
        &self.tokens
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\r')
}

/// Cuts a raw line down to what fits in the input buffer.
///
/// One byte of [`LINE_CAPACITY`] is reserved for the terminator, so at most
/// `LINE_CAPACITY - 1` bytes survive. The cut never splits a UTF-8 character.
pub fn truncate_line(line: &str) -> &str {
    let limit = LINE_CAPACITY - 1;
    if line.len() <= limit {
        return line;
    }
    let mut end = limit;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

/// Tokenizes one input line.
///
/// Returns [`PipePosition::Empty`] and an empty vector for blank input. Otherwise
/// every maximal run of non-whitespace becomes a token; the index of the first `|`
/// token is reported, and later `|` tokens stay ordinary arguments.
///
/// # Arguments
/// * `line` - The input line. Tokens borrow from it.
pub fn parse(line: &str) -> (PipePosition, ArgVector<'_>) {
    let mut args = ArgVector::new();
    let mut position = PipePosition::NoPipe;

    for token in line.split(is_delimiter).filter(|t| !t.is_empty()) {
        let index = args.len();
        if !args.push(token) {
            break;
        }
        if token == PIPE_TOKEN && position == PipePosition::NoPipe {
            position = PipePosition::At(index);
        }
    }

    if args.is_empty() {
        return (PipePosition::Empty, args);
    }
    (position, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_empty() {
        for line in ["", " ", "\n", "   \t \n"] {
            let (pos, args) = parse(line);
            assert_eq!(pos, PipePosition::Empty, "line {:?}", line);
            assert!(args.is_empty());
            assert_eq!(pos.as_raw(), 0);
        }
    }

    #[test]
    fn simple_command_has_no_pipe() {
        let (pos, args) = parse("echo hi");
        assert_eq!(pos, PipePosition::NoPipe);
        assert_eq!(pos.as_raw(), -1);
        assert_eq!(args.as_slice(), &["echo", "hi"]);
    }

    #[test]
    fn runs_of_spaces_and_trailing_newline_are_collapsed() {
        let (pos, args) = parse("  ls    -l   /tmp \n");
        assert_eq!(pos, PipePosition::NoPipe);
        assert_eq!(args.as_slice(), &["ls", "-l", "/tmp"]);
    }

    #[test]
    fn pipe_is_found_and_split_out() {
        let (pos, args) = parse("ls | wc");
        assert_eq!(pos, PipePosition::At(1));
        assert_eq!(pos.as_raw(), 1);

        let (left, right) = args.split_at_pipe(1);
        assert_eq!(left, &["ls"]);
        assert_eq!(right, &["wc"]);
    }

    #[test]
    fn pipe_with_arguments_on_both_sides() {
        let (pos, args) = parse("ls -la /usr | grep -c bin");
        assert_eq!(pos, PipePosition::At(3));
        let (left, right) = args.split_at_pipe(3);
        assert_eq!(left, &["ls", "-la", "/usr"]);
        assert_eq!(right, &["grep", "-c", "bin"]);
    }

    #[test]
    fn only_first_pipe_counts() {
        let (pos, args) = parse("a | b | c");
        assert_eq!(pos, PipePosition::At(1));
        let (left, right) = args.split_at_pipe(1);
        assert_eq!(left, &["a"]);
        assert_eq!(right, &["b", "|", "c"]);
    }

    #[test]
    fn pipe_glued_to_a_word_is_not_a_separator() {
        let (pos, args) = parse("ls|wc");
        assert_eq!(pos, PipePosition::NoPipe);
        assert_eq!(args.as_slice(), &["ls|wc"]);
    }

    #[test]
    fn leading_pipe_is_position_zero() {
        let (pos, _) = parse("| wc");
        assert_eq!(pos, PipePosition::At(0));
    }

    #[test]
    fn trailing_pipe_leaves_empty_second_stage() {
        let (pos, args) = parse("ls |");
        assert_eq!(pos, PipePosition::At(1));
        let (left, right) = args.split_at_pipe(1);
        assert_eq!(left, &["ls"]);
        assert!(right.is_empty());
    }

    #[test]
    fn tokens_past_capacity_are_dropped() {
        let line = "x ".repeat(ArgVector::CAPACITY + 10);
        let (pos, args) = parse(&line);
        assert_eq!(pos, PipePosition::NoPipe);
        assert_eq!(args.len(), ArgVector::CAPACITY);
    }

    #[test]
    fn dropped_pipe_does_not_split() {
        let line = format!("{}| y", "x ".repeat(ArgVector::CAPACITY));
        let (pos, args) = parse(&line);
        assert_eq!(pos, PipePosition::NoPipe);
        assert_eq!(args.len(), ArgVector::CAPACITY);
        assert!(!args.contains(&PIPE_TOKEN));

        let line = format!("{}| y", "x ".repeat(ArgVector::CAPACITY - 1));
        let (pos, _) = parse(&line);
        assert_eq!(pos, PipePosition::At(ArgVector::CAPACITY - 1));
    }

    #[test]
    fn truncate_keeps_short_lines() {
        assert_eq!(truncate_line("echo hi"), "echo hi");
    }

    #[test]
    fn truncate_cuts_long_lines() {
        let line = "a".repeat(200);
        assert_eq!(truncate_line(&line).len(), LINE_CAPACITY - 1);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // 'é' is two bytes, so byte 79 falls inside a character
        let line = format!("{}{}", "a".repeat(78), "é".repeat(5));
        let cut = truncate_line(&line);
        assert_eq!(cut.len(), 78);
        assert!(cut.chars().all(|c| c == 'a'));
    }
}
