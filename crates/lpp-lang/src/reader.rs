/// The lines of one problem, objective first
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemBlock {
    /// Position of the block in the input, starting at 1
    pub index: usize,
    /// Source line number (1-based) of the first kept line
    pub line: usize,
    pub lines: Vec<String>,
}

/// Split LPP text into problems.
///
/// A blank line ends the current problem. Lines starting with `#` and
/// `Subject to` headers are skipped, so runs of blank lines or comment-only
/// blocks never produce an empty problem.
pub fn read_problems(source: &str) -> Vec<ProblemBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut first_line = 0;

    let mut flush = |current: &mut Vec<String>, first_line: usize| {
        if !current.is_empty() {
            blocks.push(ProblemBlock {
                index: blocks.len() + 1,
                line: first_line,
                lines: std::mem::take(current),
            });
        }
    };

    for (n, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&mut current, first_line);
        } else if line.starts_with('#') || line.starts_with("Subject") {
            continue;
        } else {
            if current.is_empty() {
                first_line = n + 1;
            }
            current.push(line.to_string());
        }
    }
    flush(&mut current, first_line);

    blocks
}
