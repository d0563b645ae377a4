//! Failure message rendering
//!
//! Builds the human readable text attached to a file result when at least
//! one case failed.

use crate::models::report::ReportCase;

const TITLE_INDENT: &str = "  ";
const MESSAGE_INDENT: &str = "    ";
const TITLE_BULLET: &str = "\u{25cf} ";

const BOLD_RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Render every failed case as a bold title followed by its indented detail.
///
/// Blocks are separated by a blank line and the whole message ends with a
/// newline.
pub fn format_failure_message(cases: &[ReportCase], colorize: bool) -> String {
    let blocks: Vec<String> = cases
        .iter()
        .filter(|case| case.is_failed())
        .map(|case| {
            let title = format!("{TITLE_INDENT}{TITLE_BULLET}{}", case.name);
            let title = if colorize {
                format!("{BOLD_RED}{title}{RESET}")
            } else {
                title
            };
            format!("{title}\n\n{}", indent(&case.call.longrepr))
        })
        .collect();

    let mut message = blocks.join("\n\n");
    message.push('\n');
    message
}

fn indent(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("{MESSAGE_INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
