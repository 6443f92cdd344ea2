/// Opening fence of a block whose lines are commands.
pub const BASH_FENCE: &str = "```bash";
/// Any fence; closes the current block.
pub const FENCE: &str = "```";

pub struct CommandParser;

impl CommandParser {
    /// Extract runnable commands from a model reply.
    ///
    /// Only lines inside ```` ```bash ```` blocks count. Blank lines and
    /// `#` comment lines are skipped and leading whitespace is stripped.
    /// Order is preserved across and within blocks. Text without a bash
    /// block yields an empty list.
    pub fn parse(markdown: &str) -> Vec<String> {
        let mut commands = Vec::new();
        let mut in_block = false;

        for line in markdown.trim().lines() {
            if line.contains(BASH_FENCE) {
                in_block = true;
                continue;
            }
            if line.contains(FENCE) {
                in_block = false;
                continue;
            }
            if !in_block {
                continue;
            }

            let command = line.trim_start();
            if command.trim_end().is_empty() || command.starts_with('#') {
                continue;
            }
            commands.push(command.to_string());
        }

        tracing::debug!("Parsed {} command(s) from reply", commands.len());
        commands
    }
}
