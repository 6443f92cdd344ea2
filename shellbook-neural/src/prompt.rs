//! Prompt contract shared by every backend.
//!
//! Both requests ask for exactly one fenced `bash` block with no prose. The
//! command parser in `shellbook-core` tolerates replies that ignore this.

/// Persona sent as the system message of every chat request.
pub const SYSTEM_ROLE: &str = "You are an expert command-line assistant. \
Provide accurate and concise terminal commands for the user's request, \
strictly in the requested format.";

const OUTPUT_FORMAT: &str = "\
**Output Format Requirements:**
Respond *strictly* in the following Markdown format. Do not add introductions, \
explanations, apologies, greetings or sign-offs outside of it.

**Command:**
```bash
command
```
";

/// Operating system family and shell advertised to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub os: String,
    pub shell: String,
}

impl Environment {
    /// Describe the machine this process runs on.
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "linux" => "Linux",
            "macos" => "macOS",
            "windows" => "Windows",
            other => other,
        };
        Self {
            os: os.to_string(),
            shell: "bash".to_string(),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect()
    }
}

/// Wrap a free-text request in the translation prompt.
pub fn translate_prompt(request: &str, env: &Environment) -> String {
    format!(
        "**Task:** I need terminal commands, without long recipes, to achieve the following:\n\
         {request}\n\
         **Environment:**\n\
         *   Operating System: {os}\n\
         *   Shell: {shell}\n\
         \n\
         {OUTPUT_FORMAT}",
        request = request.trim(),
        os = env.os,
        shell = env.shell,
    )
}

/// Wrap a failing command and its captured output in the fix prompt.
pub fn fix_prompt(command: &str, error: &str, env: &Environment) -> String {
    format!(
        "**Task:** Running a terminal command produced an error. Return a new command that fixes it:\n\
         {command}\n\
         **Error:**\n\
         {error}\n\
         **Environment:**\n\
         *   Operating System: {os}\n\
         *   Shell: {shell}\n\
         \n\
         {OUTPUT_FORMAT}",
        command = command.trim(),
        error = error.trim(),
        os = env.os,
        shell = env.shell,
    )
}
