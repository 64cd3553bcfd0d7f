use std::io::Write;
use std::process::{Command, Stdio};

/// A clipboard program and the arguments that make it read stdin.
pub type ClipboardCommand = (&'static str, &'static [&'static str]);

/// Clipboard programs to try on this platform, in order.
pub fn platform_commands() -> &'static [ClipboardCommand] {
    #[cfg(target_os = "macos")]
    {
        &[("pbcopy", &[])]
    }
    #[cfg(target_os = "windows")]
    {
        &[("cmd", &["/C", "clip"])]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        &[
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ]
    }
}

pub fn copy_to_clipboard(text: &str) -> Result<(), String> {
    copy_with(platform_commands(), text)
}

/// Tries each command until one succeeds.
pub fn copy_with(commands: &[ClipboardCommand], text: &str) -> Result<(), String> {
    let mut last_error = None;
    for (cmd, args) in commands {
        match run_with_stdin(cmd, args, text) {
            Ok(()) => return Ok(()),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| "No clipboard command configured".to_string()))
}

fn run_with_stdin(cmd: &str, args: &[&str], input: &str) -> Result<(), String> {
    match Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(mut child) => {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(input.as_bytes());
            }
            match child.wait() {
                Ok(status) if status.success() => Ok(()),
                _ => Err(format!("Clipboard command `{}` failed", cmd)),
            }
        }
        Err(_) => Err(format!("Clipboard command `{}` not available", cmd)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_programs_report_the_last_failure() {
        let commands: &[ClipboardCommand] = &[
            ("vellum-no-such-clipboard-a", &[]),
            ("vellum-no-such-clipboard-b", &[]),
        ];
        let err = copy_with(commands, "text").unwrap_err();
        assert!(err.contains("vellum-no-such-clipboard-b"));
        assert!(err.contains("not available"));
    }

    #[test]
    fn empty_command_list_is_an_error() {
        assert!(copy_with(&[], "text").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn first_working_program_wins() {
        let commands: &[ClipboardCommand] = &[("vellum-no-such-clipboard", &[]), ("cat", &[])];
        assert!(copy_with(commands, "text").is_ok());
    }
}
