use colored::Colorize;
use neptune_core::lint::LintAssessment;
use neptune_core::models::{AiLintFinding, AiLintReport};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    #[default]
    Normal,
    Json,
}

// ---------------------------------------------------------------------------
// Structured results
// ---------------------------------------------------------------------------

/// The object every command prints in JSON mode.
#[derive(Debug, Serialize)]
pub struct CommandResult {
    pub ok: bool,
    pub messages: Vec<String>,
    pub next_action_command: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl CommandResult {
    pub fn success(next_action_command: impl Into<String>) -> Self {
        CommandResult {
            ok: true,
            messages: Vec::new(),
            next_action_command: next_action_command.into(),
            data: Map::new(),
        }
    }

    pub fn failure(messages: Vec<String>, next_action_command: impl Into<String>) -> Self {
        CommandResult {
            ok: false,
            messages,
            next_action_command: next_action_command.into(),
            data: Map::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.data.insert(key.to_string(), value);
        self
    }
}

/// A failure that has already been shown to the user; `main` only sets the
/// exit code.
#[derive(Debug, thiserror::Error)]
#[error("command failed")]
pub struct Reported;

// ---------------------------------------------------------------------------
// Terminal UI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Ui {
    mode: OutputMode,
    verbose: bool,
}

impl Ui {
    pub fn new(mode: OutputMode, verbose: bool) -> Self {
        Ui { mode, verbose }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    pub fn header(&self, title: &str) {
        if self.is_json() {
            return;
        }
        println!();
        println!("{} {}", "🔵 Neptune •".blue().bold(), title.bold());
    }

    pub fn step(&self, icon: &str, message: &str) {
        if self.is_json() {
            return;
        }
        if icon.is_empty() {
            println!("   {message}");
        } else {
            println!("{icon} {message}");
        }
    }

    /// Shown only with `--verbose`.
    pub fn detail(&self, message: &str) {
        if self.verbose {
            self.step("", &message.dimmed().to_string());
        }
    }

    pub fn info(&self, message: &str) {
        if !self.is_json() {
            println!("ℹ️  {message}");
        }
    }

    pub fn success(&self, message: &str) {
        if !self.is_json() {
            println!("{}", format!("✅ {message}").green());
        }
    }

    pub fn warn(&self, message: &str) {
        if !self.is_json() {
            println!("{}", format!("⚠️  {message}").yellow());
        }
    }

    pub fn error(&self, message: &str) {
        if !self.is_json() {
            eprintln!("{}", format!("❌ {message}").red().bold());
        }
    }

    pub fn plain(&self, text: &str) {
        if !self.is_json() {
            println!("{text}");
        }
    }

    /// Print the final result of a command. JSON mode prints the whole
    /// object; normal mode prints only failure messages and the next step.
    pub fn finish(&self, result: &CommandResult) -> anyhow::Result<()> {
        if self.is_json() {
            print_json(result)?;
        } else if !result.ok {
            let mut messages = result.messages.iter();
            if let Some(first) = messages.next() {
                self.error(first);
            }
            for m in messages {
                self.info(m);
            }
            if !result.next_action_command.is_empty() {
                self.step("👉", &format!("Next: {}", result.next_action_command));
            }
        }
        if result.ok {
            Ok(())
        } else {
            Err(Reported.into())
        }
    }

    /// Yes/no prompt. Without a terminal (or in JSON mode) the default is
    /// taken without asking.
    pub fn confirm(&self, prompt: &str, default: bool) -> anyhow::Result<bool> {
        if self.is_json() || !std::io::stdin().is_terminal() {
            return Ok(default);
        }
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    pub fn input(&self, prompt: &str, default: Option<&str>) -> anyhow::Result<String> {
        if self.is_json() || !std::io::stdin().is_terminal() {
            return default.map(str::to_string).ok_or_else(|| {
                anyhow::anyhow!("{prompt} is required when not running interactively")
            });
        }
        let mut input = dialoguer::Input::<String>::new().with_prompt(prompt);
        if let Some(d) = default {
            input = input.default(d.to_string());
        }
        Ok(input.interact_text()?)
    }

    pub fn password(&self, prompt: &str) -> anyhow::Result<String> {
        if self.is_json() || !std::io::stdin().is_terminal() {
            anyhow::bail!("{prompt} is required when not running interactively");
        }
        Ok(dialoguer::Password::new().with_prompt(prompt).interact()?)
    }

    pub fn lint_report(&self, report: &AiLintReport, assessment: Option<&LintAssessment>) {
        if self.is_json() {
            return;
        }
        if report.is_empty() {
            self.success("No AI lint findings");
            return;
        }
        let sections: [(&str, &Vec<AiLintFinding>); 3] = [
            ("Errors", &report.errors),
            ("Warnings", &report.warnings),
            ("Suppressed", &report.suppressed),
        ];
        for (title, findings) in sections {
            if findings.is_empty() {
                continue;
            }
            let heading = format!("{title} ({})", findings.len());
            match title {
                "Errors" => println!("\n{}", heading.red().bold()),
                "Warnings" => println!("\n{}", heading.yellow().bold()),
                _ => println!("\n{}", heading.dimmed()),
            }
            print_table(
                &["Category", "Code", "Message", "Path", "Suggestion"],
                findings
                    .iter()
                    .map(|f| {
                        vec![
                            f.category.label().to_string(),
                            f.code.clone(),
                            f.message.clone(),
                            f.path.clone().unwrap_or_default(),
                            f.suggestion.clone().unwrap_or_default(),
                        ]
                    })
                    .collect(),
            );
        }
        if let Some(a) = assessment {
            println!();
            for reason in &a.reasons {
                self.warn(&format!("Blocking: {reason}"));
            }
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").bold());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}
