use super::Ctx;
use crate::output::CommandResult;
use neptune_core::client::PlatformApi;
use neptune_core::project;
use std::time::Duration;

const FOLLOW_INTERVAL: Duration = Duration::from_secs(2);

pub fn run(ctx: &Ctx, project_name: Option<String>, follow: bool) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let name = ctx.project_name(project_name);
    ui.header("Logs");

    let client = ctx.client()?;
    let lines = match project::get_logs(&client, &name) {
        Ok(l) => l,
        Err(e) => {
            let result = CommandResult::failure(
                vec![format!("Failed to fetch logs: {e}")],
                "neptune logs",
            )
            .with("project", &name);
            return ui.finish(&result);
        }
    };

    if ui.is_json() {
        return ui.finish(
            &CommandResult::success("neptune status")
                .with("project", &name)
                .with("logs", &lines),
        );
    }

    ui.step("", &format!("Project: {name}"));
    println!();
    if lines.is_empty() && !follow {
        ui.info("No logs available");
        return Ok(());
    }
    for line in &lines {
        println!("{line}");
    }

    if follow {
        follow_logs(&client, &name, lines)?;
    }
    Ok(())
}

/// Re-fetch every couple of seconds and print lines not seen yet. Runs until
/// interrupted.
fn follow_logs(api: &dyn PlatformApi, name: &str, mut seen: Vec<String>) -> anyhow::Result<()> {
    loop {
        std::thread::sleep(FOLLOW_INTERVAL);
        let lines = api.get_logs(name)?;
        for line in new_lines(&seen, &lines) {
            println!("{line}");
        }
        seen = lines;
    }
}

/// Lines of `current` after the longest suffix of `seen` it starts with.
fn new_lines<'a>(seen: &[String], current: &'a [String]) -> &'a [String] {
    if seen.is_empty() {
        return current;
    }
    // The log window may have scrolled: find where the old tail ends.
    for start in 0..seen.len() {
        let tail = &seen[start..];
        if current.len() >= tail.len() && current[..tail.len()] == *tail {
            return &current[tail.len()..];
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn appended_lines_are_new() {
        let seen = v(&["a", "b"]);
        let current = v(&["a", "b", "c"]);
        assert_eq!(new_lines(&seen, &current), &v(&["c"])[..]);
    }

    #[test]
    fn scrolled_window_is_handled() {
        let seen = v(&["a", "b", "c"]);
        let current = v(&["b", "c", "d", "e"]);
        assert_eq!(new_lines(&seen, &current), &v(&["d", "e"])[..]);
    }

    #[test]
    fn unrelated_window_prints_everything() {
        let seen = v(&["a"]);
        let current = v(&["x", "y"]);
        assert_eq!(new_lines(&seen, &current), &v(&["x", "y"])[..]);
    }

    #[test]
    fn nothing_new() {
        let seen = v(&["a", "b"]);
        assert!(new_lines(&seen, &seen.clone()).is_empty());
    }
}
