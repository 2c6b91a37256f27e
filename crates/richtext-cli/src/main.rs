use anyhow::{Context, Result, anyhow, bail};
use richtext_config::Config;
use richtext_engine::{Bias, EditResult, Editor, EditorError, Position, Selection};
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use std::{env, fs, process};

/// One line of an editing script.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// Place the selection. Points are flat offsets (`7`) or tree
    /// positions (`0.1.0:3`, `:0` for the root).
    Select(Point, Option<Point>),
    Run(String, Option<String>),
    Paste(String),
    /// Replace the content as if typed into the renderer.
    Input(String),
    /// Advance the script clock and let pending typing commit.
    Wait(u64),
    Undo,
    Redo,
    Print,
    Text,
    Count,
    ShowSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Point {
    Offset(usize),
    Tree(Position),
}

fn parse_point(token: &str) -> Result<Point> {
    let Some((path, offset)) = token.split_once(':') else {
        let offset = token
            .parse()
            .with_context(|| format!("invalid offset `{token}`"))?;
        return Ok(Point::Offset(offset));
    };
    let path = if path.is_empty() {
        Vec::new()
    } else {
        path.split('.')
            .map(|index| {
                index
                    .parse::<usize>()
                    .with_context(|| format!("invalid path index `{index}` in `{token}`"))
            })
            .collect::<Result<Vec<_>>>()?
    };
    let offset = offset
        .parse()
        .with_context(|| format!("invalid offset in `{token}`"))?;
    Ok(Point::Tree(Position::new(path, offset)))
}

/// Parse one script line. Blank lines and `#` comments give `None`.
fn parse_line(line: &str) -> Result<Option<Step>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let rest_or_none = || (!rest.is_empty()).then(|| rest.to_string());

    let step = match word {
        "select" => {
            let mut points = rest.split_whitespace().map(parse_point);
            let anchor = points
                .next()
                .ok_or_else(|| anyhow!("select needs at least one point"))??;
            let focus = points.next().transpose()?;
            if points.next().is_some() {
                bail!("select takes at most two points");
            }
            Step::Select(anchor, focus)
        }
        "run" => {
            let (name, value) = match rest.split_once(char::is_whitespace) {
                Some((name, value)) => (name, Some(value.trim().to_string())),
                None => (rest, None),
            };
            if name.is_empty() {
                bail!("run needs a command name");
            }
            Step::Run(name.to_string(), value)
        }
        "paste" => Step::Paste(rest.to_string()),
        "input" => Step::Input(rest_or_none().ok_or_else(|| anyhow!("input needs markup"))?),
        "wait" => Step::Wait(
            rest.parse()
                .with_context(|| format!("invalid milliseconds `{rest}`"))?,
        ),
        "undo" => Step::Undo,
        "redo" => Step::Redo,
        "print" => Step::Print,
        "text" => Step::Text,
        "count" => Step::Count,
        "selection" => Step::ShowSelection,
        other => bail!("unknown script command `{other}`"),
    };
    Ok(Some(step))
}

/// Runs script steps against one editor, writing results to `out`.
struct ScriptRunner<W: Write> {
    editor: Editor,
    clock: Instant,
    out: W,
}

impl<W: Write> ScriptRunner<W> {
    fn new(config: &Config, out: W) -> Self {
        Self {
            editor: Editor::new(config),
            clock: Instant::now(),
            out,
        }
    }

    fn resolve(&self, point: &Point) -> Position {
        match point {
            Point::Offset(offset) => self.editor.document().position_at(*offset, Bias::Backward),
            Point::Tree(position) => position.clone(),
        }
    }

    fn step(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Select(anchor, focus) => {
                let anchor = self.resolve(&anchor);
                let focus = focus.map_or_else(|| anchor.clone(), |focus| self.resolve(&focus));
                if !self.editor.select(&Selection::new(anchor, focus)) {
                    writeln!(self.out, "selection not placed")?;
                }
            }
            Step::Run(name, value) => {
                let result = self.editor.run(&name, value.as_deref());
                self.report(result)?;
            }
            Step::Paste(text) => {
                let result = self.editor.on_paste(&text);
                self.report(result)?;
            }
            Step::Input(markup) => {
                let result = self.editor.on_input(&markup, self.clock);
                self.report(result)?;
            }
            Step::Wait(ms) => {
                self.clock += Duration::from_millis(ms);
                if self.editor.tick(self.clock) {
                    log::info!("Typing committed to history");
                }
            }
            Step::Undo => match self.editor.undo() {
                Some(result) => self.report(Ok(result))?,
                None => writeln!(self.out, "nothing to undo")?,
            },
            Step::Redo => match self.editor.redo() {
                Some(result) => self.report(Ok(result))?,
                None => writeln!(self.out, "nothing to redo")?,
            },
            Step::Print => writeln!(self.out, "{}", self.editor.content())?,
            Step::Text => writeln!(self.out, "{}", self.editor.text_content())?,
            Step::Count => writeln!(self.out, "{}", self.editor.char_count())?,
            Step::ShowSelection => match self.editor.selection() {
                Some(selection) => writeln!(
                    self.out,
                    "{} {}",
                    format_position(&selection.anchor),
                    format_position(&selection.focus)
                )?,
                None => writeln!(self.out, "no selection")?,
            },
        }
        Ok(())
    }

    /// Command failures are part of a script's output, not fatal.
    fn report(&mut self, result: Result<EditResult, EditorError>) -> Result<()> {
        match result {
            Ok(result) => writeln!(self.out, "{}", result.content)?,
            Err(err) => {
                log::warn!("Command failed: {err}");
                writeln!(self.out, "error: {err}")?;
            }
        }
        Ok(())
    }

    fn run_script(&mut self, script: &str) -> Result<()> {
        for (number, line) in script.lines().enumerate() {
            let step = parse_line(line).with_context(|| format!("line {}", number + 1))?;
            if let Some(step) = step {
                log::debug!("Step {}: {step:?}", number + 1);
                self.step(step)?;
            }
        }
        Ok(())
    }
}

fn format_position(position: &Position) -> String {
    let path: Vec<String> = position.path.iter().map(usize::to_string).collect();
    format!("{}:{}", path.join("."), position.offset)
}

fn read_script(args: &[String]) -> Result<String> {
    match args.get(1).map(String::as_str) {
        Some("-") | None => {
            let mut script = String::new();
            std::io::stdin()
                .read_to_string(&mut script)
                .context("failed to read script from stdin")?;
            Ok(script)
        }
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}")),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [script-file]", args[0]);
        eprintln!("Reads the script from stdin when no file is given.");
        process::exit(1);
    }

    let config = Config::load_or_default()?;
    let script = read_script(&args)?;

    let stdout = std::io::stdout();
    let mut runner = ScriptRunner::new(&config, stdout.lock());
    runner.run_script(&script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(script: &str) -> String {
        let mut out = Vec::new();
        {
            let mut runner = ScriptRunner::new(&Config::default(), &mut out);
            runner.run_script(script).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    // ============ parse_line tests ============

    #[test]
    fn test_parse_points() {
        assert_eq!(parse_point("7").unwrap(), Point::Offset(7));
        assert_eq!(
            parse_point("0.1.0:3").unwrap(),
            Point::Tree(Position::new(vec![0, 1, 0], 3))
        );
        assert_eq!(parse_point(":0").unwrap(), Point::Tree(Position::new(vec![], 0)));
        assert!(parse_point("0.x:1").is_err());
    }

    #[test]
    fn test_parse_run_with_value() {
        assert_eq!(
            parse_line("run set-text-color  dark red").unwrap(),
            Some(Step::Run("set-text-color".into(), Some("dark red".into())))
        );
        assert_eq!(
            parse_line("run bold").unwrap(),
            Some(Step::Run("bold".into(), None))
        );
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# a comment").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("select").is_err());
        assert!(parse_line("select 1 2 3").is_err());
        assert!(parse_line("wait soon").is_err());
        assert!(parse_line("explode").is_err());
    }

    // ============ ScriptRunner tests ============

    #[test]
    fn test_script_formats_and_undoes() {
        let output = run("input <p>hello</p>\nwait 600\nselect 0 5\nrun bold\nundo\nundo\nundo\n");

        assert_eq!(
            output,
            "<p>hello</p>\n<p><strong>hello</strong></p>\n<p>hello</p>\n<p></p>\nnothing to undo\n"
        );
    }

    #[test]
    fn test_script_reports_command_errors() {
        let output = run("select 0\nrun bold\nrun strikethrough\nprint\n");

        assert_eq!(
            output,
            "error: no active selection to apply the command to\nerror: unsupported command: strikethrough\n<p></p>\n"
        );
    }

    #[test]
    fn test_script_queries() {
        let output = run("input <p>ab</p><p>c</p>\nselect 0.0:1\nselection\ntext\ncount\n");

        assert_eq!(output, "<p>ab</p><p>c</p>\n0.0:1 0.0:1\nabc\n3\n");
    }
}
