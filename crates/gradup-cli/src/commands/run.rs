//! The `gradup run` command.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use gradup_core::action::{parse_script, Action};
use gradup_core::attempt::{ActionOutcome, Attempt, AttemptStatus, Step, TickOutcome};
use gradup_core::error::AttemptError;
use gradup_core::report::AttemptSummary;
use gradup_core::session::{run_session, SessionObserver};
use gradup_core::traits::start_attempt;
use gradup_fixtures::config::load_config_from;
use gradup_report::html::write_html_report;

use super::{summary_headline, summary_table};

pub struct RunArgs {
    pub assessment_id: Option<String>,
    pub source: Option<String>,
    pub script: Option<PathBuf>,
    pub live: bool,
    pub output: Option<PathBuf>,
    pub format: String,
    pub config: Option<PathBuf>,
}

/// Console progress observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_action(&self, action: &Action, result: &Result<ActionOutcome, AttemptError>) {
        match result {
            Ok(outcome) => eprintln!("  {action}: {}", describe(outcome)),
            Err(e) => eprintln!("  {action}: rejected ({e})"),
        }
    }

    fn on_tick(&self, remaining_secs: u32) {
        if remaining_secs % 60 == 0 {
            eprintln!("  {} min remaining", remaining_secs / 60);
        }
    }

    fn on_auto_advance(&self, step: Step) {
        eprintln!("  auto-advance: {}", describe_step(step));
    }

    fn on_finalized(&self, summary: &AttemptSummary) {
        eprintln!("\nAttempt finished: {}", summary.end_label());
    }
}

fn describe(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Status(status) => format!("now {status}"),
        ActionOutcome::Advanced(step) => describe_step(*step).to_string(),
        ActionOutcome::Retreated(retreat) => format!("{retreat:?}").to_lowercase(),
        ActionOutcome::Selected(cursor) => format!("question {}", cursor.question + 1),
        ActionOutcome::Answered(_) => "recorded".to_string(),
        ActionOutcome::Flagged(true) => "flagged".to_string(),
        ActionOutcome::Flagged(false) => "unflagged".to_string(),
        ActionOutcome::Ticked(TickOutcome::Running(left)) => format!("{left}s left"),
        ActionOutcome::Ticked(TickOutcome::Expired) => "time expired".to_string(),
        ActionOutcome::Ticked(TickOutcome::Ignored) => "clock holding".to_string(),
    }
}

fn describe_step(step: Step) -> &'static str {
    match step {
        Step::Question => "next question",
        Step::Section => "next section",
        Step::Phase => "next phase",
        Step::Completed => "completed",
    }
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let source_name = args.source.unwrap_or_else(|| config.default_source.clone());
    let assessment_id = args
        .assessment_id
        .unwrap_or_else(|| config.default_assessment.clone());
    let output = args.output.unwrap_or_else(|| config.output_dir.clone());

    let source = config.source(&source_name)?;
    let attempt = start_attempt(source.as_ref(), &assessment_id, config.policy.to_policy()).await?;

    eprintln!(
        "gradup v{}: attempting '{}' ({} questions, {} min) from {}",
        env!("CARGO_PKG_VERSION"),
        attempt.assessment().title,
        attempt.assessment().question_count(),
        attempt.assessment().duration_minutes,
        source.name(),
    );

    let attempt = if args.live {
        anyhow::ensure!(
            args.script.is_none(),
            "--live reads actions from stdin and cannot be combined with --script"
        );
        run_live(attempt).await
    } else {
        let content = match &args.script {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read script: {}", path.display()))?,
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read actions from stdin")?;
                buf
            }
        };
        let actions = parse_script(&content)?;
        let mut attempt = attempt;
        run_scripted(&mut attempt, &actions, &ConsoleObserver);
        attempt
    };

    print_state(&attempt);

    match attempt.summary() {
        Ok(summary) => {
            println!("{}", summary_headline(&summary));
            println!("{}", summary_table(&summary));
            write_reports(&summary, &output, &args.format)?;
        }
        Err(_) => println!("Attempt not finished; no report written."),
    }

    Ok(())
}

/// Apply actions in order, executing auto-advance requests immediately.
fn run_scripted(attempt: &mut Attempt, actions: &[Action], observer: &dyn SessionObserver) {
    for action in actions {
        let result = attempt.apply(action);
        let pending = match &result {
            Ok(ActionOutcome::Answered(Some(request))) => Some(*request),
            _ => None,
        };
        observer.on_action(action, &result);

        if let Some(request) = pending {
            if let Ok(Some(step)) = attempt.auto_advance(&request) {
                observer.on_auto_advance(step);
            }
        }
    }

    if let Ok(summary) = attempt.summary() {
        observer.on_finalized(&summary);
    }
}

/// Stream stdin lines into a real-time session.
///
/// The blocking stdin read can hold runtime shutdown until the next line
/// arrives.
async fn run_live(attempt: Attempt) -> Attempt {
    let (tx, rx) = mpsc::channel(32);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut line_no = 0;
        while let Ok(Some(line)) = lines.next_line().await {
            line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match trimmed.parse::<Action>() {
                Ok(action) => {
                    if tx.send(action).await.is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("  line {line_no}: {e}"),
            }
        }
    });

    let attempt = run_session(attempt, rx, &ConsoleObserver).await;
    reader.abort();
    attempt
}

fn print_state(attempt: &Attempt) {
    println!("Status: {}", attempt.status());
    if attempt.status() == AttemptStatus::Report {
        return;
    }

    let question = attempt.current_question();
    println!(
        "Position: {} / {} / question {} ({})",
        attempt.current_phase().label,
        attempt.current_section().label,
        attempt.cursor().question + 1,
        question.id
    );
    println!("Time remaining: {}", attempt.timer().clock());

    let marks: Vec<String> = attempt
        .sidebar()
        .iter()
        .map(|entry| {
            let mut mark = format!("{}", entry.index + 1);
            if entry.answered {
                mark.push('*');
            }
            if entry.flagged {
                mark.push('!');
            }
            if entry.current {
                mark = format!("[{mark}]");
            }
            mark
        })
        .collect();
    println!("Section: {}", marks.join(" "));
}

fn write_reports(summary: &AttemptSummary, output: &Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create output dir: {}", output.display()))?;
    let stem = format!(
        "attempt-{}-{}",
        summary.assessment_id,
        chrono::Utc::now().format("%Y-%m-%dT%H%M%S")
    );

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in formats {
        match fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                summary.save_json(&path)?;
                eprintln!("Summary saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(summary, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("{stem}.md"));
                std::fs::write(&path, summary.to_markdown())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Markdown report: {}", path.display());
            }
            other => eprintln!("Unknown format: {other}"),
        }
    }

    Ok(())
}
