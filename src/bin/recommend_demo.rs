//! Demo: survey answers (JSON) → rendered recommendation report.
//!
//! Usage: `recommend_demo <answers.json> [--json] [--top N]`

use anyhow::{bail, Context};
use career_recommender::{report, Recommender, SurveyAnswers, Tagger};
use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recommender=info,warn"));

    // LOG_FORMAT=json switches to one JSON object per line
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

struct Args {
    path: String,
    json: bool,
    top_n: usize,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut path = None;
    let mut json = false;
    let mut top_n = 0;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--top" => {
                let n = it.next().context("--top needs a number")?;
                top_n = n.parse().with_context(|| format!("invalid --top value `{n}`"))?;
            }
            _ if path.is_none() => path = Some(arg),
            other => bail!("unexpected argument `{other}`"),
        }
    }
    let Some(path) = path else {
        bail!("usage: recommend_demo <answers.json> [--json] [--top N]");
    };
    Ok(Args { path, json, top_n })
}

fn main() -> anyhow::Result<()> {
    // Load .env if present; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = parse_args()?;
    let raw = fs::read_to_string(&args.path)
        .with_context(|| format!("reading answers from {}", args.path))?;
    let answers: SurveyAnswers =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.path))?;

    let recommender = Recommender::from_env()?;
    let tagger = Tagger::load_default()?;
    let student = tagger.profile(&answers, &recommender.config().sectors);
    let result = recommender.recommend(&student, args.top_n);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", report::render(&result));
    }
    Ok(())
}
