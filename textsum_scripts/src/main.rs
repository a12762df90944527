use std::env;
use std::process;

use anyhow::Result;
use dotenvy::dotenv;
use getopts::Options;

use textsum_core::config::handler::ConfigurationManager;
use textsum_scripts::{
    common::ARTIFACT_FILES,
    download,
    summarize::{read_input, summarize_text},
};

fn print_usage(program: &str, opts: Options) {
    let brief = format!("Usage: {} [OPTIONS]", program);
    print!("{}", opts.usage(&brief));
    println!("\nEnvironment variables:");
    println!("  CONFIG_FILE       Path to the RON config (default config/config.ron)");
    println!("  MODEL_PATH        Overrides the configured model directory");
    println!("  TOKENIZER_PATH    Overrides the configured tokenizer directory");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt(
        "d",
        "download",
        "Download model and tokenizer artifacts from a hub repository",
        "REPO",
    );
    opts.optopt("s", "summarize", "Summarize the given text", "TEXT");
    opts.optopt("f", "file", "Summarize the contents of a file", "PATH");
    opts.optflag("h", "help", "Show this help message");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            eprintln!("Error parsing arguments: {}", f);
            print_usage(&program, opts);
            process::exit(1);
        }
    };

    if matches.opt_present("h") {
        print_usage(&program, opts);
        return Ok(());
    }

    let repo = matches.opt_str("d");
    let text = matches.opt_str("s");
    let file = matches.opt_str("f");

    let selected = [repo.is_some(), text.is_some(), file.is_some()]
        .iter()
        .filter(|set| **set)
        .count();

    if selected != 1 {
        eprintln!("Error: Specify exactly one of --download, --summarize or --file");
        print_usage(&program, opts);
        process::exit(1);
    }

    let manager = ConfigurationManager::new()?;

    if let Some(repo) = repo {
        let config = manager.get_model_evaluation_config()?;
        download::download_artifacts(&repo, ARTIFACT_FILES, &config).await?;
        return Ok(());
    }

    let input = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => read_input(&path)?,
        (None, None) => unreachable!(),
    };

    println!("📝 Summarizing {} characters...", input.chars().count());
    let summary = summarize_text(&manager, &input)?;
    println!("{}", summary);

    Ok(())
}
