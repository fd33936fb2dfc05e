use std::env;
use std::io;
use std::path::PathBuf;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() { eprintln!("Usage: {} <ingest|ask|chat> [args...]", prog); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docqa_cli::init_logging();
    let (cmd, args) = parse_args();
    let session = docqa_cli::load_session()?;
    match cmd.as_str() {
        "ingest" => {
            let path = args.first().map(PathBuf::from).unwrap_or_else(|| {
                eprintln!("Usage: docqa ingest <document.txt>"); std::process::exit(1)
            });
            docqa_cli::run_ingest(&session, &path).await?;
        }
        "ask" => {
            let question = args.join(" ");
            if question.trim().is_empty() { eprintln!("Usage: docqa ask \"<question>\""); std::process::exit(1); }
            match session.ask(&question).await {
                Ok(result) => docqa_cli::print_answer(&mut io::stdout(), &result)?,
                Err(e) => {
                    tracing::debug!(kind = e.kind(), "ask failed");
                    docqa_cli::print_error(&mut io::stderr(), &e)?;
                    std::process::exit(1);
                }
            }
        }
        "chat" => {
            let stdin = io::stdin();
            docqa_cli::run_chat(&session, stdin.lock(), &mut io::stdout(), true).await?;
        }
        _ => { eprintln!("Unknown command: {}", cmd); std::process::exit(1); }
    }
    Ok(())
}
