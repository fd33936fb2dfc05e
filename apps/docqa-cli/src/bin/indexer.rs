use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docqa_cli::init_logging();
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(path) = args.iter().find(|a| !a.starts_with('-')).map(PathBuf::from) else {
        eprintln!("Usage: docqa-ingest <document.txt>");
        std::process::exit(1);
    };
    let session = docqa_cli::load_session()?;
    println!("Document Indexer\n================");
    docqa_cli::run_ingest(&session, &path).await?;
    println!("\n💡 To ask questions, use: docqa-chat");
    Ok(())
}
