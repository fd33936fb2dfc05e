use std::io;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docqa_cli::init_logging();
    let session = docqa_cli::load_session()?;
    println!("🤖 Offline Document Q&A ({} / {})", session.embed_model(), session.llm_model());
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    docqa_cli::run_chat(&session, stdin.lock(), &mut stdout, true).await?;
    Ok(())
}
