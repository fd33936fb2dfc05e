use docqa_core::config::Config;
use docqa_core::traits::Embedder;
use docqa_embed::get_default_embedder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = get_default_embedder(&settings.ollama)?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts).await?;
    println!("model={} B={} dim={}", embedder.model_id(), embs.len(), embs.first().map_or(0, Vec::len));
    Ok(())
}
