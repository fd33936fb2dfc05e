use docqa_core::config::Config;
use docqa_vector::CollectionStore;

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let store = CollectionStore::from_settings(&settings.data);
    println!("store: {}", store.root().display());
    match store.current_generation()? {
        None => println!("no collection published"),
        Some(generation) => {
            let collection = store.load()?;
            println!(
                "generation={} chunks={} pages={} dim={} embed_model={}",
                generation,
                collection.len(),
                collection.total_pages(),
                collection.dimension(),
                collection.embed_model()
            );
        }
    }
    Ok(())
}
