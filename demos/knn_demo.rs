use hnsw_index::{Config, Index, MemoryStorage};

#[tokio::main]
async fn main() -> hnsw_index::Result<()> {
    let index: Index<&str, MemoryStorage<&str>> =
        Index::new(MemoryStorage::new(), Config::builder().build()?);

    index.insert(vec![255.0, 0.0, 0.0], Some("red")).await?;
    index.insert(vec![0.0, 255.0, 0.0], Some("green")).await?;
    index.insert(vec![0.0, 0.0, 255.0], Some("blue")).await?;

    let hits = index.knn_search(&vec![204.0, 85.0, 0.0], 1).await?;
    let closest = hits.first().expect("non-empty index");
    let tag = index.get_metadata(closest.id).await?.expect("tagged on insert");
    println!("{tag}");

    Ok(())
}
