//! Walk through a library session: stock five ISBNs, borrow one, return it.
//!
//! Run with `RUST_LOG=debug` to see every committed transition.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use lending_registry::store::SqliteStore;
use lending_registry::{
    AccountId, Isbn, IsbnKeys, ItemKey, Library, RegistryConfig, TracingSink, BORROW_FEE,
};

const FIRST_ISBN: u64 = 9780062886149;

fn readable(keys: &[ItemKey]) -> String {
    keys.iter()
        .map(|k| k.value().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn raw(keys: &[ItemKey]) -> String {
    keys.iter()
        .map(ItemKey::to_padded_hex)
        .collect::<Vec<_>>()
        .join(",")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let wallet: AccountId = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse()?;
    let store = SqliteStore::open_memory()?;
    let mut library = Library::<IsbnKeys, _>::open(RegistryConfig::new(wallet), store).await?;
    library.subscribe(TracingSink);

    println!("Library admin: {}", library.registry().owner());

    println!("\n\nAdding new books...");
    for i in 0..5 {
        let isbn = Isbn(FIRST_ISBN + i);
        let record = library.stock(&wallet, &isbn, 15).await?;
        if let Some(key) = record.event.key() {
            let stock = library.registry().get_stock(&key);
            println!(
                "\tNew Book was added with ISBN: {} with stock: {}",
                key.value(),
                stock
            );
        }
    }

    println!("\nReading Available books...");
    let available = library.registry().available_books();
    println!("\tRaw Available books: {}", raw(&available));
    println!("\tReadable Available books: {}", readable(&available));

    println!("\nBorrowing a book");
    let key = Isbn(FIRST_ISBN).key();
    let record = library.borrow(&wallet, key, BORROW_FEE).await?;
    println!("\tRecord: {}", serde_json::to_string(&record)?);

    let registry = library.registry();
    println!(
        "Book with ISBN: {} has stock: {}",
        key.value(),
        registry.get_stock(&key)
    );
    let history: Vec<String> = registry
        .book_history(&key)
        .iter()
        .map(AccountId::to_hex)
        .collect();
    println!("\tHistory: {}", history.join(","));

    let borrowed = registry.has_borrowed(&wallet);
    println!(
        "\tWallet borrowed :{} | {}",
        borrowed.to_padded_hex(),
        borrowed.value()
    );

    println!(" \n Return Book");
    library.return_book(&wallet).await?;
    let registry = library.registry();
    let borrowed = registry.has_borrowed(&wallet);
    println!(
        "\tWallet borrowed :{} | {}",
        borrowed.to_padded_hex(),
        borrowed.value()
    );
    println!(
        "\tBook with ISBN: {} has stock: {}",
        key.value(),
        registry.get_stock(&key)
    );

    let journal = library.events_since(0).await?;
    println!("\n{} events journaled", journal.len());

    Ok(())
}
