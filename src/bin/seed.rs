use dotenv::dotenv;
use lost_and_found::chat::ChatStore;
use lost_and_found::config::Config;
use lost_and_found::items::ItemStore;
use lost_and_found::storage::Storage;
use log::info;
use std::env;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let reset = env::args().skip(1).any(|arg| arg == "--reset");
    let config = Config::from_env();
    let storage = Rc::new(Storage::new(&config.database_url)?);
    let items = ItemStore::new(Rc::clone(&storage));
    let chats = ChatStore::new(Rc::clone(&storage));

    if reset {
        items.clear_all_items()?;
        info!("Removed all items from {}", config.database_url);
    }
    let seeded_items = items.seed_demo()?;
    let seeded_chats = chats.seed_demo()?;

    println!(
        "{}: items {}, chats {}",
        config.database_url,
        if seeded_items { "seeded" } else { "already present" },
        if seeded_chats { "seeded" } else { "already present" }
    );
    println!("Stored keys: {}", storage.keys()?.join(", "));
    Ok(())
}
