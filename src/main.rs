use dotenv::dotenv;
use lost_and_found::config::Config;
use lost_and_found::console::{App, Flow};
use lost_and_found::storage::Storage;
use log::info;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let storage = Storage::new(&config.database_url)?;
    info!("Using database {}", config.database_url);

    let seed = config.seed_demo_data;
    let mut app = App::new(storage, config);
    if seed {
        app.items().seed_demo()?;
        app.chats().seed_demo()?;
    }

    println!("Lost & Found. Type help for a list of commands");
    if let Some(user) = app.session().current_user() {
        println!("Welcome back, {}", user.name);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match app.handle(&line) {
            Flow::Continue(output) if output.is_empty() => {}
            Flow::Continue(output) => println!("{}", output),
            Flow::Exit => break,
        }
    }

    println!("Goodbye");
    Ok(())
}
