use crate::chat::{self, ChatStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::forms::{FoundItemForm, ImageSource, NewItemForm};
use crate::items::{self, ItemFilter, ItemStore};
use crate::models::{Item, ItemStatus};
use crate::qr;
use crate::session::{LoginRequest, ProfileUpdate, RegisterRequest, Session};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Local, NaiveDate, Utc};
use log::debug;
use std::rc::Rc;

pub const HELP: &str = "Commands:
  register <name> | <email> | <password> [| <phone>]
  login <email> <password>
  logout | whoami | profile <name> | <email>
  add <name> | <category> [| <description> | <location> | <image url or path>]
  report <name> | <category> [| <description> | <location> | <qr code> | <image url or path>]
  mine | home | categories
  found [<search>] [| <category>]
  show <item id> | scan <qr code> | delete <item id>
  chats | contact <item id> | open <chat id> | send <chat id> <message>
  exit";

const SIMILAR_SHOWN: usize = 3;
const DAY_FORMAT: &str = "%b %d, %Y";
const TIME_FORMAT: &str = "%I:%M %p";

pub enum Flow {
    Continue(String),
    Exit,
}

pub struct App<S: KeyValueStore> {
    session: Session<Rc<S>>,
    items: ItemStore<Rc<S>>,
    chats: ChatStore<Rc<S>>,
    config: Config,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: S, config: Config) -> Self {
        let store = Rc::new(store);
        App {
            session: Session::restore(Rc::clone(&store)),
            items: ItemStore::new(Rc::clone(&store)),
            chats: ChatStore::new(store),
            config,
        }
    }

    pub fn items(&self) -> &ItemStore<Rc<S>> {
        &self.items
    }

    pub fn chats(&self) -> &ChatStore<Rc<S>> {
        &self.chats
    }

    pub fn session(&self) -> &Session<Rc<S>> {
        &self.session
    }

    pub fn handle(&mut self, line: &str) -> Flow {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        let command = command.to_lowercase();
        if command == "exit" || command == "quit" {
            return Flow::Exit;
        }
        debug!("Handling command {}", command);
        match self.dispatch(&command, rest) {
            Ok(output) => Flow::Continue(output),
            Err(e) => Flow::Continue(format!("Error: {}", e)),
        }
    }

    fn dispatch(&mut self, command: &str, rest: &str) -> Result<String> {
        let args = fields(rest);
        match command {
            "" => Ok(String::new()),
            "help" => Ok(HELP.to_string()),
            "register" => {
                let user = self.session.register(RegisterRequest {
                    name: arg(&args, 0),
                    email: arg(&args, 1),
                    password: arg(&args, 2),
                    phone: args.get(3).map(|p| p.to_string()),
                })?;
                Ok(format!("Registered and logged in as {}", user.name))
            }
            "login" => {
                let user = self.session.login(LoginRequest {
                    email: arg(&args, 0),
                    password: arg(&args, 1),
                })?;
                Ok(format!("Logged in as {} <{}>", user.name, user.email))
            }
            "logout" => {
                self.session.logout()?;
                Ok("Logged out".to_string())
            }
            "whoami" => Ok(match self.session.current_user() {
                Some(user) => format!("{} <{}> (id {})", user.name, user.email, user.id),
                None => "Not logged in".to_string(),
            }),
            "profile" => {
                let user = self.session.update_profile(ProfileUpdate {
                    name: arg(&args, 0),
                    email: arg(&args, 1),
                })?;
                Ok(format!("Settings updated for {} <{}>", user.name, user.email))
            }
            "add" => self.add_item(&args),
            "report" => self.report_found(&args),
            "mine" => self.my_items(),
            "found" => Ok(self.browse_found(rest)),
            "home" => Ok(self.home()),
            "categories" => Ok(items::categories(&self.items.get_items(ItemStatus::Found)).join(", ")),
            "show" => self.show_item(rest),
            "scan" => match self.items.find_by_qr_token(rest) {
                Some(item) => Ok(describe(&item)),
                None => Err(Error::ItemNotFound(rest.to_string())),
            },
            "delete" => self.delete_item(rest),
            "chats" => self.list_chats(),
            "contact" => self.contact_owner(rest),
            "open" => self.open_chat(rest),
            "send" => {
                let (chat_id, body) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let sender_id = self.session.require_user()?.id.clone();
                let message = self.chats.send_message(chat_id, &sender_id, body, None)?;
                Ok(format!("[{}] You: {}", format_timestamp(message.timestamp, Local::now()), message.message))
            }
            other => Ok(format!("Unknown command {}. Type help for a list of commands", other)),
        }
    }

    fn add_item(&self, args: &[&str]) -> Result<String> {
        let user = self.session.require_user()?;
        let item = NewItemForm {
            name: arg(args, 0),
            category: arg(args, 1),
            description: arg(args, 2),
            location: arg(args, 3),
            image: args.get(4).and_then(|v| ImageSource::parse(v)),
        }
        .into_item(user, Utc::now())?;
        let summary = describe(&item);
        self.items.add_item(item, ItemStatus::Protected)?;
        Ok(format!("Item added: {}", summary))
    }

    fn report_found(&self, args: &[&str]) -> Result<String> {
        let user = self.session.require_user()?;
        let item = FoundItemForm {
            name: arg(args, 0),
            category: arg(args, 1),
            description: arg(args, 2),
            location: arg(args, 3),
            qr_code: arg(args, 4),
            image: args.get(5).and_then(|v| ImageSource::parse(v)),
            qr_code_image: None,
        }
        .into_item(user, Utc::now())?;
        let summary = describe(&item);
        self.items.report_found(item)?;
        Ok(format!("Found item reported: {}", summary))
    }

    fn my_items(&self) -> Result<String> {
        let user = self.session.require_user()?;
        let items = self.items.items_owned_by(&user.id, ItemStatus::Protected);
        if items.is_empty() {
            return Ok("You have no protected items yet. Use add to protect one".to_string());
        }
        Ok(list(&items))
    }

    // The whole search text is one query; only `|` introduces a category.
    fn browse_found(&self, rest: &str) -> String {
        let (query, category) = match rest.split_once('|') {
            Some((query, category)) => (query.trim(), category.trim()),
            None => (rest, ""),
        };
        let filter = ItemFilter {
            query: Some(query.to_string()).filter(|q| !q.is_empty()),
            category: Some(category.to_string()).filter(|c| !c.is_empty()),
        };
        let filtered = filter.apply(self.items.get_items(ItemStatus::Found));
        if !filtered.is_empty() {
            list(&filtered)
        } else if rest.is_empty() {
            "No found items have been reported yet".to_string()
        } else {
            "No matches. Try adjusting your search or filters".to_string()
        }
    }

    fn home(&self) -> String {
        let viewer = self.session.current_user().map(|u| u.id.as_str());
        let feed = self.items.home_feed(viewer);
        let section = |items: &[Item]| {
            if items.is_empty() {
                "  none".to_string()
            } else {
                list(items)
            }
        };
        let mut sections = Vec::new();
        if viewer.is_some() {
            sections.push(format!("Your items found by others:\n{}", section(&feed.protected_found)));
        }
        sections.push(format!("Recently found:\n{}", section(&feed.found)));
        sections.join("\n")
    }

    fn show_item(&self, id: &str) -> Result<String> {
        let item = self
            .items
            .get_item_by_id(id)
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;
        let viewer = self.session.current_user().map(|u| u.id.as_str());
        let is_owner = viewer == Some(item.user_id.as_str());

        let mut lines = vec![describe(&item)];
        if !item.description.is_empty() {
            lines.push(format!("  {}", item.description));
        }
        let added = item.date_added.with_timezone(&Local).date_naive();
        lines.push(format!("  Added {}", day_label(added, Local::now().date_naive())));
        if item.status == ItemStatus::Found {
            if let Some(contact) = &item.contact {
                for value in [&contact.name, &contact.phone, &contact.email].into_iter().flatten() {
                    lines.push(format!("  Contact: {}", value));
                }
            }
            if !is_owner {
                lines.push(format!("  Use contact {} to message the finder", item.id));
            }
        }
        if item.status == ItemStatus::Protected && is_owner {
            let token = qr::item_token(&item.id);
            lines.push(format!(
                "  QR code: {}",
                qr::image_url(&self.config.qr_endpoint, &token, self.config.qr_size)
            ));
        }
        let similar = self.items.similar_items(&item);
        if !similar.is_empty() {
            lines.push("Similar items:".to_string());
            lines.extend(similar.iter().take(SIMILAR_SHOWN).map(|other| format!("  {}", describe(other))));
        }
        Ok(lines.join("\n"))
    }

    fn delete_item(&self, id: &str) -> Result<String> {
        let user = self.session.require_user()?;
        let owned = self
            .items
            .items_owned_by(&user.id, ItemStatus::Protected)
            .iter()
            .any(|item| item.id == id);
        if !owned || !self.items.delete_item(id, ItemStatus::Protected)? {
            return Err(Error::ItemNotFound(id.to_string()));
        }
        Ok("Item deleted".to_string())
    }

    fn list_chats(&self) -> Result<String> {
        let user = self.session.require_user()?;
        let chats = self.chats.chats_for(&user.id);
        if chats.is_empty() {
            return Ok("No conversations yet".to_string());
        }
        let now = Local::now();
        let lines: Vec<String> = chats
            .iter()
            .map(|c| {
                let other = chat::other_participant(c, &user.id).unwrap_or("unknown");
                let unread = if c.unread_count > 0 && c.last_sender_id.as_deref() != Some(user.id.as_str()) {
                    format!(" ({} unread)", c.unread_count)
                } else {
                    String::new()
                };
                format!(
                    "{} {}{} [{}] {}",
                    c.id,
                    chat::display_name(other),
                    unread,
                    format_timestamp(c.last_message_timestamp, now),
                    c.last_message
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }

    fn contact_owner(&self, item_id: &str) -> Result<String> {
        let user = self.session.require_user()?;
        let item = self
            .items
            .get_item_by_id(item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;
        let chat = self.chats.open_chat(&user.id, &item.user_id, Some(&item.id))?;
        Ok(format!(
            "Chat {} with {} about {} is ready. Use send {} <message>",
            chat.id,
            chat::display_name(&item.user_id),
            item.name,
            chat.id
        ))
    }

    fn open_chat(&self, chat_id: &str) -> Result<String> {
        let user = self.session.require_user()?;
        let chat = self
            .chats
            .get_chat(chat_id)
            .filter(|c| c.has_participant(&user.id))
            .ok_or_else(|| Error::ChatNotFound(chat_id.to_string()))?;
        self.chats.mark_read(&chat.id, &user.id)?;
        let messages = self.chats.messages(&chat.id);
        if messages.is_empty() {
            return Ok("No messages yet. Start the conversation!".to_string());
        }
        let now = Local::now();
        let lines: Vec<String> = messages
            .iter()
            .map(|m| {
                let who = if m.sender_id == user.id {
                    "You".to_string()
                } else {
                    chat::display_name(&m.sender_id)
                };
                format!("[{}] {}: {}", format_timestamp(m.timestamp, now), who, m.message)
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

// Splits on `|` when present so fields may contain spaces, otherwise on whitespace.
fn fields(rest: &str) -> Vec<&str> {
    if rest.contains('|') {
        rest.split('|').map(str::trim).collect()
    } else {
        rest.split_whitespace().collect()
    }
}

fn arg(args: &[&str], index: usize) -> String {
    args.get(index).map(|v| v.to_string()).unwrap_or_default()
}

fn describe(item: &Item) -> String {
    let summary = format!("[{}] {} ({}, {})", item.id, item.name, item.category, item.status);
    match &item.location {
        Some(location) => format!("{} @ {}", summary, location),
        None => summary,
    }
}

fn list(items: &[Item]) -> String {
    items
        .iter()
        .map(|item| format!("  {}", describe(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (today - date).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        _ => date.format(DAY_FORMAT).to_string(),
    }
}

// Chat times: the clock alone for today, prefixed with the day otherwise.
fn format_timestamp(timestamp: DateTime<Utc>, now: DateTime<Local>) -> String {
    let local = timestamp.with_timezone(&Local);
    let time = local.format(TIME_FORMAT).to_string();
    match day_label(local.date_naive(), now.date_naive()).as_str() {
        "Today" => time,
        day => format!("{}, {}", day, time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::Duration;

    fn run(app: &mut App<MemoryStorage>, line: &str) -> String {
        match app.handle(line) {
            Flow::Continue(output) => output,
            Flow::Exit => panic!("unexpected exit for {}", line),
        }
    }

    fn logged_in_app() -> App<MemoryStorage> {
        let mut app = App::new(MemoryStorage::new(), Config::default());
        run(&mut app, "register Jo | jo@x.com | pw");
        app
    }

    #[test]
    fn test_commands_require_login() {
        let mut app = App::new(MemoryStorage::new(), Config::default());
        assert_eq!(run(&mut app, "mine"), "Error: Please login or register first");
        assert_eq!(run(&mut app, "login  secret"), "Error: Missing required field: password");
        assert!(run(&mut app, "login jo@x.com secret").starts_with("Logged in as Demo User"));
        assert!(matches!(app.handle("exit"), Flow::Exit));
    }

    #[test]
    fn test_add_list_and_delete() {
        let mut app = logged_in_app();
        let added = run(&mut app, "add Wallet | Accessories | Brown leather | Home");
        assert!(added.starts_with("Item added: [item-"));
        assert!(run(&mut app, "mine").contains("Wallet (Accessories, protected) @ Home"));

        let id = app.items().get_items(ItemStatus::Protected)[0].id.clone();
        let shown = run(&mut app, &format!("show {}", id));
        assert!(shown.contains("QR code: https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=lost-and-found-item-"));

        assert_eq!(run(&mut app, &format!("delete {}", id)), "Item deleted");
        assert!(run(&mut app, &format!("delete {}", id)).starts_with("Error: Item"));
        assert!(run(&mut app, "mine").starts_with("You have no protected items"));
    }

    #[test]
    fn test_add_rejects_missing_category() {
        let mut app = logged_in_app();
        assert_eq!(run(&mut app, "add Wallet"), "Error: Missing required field: category");
        assert!(app.items().get_items(ItemStatus::Protected).is_empty());
    }

    #[test]
    fn test_report_and_browse_found() {
        let mut app = logged_in_app();
        app.items().seed_demo().unwrap();
        run(&mut app, "report Umbrella | Other | Green umbrella | Library");
        assert!(run(&mut app, "found umbrella").contains("Umbrella (Other, found) @ Library"));
        let wallets = run(&mut app, "found wallet | Accessories");
        assert!(wallets.contains("[6] Wallet"));
        assert!(!wallets.contains("Umbrella"));
        assert!(run(&mut app, "found | Bags").contains("[3] Backpack"));
        assert_eq!(run(&mut app, "found zebra"), "No matches. Try adjusting your search or filters");
        assert_eq!(run(&mut app, "categories"), "Bags, Electronics, Accessories, Other");
    }

    #[test]
    fn test_found_search_keeps_spaces_in_query() {
        let mut app = logged_in_app();
        app.items().seed_demo().unwrap();
        let matches = run(&mut app, "found Black Northface");
        assert!(matches.contains("[3] Backpack"));
        assert!(!matches.contains("Headphones"));
        assert!(run(&mut app, "found red zipper | Bags").contains("[3] Backpack"));
        assert_eq!(run(&mut app, "found red zipper | Electronics"), "No matches. Try adjusting your search or filters");
    }

    #[test]
    fn test_home_without_login_shows_first_found_items() {
        let mut app = App::new(MemoryStorage::new(), Config::default());
        app.items().seed_demo().unwrap();
        let home = run(&mut app, "home");
        assert!(home.starts_with("Recently found:"));
        assert!(!home.contains("Your items found by others"));
        assert!(home.contains("[3] Backpack"));
        assert!(home.contains("[6] Wallet"));

        run(&mut app, "login jo@x.com secret");
        assert!(run(&mut app, "home").starts_with("Your items found by others:\n  none"));
    }

    #[test]
    fn test_contact_finder_and_chat() {
        let mut app = logged_in_app();
        app.items().seed_demo().unwrap();
        let shown = run(&mut app, "show 3");
        assert!(shown.contains("Contact: Jane Smith"));
        assert!(shown.contains("Use contact 3"));

        let ready = run(&mut app, "contact 3");
        let chat_id = app.chats().chats_for("123")[0].id.clone();
        assert!(ready.contains(&chat_id));

        assert!(run(&mut app, &format!("send {} Is it still there?", chat_id)).ends_with("You: Is it still there?"));
        assert!(run(&mut app, &format!("open {}", chat_id)).contains("You: Is it still there?"));
        assert!(run(&mut app, "chats").contains("User 456"));
        assert!(run(&mut app, "send nope hi").starts_with("Error: Chat nope not found"));
    }

    #[test]
    fn test_open_seeded_chat_marks_read() {
        let mut app = logged_in_app();
        app.chats().seed_demo().unwrap();
        assert!(run(&mut app, "chats").contains("(2 unread)"));
        assert!(run(&mut app, "open chat1").contains("User 456: It has initials J.D. on it. Is it yours?"));
        assert!(!run(&mut app, "chats").contains("unread"));
    }

    #[test]
    fn test_scan_and_whoami() {
        let mut app = logged_in_app();
        app.items().seed_demo().unwrap();
        assert!(run(&mut app, "scan lost-and-found-item-5").contains("Glasses"));
        assert!(run(&mut app, "scan garbage").starts_with("Error"));
        assert_eq!(run(&mut app, "whoami"), "Jo <jo@x.com> (id 123)");
        run(&mut app, "logout");
        assert_eq!(run(&mut app, "whoami"), "Not logged in");
    }

    #[test]
    fn test_format_timestamp() {
        let now = Local::now();
        let today = now.with_timezone(&Utc);
        assert!(!format_timestamp(today, now).contains("Yesterday"));
        assert!(format_timestamp(today - Duration::days(1), now).starts_with("Yesterday, "));
        let older = format_timestamp(today - Duration::days(10), now);
        assert!(!older.starts_with("Yesterday"));
    }

    #[test]
    fn test_day_label() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 21).unwrap();
        assert_eq!(day_label(today, today), "Today");
        assert_eq!(day_label(NaiveDate::from_ymd_opt(2025, 4, 20).unwrap(), today), "Yesterday");
        assert_eq!(day_label(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(), today), "Mar 05, 2025");
    }

    #[test]
    fn test_fields_split() {
        assert_eq!(fields("a | b c | d"), vec!["a", "b c", "d"]);
        assert_eq!(fields("a b  c"), vec!["a", "b", "c"]);
        assert!(fields("").is_empty());
    }
}
