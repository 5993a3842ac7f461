use crate::models::{Chat, ChatMessage, Contact, Item, ItemStatus};
use chrono::{DateTime, TimeZone, Utc};

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
        .single()
        .unwrap_or_default()
}

fn contact(name: &str, phone: &str, email: &str) -> Option<Contact> {
    Some(Contact {
        name: Some(name.to_string()),
        phone: Some(phone.to_string()),
        email: Some(email.to_string()),
    })
}

#[allow(clippy::too_many_arguments)]
fn item(
    id: &str,
    name: &str,
    description: &str,
    image: &str,
    category: &str,
    status: ItemStatus,
    date_added: DateTime<Utc>,
    user_id: &str,
    location: &str,
    contact: Option<Contact>,
) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        image: image.to_string(),
        status,
        date_added,
        user_id: user_id.to_string(),
        location: Some(location.to_string()),
        contact,
        qr_code: None,
        qr_code_image: None,
        is_found: None,
    }
}

pub fn items() -> Vec<Item> {
    vec![
        item(
            "1",
            "Wallet",
            "Brown leather wallet with initials J.D.",
            "https://images.unsplash.com/photo-1627123424574-724758594e93?q=80&w=3387&auto=format&fit=crop",
            "Accessories",
            ItemStatus::Protected,
            at(2025, 3, 15, 10, 30),
            "123",
            "Home",
            None,
        ),
        item(
            "2",
            "Smartphone",
            "iPhone 15 Pro, space gray, has a crack on the screen",
            "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?q=80&w=3280&auto=format&fit=crop",
            "Electronics",
            ItemStatus::Protected,
            at(2025, 4, 2, 14, 45),
            "123",
            "Work",
            None,
        ),
        item(
            "3",
            "Backpack",
            "Black Northface backpack with red zipper",
            "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?q=80&w=3387&auto=format&fit=crop",
            "Bags",
            ItemStatus::Found,
            at(2025, 4, 20, 9, 15),
            "456",
            "Central Park",
            contact("Jane Smith", "555-123-4567", "jane@example.com"),
        ),
        item(
            "4",
            "Headphones",
            "Sony WH-1000XM4 noise-cancelling headphones",
            "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?q=80&w=3270&auto=format&fit=crop",
            "Electronics",
            ItemStatus::Found,
            at(2025, 4, 18, 16, 20),
            "789",
            "Coffee Shop on Main St",
            contact("Mike Johnson", "555-987-6543", "mike@example.com"),
        ),
        item(
            "5",
            "Glasses",
            "Ray-Ban sunglasses in black case",
            "https://images.unsplash.com/photo-1574258495973-f010dfbb5371?q=80&w=3270&auto=format&fit=crop",
            "Accessories",
            ItemStatus::Protected,
            at(2025, 3, 28, 11, 50),
            "123",
            "Car",
            None,
        ),
        item(
            "6",
            "Wallet",
            "Blue leather wallet found near bus stop",
            "https://images.unsplash.com/photo-1556656793-08538906a9f8?q=80&w=3270&auto=format&fit=crop",
            "Accessories",
            ItemStatus::Found,
            at(2025, 4, 15, 13, 10),
            "567",
            "Bus Stop on 5th Avenue",
            contact("Alex Davis", "555-456-7890", "alex@example.com"),
        ),
    ]
}

pub fn chats() -> Vec<Chat> {
    vec![
        Chat {
            id: "chat1".to_string(),
            participants: ["123".to_string(), "456".to_string()],
            last_message: "Hi, I found your wallet at Central Park".to_string(),
            last_message_timestamp: at(2025, 4, 20, 10, 30),
            last_sender_id: Some("456".to_string()),
            unread_count: 2,
            item_id: Some("3".to_string()),
        },
        Chat {
            id: "chat2".to_string(),
            participants: ["123".to_string(), "789".to_string()],
            last_message: "Are these your headphones?".to_string(),
            last_message_timestamp: at(2025, 4, 19, 15, 45),
            last_sender_id: Some("123".to_string()),
            unread_count: 0,
            item_id: Some("4".to_string()),
        },
    ]
}

fn message(id: &str, from: &str, to: &str, body: &str, timestamp: DateTime<Utc>, item_id: &str) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        sender_id: from.to_string(),
        receiver_id: to.to_string(),
        message: body.to_string(),
        timestamp,
        item_id: Some(item_id.to_string()),
    }
}

pub fn chat_messages() -> Vec<(String, Vec<ChatMessage>)> {
    vec![
        (
            "chat1".to_string(),
            vec![
                message("msg1", "456", "123", "Hi, I found your wallet at Central Park", at(2025, 4, 20, 10, 30), "3"),
                message("msg2", "456", "123", "It has initials J.D. on it. Is it yours?", at(2025, 4, 20, 10, 31), "3"),
            ],
        ),
        (
            "chat2".to_string(),
            vec![
                message("msg3", "789", "123", "Hey, I found these Sony headphones at the coffee shop", at(2025, 4, 19, 15, 40), "4"),
                message("msg4", "123", "789", "Yes, those are mine! Thank you for finding them.", at(2025, 4, 19, 15, 45), "4"),
            ],
        ),
    ]
}
