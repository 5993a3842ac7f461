use crate::error::{Error, Result};
use crate::models::{Contact, Item, ItemStatus, User, CATEGORIES, DEFAULT_IMAGE};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Url(String),
    File(PathBuf),
}

impl ImageSource {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else if value.starts_with("http://") || value.starts_with("https://") || value.starts_with("data:") {
            Some(ImageSource::Url(value.to_string()))
        } else {
            Some(ImageSource::File(PathBuf::from(normalize_path(value))))
        }
    }

    pub fn resolve(&self) -> Result<String> {
        match self {
            ImageSource::Url(url) => Ok(url.clone()),
            ImageSource::File(path) => {
                let bytes = fs::read(path)?;
                Ok(format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes)))
            }
        }
    }
}

fn normalize_path(path: &str) -> String {
    path.replace("\\\\", "/").replace('\\', "/")
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn resolve_image(image: Option<&ImageSource>) -> Result<String> {
    image.map_or_else(|| Ok(DEFAULT_IMAGE.to_string()), ImageSource::resolve)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn validate(name: &str, category: &str) -> Result<(String, String)> {
    let name = non_empty(name).ok_or_else(|| Error::missing("name"))?;
    let category = non_empty(category).ok_or_else(|| Error::missing("category"))?;
    if !CATEGORIES.contains(&category.as_str()) {
        return Err(Error::Validation(format!(
            "Unknown category {}, expected one of {}",
            category,
            CATEGORIES.join(", ")
        )));
    }
    Ok((name, category))
}

fn new_item_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("item-{}-{}", now.timestamp_millis(), &suffix[..8])
}

#[derive(Debug, Clone, Default)]
pub struct NewItemForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub image: Option<ImageSource>,
}

impl NewItemForm {
    pub fn into_item(self, owner: &User, now: DateTime<Utc>) -> Result<Item> {
        let (name, category) = validate(&self.name, &self.category)?;
        Ok(Item {
            id: new_item_id(now),
            name,
            description: self.description.trim().to_string(),
            category,
            image: resolve_image(self.image.as_ref())?,
            status: ItemStatus::Protected,
            date_added: now,
            user_id: owner.id.clone(),
            location: non_empty(&self.location),
            contact: None,
            qr_code: None,
            qr_code_image: None,
            is_found: None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FoundItemForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub image: Option<ImageSource>,
    pub qr_code: String,
    pub qr_code_image: Option<ImageSource>,
}

impl FoundItemForm {
    /// A report carrying a QR token is filed as protected.
    pub fn into_item(self, reporter: &User, now: DateTime<Utc>) -> Result<Item> {
        let (name, category) = validate(&self.name, &self.category)?;
        let qr_code = non_empty(&self.qr_code);
        let qr_code_image = self
            .qr_code_image
            .as_ref()
            .map(ImageSource::resolve)
            .transpose()?;
        let status = if qr_code.is_some() || qr_code_image.is_some() {
            ItemStatus::Protected
        } else {
            ItemStatus::Found
        };
        Ok(Item {
            id: new_item_id(now),
            name,
            description: self.description.trim().to_string(),
            category,
            image: resolve_image(self.image.as_ref())?,
            status,
            date_added: now,
            user_id: reporter.id.clone(),
            location: non_empty(&self.location),
            contact: Some(Contact {
                name: non_empty(&reporter.name),
                phone: non_empty(&reporter.phone),
                email: non_empty(&reporter.email),
            }),
            qr_code,
            qr_code_image,
            is_found: Some(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn user() -> User {
        User {
            id: "123".to_string(),
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            phone: String::new(),
        }
    }

    fn found_form() -> FoundItemForm {
        FoundItemForm {
            name: "Backpack".to_string(),
            category: "Bags".to_string(),
            location: "Central Park".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_item_defaults() {
        let now = Utc::now();
        let item = NewItemForm {
            name: " Wallet ".to_string(),
            category: "Accessories".to_string(),
            ..Default::default()
        }
        .into_item(&user(), now)
        .unwrap();
        assert_eq!(item.name, "Wallet");
        assert_eq!(item.status, ItemStatus::Protected);
        assert_eq!(item.user_id, "123");
        assert_eq!(item.image, DEFAULT_IMAGE);
        assert_eq!(item.location, None);
        assert_eq!(item.date_added, now);
        assert!(item.id.starts_with(&format!("item-{}-", now.timestamp_millis())));
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let missing_name = NewItemForm {
            category: "Bags".to_string(),
            ..Default::default()
        };
        assert!(matches!(missing_name.into_item(&user(), Utc::now()), Err(Error::Validation(_))));

        let mut form = found_form();
        form.category = String::new();
        assert!(form.into_item(&user(), Utc::now()).is_err());

        let mut form = found_form();
        form.category = "Pets".to_string();
        assert!(form.into_item(&user(), Utc::now()).is_err());
    }

    #[test]
    fn test_found_item_without_qr_code() {
        let item = found_form().into_item(&user(), Utc::now()).unwrap();
        assert_eq!(item.status, ItemStatus::Found);
        assert_eq!(item.is_found, Some(true));
        assert_eq!(item.location.as_deref(), Some("Central Park"));
        let contact = item.contact.unwrap();
        assert_eq!(contact.name.as_deref(), Some("Jane Smith"));
        assert_eq!(contact.phone, None);
        assert_eq!(contact.email.as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn test_found_item_with_qr_code_is_protected() {
        let mut form = found_form();
        form.qr_code = "lost-and-found-item-1".to_string();
        let item = form.into_item(&user(), Utc::now()).unwrap();
        assert_eq!(item.status, ItemStatus::Protected);
        assert!(item.has_qr_code());
    }

    #[test]
    fn test_image_file_becomes_data_url() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"png").unwrap();
        let source = ImageSource::parse(file.path().to_str().unwrap()).unwrap();
        assert_eq!(source.resolve().unwrap(), "data:image/png;base64,cG5n");
    }

    #[test]
    fn test_image_source_parse() {
        assert_eq!(
            ImageSource::parse("https://example.com/a.jpg"),
            Some(ImageSource::Url("https://example.com/a.jpg".to_string()))
        );
        assert_eq!(
            ImageSource::parse("C:\\photos\\a.jpg"),
            Some(ImageSource::File(PathBuf::from("C:/photos/a.jpg")))
        );
        assert_eq!(ImageSource::parse("  "), None);
    }

    #[test]
    fn test_missing_image_file_is_an_error() {
        let form = NewItemForm {
            name: "Wallet".to_string(),
            category: "Accessories".to_string(),
            image: Some(ImageSource::File(PathBuf::from("/definitely/not/here.png"))),
            ..Default::default()
        };
        assert!(matches!(form.into_item(&user(), Utc::now()), Err(Error::Io(_))));
    }
}
