use gtmpl::Value;
use pulldown_cmark::{html, Parser};

/// The parsed representation of one source markdown file. A [`Post`] is
/// built exactly once, by the worker that took its parse job, and is never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The post's name, derived from the source file's stem.
    pub name: String,

    /// The post's body, rendered from markdown to HTML.
    pub body: String,

    /// The categories the post belongs to, derived from its source path.
    pub categories: Vec<String>,
}

impl Post {
    /// Builds a [`Post`] from raw markdown text. `name` is the source file's
    /// stem and `categories` comes from discovery.
    pub fn from_markdown(name: &str, raw: &str, categories: Vec<String>) -> Post {
        let mut body = String::new();
        html::push_html(&mut body, Parser::new(raw));
        Post {
            name: name.to_owned(),
            body,
            categories,
        }
    }

    /// Converts a [`Post`] into a [`Value`] for templating. The result is a
    /// [`Value::Object`] with `name`, `body`, and `categories` fields.
    pub fn to_value(&self) -> Value {
        use std::collections::HashMap;

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), Value::String(self.name.clone()));
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        m.insert(
            "categories".to_owned(),
            Value::Array(
                self.categories
                    .iter()
                    .map(|c| Value::String(c.clone()))
                    .collect(),
            ),
        );
        Value::Object(m)
    }
}
