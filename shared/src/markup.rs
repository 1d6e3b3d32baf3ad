use pulldown_cmark::{html, Options, Parser};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Markup {
    #[default]
    Markdown,
    Text,
}

impl Markup {
    pub fn from_extension(extension: &str) -> Option<Markup> {
        match extension.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Markup::Markdown),
            "txt" => Some(Markup::Text),
            _ => None,
        }
    }

    /// Renders page source to an HTML fragment.
    pub fn render(&self, content: &str) -> String {
        match self {
            Markup::Markdown => {
                let mut options = Options::empty();
                options.insert(Options::ENABLE_STRIKETHROUGH);
                options.insert(Options::ENABLE_TABLES);

                let mut rendered = String::new();
                html::push_html(&mut rendered, Parser::new_ext(content, options));
                rendered
            }
            Markup::Text => format!("<pre>{}</pre>", escape_html(content)),
        }
    }
}

fn escape_html(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    // writing into a String cannot fail
    let _ = pulldown_cmark_escape::escape_html(&mut escaped, content);
    escaped
}
