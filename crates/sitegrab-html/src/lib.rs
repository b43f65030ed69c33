#[macro_use]
extern crate html5ever;

pub mod clean;
pub mod html;
pub mod node;

pub use crate::clean::{
    clean, Cleaned, ContentClass, ExtractError, Itemprop, Locate, Located, Rebuilt,
};
pub use crate::html::Html;
pub use crate::node::Node;
