//! The host page, seen through the handful of DOM operations the automation needs.
//!
//! Everything that knows Costpoint's markup lives behind [`HostPage`]: class names, the
//! overlay ids and the sibling layout around an hours cell. A markup change on the host
//! side is fixed by changing an implementation of this trait, not the automation.

mod grid_page;

pub use grid_page::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Class of the elements that carry a column's date text.
pub const DATE_HEADER_CLASS: &str = "hdTxt";
/// Class of the span next to an hours cell that arms the note editor.
pub const COMMENT_TRIGGER_CLASS: &str = "tCommentBtn";
/// Text area of the note editor overlay.
pub const NOTE_EDITOR_ID: &str = "expandoEdit";
/// Confirm button of the note editor overlay.
pub const NOTE_CONFIRM_ID: &str = "expandoOK";
/// Class put on cells the automation wrote.
pub const DEFAULT_MARKER_CLASS: &str = "automated";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("element not interactable: {0}")]
    NotInteractable(String),
}

/// An element together with its visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// An `<input>` together with its current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputElement {
    pub id: String,
    #[serde(default)]
    pub value: String,
}

#[async_trait]
pub trait HostPage: Send + Sync {
    /// Elements carrying `class`, in document order.
    async fn elements_with_class(&self, class: &str) -> Result<Vec<TextElement>, PageError>;

    /// Every input on the page, in document order.
    async fn inputs(&self) -> Result<Vec<InputElement>, PageError>;

    async fn element_exists(&self, id: &str) -> Result<bool, PageError>;

    /// Current value of an input, `None` if there is no such input.
    async fn input_value(&self, id: &str) -> Result<Option<String>, PageError>;

    /// The comment attached to an hours cell, `None` if it has none.
    async fn cell_note(&self, cell_id: &str) -> Result<Option<String>, PageError>;

    async fn has_class(&self, id: &str, class: &str) -> Result<bool, PageError>;

    async fn add_class(&self, id: &str, class: &str) -> Result<(), PageError>;

    async fn remove_class(&self, id: &str, class: &str) -> Result<(), PageError>;

    async fn focus(&self, id: &str) -> Result<(), PageError>;

    async fn blur(&self, id: &str) -> Result<(), PageError>;

    async fn set_value(&self, id: &str, value: &str) -> Result<(), PageError>;

    /// The comment trigger sharing a parent with the given cell.
    async fn comment_trigger(&self, cell_id: &str) -> Result<Option<String>, PageError>;

    async fn next_sibling(&self, id: &str) -> Result<Option<String>, PageError>;

    /// Forces an element visible regardless of the host's hover styling.
    async fn show(&self, id: &str) -> Result<(), PageError>;

    async fn click(&self, id: &str) -> Result<(), PageError>;
}
