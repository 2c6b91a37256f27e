//! Named editing commands and their execution against a document.

mod style;

pub use style::StyleProperty;

use richtext_config::Config;

use crate::document::{Attributes, Bias, DocumentModel, Element, ElementKind, Node, Selection};
use crate::error::EditorError;

/// Every command the editor can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Bold,
    Italic,
    Underline,
    Heading1,
    Heading2,
    Heading3,
    Blockquote,
    Preformatted,
    UnorderedList,
    OrderedList,
    InsertCodeBlock,
    InsertCallout { callout_type: Option<String> },
    ClearFormatting,
    ClearContent,
    SetStyle { property: StyleProperty, value: String },
    InsertText { text: String },
    Indent,
    Outdent,
}

impl Command {
    /// Resolve a command name (and its optional value) as sent by a toolbar
    /// or a key binding. Browser-style names are accepted as aliases.
    pub fn from_name(name: &str, value: Option<&str>) -> Result<Self, EditorError> {
        let required = || {
            value.map(str::to_string).ok_or_else(|| EditorError::MissingValue {
                command: name.to_string(),
            })
        };

        let command = match name {
            "bold" => Command::Bold,
            "italic" => Command::Italic,
            "underline" => Command::Underline,
            "heading-1" => Command::Heading1,
            "heading-2" => Command::Heading2,
            "heading-3" => Command::Heading3,
            "blockquote" => Command::Blockquote,
            "preformatted" => Command::Preformatted,
            "formatBlock" => return Self::from_block_tag(name, value),
            "unordered-list" | "insertUnorderedList" => Command::UnorderedList,
            "ordered-list" | "insertOrderedList" => Command::OrderedList,
            "insert-code-block" => Command::InsertCodeBlock,
            "insert-callout" => Command::InsertCallout {
                callout_type: value.filter(|v| !v.trim().is_empty()).map(str::to_string),
            },
            "clear-formatting" | "removeFormat" => Command::ClearFormatting,
            "clear-content" => Command::ClearContent,
            "set-font-family" | "fontName" => Command::SetStyle {
                property: StyleProperty::FontFamily,
                value: required()?,
            },
            "set-font-size" | "fontSize" => Command::SetStyle {
                property: StyleProperty::FontSize,
                value: required()?,
            },
            "set-text-color" | "foreColor" => Command::SetStyle {
                property: StyleProperty::TextColor,
                value: required()?,
            },
            "insert-text" | "insertText" => Command::InsertText { text: required()? },
            "indent" => Command::Indent,
            "outdent" => Command::Outdent,
            _ => return Err(EditorError::UnsupportedCommand(name.to_string())),
        };
        Ok(command)
    }

    /// `formatBlock` carries the block tag as its value, with or without
    /// angle brackets.
    fn from_block_tag(name: &str, value: Option<&str>) -> Result<Self, EditorError> {
        let tag = value
            .ok_or_else(|| EditorError::MissingValue {
                command: name.to_string(),
            })?
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_ascii_lowercase();
        match tag.as_str() {
            "h1" => Ok(Command::Heading1),
            "h2" => Ok(Command::Heading2),
            "h3" => Ok(Command::Heading3),
            "blockquote" => Ok(Command::Blockquote),
            "pre" => Ok(Command::Preformatted),
            _ => Err(EditorError::UnsupportedCommand(format!("{name} {tag}"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Bold => "bold",
            Command::Italic => "italic",
            Command::Underline => "underline",
            Command::Heading1 => "heading-1",
            Command::Heading2 => "heading-2",
            Command::Heading3 => "heading-3",
            Command::Blockquote => "blockquote",
            Command::Preformatted => "preformatted",
            Command::UnorderedList => "unordered-list",
            Command::OrderedList => "ordered-list",
            Command::InsertCodeBlock => "insert-code-block",
            Command::InsertCallout { .. } => "insert-callout",
            Command::ClearFormatting => "clear-formatting",
            Command::ClearContent => "clear-content",
            Command::SetStyle { property, .. } => property.command_name(),
            Command::InsertText { .. } => "insert-text",
            Command::Indent => "indent",
            Command::Outdent => "outdent",
        }
    }

    fn inline_kind(&self) -> Option<ElementKind> {
        match self {
            Command::Bold => Some(ElementKind::Bold),
            Command::Italic => Some(ElementKind::Italic),
            Command::Underline => Some(ElementKind::Underline),
            _ => None,
        }
    }

    fn block_kind(&self) -> Option<ElementKind> {
        match self {
            Command::Heading1 => Some(ElementKind::Heading1),
            Command::Heading2 => Some(ElementKind::Heading2),
            Command::Heading3 => Some(ElementKind::Heading3),
            Command::Blockquote => Some(ElementKind::Blockquote),
            Command::Preformatted => Some(ElementKind::Preformatted),
            _ => None,
        }
    }

    fn list_kind(&self) -> Option<ElementKind> {
        match self {
            Command::UnorderedList => Some(ElementKind::UnorderedList),
            Command::OrderedList => Some(ElementKind::OrderedList),
            _ => None,
        }
    }

    /// Commands that act on the characters of a range and do nothing useful
    /// on a caret.
    fn needs_range(&self) -> bool {
        self.inline_kind().is_some()
            || matches!(self, Command::ClearFormatting | Command::SetStyle { .. })
    }
}

/// Applies [`Command`]s to a document.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    code_placeholder: String,
    callout_placeholder: String,
    default_callout_type: String,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl CommandExecutor {
    pub fn new(config: &Config) -> Self {
        Self {
            code_placeholder: config.code_placeholder.clone(),
            callout_placeholder: config.callout_placeholder.clone(),
            default_callout_type: config.default_callout_type.clone(),
        }
    }

    /// Fail the way [`CommandExecutor::execute`] would, without touching the
    /// document.
    pub fn check(
        &self,
        document: &DocumentModel,
        selection: Option<&Selection>,
        command: &Command,
    ) -> Result<(), EditorError> {
        let selection = selection.ok_or(EditorError::NoActiveSelection)?;
        if command.needs_range() {
            let (start, end) = document.ordered_offsets(selection);
            if start == end {
                return Err(EditorError::NoActiveSelection);
            }
        }
        Ok(())
    }

    /// Run `command` over `selection` and return the selection to show next.
    pub fn execute(
        &self,
        document: &mut DocumentModel,
        selection: Option<&Selection>,
        command: &Command,
    ) -> Result<Selection, EditorError> {
        self.check(document, selection, command)?;
        let selection = selection.ok_or(EditorError::NoActiveSelection)?;

        if let Some(kind) = command.inline_kind() {
            let active = document.is_covered(selection, |element| element.kind == kind);
            return Ok(if active {
                document.unwrap(selection, kind)
            } else {
                document.wrap(selection, kind, Attributes::new())
            });
        }
        if let Some(kind) = command.block_kind() {
            return Ok(document.replace_block(selection, kind));
        }
        if let Some(kind) = command.list_kind() {
            return Ok(document.toggle_list(selection, kind));
        }

        let next = match command {
            Command::InsertCodeBlock => {
                let block = Element::new(ElementKind::Preformatted);
                self.replace_with_block(document, selection, block, &self.code_placeholder)
            }
            Command::InsertCallout { callout_type } => {
                let callout_type = callout_type.as_deref().unwrap_or(&self.default_callout_type);
                let block = Element::callout(callout_type);
                self.replace_with_block(document, selection, block, &self.callout_placeholder)
            }
            Command::ClearFormatting => style::clear_formatting(document, selection),
            Command::ClearContent => {
                *document = DocumentModel::default();
                Selection::collapsed(document.position_at(0, Bias::Backward))
            }
            Command::SetStyle { property, value } => {
                style::apply(document, selection, *property, value)
            }
            Command::InsertText { text } => {
                let caret = document.delete_range(selection);
                document.insert_at(&caret.focus, Node::text(text.as_str()))
            }
            Command::Indent => document.indent_item(selection),
            Command::Outdent => document.outdent_item(selection),
            _ => return Err(EditorError::UnsupportedCommand(command.name().to_string())),
        };
        Ok(next)
    }

    /// Whether a toolbar button for `command` should show as active.
    pub fn is_active(
        &self,
        document: &DocumentModel,
        selection: Option<&Selection>,
        command: &Command,
    ) -> bool {
        let Some(selection) = selection else {
            return false;
        };
        if let Some(kind) = command.inline_kind() {
            return document.is_covered(selection, |element| element.kind == kind);
        }
        if let Some(kind) = command.block_kind() {
            let (start, end) = document.ordered_offsets(selection);
            let lines = document.lines_in(start, end);
            return !lines.is_empty()
                && lines.iter().all(|line| {
                    document
                        .element_at(&line.container)
                        .is_some_and(|container| container.kind == kind)
                });
        }
        if let Some(kind) = command.list_kind() {
            return document.is_covered(selection, |element| element.kind == kind);
        }
        match command {
            Command::SetStyle { property, value } => {
                style::is_applied(document, selection, *property, value)
            }
            _ => false,
        }
    }

    /// Swap the range for `block`, filled with the selected text or with
    /// `placeholder` when nothing is selected.
    fn replace_with_block(
        &self,
        document: &mut DocumentModel,
        selection: &Selection,
        block: Element,
        placeholder: &str,
    ) -> Selection {
        let (start, end) = document.ordered_offsets(selection);
        let body = if start == end {
            placeholder.to_string()
        } else {
            document.text_between(start, end)
        };
        let caret = document.delete_range(selection);
        document.insert_at(
            &caret.focus,
            Node::Element(block.with_children(vec![Node::text(body)])),
        )
    }
}
