//! Rich-text editor behaviour for fixture pages

/// Editor libraries the fixture can imitate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureEditor {
    ProseMirror,
    Lexical,
    Draft,
    Quill,
}

impl FixtureEditor {
    /// Detect from the markers each library leaves on its editable root.
    pub fn detect(class_attr: Option<&str>, has_lexical_marker: bool) -> Option<Self> {
        if has_lexical_marker {
            return Some(Self::Lexical);
        }
        let classes = class_attr.unwrap_or_default();
        classes.split_whitespace().find_map(|class| match class {
            "ProseMirror" => Some(Self::ProseMirror),
            "public-DraftEditor-content" => Some(Self::Draft),
            "ql-editor" => Some(Self::Quill),
            _ => None,
        })
    }

    /// Editors that re-render their DOM from an internal document model.
    /// Direct text writes are discarded on their next input cycle.
    pub fn owns_model(self) -> bool {
        !matches!(self, Self::Quill)
    }
}

/// Pointer activation progress; editors only accept commands once armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Activation {
    #[default]
    Idle,
    Pressed,
    Released,
    Armed,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EditorState {
    pub family: Option<FixtureEditor>,
    activation: Activation,
    /// Model text for model-owning editors.
    pub model: String,
}

impl EditorState {
    pub fn new(family: Option<FixtureEditor>, text: &str) -> Self {
        Self {
            family,
            activation: Activation::Idle,
            model: text.to_string(),
        }
    }

    pub fn on_mouse_down(&mut self) {
        self.activation = Activation::Pressed;
    }

    pub fn on_mouse_up(&mut self) {
        self.activation = match self.activation {
            Activation::Pressed => Activation::Released,
            Activation::Armed => Activation::Armed,
            _ => Activation::Idle,
        };
    }

    pub fn on_click(&mut self) {
        self.activation = match self.activation {
            Activation::Released | Activation::Armed => Activation::Armed,
            _ => Activation::Idle,
        };
    }

    pub fn on_blur(&mut self) {
        self.activation = Activation::Idle;
    }

    /// Plain contenteditable hosts need no activation.
    pub fn accepts_commands(&self) -> bool {
        self.family.is_none() || self.activation == Activation::Armed
    }

    pub fn owns_model(&self) -> bool {
        self.family.map(FixtureEditor::owns_model).unwrap_or(false)
    }
}
