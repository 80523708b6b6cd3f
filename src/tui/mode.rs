use crate::shared::InputEvent;

// state local to the tui: which text prompt (if any) is open and what has
// been typed into it so far. Everything else comes from DisplayState.
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub prompt: Option<Prompt>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Emotion, // template name, e.g. "sad"
    Mood,    // free text run through the matcher
    Share,   // link or bare token
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Emotion => "emotion",
            PromptKind::Mood => "describe a mood",
            PromptKind::Share => "melody link",
        }
    }

    pub fn submit(self, text: String) -> InputEvent {
        match self {
            PromptKind::Emotion => InputEvent::ApplyEmotion(text),
            PromptKind::Mood => InputEvent::DescribeMood(text),
            PromptKind::Share => InputEvent::LoadShare(text),
        }
    }
}

impl TuiState {
    pub fn open(&mut self, kind: PromptKind) {
        self.prompt = Some(Prompt { kind, text: String::new() });
    }
}
