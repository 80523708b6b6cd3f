use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crate::sequencer::scale::Scale;
use crate::shared::InputEvent;
use super::mode::{PromptKind, TuiState};

const TEMPO_STEP: i32 = 5;
const KNOB_STEP: f32 = 0.01;

// poll for input from tui; while a prompt is open keys edit its text,
// otherwise they resolve straight to semantic input events
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

pub fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    if ts.prompt.is_some() {
        return edit_prompt(code, ts);
    }

    match code {
        KeyCode::Esc | KeyCode::Char('q') => vec![InputEvent::Quit],

        // cursor
        KeyCode::Up | KeyCode::Char('k') => vec![InputEvent::MoveCursor { rows: -1, cols: 0 }],
        KeyCode::Down | KeyCode::Char('j') => vec![InputEvent::MoveCursor { rows: 1, cols: 0 }],
        KeyCode::Left | KeyCode::Char('h') => vec![InputEvent::MoveCursor { rows: 0, cols: -1 }],
        KeyCode::Right | KeyCode::Char('l') => vec![InputEvent::MoveCursor { rows: 0, cols: 1 }],
        KeyCode::Enter => vec![InputEvent::ToggleCursor],

        // transport
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Char('s') => vec![InputEvent::Stop],
        KeyCode::Char('c') => vec![InputEvent::Clear],
        KeyCode::Char('-') => vec![InputEvent::AdjustTempo(-TEMPO_STEP)],
        KeyCode::Char('=') => vec![InputEvent::AdjustTempo(TEMPO_STEP)],

        // sound
        KeyCode::Char('1') => vec![InputEvent::SetScale(Scale::Major)],
        KeyCode::Char('2') => vec![InputEvent::SetScale(Scale::Minor)],
        KeyCode::Char('3') => vec![InputEvent::SetScale(Scale::Pentatonic)],
        KeyCode::Tab => vec![InputEvent::CycleScale],
        KeyCode::Char('i') => vec![InputEvent::CycleInstrument],
        KeyCode::Char('[') => vec![InputEvent::AdjustAttack(-KNOB_STEP)],
        KeyCode::Char(']') => vec![InputEvent::AdjustAttack(KNOB_STEP)],
        KeyCode::Char('{') => vec![InputEvent::AdjustDecay(-KNOB_STEP)],
        KeyCode::Char('}') => vec![InputEvent::AdjustDecay(KNOB_STEP)],

        // prompts
        KeyCode::Char('e') => { ts.open(PromptKind::Emotion); vec![] }
        KeyCode::Char('m') => { ts.open(PromptKind::Mood); vec![] }
        KeyCode::Char('o') => { ts.open(PromptKind::Share); vec![] }

        KeyCode::Char('g') => vec![InputEvent::Challenge],
        KeyCode::Char('x') => vec![InputEvent::Share],

        _ => vec![],
    }
}

// keys while a prompt is open: type, erase, submit or cancel
fn edit_prompt(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    let Some(prompt) = ts.prompt.as_mut() else {
        return vec![];
    };
    match code {
        KeyCode::Char(c) => { prompt.text.push(c); vec![] }
        KeyCode::Backspace => { prompt.text.pop(); vec![] }
        KeyCode::Esc => { ts.prompt = None; vec![] }
        KeyCode::Enter => match ts.prompt.take() {
            Some(p) => vec![p.kind.submit(p.text)],
            None => vec![],
        },
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(text: &str, ts: &mut TuiState) {
        for c in text.chars() {
            assert!(handle_key(KeyCode::Char(c), ts).is_empty());
        }
    }

    #[test]
    fn test_prompt_swallows_keys_until_enter() {
        let mut ts = TuiState::default();
        assert!(handle_key(KeyCode::Char('m'), &mut ts).is_empty());
        // 'q' and ' ' would normally quit and play
        type_text("quiet night", &mut ts);
        handle_key(KeyCode::Backspace, &mut ts);
        assert_eq!(
            handle_key(KeyCode::Enter, &mut ts),
            vec![InputEvent::DescribeMood("quiet nigh".into())]
        );
        assert!(ts.prompt.is_none());
    }

    #[test]
    fn test_esc_cancels_prompt_before_quitting() {
        let mut ts = TuiState::default();
        handle_key(KeyCode::Char('o'), &mut ts);
        type_text("abc", &mut ts);
        assert!(handle_key(KeyCode::Esc, &mut ts).is_empty());
        assert!(ts.prompt.is_none());
        assert_eq!(handle_key(KeyCode::Esc, &mut ts), vec![InputEvent::Quit]);
    }

    #[test]
    fn test_plain_keys_map_to_events() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(KeyCode::Char(' '), &mut ts), vec![InputEvent::PlayPress]);
        assert_eq!(handle_key(KeyCode::Char('2'), &mut ts), vec![InputEvent::SetScale(Scale::Minor)]);
        assert_eq!(handle_key(KeyCode::Char('='), &mut ts), vec![InputEvent::AdjustTempo(5)]);
        assert_eq!(
            handle_key(KeyCode::Char('h'), &mut ts),
            vec![InputEvent::MoveCursor { rows: 0, cols: -1 }]
        );
        assert!(handle_key(KeyCode::Char('z'), &mut ts).is_empty());
    }
}
