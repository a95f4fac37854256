//! Keyboard shortcuts bound for the lifetime of an editor.

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
  pub key: char,
  pub ctrl: bool,
  /// Cmd on macOS.
  pub meta: bool,
  pub shift: bool,
  pub alt: bool,
}

impl KeyChord {
  pub fn plain(key: char) -> Self {
    Self {
      key,
      ctrl: false,
      meta: false,
      shift: false,
      alt: false,
    }
  }

  pub fn ctrl(key: char) -> Self {
    Self {
      ctrl: true,
      ..Self::plain(key)
    }
  }

  pub fn meta(key: char) -> Self {
    Self {
      meta: true,
      ..Self::plain(key)
    }
  }
}

/// What currently has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusContext {
  #[default]
  Canvas,
  /// A text field (node settings form, flow name, ...).
  TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
  Save,
}

/// Map a key press to an editor action.
///
/// Ctrl+S / Cmd+S saves, except while a text input has focus, where the
/// chord belongs to the field.
pub fn resolve_shortcut(chord: KeyChord, focus: FocusContext) -> Option<EditorAction> {
  if focus == FocusContext::TextInput {
    return None;
  }

  let save_modifier = chord.ctrl || chord.meta;
  if save_modifier && !chord.alt && !chord.shift && chord.key.eq_ignore_ascii_case(&'s') {
    return Some(EditorAction::Save);
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ctrl_and_cmd_s_save() {
    assert_eq!(
      resolve_shortcut(KeyChord::ctrl('s'), FocusContext::Canvas),
      Some(EditorAction::Save)
    );
    assert_eq!(
      resolve_shortcut(KeyChord::meta('S'), FocusContext::Canvas),
      Some(EditorAction::Save)
    );
  }

  #[test]
  fn test_text_input_keeps_the_chord() {
    assert_eq!(
      resolve_shortcut(KeyChord::ctrl('s'), FocusContext::TextInput),
      None
    );
  }

  #[test]
  fn test_other_chords_do_nothing() {
    assert_eq!(resolve_shortcut(KeyChord::plain('s'), FocusContext::Canvas), None);
    assert_eq!(resolve_shortcut(KeyChord::ctrl('a'), FocusContext::Canvas), None);
    let ctrl_shift_s = KeyChord {
      shift: true,
      ..KeyChord::ctrl('s')
    };
    assert_eq!(resolve_shortcut(ctrl_shift_s, FocusContext::Canvas), None);
  }
}
