//! Logical key definitions produced by the key decoder.
//!
//! Raw control codes and escape sequences are collapsed into the editing
//! actions they stand for, so the dispatcher never sees terminal bytes.

/// Logical key event consumed by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable rune, or an unrecognized one passed through
    Char(char),

    // Cursor movement
    /// Ctrl-A, Home
    LineStart,
    /// Ctrl-E, End
    LineEnd,
    /// Ctrl-B, Left
    Backward,
    /// Ctrl-F, Right
    Forward,
    /// Ctrl-P, Up
    Prev,
    /// Ctrl-N, Down
    Next,

    // Editing
    /// Ctrl-C
    Interrupt,
    /// Ctrl-D: delete forward, or end of input on an empty line
    Delete,
    /// The `ESC [ 3 ~` delete key
    DeleteForward,
    /// Ctrl-G, cancels search and completion
    Bell,
    /// Ctrl-H, DEL
    Backspace,
    Tab,
    /// Ctrl-J, Ctrl-M
    Enter,
    /// Ctrl-K
    Kill,
    /// Ctrl-U
    KillFront,
    /// Ctrl-L
    ClearScreen,
    /// Ctrl-R
    BackwardSearch,
    /// Ctrl-S
    ForwardSearch,
    /// Ctrl-T
    Transpose,
    /// Ctrl-W
    BackwardKillWord,
    /// Ctrl-Y
    Yank,
    /// A lone ESC, or `ESC ESC`
    Escape,

    // Meta sequences
    /// `ESC b`
    MetaBackward,
    /// `ESC f`
    MetaForward,
    /// `ESC d`
    MetaDelete,
    /// `ESC DEL`, `ESC ^H`
    MetaBackspace,
    /// `ESC t`, `ESC ^T`
    MetaTranspose,
}

impl Key {
    /// Keys after which the reader pauses until the dispatcher asks for more.
    ///
    /// Each of these may end the read session; parking keeps the reader from
    /// consuming input that belongs to whatever the caller does next.
    pub fn parks_reader(&self) -> bool {
        matches!(self, Key::Enter | Key::Interrupt | Key::Delete)
    }

    /// The rune carried by a [`Key::Char`].
    pub fn as_char(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            _ => None,
        }
    }
}
