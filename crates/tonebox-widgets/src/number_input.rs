#![forbid(unsafe_code)]

//! Bounded integer input.
//!
//! A single-line field that only ever settles on an integer inside an
//! inclusive range. While typing, printable characters other than digits and
//! `.` are rejected outright. When the field loses focus its text is parsed,
//! clamped into range and floored, and the result replaces the text.
//!
//! Text that cannot be parsed at all (empty, a lone `.`, `1.2.3`) reverts to
//! the last value the field settled on.

use tonebox_core::event::{Event, KeyCode, KeyEvent};

/// Verdict of the keystroke filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFilter {
    Accept,
    Reject,
}

impl KeyFilter {
    /// Filter a raw character code.
    ///
    /// Control codes (`<= 31`), digits and `.` pass; every other code is
    /// rejected.
    #[must_use]
    pub const fn for_code(code: u32) -> Self {
        if code != 46 && code > 31 && (code < 48 || code > 57) {
            Self::Reject
        } else {
            Self::Accept
        }
    }

    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// A numeric input field with inclusive bounds.
#[derive(Debug, Clone, Default)]
pub struct NumberInput {
    /// Display text.
    value: String,
    /// Cursor position (char index).
    cursor: usize,
    /// Selection anchor (char index). When set, selection spans from anchor to cursor.
    selection_anchor: Option<usize>,
    min: u32,
    max: u32,
    /// Value restored when the text cannot be parsed.
    last_valid: u32,
    focused: bool,
}

impl NumberInput {
    /// Create a field seeded with `value` and bounds `min..=max`.
    #[must_use]
    pub fn new(value: u32, min: u32, max: u32) -> Self {
        let mut input = Self::default();
        input.seed(value, min, max);
        input
    }

    /// Set the display text and bounds.
    ///
    /// The text shows `value` as given; it is only clamped on blur or read.
    pub fn seed(&mut self, value: u32, min: u32, max: u32) {
        self.value = value.to_string();
        self.min = min;
        self.max = max;
        self.last_valid = Self::clamp_floor(f64::from(value), min, max);
        self.cursor = self.char_count();
        self.selection_anchor = None;
    }

    /// Filter one typed character.
    #[must_use]
    pub fn filter_key(c: char) -> KeyFilter {
        KeyFilter::for_code(u32::from(c))
    }

    /// Settle the field: parse, clamp, floor, and write the result back.
    ///
    /// Returns the settled value.
    pub fn blur(&mut self) -> u32 {
        let settled = self.read_validated();
        let text = settled.to_string();
        if text != self.value {
            tracing::debug!(from = %self.value, to = settled, "number_input clamped on blur");
        }
        self.value = text;
        self.last_valid = settled;
        self.focused = false;
        self.selection_anchor = None;
        self.cursor = self.cursor.min(self.char_count());
        settled
    }

    /// The value the current text would settle on.
    ///
    /// Does not modify the field.
    #[must_use]
    pub fn read_validated(&self) -> u32 {
        match Self::parse(&self.value) {
            Some(number) => Self::clamp_floor(number, self.min, self.max),
            None => Self::clamp_floor(f64::from(self.last_valid), self.min, self.max),
        }
    }

    fn parse(text: &str) -> Option<f64> {
        text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// `floor(max(min, min(max, n)))`.
    fn clamp_floor(number: f64, min: u32, max: u32) -> u32 {
        // `as` saturates, and the clamp keeps the result inside u32 anyway
        number.min(f64::from(max)).max(f64::from(min)).floor() as u32
    }

    // --- Accessors ---

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text without filtering, as a host setting the value would.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.char_count();
        self.selection_anchor = None;
    }

    #[must_use]
    pub fn bounds(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    #[must_use]
    pub fn last_valid(&self) -> u32 {
        self.last_valid
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    #[must_use]
    pub fn selected_text(&self) -> Option<&str> {
        let anchor = self.selection_anchor?;
        let (start, end) = self.selection_range(anchor);
        if start == end {
            return None;
        }
        Some(&self.value[self.byte_offset(start)..self.byte_offset(end)])
    }

    pub fn select_all(&mut self) {
        self.selection_anchor = Some(0);
        self.cursor = self.char_count();
    }

    // --- Events ---

    /// Handle an input event.
    ///
    /// Returns `true` if the state changed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let (changed, operation) = match event {
            Event::Key(key) if key.is_press() => {
                (self.handle_key(key), Self::key_operation_name(key))
            }
            Event::Paste(paste) => (self.paste(&paste.text), "paste"),
            Event::Focus(true) => {
                self.focused = true;
                (false, "focus")
            }
            Event::Focus(false) => {
                let before = self.value.clone();
                self.blur();
                (before != self.value, "blur")
            }
            _ => (false, "other"),
        };

        if changed {
            self.trace_edit(operation);
        }

        changed
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let ctrl = key.ctrl();
        let shift = key.shift();

        match key.code {
            KeyCode::Char('a') if ctrl => {
                self.select_all();
                true
            }
            KeyCode::Char(c) if !ctrl => self.insert_char(c),
            KeyCode::Backspace => {
                if self.selection_anchor.is_some() {
                    self.delete_selection()
                } else {
                    self.delete_char_back()
                }
            }
            KeyCode::Delete => {
                if self.selection_anchor.is_some() {
                    self.delete_selection()
                } else {
                    self.delete_char_forward()
                }
            }
            KeyCode::Left => self.move_cursor(self.cursor.saturating_sub(1), shift),
            KeyCode::Right => self.move_cursor((self.cursor + 1).min(self.char_count()), shift),
            KeyCode::Home => self.move_cursor(0, shift),
            KeyCode::End => self.move_cursor(self.char_count(), shift),
            KeyCode::Up => self.step(1),
            KeyCode::Down => self.step(-1),
            _ => false,
        }
    }

    fn trace_edit(&self, operation: &'static str) {
        let _span = tracing::debug_span!(
            "number_input.edit",
            operation,
            cursor_position = self.cursor,
            value_len = self.value.len(),
            has_selection = self.selection_anchor.is_some()
        )
        .entered();
    }

    fn key_operation_name(key: &KeyEvent) -> &'static str {
        let ctrl = key.ctrl();

        match key.code {
            KeyCode::Char('a') if ctrl => "select_all",
            KeyCode::Char(_) => "insert_char",
            KeyCode::Backspace => "delete_back",
            KeyCode::Delete => "delete_forward",
            KeyCode::Left => "move_left",
            KeyCode::Right => "move_right",
            KeyCode::Home => "move_home",
            KeyCode::End => "move_end",
            KeyCode::Up => "step_up",
            KeyCode::Down => "step_down",
            _ => "key_other",
        }
    }

    // --- Editing operations ---

    /// Insert a typed character at the cursor, replacing any selection.
    ///
    /// Returns `false` if the filter rejected it or it was a control code.
    pub fn insert_char(&mut self, c: char) -> bool {
        if !Self::filter_key(c).is_accept() {
            tracing::trace!(key = %c.escape_debug(), "number_input rejected keystroke");
            return false;
        }
        if c.is_control() {
            return false;
        }

        self.delete_selection();
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
        true
    }

    /// Insert the accepted characters of `text`.
    pub fn paste(&mut self, text: &str) -> bool {
        let clean: String = text
            .chars()
            .filter(|&c| Self::filter_key(c).is_accept() && !c.is_control())
            .collect();
        if clean.is_empty() {
            return false;
        }

        self.delete_selection();
        let at = self.byte_offset(self.cursor);
        self.value.insert_str(at, &clean);
        self.cursor += clean.chars().count();
        true
    }

    /// Step the settled value by `delta`, clamped to the bounds.
    pub fn step(&mut self, delta: i64) -> bool {
        let current = i64::from(self.read_validated());
        let next = (current + delta).clamp(i64::from(self.min), i64::from(self.max.max(self.min)));
        let next = u32::try_from(next).unwrap_or(self.min);
        let text = next.to_string();
        if text == self.value {
            return false;
        }
        self.value = text;
        self.last_valid = next;
        self.selection_anchor = None;
        self.cursor = self.char_count();
        true
    }

    fn delete_selection(&mut self) -> bool {
        let Some(anchor) = self.selection_anchor.take() else {
            return false;
        };
        let (start, end) = self.selection_range(anchor);
        if start == end {
            return false;
        }
        let (from, to) = (self.byte_offset(start), self.byte_offset(end));
        self.value.replace_range(from..to, "");
        self.cursor = start;
        true
    }

    fn delete_char_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.value.remove(at);
        self.cursor -= 1;
        true
    }

    fn delete_char_forward(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.value.remove(at);
        true
    }

    fn move_cursor(&mut self, to: usize, extend: bool) -> bool {
        if extend {
            if self.selection_anchor.is_none() {
                self.selection_anchor = Some(self.cursor);
            }
        } else {
            self.selection_anchor = None;
        }
        self.cursor = to;
        true
    }

    fn selection_range(&self, anchor: usize) -> (usize, usize) {
        let anchor = anchor.min(self.char_count());
        if anchor <= self.cursor {
            (anchor, self.cursor)
        } else {
            (self.cursor, anchor)
        }
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }
}
